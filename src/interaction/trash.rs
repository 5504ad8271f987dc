//! Trash receptacle styling and hit-testing geometry.
//!
//! The trash can is styled through a small property table (the widget's
//! equivalent of CSS custom properties). Every value must be a strict
//! integer pixel string such as `"96px"` — hit-testing is done in pixel
//! space, so a relative unit would be meaningless. Malformed values are a
//! fatal setup error.
//!
//! Proximity tests run against the pointer's pixel displacement from the
//! far (bottom-right) corner of the surface, where the can is drawn.

use cgmath::{InnerSpace, Vector2};
use thiserror::Error;

use crate::gfx::camera::world_length_to_width_px;

/// Longest world-space extent of the chinchilla model, used to size the
/// shrink target so the projected model fits the active zone.
pub const MODEL_LENGTH_UPPER_BOUND: f32 = 4.0;

/// Style property names, mirrored by the overlay's styling.
pub const LENGTH: &str = "--length";
pub const ACTIVE_LENGTH: &str = "--active-length";
pub const HIGHLIGHT_DISTANCE: &str = "--highlight-distance";
pub const SPACING: &str = "--spacing";

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("missing trash can style property `{0}`")]
    Missing(&'static str),
    #[error("trash can style property `{name}` must be an integer pixel value, got `{value}`")]
    NotPixels { name: &'static str, value: String },
}

/// The trash can's style property table.
#[derive(Debug, Clone)]
pub struct TrashStyle {
    properties: Vec<(String, String)>,
}

impl Default for TrashStyle {
    fn default() -> Self {
        Self {
            properties: vec![
                (LENGTH.into(), "96px".into()),
                (ACTIVE_LENGTH.into(), "64px".into()),
                (HIGHLIGHT_DISTANCE.into(), "160px".into()),
                (SPACING.into(), "16px".into()),
            ],
        }
    }
}

impl TrashStyle {
    pub fn new(properties: Vec<(String, String)>) -> Self {
        Self { properties }
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Derives pixel geometry from the property table.
    ///
    /// Fails on a missing property or on any value that is not a strict
    /// `<integer>px` string.
    pub fn geometry(&self) -> Result<TrashGeometry, StyleError> {
        Ok(TrashGeometry {
            length: self.pixel_value(LENGTH)?,
            active_length: self.pixel_value(ACTIVE_LENGTH)?,
            highlight_distance: self.pixel_value(HIGHLIGHT_DISTANCE)?,
            margin: self.pixel_value(SPACING)?,
        })
    }

    fn pixel_value(&self, name: &'static str) -> Result<f32, StyleError> {
        let value = self.property(name).ok_or(StyleError::Missing(name))?;
        parse_px(value)
            .ok_or_else(|| StyleError::NotPixels {
                name,
                value: value.to_string(),
            })
            .map(|px| px as f32)
    }
}

/// Parses a strict `<integer>px` string. No whitespace, no sign, no
/// fractions, no other units.
fn parse_px(value: &str) -> Option<u32> {
    let digits = value.strip_suffix("px")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Pixel-space hit-testing geometry, derived from [`TrashStyle`] on setup
/// and on every window resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrashGeometry {
    /// Rendered side length of the can glyph.
    pub length: f32,
    /// Side length of the square drop zone.
    pub active_length: f32,
    /// Radius of the "getting close" halo.
    pub highlight_distance: f32,
    /// Gap between the drop zone and the surface corner.
    pub margin: f32,
}

impl TrashGeometry {
    /// True when the pointer is close enough to the corner to light the
    /// can up. `displacement` is (surface size − pointer position).
    pub fn highlights(&self, displacement: Vector2<f32>) -> bool {
        displacement.magnitude() < self.highlight_distance
    }

    /// True when the pointer sits strictly inside the square drop zone.
    pub fn contains(&self, displacement: Vector2<f32>) -> bool {
        let min = self.margin;
        let max = self.margin + self.active_length;
        displacement.x > min && displacement.x < max && displacement.y > min && displacement.y < max
    }

    /// Scale that makes the dragged model's projected size match the drop
    /// zone: `scale * width_px(bound) = active_length / 2`.
    ///
    /// Depends on the live camera half-width and surface width, so it is
    /// recomputed on every pointer move rather than cached.
    pub fn shrink_scale(&self, camera_half_width: f32, surface_width_px: f32) -> f32 {
        self.active_length
            / (2.0
                * world_length_to_width_px(
                    MODEL_LENGTH_UPPER_BOUND,
                    camera_half_width,
                    surface_width_px,
                ))
    }
}

/// Visual state the overlay renders. The flags mirror the `highlighted`
/// and `active` styling classes of the receptacle element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrashVisual {
    pub highlighted: bool,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(length: &str) -> TrashStyle {
        TrashStyle::new(vec![
            (LENGTH.into(), length.into()),
            (ACTIVE_LENGTH.into(), "64px".into()),
            (HIGHLIGHT_DISTANCE.into(), "160px".into()),
            (SPACING.into(), "16px".into()),
        ])
    }

    #[test]
    fn test_default_style_parses() {
        let geometry = TrashStyle::default().geometry().unwrap();
        assert_eq!(geometry.length, 96.0);
        assert_eq!(geometry.active_length, 64.0);
        assert_eq!(geometry.highlight_distance, 160.0);
        assert_eq!(geometry.margin, 16.0);
    }

    #[test]
    fn test_non_pixel_units_are_rejected() {
        for bad in ["10em", "1.5px", "10 px", "-4px", "px", "10"] {
            let err = style(bad).geometry().unwrap_err();
            assert!(
                matches!(err, StyleError::NotPixels { name: LENGTH, .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_property_is_rejected() {
        let style = TrashStyle::new(vec![(LENGTH.into(), "96px".into())]);
        assert!(matches!(
            style.geometry().unwrap_err(),
            StyleError::Missing(_)
        ));
    }

    #[test]
    fn test_active_box_bounds_are_exclusive() {
        let geometry = TrashStyle::default().geometry().unwrap();
        assert!(!geometry.contains(Vector2::new(16.0, 16.0)));
        assert!(!geometry.contains(Vector2::new(80.0, 40.0)));
        assert!(geometry.contains(Vector2::new(17.0, 79.0)));
        assert!(geometry.contains(Vector2::new(48.0, 48.0)));
        assert!(!geometry.contains(Vector2::new(48.0, 200.0)));
    }

    #[test]
    fn test_highlight_radius() {
        let geometry = TrashStyle::default().geometry().unwrap();
        assert!(geometry.highlights(Vector2::new(100.0, 100.0)));
        assert!(!geometry.highlights(Vector2::new(160.0, 0.0)));
    }

    #[test]
    fn test_shrink_scale_matches_active_zone() {
        let geometry = TrashStyle::default().geometry().unwrap();
        // width_px(4.0) = 4 / (2 * 5) * 800 = 320, so scale = 64 / 640.
        let scale = geometry.shrink_scale(5.0, 800.0);
        assert!((scale - 0.1).abs() < 1.0e-6);
    }
}
