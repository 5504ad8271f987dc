//! The trash-can receptacle: style ownership and overlay drawing.
//!
//! Owns the style property table and the pixel geometry derived from it.
//! The glyph sits in the bottom-right corner of the surface; its styling
//! reacts to the controller's `highlighted` and `active` flags.

use crate::interaction::trash::{StyleError, TrashGeometry, TrashStyle, TrashVisual};

const BODY_COLOR: [f32; 4] = [0.62, 0.65, 0.70, 0.85];
const HIGHLIGHT_COLOR: [f32; 4] = [0.85, 0.88, 0.92, 0.95];
const ACTIVE_COLOR: [f32; 4] = [0.95, 0.45, 0.35, 1.0];

pub struct TrashCan {
    style: TrashStyle,
    geometry: TrashGeometry,
}

impl TrashCan {
    /// Builds the receptacle from the default style. Fails on malformed
    /// style values before any window exists.
    pub fn new() -> Result<Self, StyleError> {
        Self::with_style(TrashStyle::default())
    }

    pub fn with_style(style: TrashStyle) -> Result<Self, StyleError> {
        let geometry = style.geometry()?;
        Ok(Self { style, geometry })
    }

    pub fn geometry(&self) -> TrashGeometry {
        self.geometry
    }

    /// Re-derives the pixel geometry from the style table. Called on every
    /// window resize; the widget cannot hit-test without these values, so
    /// the caller treats an error as fatal.
    pub fn refresh_geometry(&mut self) -> Result<(), StyleError> {
        self.geometry = self.style.geometry()?;
        Ok(())
    }

    /// Paints the can in the bottom-right corner of the surface.
    pub fn draw(&self, ui: &imgui::Ui, viewport: [f32; 2], visual: TrashVisual) {
        let geometry = self.geometry;
        let length = if visual.active {
            geometry.length * 1.15
        } else {
            geometry.length
        };
        let color = if visual.active {
            ACTIVE_COLOR
        } else if visual.highlighted {
            HIGHLIGHT_COLOR
        } else {
            BODY_COLOR
        };

        let corner = [
            viewport[0] - geometry.margin - length,
            viewport[1] - geometry.margin - length,
        ];

        let draw_list = ui.get_background_draw_list();

        // Body: a slightly tapered bin below the lid line.
        let lid_height = length * 0.18;
        let body_top = corner[1] + lid_height;
        let inset = length * 0.12;
        draw_list
            .add_rect(
                [corner[0] + inset, body_top],
                [corner[0] + length - inset, corner[1] + length],
                color,
            )
            .rounding(length * 0.08)
            .filled(true)
            .build();

        // Lid with a raised handle.
        draw_list
            .add_rect(
                [corner[0], corner[1] + lid_height * 0.55],
                [corner[0] + length, body_top],
                color,
            )
            .rounding(length * 0.05)
            .filled(true)
            .build();
        draw_list
            .add_rect(
                [corner[0] + length * 0.38, corner[1]],
                [corner[0] + length * 0.62, corner[1] + lid_height * 0.55],
                color,
            )
            .filled(true)
            .build();

        // Three ribs down the body.
        let rib_color = [0.1, 0.12, 0.15, 0.6];
        for i in 1..=3 {
            let x = corner[0] + length * (0.2 + 0.2 * i as f32);
            draw_list
                .add_line(
                    [x, body_top + length * 0.12],
                    [x, corner[1] + length * 0.88],
                    rib_color,
                )
                .thickness((length * 0.04).max(1.0))
                .build();
        }

        // Halo while the drop would land.
        if visual.highlighted && !visual.active {
            let center = [corner[0] + length * 0.5, corner[1] + length * 0.55];
            draw_list
                .add_circle(center, length * 0.75, [1.0, 1.0, 1.0, 0.25])
                .thickness(2.0)
                .build();
        }
    }
}
