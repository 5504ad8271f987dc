//! Fixed orthographic camera.
//!
//! The widget's camera never moves: the eye sits on a sphere around the
//! origin (distance 5, polar angle π/3, azimuth 0) looking at the center of
//! the scene. Only the projection changes, tracking the surface aspect
//! ratio so a world unit stays square on screen.

use cgmath::{ortho, InnerSpace, Matrix4, Point3, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Half the visible world width. The projection is anchored on width; the
/// height follows the aspect ratio.
pub const HALF_WIDTH: f32 = 5.0;
/// Eye distance from the origin.
pub const DISTANCE: f32 = 5.0;
/// Polar angle of the eye, measured from +Y. Also compensated for by the
/// drag translation math.
pub const POLAR_ANGLE: f32 = std::f32::consts::FRAC_PI_3;
/// Azimuth of the eye around +Y.
pub const AZIMUTH: f32 = 0.0;

const ZNEAR: f32 = 0.1;
const ZFAR: f32 = 1000.0;

/// Snapshot of the live projection extents, passed by value into the
/// interaction code so hit-testing math never reads cached camera state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub half_width: f32,
    pub half_height: f32,
}

/// Pixel width covered by a world-space length at the current projection.
///
/// Pure on purpose: the trash-can shrink formula recomputes this on every
/// pointer move against the live camera half-width and surface width.
pub fn world_length_to_width_px(length: f32, half_width: f32, surface_width_px: f32) -> f32 {
    length / (2.0 * half_width) * surface_width_px
}

#[derive(Debug, Clone, Copy)]
pub struct OrthoCamera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub half_width: f32,
    pub half_height: f32,
    pub uniform: CameraUniform,
}

impl OrthoCamera {
    /// Creates the camera for a surface of the given pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        let eye = DISTANCE
            * Vector3::new(
                POLAR_ANGLE.sin() * AZIMUTH.cos(),
                POLAR_ANGLE.cos(),
                POLAR_ANGLE.sin() * AZIMUTH.sin(),
            );
        let mut camera = Self {
            eye,
            target: Vector3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
            half_width: HALF_WIDTH,
            half_height: height as f32 / width as f32 * HALF_WIDTH,
            uniform: CameraUniform::default(),
        };
        camera.update_view_proj();
        camera
    }

    /// Tracks a surface resize: width stays anchored, height follows.
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.half_height = height as f32 / width as f32 * self.half_width;
        self.update_view_proj();
    }

    pub fn projection(&self) -> Projection {
        Projection {
            half_width: self.half_width,
            half_height: self.half_height,
        }
    }

    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(
            Point3::new(self.eye.x, self.eye.y, self.eye.z),
            Point3::new(self.target.x, self.target.y, self.target.z),
            self.up,
        );
        let proj = OPENGL_TO_WGPU_MATRIX
            * ortho(
                -self.half_width,
                self.half_width,
                -self.half_height,
                self.half_height,
                ZNEAR,
                ZFAR,
            );
        proj * view
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = self.build_view_projection_matrix().into();
    }

    /// Orthonormal view basis: (right, up, forward).
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        (right, up, forward)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Eye position in homogenous coordinates, for the 16 byte alignment.
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::from_scale(1.0).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_sits_on_the_view_sphere() {
        let camera = OrthoCamera::new(800, 600);
        assert!((camera.eye.magnitude() - DISTANCE).abs() < 1.0e-5);
        // φ = π/3, θ = 0 puts the eye in the +x/+y plane.
        assert!((camera.eye.x - DISTANCE * POLAR_ANGLE.sin()).abs() < 1.0e-5);
        assert!((camera.eye.y - DISTANCE * POLAR_ANGLE.cos()).abs() < 1.0e-5);
        assert!(camera.eye.z.abs() < 1.0e-5);
    }

    #[test]
    fn test_resize_keeps_width_anchored() {
        let mut camera = OrthoCamera::new(800, 600);
        assert_eq!(camera.half_height, 3.75);

        camera.resize_projection(800, 400);
        assert_eq!(camera.half_width, HALF_WIDTH);
        assert_eq!(camera.half_height, 2.5);
    }

    #[test]
    fn test_world_length_to_width_px_scales() {
        // 4 world units across a 10-unit view on an 800 px surface.
        assert_eq!(world_length_to_width_px(4.0, 5.0, 800.0), 320.0);
        // Linear in surface width, inverse in half-width.
        assert_eq!(world_length_to_width_px(4.0, 5.0, 1600.0), 640.0);
        assert_eq!(world_length_to_width_px(4.0, 10.0, 800.0), 160.0);
    }
}
