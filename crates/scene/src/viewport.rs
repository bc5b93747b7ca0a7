use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// Smallest pixel extent accepted from the host; zero-sized windows are
/// clamped to this instead of producing a degenerate aspect ratio.
pub const MIN_PIXEL_EXTENT: f64 = 1.0;
/// Smallest world-space extent the field may be scaled to.
pub const MIN_WORLD_EXTENT: f64 = 1e-6;

/// Fixed perspective camera on the +Z axis looking at the origin.
///
/// The field plane sits at `z = 0`, so its distance from the camera equals
/// `distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
    /// Distance from the camera to the origin along +Z.
    pub distance: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 35.0,
            distance: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn position(&self) -> DVec3 {
        DVec3::new(0.0, 0.0, self.distance)
    }

    pub fn view(&self) -> DMat4 {
        DMat4::look_at_rh(self.position(), DVec3::ZERO, DVec3::Y)
    }

    pub fn projection(&self, aspect: f64) -> DMat4 {
        DMat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f64) -> DMat4 {
        self.projection(aspect) * self.view()
    }

    /// Height of the visible frustum slice at world depth `z`.
    pub fn visible_height_at(&self, z: f64) -> f64 {
        let distance = (self.distance - z).abs();
        2.0 * (self.fov_degrees.to_radians() * 0.5).tan() * distance
    }
}

/// Visible area in world units at the field's depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Recomputes the field's world-space extent whenever the window resizes.
#[derive(Debug, Clone)]
pub struct ViewportAdapter {
    camera: Camera,
    field_depth: f64,
    pixels: (f64, f64),
    current: ViewportSize,
}

impl ViewportAdapter {
    pub fn new(camera: Camera) -> Self {
        let mut adapter = Self {
            camera,
            field_depth: 0.0,
            pixels: (MIN_PIXEL_EXTENT, MIN_PIXEL_EXTENT),
            current: ViewportSize {
                width: MIN_WORLD_EXTENT,
                height: MIN_WORLD_EXTENT,
            },
        };
        adapter.on_resize(MIN_PIXEL_EXTENT, MIN_PIXEL_EXTENT);
        adapter
    }

    /// Applies a new pixel size and returns the world-space extent the field
    /// plane must have to fill the frustum edge to edge.
    pub fn on_resize(&mut self, pixel_width: f64, pixel_height: f64) -> ViewportSize {
        let width = clamp_pixels(pixel_width);
        let height = clamp_pixels(pixel_height);
        if width != pixel_width || height != pixel_height {
            tracing::warn!(
                pixel_width,
                pixel_height,
                "viewport size clamped to a minimum positive extent"
            );
        }
        self.pixels = (width, height);

        let world_height = clamp_world(self.camera.visible_height_at(self.field_depth));
        let world_width = clamp_world(world_height * (width / height));
        self.current = ViewportSize {
            width: world_width,
            height: world_height,
        };
        self.current
    }

    pub fn current(&self) -> ViewportSize {
        self.current
    }

    /// Pixel dimensions of the most recent resize.
    pub fn pixels(&self) -> (f64, f64) {
        self.pixels
    }

    pub fn aspect(&self) -> f64 {
        self.pixels.0 / self.pixels.1
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

fn clamp_pixels(value: f64) -> f64 {
    if value.is_finite() {
        value.max(MIN_PIXEL_EXTENT)
    } else {
        MIN_PIXEL_EXTENT
    }
}

fn clamp_world(value: f64) -> f64 {
    if value.is_finite() && value > MIN_WORLD_EXTENT {
        value
    } else {
        MIN_WORLD_EXTENT
    }
}
