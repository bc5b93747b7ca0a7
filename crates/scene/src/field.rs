//! The full-viewport "liquid" colour field.
//!
//! For a surface coordinate `(u, v)` in `[0, 1]²` (v pointing up):
//!
//! ```text
//! t  = time * 0.15
//! m  = mouse * 0.1
//! s  = sin(u*8 + t + m.x*12) + sin(v*6 - t + m.y*12)
//! k  = smoothstep(0, 1, s*0.5 + 0.5)
//! rgb = mix(color_a, color_b, k), alpha = 1
//! ```
//!
//! The GPU fragment shader in the renderer evaluates the same expression; the
//! CPU version here backs snapshots and tests.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::viewport::ViewportSize;

const TIME_SCALE: f64 = 0.15;
const MOUSE_SCALE: f64 = 0.1;
const MOUSE_PHASE: f64 = 12.0;
const U_FREQUENCY: f64 = 8.0;
const V_FREQUENCY: f64 = 6.0;

/// Per-frame inputs broadcast to every point of the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldUniforms {
    pub time: f64,
    pub mouse: DVec2,
    pub scale: ViewportSize,
}

/// The two dark reference colours the field blends between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPalette {
    pub color_a: DVec3,
    pub color_b: DVec3,
}

impl Default for FieldPalette {
    fn default() -> Self {
        Self {
            color_a: DVec3::splat(0.005),
            color_b: DVec3::splat(0.05),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn rgb(&self) -> DVec3 {
        DVec3::new(self.r, self.g, self.b)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let quantize = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }
}

/// GLSL-style smoothstep: clamps `x` into `[edge0, edge1]` and eases it cubically.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Clone, Default)]
pub struct ProceduralField {
    palette: FieldPalette,
}

impl ProceduralField {
    pub fn new(palette: FieldPalette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &FieldPalette {
        &self.palette
    }

    /// Binds the field to one frame's uniforms.
    pub fn evaluate(&self, uniforms: FieldUniforms) -> ColorField {
        ColorField {
            uniforms,
            palette: self.palette,
        }
    }

    /// RGBA8 raster of the field for one frame's uniforms.
    pub fn sample_grid(&self, uniforms: FieldUniforms, width: u32, height: u32) -> Vec<u8> {
        self.evaluate(uniforms).rasterize(width, height)
    }
}

/// A field bound to a frame's uniforms; sample it with [`ColorField::at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorField {
    uniforms: FieldUniforms,
    palette: FieldPalette,
}

impl ColorField {
    /// Blend factor between the two palette colours at `(u, v)`, in `[0, 1]`.
    pub fn intensity_at(&self, u: f64, v: f64) -> f64 {
        let t = self.uniforms.time * TIME_SCALE;
        let m = self.uniforms.mouse * MOUSE_SCALE;
        let s = (u * U_FREQUENCY + t + m.x * MOUSE_PHASE).sin()
            + (v * V_FREQUENCY - t + m.y * MOUSE_PHASE).sin();
        smoothstep(0.0, 1.0, s * 0.5 + 0.5)
    }

    pub fn at(&self, u: f64, v: f64) -> Rgba {
        let k = self.intensity_at(u, v);
        let rgb = self.palette.color_a.lerp(self.palette.color_b, k);
        Rgba {
            r: rgb.x,
            g: rgb.y,
            b: rgb.z,
            a: 1.0,
        }
    }

    /// World-space size of the surface the field is drawn on.
    pub fn extent(&self) -> ViewportSize {
        self.uniforms.scale
    }

    pub fn uniforms(&self) -> &FieldUniforms {
        &self.uniforms
    }

    /// Rasterises the field into tightly packed RGBA8 rows, top row first,
    /// sampling at pixel centres.
    pub fn rasterize(&self, width: u32, height: u32) -> Vec<u8> {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for row in 0..height {
            let v = 1.0 - (f64::from(row) + 0.5) / f64::from(height);
            for column in 0..width {
                let u = (f64::from(column) + 0.5) / f64::from(width);
                pixels.extend_from_slice(&self.at(u, v).to_rgba8());
            }
        }
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms(time: f64, mouse: DVec2) -> FieldUniforms {
        FieldUniforms {
            time,
            mouse,
            scale: ViewportSize {
                width: 4.0,
                height: 3.0,
            },
        }
    }

    #[test]
    fn smoothstep_endpoints_and_midpoint() {
        assert_eq!(smoothstep(0.0, 1.0, -0.5), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 1.5), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn origin_at_time_zero_is_midpoint() {
        let field = ProceduralField::default().evaluate(uniforms(0.0, DVec2::ZERO));
        assert!((field.intensity_at(0.0, 0.0) - smoothstep(0.0, 1.0, 0.5)).abs() < 1e-12);
        let color = field.at(0.0, 0.0);
        assert!((color.r - 0.0275).abs() < 1e-12);
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn output_stays_within_palette() {
        let palette = FieldPalette::default();
        let field = ProceduralField::new(palette);
        let lo = palette.color_a.min(palette.color_b);
        let hi = palette.color_a.max(palette.color_b);
        for step in 0..40 {
            let time = step as f64 * 1.7;
            let mouse = DVec2::new((step as f64 * 0.3).sin(), (step as f64 * 0.7).cos());
            let bound = field.evaluate(uniforms(time, mouse));
            for i in 0..=16 {
                for j in 0..=16 {
                    let rgb = bound.at(i as f64 / 16.0, j as f64 / 16.0).rgb();
                    assert!(rgb.cmpge(lo - 1e-15).all() && rgb.cmple(hi + 1e-15).all());
                }
            }
        }
    }

    #[test]
    fn pointer_shifts_the_pattern() {
        let field = ProceduralField::default();
        let still = field.evaluate(uniforms(1.0, DVec2::ZERO));
        let moved = field.evaluate(uniforms(1.0, DVec2::new(1.0, 0.0)));
        assert_ne!(still.intensity_at(0.3, 0.3), moved.intensity_at(0.3, 0.3));
    }

    #[test]
    fn extent_follows_uniform_scale() {
        let field = ProceduralField::default().evaluate(uniforms(0.0, DVec2::ZERO));
        assert_eq!(
            field.extent(),
            ViewportSize {
                width: 4.0,
                height: 3.0
            }
        );
    }

    #[test]
    fn rasterize_produces_opaque_rows() {
        let field = ProceduralField::default().evaluate(uniforms(2.0, DVec2::ZERO));
        let pixels = field.rasterize(8, 4);
        assert_eq!(pixels.len(), 8 * 4 * 4);
        assert!(pixels.chunks_exact(4).all(|px| px[3] == 255));
        // Palette tops out at 0.05, so nothing brighter than 13/255.
        assert!(pixels.chunks_exact(4).all(|px| px[0] <= 13));
        assert_eq!(
            ProceduralField::default().sample_grid(uniforms(2.0, DVec2::ZERO), 8, 4),
            pixels
        );
    }
}
