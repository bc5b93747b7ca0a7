use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::noise::signed_noise;

/// Drift of the noise lattice per unit of distortion phase.
const NOISE_DRIFT: f64 = 0.1;
/// Maps object-space positions onto the noise lattice.
const NOISE_FREQUENCY: f64 = 0.5;

/// Surface shading inputs for the solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidMaterial {
    /// Base colour, sRGB encoded.
    pub color: DVec3,
    pub roughness: f64,
    pub metalness: f64,
}

impl Default for SolidMaterial {
    fn default() -> Self {
        Self {
            color: DVec3::splat(f64::from(0x0a_u8) / 255.0),
            roughness: 0.05,
            metalness: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidParams {
    pub radius: f64,
    /// Icosahedron subdivision level; 0 is the bare 20-face solid.
    pub detail: u32,
    /// Spin around the Y axis in radians per second.
    pub rotation_speed: f64,
    pub float_speed: f64,
    pub float_amplitude: f64,
    /// Scales the slow tilt applied by the floating wrapper.
    pub rotation_intensity: f64,
    /// Maximum radial displacement as a fraction of the radius.
    pub distort: f64,
    /// Distortion phase advance per second.
    pub distort_speed: f64,
    pub material: SolidMaterial,
}

impl Default for SolidParams {
    fn default() -> Self {
        Self {
            radius: 13.0,
            detail: 1,
            rotation_speed: 0.25,
            float_speed: 2.0,
            float_amplitude: 0.1,
            rotation_intensity: 0.5,
            distort: 0.4,
            distort_speed: 4.0,
            material: SolidMaterial::default(),
        }
    }
}

/// Per-frame pose and deformation state of the solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidTransform {
    /// Spin in radians; grows without bound, only its sine/cosine matter.
    pub rotation_y: f64,
    pub float_offset: f64,
    pub distort_phase: f64,
    /// Parent tilt from the floating wrapper, XYZ euler radians.
    pub wobble: DVec3,
}

impl SolidTransform {
    /// Object-to-world matrix: bob, then wobble, then spin.
    pub fn model_matrix(&self) -> DMat4 {
        DMat4::from_translation(DVec3::new(0.0, self.float_offset, 0.0))
            * DMat4::from_rotation_x(self.wobble.x)
            * DMat4::from_rotation_y(self.wobble.y)
            * DMat4::from_rotation_z(self.wobble.z)
            * DMat4::from_rotation_y(self.rotation_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidVertex {
    pub position: DVec3,
    pub normal: DVec3,
}

/// Non-indexed triangle list of a subdivided icosahedron projected onto a sphere.
#[derive(Debug, Clone)]
pub struct SolidMesh {
    radius: f64,
    positions: Vec<DVec3>,
}

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_corners() -> [DVec3; 12] {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    [
        DVec3::new(-1.0, t, 0.0),
        DVec3::new(1.0, t, 0.0),
        DVec3::new(-1.0, -t, 0.0),
        DVec3::new(1.0, -t, 0.0),
        DVec3::new(0.0, -1.0, t),
        DVec3::new(0.0, 1.0, t),
        DVec3::new(0.0, -1.0, -t),
        DVec3::new(0.0, 1.0, -t),
        DVec3::new(t, 0.0, -1.0),
        DVec3::new(t, 0.0, 1.0),
        DVec3::new(-t, 0.0, -1.0),
        DVec3::new(-t, 0.0, 1.0),
    ]
}

impl SolidMesh {
    pub fn icosahedron(radius: f64, detail: u32) -> Self {
        let corners = icosahedron_corners();
        let cols = detail as usize + 1;
        let mut positions = Vec::with_capacity(ICOSAHEDRON_FACES.len() * cols * cols * 3);

        for face in ICOSAHEDRON_FACES {
            let [a, b, c] = face.map(|index| corners[index]);
            // Row i runs from the a-c edge to the b-c edge; the last row is c.
            let grid: Vec<Vec<DVec3>> = (0..=cols)
                .map(|i| {
                    let aj = a.lerp(c, i as f64 / cols as f64);
                    let bj = b.lerp(c, i as f64 / cols as f64);
                    let rows = cols - i;
                    if rows == 0 {
                        vec![aj]
                    } else {
                        (0..=rows)
                            .map(|j| aj.lerp(bj, j as f64 / rows as f64))
                            .collect()
                    }
                })
                .collect();

            for i in 0..cols {
                for j in 0..2 * (cols - i) - 1 {
                    let k = j / 2;
                    let triangle = if j % 2 == 0 {
                        [grid[i][k + 1], grid[i + 1][k], grid[i][k]]
                    } else {
                        [grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]
                    };
                    positions.extend(triangle.map(|p| p.normalize() * radius));
                }
            }
        }

        Self { radius, positions }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Displaces every vertex along its radial direction by at most
    /// `radius * distort` and recomputes flat, outward-facing normals.
    ///
    /// Coincident base vertices always land on the same deformed position,
    /// so the surface never cracks.
    pub fn deform(&self, phase: f64, distort: f64) -> Vec<SolidVertex> {
        let drift = DVec3::splat(phase * NOISE_DRIFT);
        let displaced: Vec<DVec3> = self
            .positions
            .iter()
            .map(|&position| {
                let direction = position.normalize_or_zero();
                let n = signed_noise(position * NOISE_FREQUENCY + drift);
                direction * (self.radius + self.radius * distort * n)
            })
            .collect();

        let mut vertices = Vec::with_capacity(displaced.len());
        for triangle in displaced.chunks_exact(3) {
            let (a, b, c) = (triangle[0], triangle[1], triangle[2]);
            let mut normal = (b - a).cross(c - a).normalize_or_zero();
            if normal.dot(a + b + c) < 0.0 {
                normal = -normal;
            }
            vertices.extend([a, b, c].map(|position| SolidVertex { position, normal }));
        }
        vertices
    }
}

/// Single slowly rotating, floating, continuously deforming solid.
#[derive(Debug, Clone)]
pub struct RotatingSolid {
    params: SolidParams,
    mesh: SolidMesh,
}

impl RotatingSolid {
    pub fn new(params: SolidParams) -> Self {
        let mesh = SolidMesh::icosahedron(params.radius, params.detail);
        Self { params, mesh }
    }

    pub fn params(&self) -> &SolidParams {
        &self.params
    }

    pub fn mesh(&self) -> &SolidMesh {
        &self.mesh
    }

    pub fn advance(&self, elapsed_seconds: f64) -> SolidTransform {
        let p = &self.params;
        let wobble_phase = elapsed_seconds * p.float_speed / 4.0;
        SolidTransform {
            rotation_y: elapsed_seconds * p.rotation_speed,
            float_offset: p.float_amplitude * (elapsed_seconds * p.float_speed).sin(),
            distort_phase: elapsed_seconds * p.distort_speed,
            wobble: DVec3::new(
                wobble_phase.cos() / 8.0,
                wobble_phase.sin() / 8.0,
                wobble_phase.sin() / 20.0,
            ) * p.rotation_intensity,
        }
    }

    /// Deformed surface for the given transform's distortion phase.
    pub fn surface(&self, transform: &SolidTransform) -> Vec<SolidVertex> {
        self.mesh.deform(transform.distort_phase, self.params.distort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_linear_in_time() {
        let solid = RotatingSolid::new(SolidParams::default());
        for step in 0..200 {
            let t = step as f64 * 0.37;
            let transform = solid.advance(t);
            assert_eq!(transform.rotation_y, t * 0.25);
            assert!(transform.float_offset.abs() <= 0.1 + 1e-12);
            assert_eq!(transform.distort_phase, t * 4.0);
        }
    }

    #[test]
    fn starts_at_rest() {
        let transform = RotatingSolid::new(SolidParams::default()).advance(0.0);
        assert_eq!(transform.rotation_y, 0.0);
        assert_eq!(transform.float_offset, 0.0);
        assert_eq!(transform.distort_phase, 0.0);
    }

    #[test]
    fn accepts_any_real_time() {
        let solid = RotatingSolid::new(SolidParams::default());
        let transform = solid.advance(-1.0e6);
        assert!(transform.float_offset.abs() <= 0.1 + 1e-12);
        assert!(transform.wobble.is_finite());
    }

    #[test]
    fn surface_stays_finite_after_very_long_runs() {
        let solid = RotatingSolid::new(SolidParams::default());
        for &t in &[6.0e9, 1.0e12, -1.0e12] {
            let surface = solid.surface(&solid.advance(t));
            assert_eq!(surface.len(), solid.mesh().positions().len());
            for vertex in surface {
                assert!(vertex.position.is_finite());
                assert!(vertex.normal.is_finite());
                assert!((vertex.position.length() - 13.0).abs() <= 13.0 * 0.4 + 1e-6);
            }
        }
    }

    #[test]
    fn detail_one_has_eighty_faces_on_the_sphere() {
        let mesh = SolidMesh::icosahedron(13.0, 1);
        assert_eq!(mesh.triangle_count(), 80);
        assert!(mesh
            .positions()
            .iter()
            .all(|p| (p.length() - 13.0).abs() < 1e-9));
        assert_eq!(SolidMesh::icosahedron(1.0, 0).triangle_count(), 20);
        assert_eq!(SolidMesh::icosahedron(1.0, 2).triangle_count(), 180);
    }

    #[test]
    fn displacement_is_bounded() {
        let solid = RotatingSolid::new(SolidParams::default());
        for step in 0..20 {
            let transform = solid.advance(step as f64 * 0.8);
            for vertex in solid.surface(&transform) {
                let offset = vertex.position.length() - 13.0;
                assert!(offset.abs() <= 13.0 * 0.4 + 1e-9);
                assert!((vertex.normal.length() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn deformation_is_continuous_in_phase() {
        let mesh = SolidMesh::icosahedron(13.0, 1);
        let a = mesh.deform(10.0, 0.4);
        let b = mesh.deform(10.0 + 1e-6, 0.4);
        for (left, right) in a.iter().zip(&b) {
            assert!((left.position - right.position).length() < 1e-3);
        }
    }

    #[test]
    fn shared_vertices_stay_welded() {
        let mesh = SolidMesh::icosahedron(13.0, 1);
        let deformed = mesh.deform(3.3, 0.4);
        for (i, base_i) in mesh.positions().iter().enumerate() {
            for (j, base_j) in mesh.positions().iter().enumerate().skip(i + 1) {
                if (*base_i - *base_j).length() < 1e-9 {
                    assert!((deformed[i].position - deformed[j].position).length() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn model_matrix_applies_bob() {
        let transform = SolidTransform {
            rotation_y: 0.0,
            float_offset: 0.1,
            distort_phase: 0.0,
            wobble: DVec3::ZERO,
        };
        let origin = transform.model_matrix().transform_point3(DVec3::ZERO);
        assert!((origin - DVec3::new(0.0, 0.1, 0.0)).length() < 1e-12);
    }
}
