//! Lattice value noise used to morph the solid's surface.

use glam::DVec3;

const NOISE_SEED: u32 = 0x9e37_79b9;

fn noise_hash(x: i32, y: i32, z: i32, seed: u32) -> f64 {
    let mut h = seed.wrapping_add(x as u32).wrapping_mul(374761393);
    h = h.wrapping_add(y as u32).wrapping_mul(668265263);
    h = h.wrapping_add(z as u32).wrapping_mul(2147483647);
    h = (h ^ (h >> 13)).wrapping_mul(1274126177);
    h ^= h >> 16;
    f64::from(h & 0x7fff) / f64::from(0x7fff)
}

fn fade(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Cells per axis before the lattice repeats; keeps indices in `i32` range
/// for arbitrarily large coordinates.
const LATTICE_PERIOD: i32 = 1 << 16;

/// Lattice cell index (reduced into the period) and offset within the cell.
fn lattice(coord: f64) -> (i32, f64) {
    let cell = coord.floor();
    let index = cell.rem_euclid(f64::from(LATTICE_PERIOD)) as i32;
    (index, coord - cell)
}

fn next_cell(index: i32) -> i32 {
    (index + 1) % LATTICE_PERIOD
}

/// Trilinear value noise in `[0, 1]`, continuous in every coordinate.
pub fn value_noise(point: DVec3) -> f64 {
    let (ix, tx) = lattice(point.x);
    let (iy, ty) = lattice(point.y);
    let (iz, tz) = lattice(point.z);
    let (jx, jy, jz) = (next_cell(ix), next_cell(iy), next_cell(iz));
    let fx = fade(tx);
    let fy = fade(ty);
    let fz = fade(tz);

    let c000 = noise_hash(ix, iy, iz, NOISE_SEED);
    let c100 = noise_hash(jx, iy, iz, NOISE_SEED);
    let c010 = noise_hash(ix, jy, iz, NOISE_SEED);
    let c110 = noise_hash(jx, jy, iz, NOISE_SEED);
    let c001 = noise_hash(ix, iy, jz, NOISE_SEED);
    let c101 = noise_hash(jx, iy, jz, NOISE_SEED);
    let c011 = noise_hash(ix, jy, jz, NOISE_SEED);
    let c111 = noise_hash(jx, jy, jz, NOISE_SEED);

    let x0 = c000 + (c100 - c000) * fx;
    let x1 = c010 + (c110 - c010) * fx;
    let x2 = c001 + (c101 - c001) * fx;
    let x3 = c011 + (c111 - c011) * fx;

    let y0 = x0 + (x1 - x0) * fy;
    let y1 = x2 + (x3 - x2) * fy;

    y0 + (y1 - y0) * fz
}

/// Value noise remapped to `[-1, 1]`.
pub fn signed_noise(point: DVec3) -> f64 {
    (value_noise(point) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_range() {
        for i in -50..50 {
            let p = DVec3::new(i as f64 * 0.37, i as f64 * -0.91, i as f64 * 0.13 + 4.0);
            let n = signed_noise(p);
            assert!((-1.0..=1.0).contains(&n));
        }
    }

    #[test]
    fn deterministic() {
        let p = DVec3::new(1.25, -3.5, 0.75);
        assert_eq!(value_noise(p), value_noise(p));
    }

    #[test]
    fn continuous_across_lattice_cells() {
        let eps = 1e-7;
        for &x in &[0.0, 1.0, -2.0, 5.0] {
            let left = value_noise(DVec3::new(x - eps, 0.3, 0.6));
            let right = value_noise(DVec3::new(x + eps, 0.3, 0.6));
            assert!((left - right).abs() < 1e-5);
        }
    }

    #[test]
    fn continuous_where_the_lattice_repeats() {
        let edge = f64::from(LATTICE_PERIOD);
        let eps = 1e-7;
        let left = value_noise(DVec3::new(edge - eps, 0.3, 0.6));
        let right = value_noise(DVec3::new(edge + eps, 0.3, 0.6));
        assert!((left - right).abs() < 1e-5);
        assert_eq!(
            value_noise(DVec3::new(0.25, 0.5, 0.75)),
            value_noise(DVec3::new(edge + 0.25, 0.5, 0.75))
        );
    }

    #[test]
    fn huge_coordinates_stay_in_range() {
        for &c in &[3.0e9, -3.0e9, 4.0e11, 1.0e15, -1.0e18] {
            let n = signed_noise(DVec3::new(c, c * 0.5, -c));
            assert!(n.is_finite());
            assert!((-1.0..=1.0).contains(&n));
        }
    }
}
