//! Vector helpers on top of `glam::Vec3`.
//!
//! `Vec3` already provides componentwise `*`, scalar `*` and `/`, `+`,
//! `dot` and `length` with plain IEEE-754 semantics, so NaN and infinity
//! propagate the way raw sensor values do. What lives here is the little
//! the engine needs beyond that: a normalization that reports zero-length
//! input instead of producing NaN, and the integer axis-layout transform.

use crate::error::{FusionError, Result};
use glam::{Mat3, Vec3};

/// Split `v` into its unit direction and length.
///
/// Fails with [`FusionError::DegenerateVector`] when the length is exactly zero.
pub fn normalize(v: Vec3) -> Result<(Vec3, f32)> {
    let length = v.length();
    if length == 0.0 {
        return Err(FusionError::DegenerateVector);
    }
    Ok((v / length, length))
}

/// Build the sensor-to-device transform from a row-major integer layout.
pub fn layout_matrix(layout: &[[i16; 3]; 3]) -> Mat3 {
    let row = |r: usize| {
        Vec3::new(
            layout[r][0] as f32,
            layout[r][1] as f32,
            layout[r][2] as f32,
        )
    };
    // glam matrices are column-major; build from rows and transpose.
    Mat3::from_cols(row(0), row(1), row(2)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn componentwise_operations() {
        let a = Vec3::new(1.0, -2.0, 3.0);
        let b = Vec3::new(4.0, 0.5, -1.0);

        assert_eq!(a + b, Vec3::new(5.0, -1.5, 2.0));
        assert_eq!(a * b, Vec3::new(4.0, -1.0, -3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, -4.0, 6.0));
        assert_eq!(a / 2.0, Vec3::new(0.5, -1.0, 1.5));
    }

    #[test]
    fn length_of_pythagorean_triple() {
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).length(), 5.0);
        assert_eq!(Vec3::ZERO.length(), 0.0);
    }

    #[test]
    fn dot_is_symmetric_and_bilinear() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(-4.0, 5.0, 0.5);
        let c = Vec3::new(0.25, -1.0, 2.0);

        assert_eq!(a.dot(b), b.dot(a));
        assert!(((a + c).dot(b) - (a.dot(b) + c.dot(b))).abs() < 1e-5);
        assert!(((a * 3.0).dot(b) - 3.0 * a.dot(b)).abs() < 1e-5);
    }

    #[test]
    fn nan_propagates() {
        let v = Vec3::new(f32::NAN, 1.0, 1.0) + Vec3::ONE;
        assert!(v.x.is_nan());
        assert!(v.length().is_nan());
    }

    #[test]
    fn normalize_returns_unit_and_length() {
        let (unit, length) = normalize(Vec3::new(0.0, 3.0, 4.0)).unwrap();
        assert_eq!(length, 5.0);
        assert!((unit.length() - 1.0).abs() < 1e-6);
        assert!((unit.y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn normalize_rejects_zero() {
        assert_eq!(normalize(Vec3::ZERO), Err(FusionError::DegenerateVector));
    }

    #[test]
    fn layout_is_row_major() {
        // Swap x/y and flip z.
        let m = layout_matrix(&[[0, 1, 0], [1, 0, 0], [0, 0, -1]]);
        assert_eq!(m * Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 1.0, -3.0));

        let identity = layout_matrix(&[[1, 0, 0], [0, 1, 0], [0, 0, 1]]);
        assert_eq!(identity, Mat3::IDENTITY);
    }
}
