//! Correction model shared by both calibrators and the ellipsoid fit that
//! refines it.
//!
//! Accepted vectors are binned by direction into the 26 neighbours of a
//! 3x3x3 cube. Each bucket keeps one blended representative, so a long
//! stream from a single orientation cannot outweigh the rest of the sphere.
//! Once every axis has been seen from both sides the representatives are fit
//! to an axis-aligned ellipsoid
//!
//! ```text
//! A x² + B y² + C z² + D x + E y + F z = 1
//! ```
//!
//! whose centre is the bias and whose radii give the per-axis scale.

use glam::{DVec3, Vec3};
use nalgebra::{Matrix6, Vector6};

const BUCKETS: usize = 27;
/// Index of the (0, 0, 0) cell, which no unit direction maps to.
const CENTRE_BUCKET: usize = 13;
/// Weight given to a new vector when blending into an occupied bucket.
const BUCKET_BLEND: f64 = 0.25;
/// A direction component above this is quantized to ±1.
const AXIS_THRESHOLD: f32 = 0.5;
const MIN_BUCKETS: usize = 6;

/// `fixed = (raw + translation) * scale`, componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionModel {
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Default for CorrectionModel {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl CorrectionModel {
    pub fn apply(&self, value: &mut Vec3) {
        *value = (*value + self.translation) * self.scale;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of a successful ellipsoid fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsoidFit {
    pub center: DVec3,
    pub radii: DVec3,
}

impl EllipsoidFit {
    /// Correction that moves the centre to the origin and equalizes the radii
    /// to their mean, preserving the overall magnitude.
    pub fn model(&self) -> CorrectionModel {
        let mean_radius = (self.radii.x + self.radii.y + self.radii.z) / 3.0;
        CorrectionModel {
            translation: (-self.center).as_vec3(),
            scale: (DVec3::splat(mean_radius) / self.radii).as_vec3(),
        }
    }
}

/// Direction-bucketed set of calibration points.
#[derive(Debug, Clone)]
pub struct PointCloud {
    buckets: [Option<DVec3>; BUCKETS],
}

impl Default for PointCloud {
    fn default() -> Self {
        Self {
            buckets: [None; BUCKETS],
        }
    }
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `point`, binned by its direction as seen from `reference`.
    ///
    /// Returns `false` if the point coincides with the reference and has no
    /// direction.
    pub fn push(&mut self, point: Vec3, reference: Vec3) -> bool {
        let Some(index) = bucket_index(point - reference) else {
            return false;
        };
        let point = point.as_dvec3();
        let slot = &mut self.buckets[index];
        *slot = Some(match *slot {
            None => point,
            Some(existing) => existing + (point - existing) * BUCKET_BLEND,
        });
        true
    }

    pub fn filled(&self) -> usize {
        self.buckets.iter().filter(|b| b.is_some()).count()
    }

    /// Whether every axis has been observed from both its positive and
    /// negative side.
    pub fn covers_all_axes(&self) -> bool {
        let mut seen = [[false; 2]; 3];
        for (index, bucket) in self.buckets.iter().enumerate() {
            if bucket.is_none() {
                continue;
            }
            for (axis, cell) in bucket_cell(index).iter().enumerate() {
                match cell {
                    1 => seen[axis][0] = true,
                    -1 => seen[axis][1] = true,
                    _ => {}
                }
            }
        }
        seen.iter().all(|s| s[0] && s[1])
    }

    pub fn clear(&mut self) {
        self.buckets = [None; BUCKETS];
    }

    /// Fit an axis-aligned ellipsoid to the bucket representatives.
    ///
    /// Returns `None` when coverage is insufficient or the solution is not a
    /// real ellipsoid.
    pub fn fit(&self) -> Option<EllipsoidFit> {
        if self.filled() < MIN_BUCKETS || !self.covers_all_axes() {
            return None;
        }

        let points: Vec<DVec3> = self.buckets.iter().flatten().copied().collect();

        // Condition the system: centre on the mean and scale to unit RMS.
        let mean = points.iter().copied().sum::<DVec3>() / points.len() as f64;
        let rms = (points
            .iter()
            .map(|p| (*p - mean).length_squared())
            .sum::<f64>()
            / points.len() as f64)
            .sqrt();
        if rms == 0.0 || !rms.is_finite() {
            return None;
        }

        let mut normal = Matrix6::<f64>::zeros();
        let mut rhs = Vector6::<f64>::zeros();
        for p in &points {
            let q = (*p - mean) / rms;
            let row = Vector6::new(q.x * q.x, q.y * q.y, q.z * q.z, q.x, q.y, q.z);
            normal += row * row.transpose();
            rhs += row;
        }

        let solution = normal.lu().solve(&rhs)?;
        let quadratic = DVec3::new(solution[0], solution[1], solution[2]);
        let linear = DVec3::new(solution[3], solution[4], solution[5]);
        if quadratic.min_element() <= 0.0 {
            return None;
        }

        let center = -linear / (2.0 * quadratic);
        let g = 1.0 + (quadratic * center * center).element_sum();
        if g <= 0.0 {
            return None;
        }
        let radii = DVec3::new(
            (g / quadratic.x).sqrt(),
            (g / quadratic.y).sqrt(),
            (g / quadratic.z).sqrt(),
        );

        let fit = EllipsoidFit {
            center: mean + center * rms,
            radii: radii * rms,
        };
        (fit.center.is_finite() && fit.radii.is_finite()).then_some(fit)
    }
}

/// Quantize a direction to one of the 26 cube neighbours.
fn bucket_index(direction: Vec3) -> Option<usize> {
    let length = direction.length();
    if length == 0.0 || !length.is_finite() {
        return None;
    }
    let unit = direction / length;
    let quantize = |c: f32| -> usize {
        if c > AXIS_THRESHOLD {
            2
        } else if c < -AXIS_THRESHOLD {
            0
        } else {
            1
        }
    };
    let index = quantize(unit.x) * 9 + quantize(unit.y) * 3 + quantize(unit.z);
    // Unreachable for a unit vector, whose largest component is >= 1/sqrt(3).
    (index != CENTRE_BUCKET).then_some(index)
}

fn bucket_cell(index: usize) -> [i32; 3] {
    [
        (index / 9) as i32 - 1,
        ((index / 3) % 3) as i32 - 1,
        (index % 3) as i32 - 1,
    ]
}
