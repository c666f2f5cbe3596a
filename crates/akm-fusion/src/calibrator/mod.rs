//! Online calibrators for the two sensors.
//!
//! Both share one contract: `push` refines the correction model from a
//! filtered sample, `fix` applies the current model in place, `reset` returns
//! to the uncalibrated identity model. The set of sensors is fixed, so the
//! family is a closed enum rather than a trait object.

pub mod fit;
pub mod gravity;
pub mod magnetic;

pub use fit::{CorrectionModel, EllipsoidFit, PointCloud};
pub use gravity::GravityCalibrator;
pub use magnetic::MagneticCalibrator;

use glam::Vec3;

#[derive(Debug, Clone)]
pub enum Calibrator {
    Accelerometer(GravityCalibrator),
    Magnetic(MagneticCalibrator),
}

impl Calibrator {
    pub fn push(&mut self, sample: Vec3) {
        match self {
            Calibrator::Accelerometer(c) => c.push(sample),
            Calibrator::Magnetic(c) => c.push(sample),
        }
    }

    pub fn fix(&self, value: &mut Vec3) {
        match self {
            Calibrator::Accelerometer(c) => c.fix(value),
            Calibrator::Magnetic(c) => c.fix(value),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Calibrator::Accelerometer(c) => c.reset(),
            Calibrator::Magnetic(c) => c.reset(),
        }
    }

    /// Driver status for the upcoming sample. Only the magnetometer uses it.
    pub fn record_status(&mut self, status: i32, period: i32) {
        if let Calibrator::Magnetic(c) = self {
            c.record_status(status, period);
        }
    }

    pub fn model(&self) -> &CorrectionModel {
        match self {
            Calibrator::Accelerometer(c) => c.model(),
            Calibrator::Magnetic(c) => c.model(),
        }
    }

    /// Samples that have fed the correction model since the last reset.
    pub fn samples_used(&self) -> u32 {
        match self {
            Calibrator::Accelerometer(c) => c.accepted(),
            Calibrator::Magnetic(c) => c.collected(),
        }
    }

    /// Current gravity estimate, for the accelerometer variant.
    pub fn gravity_estimate(&self) -> Option<Vec3> {
        match self {
            Calibrator::Accelerometer(c) => Some(c.gravity()),
            Calibrator::Magnetic(_) => None,
        }
    }
}
