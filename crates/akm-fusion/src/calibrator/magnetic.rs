use super::fit::{CorrectionModel, PointCloud};
use akm_config::MagneticConfig;
use glam::Vec3;

/// Hard/soft-iron calibrator for the magnetometer.
///
/// Samples from arbitrary headings are binned around the midpoint of the
/// observed bounding box, the same min/max estimate a manual hard-iron
/// calibration uses, and periodically fit to an ellipsoid whose centre is
/// the hard-iron offset and whose radii expose soft-iron stretch.
#[derive(Debug, Clone)]
pub struct MagneticCalibrator {
    config: MagneticConfig,
    model: CorrectionModel,
    cloud: PointCloud,
    min: Vec3,
    max: Vec3,
    collected: u32,
    since_refit: u32,
    last_status: Option<i32>,
    last_period: Option<i32>,
}

impl MagneticCalibrator {
    pub fn new(config: MagneticConfig) -> Self {
        Self {
            config,
            model: CorrectionModel::default(),
            cloud: PointCloud::new(),
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
            collected: 0,
            since_refit: 0,
            last_status: None,
            last_period: None,
        }
    }

    /// Record the driver's status and period hint for the next sample.
    pub fn record_status(&mut self, status: i32, period: i32) {
        self.last_status = Some(status);
        self.last_period = Some(period);
    }

    pub fn push(&mut self, sample: Vec3) {
        let strength = sample.length();
        // Negated comparison also rejects NaN.
        if !(strength >= self.config.min_field) {
            tracing::trace!(?sample, "Magnetic sample too weak for calibration");
            return;
        }
        // A single overflow reading would drag the bounding box off the
        // field sphere for the rest of the session.
        if strength > self.config.max_field {
            tracing::debug!(?sample, max = self.config.max_field, "Magnetic sample out of range");
            return;
        }

        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
        if !self.cloud.push(sample, self.bounding_center()) {
            return;
        }

        self.collected = self.collected.saturating_add(1);
        self.since_refit += 1;
        if self.since_refit < self.config.refresh.max(1) {
            return;
        }
        self.since_refit = 0;

        if let Some(fit) = self.cloud.fit() {
            self.model = fit.model();
            tracing::info!(
                hard_iron_x = fit.center.x,
                hard_iron_y = fit.center.y,
                hard_iron_z = fit.center.z,
                radius_x = fit.radii.x,
                radius_y = fit.radii.y,
                radius_z = fit.radii.z,
                "Magnetometer calibration refit"
            );
        }
    }

    pub fn fix(&self, value: &mut Vec3) {
        self.model.apply(value);
    }

    pub fn reset(&mut self) {
        let config = self.config;
        *self = Self::new(config);
    }

    pub fn model(&self) -> &CorrectionModel {
        &self.model
    }

    /// Samples that contributed to the point cloud since the last reset.
    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn last_status(&self) -> Option<i32> {
        self.last_status
    }

    pub fn last_period(&self) -> Option<i32> {
        self.last_period
    }

    fn bounding_center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}
