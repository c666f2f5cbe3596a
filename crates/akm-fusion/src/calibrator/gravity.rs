use super::fit::{CorrectionModel, PointCloud};
use crate::math::normalize;
use akm_config::GravityConfig;
use glam::Vec3;

/// Accelerometer calibrator driven by the gravity vector.
///
/// While the device is at rest the filtered acceleration *is* gravity, so a
/// slow exponential average of acceleration converges to it. A sample is
/// trusted only when it agrees with that average in both magnitude and
/// direction; motion changes the former and rotation the latter.
#[derive(Debug, Clone)]
pub struct GravityCalibrator {
    config: GravityConfig,
    /// Running gravity estimate.
    gravity: Vec3,
    model: CorrectionModel,
    cloud: PointCloud,
    accepted: u32,
    since_refit: u32,
}

impl GravityCalibrator {
    pub fn new(config: GravityConfig) -> Self {
        Self {
            config,
            gravity: Vec3::ZERO,
            model: CorrectionModel::default(),
            cloud: PointCloud::new(),
            accepted: 0,
            since_refit: 0,
        }
    }

    pub fn push(&mut self, sample: Vec3) {
        let smoothing = self.config.smoothing;
        self.gravity = self.gravity * smoothing + sample * (1.0 - smoothing);

        let (Ok((sample_dir, sample_len)), Ok((gravity_dir, gravity_len))) =
            (normalize(sample), normalize(self.gravity))
        else {
            tracing::trace!("Zero-length acceleration, skipping gravity update");
            return;
        };

        let error = self.config.error;
        if (sample_len - gravity_len).abs() < error && sample_dir.dot(gravity_dir) > 1.0 - error {
            self.accept();
        }
    }

    pub fn fix(&self, value: &mut Vec3) {
        self.model.apply(value);
    }

    pub fn reset(&mut self) {
        self.gravity = Vec3::ZERO;
        self.model = CorrectionModel::default();
        self.cloud.clear();
        self.accepted = 0;
        self.since_refit = 0;
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn model(&self) -> &CorrectionModel {
        &self.model
    }

    /// Number of samples trusted as gravity since the last reset.
    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    fn accept(&mut self) {
        self.cloud.push(self.gravity, Vec3::ZERO);
        self.accepted = self.accepted.saturating_add(1);
        self.since_refit += 1;
        if self.since_refit < self.config.refresh.max(1) {
            return;
        }
        self.since_refit = 0;

        match self.cloud.fit() {
            Some(fit) => {
                self.model = fit.model();
                tracing::info!(
                    offset_x = fit.center.x,
                    offset_y = fit.center.y,
                    offset_z = fit.center.z,
                    accepted = self.accepted,
                    "Accelerometer calibration refit"
                );
            }
            None => tracing::trace!(
                buckets = self.cloud.filled(),
                "Not enough orientations for accelerometer fit"
            ),
        }
    }
}
