use crate::calibrator::{Calibrator, GravityCalibrator, MagneticCalibrator};
use crate::error::{FusionError, Result};
use crate::filter::SmoothingFilter;
use crate::math::layout_matrix;
use crate::orientation::OrientationEngine;
use crate::types::{Orientation, RawSample};
use akm_config::EngineConfig;
use glam::{Mat3, Vec3};
use std::path::{Path, PathBuf};

/// How often ingestion progress is logged.
const LOG_EVERY: u64 = 1000;

/// Calibration and fusion for one accelerometer/magnetometer pair.
///
/// Not synchronized: callers delivering samples from several threads must
/// serialize access themselves.
pub struct FusionSession {
    config: EngineConfig,
    /// Magnetometer sensor-to-device transform for the active form factor.
    layout: Mat3,
    form_factor: u32,
    accel_filter: SmoothingFilter,
    mag_filter: SmoothingFilter,
    accel_calibrator: Calibrator,
    mag_calibrator: Calibrator,
    last_acceleration: Vec3,
    last_magnetic: Vec3,
    orientation: OrientationEngine,
    started: bool,
    device_path: Option<PathBuf>,
    sample_count: u64,
}

impl FusionSession {
    /// Create an idle, uncalibrated session.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            layout: layout_matrix(&config.layout.layout_for(0)),
            form_factor: 0,
            accel_filter: SmoothingFilter::new(&config.accel_filter),
            mag_filter: SmoothingFilter::new(&config.mag_filter),
            accel_calibrator: Calibrator::Accelerometer(GravityCalibrator::new(config.gravity)),
            mag_calibrator: Calibrator::Magnetic(MagneticCalibrator::new(config.magnetic)),
            last_acceleration: Vec3::ZERO,
            last_magnetic: Vec3::ZERO,
            orientation: OrientationEngine::new(),
            started: false,
            device_path: None,
            sample_count: 0,
            config,
        }
    }

    /// Begin a session on the given device node. Calibration starts over.
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.started {
            return Err(FusionError::AlreadyStarted);
        }
        let path = path.as_ref().to_path_buf();
        self.recalibrate();
        self.started = true;
        tracing::info!(?path, "Fusion session started");
        self.device_path = Some(path);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Err(FusionError::NotStarted);
        }
        self.started = false;
        let path = self.device_path.take();
        tracing::info!(
            ?path,
            samples = self.sample_count,
            "Fusion session stopped"
        );
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn device_path(&self) -> Option<&Path> {
        self.device_path.as_deref()
    }

    /// Ingest a raw accelerometer reading.
    ///
    /// Counts are scaled by `accel_range / sensitivity`; a sensitivity that is
    /// zero or negative is rejected before the division.
    pub fn ingest_acceleration(&mut self, x: i32, y: i32, z: i32, sensitivity: i32) -> Result<()> {
        if sensitivity <= 0 {
            return Err(FusionError::InvalidSensitivity(sensitivity));
        }
        let raw = Vec3::new(x as f32, y as f32, z as f32)
            * (self.config.accel_range / sensitivity as f32);

        let mut value = self.accel_filter.push(raw);
        self.accel_calibrator.push(value);
        self.accel_calibrator.fix(&mut value);
        self.last_acceleration = value;
        self.orientation.invalidate();
        self.count_sample();
        Ok(())
    }

    /// Ingest a raw magnetometer reading, remapped to device axes.
    pub fn ingest_magnetic(&mut self, x: i32, y: i32, z: i32, status: i32, period: i32) -> Result<()> {
        let raw = self.layout * Vec3::new(x as f32, y as f32, z as f32) * self.config.magnetic_unit;

        let mut value = self.mag_filter.push(raw);
        self.mag_calibrator.record_status(status, period);
        self.mag_calibrator.push(value);
        self.mag_calibrator.fix(&mut value);
        self.last_magnetic = value;
        self.orientation.invalidate();
        self.count_sample();
        Ok(())
    }

    pub fn ingest(&mut self, sample: &RawSample) -> Result<()> {
        match *sample {
            RawSample::Acceleration(a) => self.ingest_acceleration(a.x, a.y, a.z, a.sensitivity),
            RawSample::Magnetic(m) => self.ingest_magnetic(m.x, m.y, m.z, m.status, m.period),
        }
    }

    /// Orientation from the latest calibrated vectors, recomputed only after
    /// an ingestion.
    pub fn orientation(&mut self) -> Orientation {
        self.orientation.get(self.last_acceleration, self.last_magnetic)
    }

    /// Last calibrated magnetic field, in µT.
    pub fn magnetic(&self) -> Vec3 {
        self.last_magnetic
    }

    /// Last calibrated acceleration.
    pub fn acceleration(&self) -> Vec3 {
        self.last_acceleration
    }

    /// Number of accelerometer samples trusted as gravity since the last
    /// recalibration. Zero means uncalibrated.
    pub fn calibration_goodness(&self) -> u32 {
        self.accel_calibrator.samples_used()
    }

    /// Return both sensors to the uncalibrated state without stopping.
    pub fn recalibrate(&mut self) {
        self.accel_calibrator.reset();
        self.mag_calibrator.reset();
        self.accel_filter.reset();
        self.mag_filter.reset();
        self.orientation.reset();
        tracing::info!("Calibration reset");
    }

    /// Switch device geometry. The magnetometer starts over when its axis
    /// layout changes; the stored field is cleared since it is in the old
    /// frame, and the azimuth holds until the next magnetic sample.
    pub fn change_form_factor(&mut self, form_factor: i32) -> Result<()> {
        let count = self.config.layout.form_factor_count;
        let id = u32::try_from(form_factor)
            .ok()
            .filter(|id| *id < count)
            .ok_or(FusionError::InvalidFormFactor {
                id: form_factor,
                count,
            })?;

        let layout = layout_matrix(&self.config.layout.layout_for(id));
        if layout != self.layout {
            self.layout = layout;
            self.mag_calibrator.reset();
            self.mag_filter.reset();
            self.last_magnetic = Vec3::ZERO;
            tracing::info!(form_factor = id, "Magnetometer layout changed");
        }
        self.form_factor = id;
        Ok(())
    }

    pub fn form_factor(&self) -> u32 {
        self.form_factor
    }

    pub fn accelerometer(&self) -> &Calibrator {
        &self.accel_calibrator
    }

    pub fn magnetometer(&self) -> &Calibrator {
        &self.mag_calibrator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn count_sample(&mut self) {
        self.sample_count += 1;
        if self.sample_count % LOG_EVERY == 0 {
            tracing::debug!(
                sample_count = self.sample_count,
                goodness = self.calibration_goodness(),
                "Sensor samples processed"
            );
        }
    }
}

impl Drop for FusionSession {
    fn drop(&mut self) {
        if self.started {
            let _ = self.stop();
        }
    }
}
