//! Handle used by platform driver glue.
//!
//! Mirrors the narrow sensor-HAL surface: one handle per sensor pair,
//! explicitly initialised and released, with every call reporting failure
//! when no session exists instead of relying on process-wide state.

use crate::error::{FusionError, Result};
use crate::session::FusionSession;
use crate::types::Orientation;
use akm_config::{AxisLayout, EngineConfig};
use glam::Vec3;
use std::path::Path;

/// AK897x register addresses handed over by the platform.
///
/// Stored as given; the engine never talks to the bus itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    pub wia: u8,
    pub info: u8,
    pub st1: u8,
    pub hxl: u8,
    pub hxh: u8,
    pub hyl: u8,
    pub hyh: u8,
    pub hzl: u8,
    pub hzh: u8,
    pub st2: u8,
    pub cntl: u8,
    pub astc: u8,
    pub i2cdis: u8,
    pub asax: u8,
    pub asay: u8,
    pub asaz: u8,
}

impl Default for RegisterMap {
    /// AK8975 register layout.
    fn default() -> Self {
        Self {
            wia: 0x00,
            info: 0x01,
            st1: 0x02,
            hxl: 0x03,
            hxh: 0x04,
            hyl: 0x05,
            hyh: 0x06,
            hzl: 0x07,
            hzh: 0x08,
            st2: 0x09,
            cntl: 0x0A,
            astc: 0x0C,
            i2cdis: 0x0F,
            asax: 0x10,
            asay: 0x11,
            asaz: 0x12,
        }
    }
}

struct Engine {
    session: FusionSession,
    registers: RegisterMap,
}

#[derive(Default)]
pub struct AkmDriver {
    engine: Option<Engine>,
}

impl AkmDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session for one sensor pair.
    ///
    /// `max_form_number` and `mag_layout` override the layout section of
    /// `config`. Re-initialising replaces (and stops) any previous session.
    pub fn init(
        &mut self,
        max_form_number: i32,
        registers: RegisterMap,
        mag_layout: AxisLayout,
        mut config: EngineConfig,
    ) {
        config.layout.form_factor_count = u32::try_from(max_form_number).unwrap_or(0).max(1);
        config.layout.mag_layout = mag_layout;

        if self.engine.is_some() {
            tracing::warn!("Driver re-initialised, replacing existing session");
        }
        tracing::info!(
            form_factors = config.layout.form_factor_count,
            ?mag_layout,
            "AKM engine initialised"
        );
        self.engine = Some(Engine {
            session: FusionSession::new(config),
            registers,
        });
    }

    /// Drop the session, stopping it first if it is running.
    pub fn release(&mut self) {
        if self.engine.take().is_some() {
            tracing::info!("AKM engine released");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.session_mut()?.start(path)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.session_mut()?.stop()
    }

    pub fn save_acc(&mut self, x: i32, y: i32, z: i32, sensitivity: i32) -> Result<()> {
        self.session_mut()?.ingest_acceleration(x, y, z, sensitivity)
    }

    pub fn save_mag(&mut self, x: i32, y: i32, z: i32, status: i32, period: i32) -> Result<()> {
        self.session_mut()?.ingest_magnetic(x, y, z, status, period)
    }

    pub fn orientation_values(&mut self) -> Result<Orientation> {
        Ok(self.session_mut()?.orientation())
    }

    pub fn magnetic_values(&self) -> Result<Vec3> {
        Ok(self.session()?.magnetic())
    }

    /// Zero when no session exists.
    pub fn calibration_goodness(&self) -> u32 {
        self.engine
            .as_ref()
            .map_or(0, |e| e.session.calibration_goodness())
    }

    /// Restart calibration. Does nothing when no session exists.
    pub fn force_recalibration(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.session.recalibrate();
        }
    }

    pub fn change_form_factor(&mut self, form_factor: i32) -> Result<()> {
        self.session_mut()?.change_form_factor(form_factor)
    }

    pub fn session(&self) -> Result<&FusionSession> {
        self.engine
            .as_ref()
            .map(|e| &e.session)
            .ok_or(FusionError::NotInitialized)
    }

    pub fn session_mut(&mut self) -> Result<&mut FusionSession> {
        self.engine
            .as_mut()
            .map(|e| &mut e.session)
            .ok_or(FusionError::NotInitialized)
    }

    pub fn register_map(&self) -> Result<&RegisterMap> {
        self.engine
            .as_ref()
            .map(|e| &e.registers)
            .ok_or(FusionError::NotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use akm_config::IDENTITY_LAYOUT;

    fn initialised() -> AkmDriver {
        let mut driver = AkmDriver::new();
        driver.init(2, RegisterMap::default(), IDENTITY_LAYOUT, EngineConfig::default());
        driver
    }

    #[test]
    fn calls_fail_before_init() {
        let mut driver = AkmDriver::new();
        assert_eq!(driver.start("/dev/akm"), Err(FusionError::NotInitialized));
        assert_eq!(driver.stop(), Err(FusionError::NotInitialized));
        assert_eq!(driver.save_acc(0, 0, 720, 720), Err(FusionError::NotInitialized));
        assert_eq!(driver.save_mag(0, 20, -40, 0, 0), Err(FusionError::NotInitialized));
        assert_eq!(driver.orientation_values(), Err(FusionError::NotInitialized));
        assert_eq!(driver.magnetic_values(), Err(FusionError::NotInitialized));
        assert_eq!(driver.change_form_factor(0), Err(FusionError::NotInitialized));
        assert!(driver.register_map().is_err());
    }

    #[test]
    fn queries_tolerate_missing_engine() {
        let mut driver = AkmDriver::new();
        assert_eq!(driver.calibration_goodness(), 0);
        driver.force_recalibration();
        driver.release();
        assert!(!driver.is_initialized());
    }

    #[test]
    fn init_applies_layout_and_form_factors() {
        let mut driver = AkmDriver::new();
        let layout = [[0, 1, 0], [1, 0, 0], [0, 0, -1]];
        driver.init(3, RegisterMap::default(), layout, EngineConfig::default());

        let config = driver.session().unwrap().config();
        assert_eq!(config.layout.form_factor_count, 3);
        assert_eq!(config.layout.mag_layout, layout);

        driver.save_mag(1, 2, 3, 0, 0).unwrap();
        assert_eq!(driver.magnetic_values().unwrap(), Vec3::new(2.0, 1.0, -3.0));
        assert_eq!(
            driver.change_form_factor(3),
            Err(FusionError::InvalidFormFactor { id: 3, count: 3 })
        );
    }

    #[test]
    fn non_positive_form_count_means_one() {
        let mut driver = AkmDriver::new();
        driver.init(0, RegisterMap::default(), IDENTITY_LAYOUT, EngineConfig::default());
        assert!(driver.change_form_factor(0).is_ok());
        assert!(driver.change_form_factor(1).is_err());
    }

    #[test]
    fn register_map_is_kept() {
        let mut driver = AkmDriver::new();
        let registers = RegisterMap {
            cntl: 0x31,
            ..RegisterMap::default()
        };
        driver.init(1, registers, IDENTITY_LAYOUT, EngineConfig::default());
        assert_eq!(driver.register_map().unwrap().cntl, 0x31);
        assert_eq!(driver.register_map().unwrap().st2, 0x09);
    }

    #[test]
    fn release_stops_and_forgets() {
        let mut driver = initialised();
        driver.start("/dev/akm8975").unwrap();
        assert!(driver.session().unwrap().is_started());

        driver.release();
        assert!(!driver.is_initialized());
        assert_eq!(driver.stop(), Err(FusionError::NotInitialized));
    }
}
