//! Accelerometer/magnetometer fusion for AK897x-class compasses.
//!
//! Raw integer samples go through a smoothing filter, an online calibrator
//! (gravity-gated for the accelerometer, hard/soft-iron for the
//! magnetometer) and finally a tilt-compensated compass that reports
//! azimuth, pitch and roll in degrees.
//!
//! [`FusionSession`] owns one sensor pair; [`AkmDriver`] wraps it in the
//! init/release lifecycle the platform driver glue expects.

pub mod calibrator;
pub mod driver;
pub mod error;
pub mod filter;
pub mod math;
pub mod orientation;
pub mod session;
pub mod types;

pub use calibrator::Calibrator;
pub use driver::{AkmDriver, RegisterMap};
pub use error::{FusionError, Result};
pub use orientation::compute_orientation;
pub use session::FusionSession;
pub use types::{Orientation, RawAcceleration, RawMagnetic, RawSample};
