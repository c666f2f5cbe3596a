use glam::Vec3;

/// Raw accelerometer reading in device-native counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAcceleration {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Counts per unit of the platform's acceleration range.
    pub sensitivity: i32,
}

/// Raw magnetometer reading in device-native counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMagnetic {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Driver-reported sensor status, passed through to the calibrator.
    pub status: i32,
    /// Sampling period hint from the driver.
    pub period: i32,
}

/// A single sample delivered by the platform driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSample {
    Acceleration(RawAcceleration),
    Magnetic(RawMagnetic),
}

/// Device orientation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    /// Heading of the device y axis from magnetic north, [0, 360). East is 90.
    pub azimuth: f32,
    /// Rotation around the x axis, (-180, 180].
    pub pitch: f32,
    /// Rotation around the y axis, [-90, 90].
    pub roll: f32,
}

impl Orientation {
    /// `(azimuth, pitch, roll)` packed as a vector.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.azimuth, self.pitch, self.roll)
    }
}
