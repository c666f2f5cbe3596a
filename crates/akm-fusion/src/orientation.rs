use crate::math::normalize;
use crate::types::Orientation;
use glam::Vec3;

/// Lazily recomputed orientation.
///
/// Ingestion marks the cache stale; the next read recomputes once and later
/// reads return the stored value until the next ingestion.
#[derive(Debug, Clone, Default)]
pub struct OrientationEngine {
    cached: Orientation,
    stale: bool,
}

impl OrientationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Return the orientation for the given calibrated vectors, recomputing
    /// only if an ingestion happened since the last read.
    pub fn get(&mut self, acceleration: Vec3, magnetic: Vec3) -> Orientation {
        if self.stale {
            self.cached = compute_orientation(acceleration, magnetic, self.cached);
            self.stale = false;
        }
        self.cached
    }

    /// Forget the cached value; the next read recomputes.
    pub fn reset(&mut self) {
        self.cached = Orientation::default();
        self.stale = true;
    }
}

/// Tilt-compensated compass.
///
/// `acceleration` is the reaction to gravity (points up at rest). Pitch and
/// roll come from its direction alone. The magnetic vector is reduced to the
/// horizontal plane through `east = m × a` and `north = a × east`, and the
/// azimuth is the heading of the device y axis in that plane.
///
/// Zero acceleration leaves `previous` untouched. A magnetic vector that is
/// zero or parallel to gravity keeps the previous azimuth.
pub fn compute_orientation(acceleration: Vec3, magnetic: Vec3, previous: Orientation) -> Orientation {
    let Ok((up, _)) = normalize(acceleration) else {
        tracing::trace!("Zero acceleration, keeping last orientation");
        return previous;
    };

    let pitch = (-up.y).atan2(up.z).to_degrees();
    let roll = up.x.clamp(-1.0, 1.0).asin().to_degrees();

    let azimuth = match normalize(magnetic.cross(up)) {
        Ok((east, _)) => {
            let north = up.cross(east);
            wrap_360(east.y.atan2(north.y).to_degrees())
        }
        Err(_) => previous.azimuth,
    };

    Orientation {
        azimuth,
        pitch,
        roll,
    }
}

/// Map an angle in degrees to [0, 360).
fn wrap_360(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
