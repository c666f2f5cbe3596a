use serde::{Deserialize, Serialize};

/// A 3x3 integer axis remap, row-major: `device = layout * sensor`.
pub type AxisLayout = [[i16; 3]; 3];

/// Identity axis remap (sensor axes already match device axes).
pub const IDENTITY_LAYOUT: AxisLayout = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Physical range numerator for accelerometer counts.
    /// A raw count is scaled by `accel_range / sensitivity`; 720 units = 1 g.
    pub accel_range: f32,
    /// Microtesla per raw magnetometer count.
    pub magnetic_unit: f32,
    /// Smoothing applied to accelerometer samples before calibration.
    pub accel_filter: FilterConfig,
    /// Smoothing applied to magnetometer samples before calibration.
    pub mag_filter: FilterConfig,
    /// Gravity estimator tuning.
    pub gravity: GravityConfig,
    /// Hard/soft-iron estimator tuning.
    pub magnetic: MagneticConfig,
    /// Magnetometer axis layout and form factors.
    pub layout: LayoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            accel_range: 720.0,
            magnetic_unit: 1.0,
            accel_filter: FilterConfig::PassThrough,
            mag_filter: FilterConfig::PassThrough,
            gravity: GravityConfig::default(),
            magnetic: MagneticConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Per-channel smoothing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Samples are forwarded unchanged.
    #[default]
    PassThrough,
    /// Mean of the last `window` samples.
    MovingAverage { window: usize },
    /// `y = alpha * x + (1 - alpha) * y_prev`. Lower alpha = more smoothing.
    Exponential { alpha: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// Weight kept from the previous gravity estimate on each push.
    pub smoothing: f32,
    /// Magnitude and direction tolerance before a sample is trusted as gravity.
    pub error: f32,
    /// Accepted samples between correction-model refits.
    pub refresh: u32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.8,
            error: 0.05,
            refresh: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticConfig {
    /// Samples weaker than this (µT) are not used for hard/soft-iron fitting.
    pub min_field: f32,
    /// Samples stronger than this (µT) are treated as glitches or overflow
    /// and never reach the fit.
    pub max_field: f32,
    /// Collected samples between correction-model refits.
    pub refresh: u32,
}

impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            min_field: 10.0,
            max_field: 1000.0,
            refresh: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of device geometries the platform can switch between.
    pub form_factor_count: u32,
    /// Base magnetometer axis layout.
    pub mag_layout: AxisLayout,
    /// Optional per-form-factor layouts, indexed by form factor id.
    /// Ids without an entry use `mag_layout`.
    pub form_factors: Vec<AxisLayout>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            form_factor_count: 1,
            mag_layout: IDENTITY_LAYOUT,
            form_factors: Vec::new(),
        }
    }
}

impl LayoutConfig {
    /// Layout to use for the given form factor.
    pub fn layout_for(&self, form_factor: u32) -> AxisLayout {
        self.form_factors
            .get(form_factor as usize)
            .copied()
            .unwrap_or(self.mag_layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_conventions() {
        let config = EngineConfig::default();
        assert_eq!(config.accel_range, 720.0);
        assert_eq!(config.accel_filter, FilterConfig::PassThrough);
        assert_eq!(config.gravity.smoothing, 0.8);
        assert_eq!(config.gravity.error, 0.05);
        assert_eq!(config.gravity.refresh, 10);
        assert_eq!(config.magnetic.max_field, 1000.0);
        assert_eq!(config.layout.mag_layout, IDENTITY_LAYOUT);
    }

    #[test]
    fn layout_for_falls_back_to_base() {
        let flipped = [[0, 1, 0], [1, 0, 0], [0, 0, -1]];
        let layout = LayoutConfig {
            form_factor_count: 3,
            mag_layout: IDENTITY_LAYOUT,
            form_factors: vec![IDENTITY_LAYOUT, flipped],
        };
        assert_eq!(layout.layout_for(0), IDENTITY_LAYOUT);
        assert_eq!(layout.layout_for(1), flipped);
        assert_eq!(layout.layout_for(2), IDENTITY_LAYOUT);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            accel_range = 1000.0

            [accel_filter]
            kind = "moving_average"
            window = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.accel_range, 1000.0);
        assert_eq!(config.accel_filter, FilterConfig::MovingAverage { window: 4 });
        assert_eq!(config.mag_filter, FilterConfig::PassThrough);
        assert_eq!(config.gravity, GravityConfig::default());
    }
}
