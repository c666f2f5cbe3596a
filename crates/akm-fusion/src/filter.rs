use akm_config::FilterConfig;
use glam::{DVec3, Vec3};
use std::collections::VecDeque;

/// Upper bound on a moving-average window taken from configuration.
pub const MAX_WINDOW: usize = 1024;

/// Per-channel smoothing applied to raw samples before calibration.
///
/// Outlier rejection is left to the calibrators; a filter only denoises.
#[derive(Debug, Clone, Default)]
pub enum SmoothingFilter {
    #[default]
    PassThrough,
    /// Mean over the last `window` samples.
    MovingAverage {
        window: usize,
        samples: VecDeque<Vec3>,
    },
    /// First-order IIR low-pass: `y = alpha * x + (1 - alpha) * y_prev`.
    Exponential { alpha: f32, state: Option<Vec3> },
}

impl SmoothingFilter {
    pub fn new(config: &FilterConfig) -> Self {
        match *config {
            FilterConfig::PassThrough => SmoothingFilter::PassThrough,
            // A window of zero or one sample is a pass-through.
            FilterConfig::MovingAverage { window } if window <= 1 => SmoothingFilter::PassThrough,
            FilterConfig::MovingAverage { window } => {
                if window > MAX_WINDOW {
                    tracing::warn!(window, max = MAX_WINDOW, "Moving-average window clamped");
                }
                SmoothingFilter::MovingAverage {
                    window: window.min(MAX_WINDOW),
                    samples: VecDeque::new(),
                }
            }
            FilterConfig::Exponential { alpha } if alpha.is_nan() => {
                tracing::warn!("Exponential filter alpha is NaN, smoothing disabled");
                SmoothingFilter::PassThrough
            }
            FilterConfig::Exponential { alpha } => SmoothingFilter::Exponential {
                alpha: alpha.clamp(0.0, 1.0),
                state: None,
            },
        }
    }

    /// Feed a sample and return the smoothed value.
    pub fn push(&mut self, sample: Vec3) -> Vec3 {
        match self {
            SmoothingFilter::PassThrough => sample,
            SmoothingFilter::MovingAverage { window, samples } => {
                if samples.len() == *window {
                    samples.pop_front();
                }
                samples.push_back(sample);
                // Summed afresh in f64 so a spike leaves no residue once it
                // drops out of the window.
                let sum: DVec3 = samples.iter().map(|s| s.as_dvec3()).sum();
                (sum / samples.len() as f64).as_vec3()
            }
            SmoothingFilter::Exponential { alpha, state } => {
                // The first sample primes the filter.
                let output = match *state {
                    None => sample,
                    Some(prev) => sample * *alpha + prev * (1.0 - *alpha),
                };
                *state = Some(output);
                output
            }
        }
    }

    /// Drop accumulated history.
    pub fn reset(&mut self) {
        match self {
            SmoothingFilter::PassThrough => {}
            SmoothingFilter::MovingAverage { samples, .. } => samples.clear(),
            SmoothingFilter::Exponential { state, .. } => *state = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_is_identity() {
        let mut filter = SmoothingFilter::new(&FilterConfig::PassThrough);
        let v = Vec3::new(1.0, -2.0, 9.8);
        assert_eq!(filter.push(v), v);
        assert_eq!(filter.push(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn moving_average_window() {
        let mut filter = SmoothingFilter::new(&FilterConfig::MovingAverage { window: 3 });

        assert_eq!(filter.push(Vec3::splat(3.0)), Vec3::splat(3.0));
        assert_eq!(filter.push(Vec3::splat(6.0)), Vec3::splat(4.5));
        assert_eq!(filter.push(Vec3::splat(9.0)), Vec3::splat(6.0));
        // Oldest sample (3.0) falls out of the window.
        assert_eq!(filter.push(Vec3::splat(12.0)), Vec3::splat(9.0));
    }

    #[test]
    fn tiny_window_degrades_to_pass_through() {
        let filter = SmoothingFilter::new(&FilterConfig::MovingAverage { window: 1 });
        assert!(matches!(filter, SmoothingFilter::PassThrough));
    }

    #[test]
    fn spike_leaves_no_residue() {
        let mut filter = SmoothingFilter::new(&FilterConfig::MovingAverage { window: 4 });
        filter.push(Vec3::splat(1e9));
        let mut last = Vec3::ZERO;
        for _ in 0..8 {
            last = filter.push(Vec3::new(0.0, 0.0, 720.0));
        }
        assert_eq!(last, Vec3::new(0.0, 0.0, 720.0));
    }

    #[test]
    fn oversized_window_is_clamped() {
        let filter = SmoothingFilter::new(&FilterConfig::MovingAverage { window: usize::MAX });
        match filter {
            SmoothingFilter::MovingAverage { window, samples } => {
                assert_eq!(window, MAX_WINDOW);
                assert!(samples.is_empty());
            }
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn nan_alpha_disables_smoothing() {
        let mut filter = SmoothingFilter::new(&FilterConfig::Exponential { alpha: f32::NAN });
        assert!(matches!(filter, SmoothingFilter::PassThrough));
        filter.push(Vec3::splat(100.0));
        assert_eq!(filter.push(Vec3::splat(2.0)), Vec3::splat(2.0));
    }

    #[test]
    fn exponential_smooths_toward_input() {
        let mut filter = SmoothingFilter::new(&FilterConfig::Exponential { alpha: 0.5 });

        assert_eq!(filter.push(Vec3::ZERO), Vec3::ZERO);
        assert_eq!(filter.push(Vec3::splat(8.0)), Vec3::splat(4.0));
        assert_eq!(filter.push(Vec3::splat(8.0)), Vec3::splat(6.0));
    }

    #[test]
    fn reset_clears_history() {
        let mut filter = SmoothingFilter::new(&FilterConfig::MovingAverage { window: 4 });
        filter.push(Vec3::splat(100.0));
        filter.push(Vec3::splat(100.0));
        filter.reset();
        assert_eq!(filter.push(Vec3::splat(2.0)), Vec3::splat(2.0));

        let mut filter = SmoothingFilter::new(&FilterConfig::Exponential { alpha: 0.1 });
        filter.push(Vec3::splat(100.0));
        filter.reset();
        assert_eq!(filter.push(Vec3::splat(2.0)), Vec3::splat(2.0));
    }
}
