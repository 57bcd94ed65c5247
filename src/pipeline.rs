//! Per-station pipeline orchestration (§2 data flow).
//!
//! [`StationPipeline`] is a thin convenience wrapper that wires one
//! [`RealtimeShindoFilter`] + one [`BleedingDelayLine`] (JMA intensity) and
//! one [`RealtimeLPGMCalculator`] + one `BleedingDelayLine` (long-period
//! indicator) together for a single station, the same way a file reader
//! orchestrates its own parse and render stages as one owning struct. It
//! adds no DSP semantics beyond what §4 already covers.

use crate::bleeding::BleedingDelayLine;
use crate::lpgm::RealtimeLPGMCalculator;
use crate::shindo::{self, RealtimeShindoFilter, STARTUP_GUARD_SAMPLES};
use crate::vector::Vec3;

/// Trailing window, in seconds, over which both bleeding delay lines damp
/// their respective statistics (§4.6: "K ~= 0.3s of samples, D ~= 60s").
const BLEED_WINDOW_SECONDS: f64 = 60.0;
/// Exceedance duration, in seconds, used for the Shindo magnitude bleed.
const INTENSITY_BLEED_SECONDS: f64 = 0.3;

/// One call to [`StationPipeline::update`]'s worth of derived output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOutput {
    /// The Shindo cascade's filtered acceleration (all three components).
    pub filtered_acceleration: Vec3,
    /// JMA seismic intensity scalar, or `f64::NEG_INFINITY` before the
    /// caller-enforced startup guard (`samples_seen < 70`, see
    /// [`STARTUP_GUARD_SAMPLES`]) has elapsed.
    pub intensity: f64,
    /// Cumulative ground velocity from the LPGM prefilter's trapezoidal
    /// integration.
    pub velocity: Vec3,
    /// Per-oscillator spectral velocity of absolute acceleration.
    pub sva: [f64; 32],
    /// `max(sva)` for this sample alone.
    pub max_sva: f64,
    /// The long-period ground motion indicator: the bleeding-delay-line
    /// peak-over-window statistic applied to `max_sva`.
    pub long_period_indicator: f64,
}

/// One station's full real-time pipeline: Shindo intensity on one branch,
/// long-period ground motion on the other, both fed from the same
/// 3-component acceleration stream.
pub struct StationPipeline {
    shindo_filter: RealtimeShindoFilter<Vec3>,
    intensity_bleed: BleedingDelayLine<f64>,
    lpgm: RealtimeLPGMCalculator,
    sva_bleed: BleedingDelayLine<f64>,
    samples_seen: usize,
}

impl StationPipeline {
    /// Build a pipeline for a station sampled at `sample_rate_hz`, using
    /// the default seismological Shindo parameters and LPGM damping.
    pub fn new(sample_rate_hz: f64) -> Self {
        assert!(sample_rate_hz > 0.0, "sample_rate_hz must be positive");

        let delta_t = 1.0 / sample_rate_hz;
        let shindo_filter = RealtimeShindoFilter::new(delta_t);

        let duration = ((BLEED_WINDOW_SECONDS * sample_rate_hz).round() as usize).max(1);
        let intensity_bleeding = ((INTENSITY_BLEED_SECONDS * sample_rate_hz).round() as usize).clamp(1, duration);
        let intensity_bleed = BleedingDelayLine::new(duration, intensity_bleeding, 0.0);

        let lpgm = RealtimeLPGMCalculator::with_default_damping(sample_rate_hz);
        let sva_bleed = BleedingDelayLine::new(duration, 1, 0.0);

        Self { shindo_filter, intensity_bleed, lpgm, sva_bleed, samples_seen: 0 }
    }

    /// Feed one 3-component acceleration sample (NS, EW, UD, in m/s^2)
    /// through both branches of the pipeline.
    pub fn update(&mut self, acceleration: Vec3) -> PipelineOutput {
        self.samples_seen += 1;

        let filtered = self.shindo_filter.update(acceleration);
        let magnitude = ((filtered.x as f64).powi(2) + (filtered.y as f64).powi(2) + (filtered.z as f64).powi(2)).sqrt();
        self.intensity_bleed.add(shindo::to_gal(magnitude));

        let intensity = if self.samples_seen >= STARTUP_GUARD_SAMPLES {
            shindo::intensity_from_magnitude(self.intensity_bleed.computed_value())
        } else {
            f64::NEG_INFINITY
        };

        self.lpgm.update(acceleration);
        self.sva_bleed.add(self.lpgm.max_sva());

        PipelineOutput {
            filtered_acceleration: filtered,
            intensity,
            velocity: self.lpgm.velocity(),
            sva: *self.lpgm.sva(),
            max_sva: self.lpgm.max_sva(),
            long_period_indicator: self.sva_bleed.computed_value(),
        }
    }

    /// Number of samples fed into the pipeline so far.
    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }
}
