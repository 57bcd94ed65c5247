//! Realtime JMA Shindo filter (§4.4).
//!
//! A fixed six-section biquad cascade approximating the JMA seismic-intensity
//! weighting curve, plus the magnitude-to-intensity conversion applied
//! outside the filter once a [`BleedingDelayLine`](crate::bleeding::BleedingDelayLine)
//! has accumulated the rolling magnitude envelope.

use crate::biquad::{BiquadSection, IIRFilterGroup};
use crate::vector::VectorOps;

/// Number of samples a downstream viewer should wait for before trusting
/// the filter's output: an initial-transient guard, not a property of the
/// filter itself (see design notes). Library users that want this behavior
/// must apply it themselves against their own sample counter.
pub const STARTUP_GUARD_SAMPLES: usize = 70;

/// Seismological tunables for [`RealtimeShindoFilter`]. `Default` gives the
/// values the JMA weighting curve is defined against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShindoParams {
    pub f0: f64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub f4: f64,
    pub f5: f64,
    pub h2a: f64,
    pub h2b: f64,
    pub h3: f64,
    pub h4: f64,
    pub h5: f64,
    pub gain: f64,
}

impl Default for ShindoParams {
    fn default() -> Self {
        Self {
            f0: 0.45,
            f1: 7.0,
            f2: 0.5,
            f3: 12.0,
            f4: 20.0,
            f5: 30.0,
            h2a: 1.0,
            h2b: 0.75,
            h3: 0.6,
            h4: 0.6,
            h5: 0.6,
            gain: 1.262,
        }
    }
}

fn section_1_2(dt: f64, w0: f64, w1: f64) -> (BiquadSection, BiquadSection) {
    let dt2 = dt * dt;

    let s1 = BiquadSection::new(
        8.0 / dt2 + w0 * w1,
        (4.0 * w0 + 2.0 * w1) / dt,
        2.0 * w0 * w1 - 16.0 / dt2,
        4.0 / dt2,
        2.0 * w1 / dt,
        -8.0 / dt2,
    );

    let w1sq = w1 * w1;
    let s2 = BiquadSection::new(
        16.0 / dt2 + w1sq,
        17.0 * w1 / dt,
        2.0 * w1sq - 32.0 / dt2,
        4.0 / dt2 + w1sq,
        8.5 * w1 / dt,
        2.0 * w1sq - 8.0 / dt2,
    );

    (s1, s2)
}

fn section_3(dt: f64, w2: f64, h2a: f64, h2b: f64) -> BiquadSection {
    let dt2 = dt * dt;
    let w2sq = w2 * w2;
    BiquadSection::new(
        12.0 / dt2 + w2sq,
        12.0 * h2b * w2 / dt,
        10.0 * w2sq - 24.0 / dt2,
        12.0 / dt2 + w2sq,
        12.0 * h2a * w2 / dt,
        10.0 * w2sq - 24.0 / dt2,
    )
}

/// Sections 4-6 share one formula, parameterized by their own corner
/// frequency and damping-like constant.
fn high_frequency_rolloff_section(dt: f64, w: f64, h: f64) -> BiquadSection {
    let dt2 = dt * dt;
    let wsq = w * w;
    BiquadSection::new(12.0 / dt2 + wsq, 12.0 * h * w / dt, 10.0 * wsq - 24.0 / dt2, wsq, 0.0, 10.0 * wsq)
}

fn build_sections(delta_t: f64, p: &ShindoParams) -> Vec<BiquadSection> {
    let w = |f: f64| 2.0 * std::f64::consts::PI * f;
    let (s1, s2) = section_1_2(delta_t, w(p.f0), w(p.f1));
    let s3 = section_3(delta_t, w(p.f2), p.h2a, p.h2b);
    let s4 = high_frequency_rolloff_section(delta_t, w(p.f3), p.h3);
    let s5 = high_frequency_rolloff_section(delta_t, w(p.f4), p.h4);
    let s6 = high_frequency_rolloff_section(delta_t, w(p.f5), p.h5);
    vec![s1, s2, s3, s4, s5, s6]
}

/// The JMA-weighting biquad cascade, ready to filter a stream of
/// acceleration samples (scalar magnitude or a 3-component vector).
#[derive(Debug, Clone)]
pub struct RealtimeShindoFilter<T: VectorOps> {
    cascade: IIRFilterGroup<T>,
}

impl<T: VectorOps> RealtimeShindoFilter<T> {
    /// Build the filter for a sampling period `delta_t` (seconds) using the
    /// default seismological parameters.
    pub fn new(delta_t: f64) -> Self {
        Self::with_params(delta_t, ShindoParams::default())
    }

    /// Build the filter with caller-supplied seismological parameters.
    pub fn with_params(delta_t: f64, params: ShindoParams) -> Self {
        assert!(delta_t > 0.0, "delta_t must be positive");
        let sections = build_sections(delta_t, &params);
        let cascade = IIRFilterGroup::new(sections, params.gain);
        Self { cascade }
    }

    /// Feed one sample through the six-section cascade.
    pub fn update(&mut self, x: T) -> T {
        self.cascade.update(x)
    }
}

/// Convert the bleeding-delay-line magnitude statistic (in gal) to a JMA
/// intensity scalar: `I = 2*log10(v*) + 0.94`.
///
/// `v_star <= 0` has no seismological meaning (intensity is only defined for
/// a positive magnitude envelope) and returns `f64::NEG_INFINITY`, matching
/// the mathematical limit of `log10` rather than panicking on live data.
pub fn intensity_from_magnitude(v_star_gal: f64) -> f64 {
    if v_star_gal <= 0.0 {
        return f64::NEG_INFINITY;
    }
    2.0 * v_star_gal.log10() + 0.94
}

/// Convert an acceleration magnitude in m/s^2 to gal (cm/s^2), the unit the
/// JMA intensity formula is defined against.
pub fn to_gal(meters_per_second_squared: f64) -> f64 {
    meters_per_second_squared * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_has_six_sections() {
        let filter = RealtimeShindoFilter::<f64>::new(0.01);
        assert_eq!(filter.cascade.len(), 6);
    }

    #[test]
    fn intensity_matches_known_point() {
        // v* = 1 gal => log10(1) = 0 => I = 0.94.
        assert!((intensity_from_magnitude(1.0) - 0.94).abs() < 1e-12);
        // v* = 10 gal => log10(10) = 1 => I = 2.94.
        assert!((intensity_from_magnitude(10.0) - 2.94).abs() < 1e-12);
    }

    #[test]
    fn non_positive_magnitude_is_negative_infinity() {
        assert_eq!(intensity_from_magnitude(0.0), f64::NEG_INFINITY);
        assert_eq!(intensity_from_magnitude(-5.0), f64::NEG_INFINITY);
    }

    #[test]
    fn gal_conversion_scales_by_one_hundred() {
        assert_eq!(to_gal(0.01), 1.0);
    }

    #[test]
    fn filter_responds_to_a_sustained_input() {
        let mut filter = RealtimeShindoFilter::<f64>::new(0.01);
        let mut last = 0.0;
        for _ in 0..STARTUP_GUARD_SAMPLES {
            last = filter.update(1.0);
        }
        assert!(last.is_finite());
    }
}
