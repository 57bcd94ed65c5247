//! Realtime long-period ground motion (LPGM) calculator (§4.5).
//!
//! A bank of 32 independent single-degree-of-freedom oscillators spanning
//! natural periods 1.6 s to 7.8 s, each step-updated by a pair of 2x2
//! transition matrices derived once at construction from the exact
//! (Nigam-Jennings) solution of the SDOF equation of motion under a
//! piecewise-linear ground acceleration input. The horizontal components
//! (NS, EW) are tracked jointly as the two columns of each oscillator's
//! state matrix; the vertical component only passes through the prefilter.

use crate::biquad::{BiquadSection, IIRFilterGroup};
use crate::coefficients::butterworth_highpass_2;
use crate::vector::Vec3;

const OSCILLATOR_COUNT: usize = 32;
const PERIOD_BASE_SECONDS: f64 = 1.6;
const PERIOD_STEP_SECONDS: f64 = 0.2;
const PREFILTER_CUTOFF_HZ: f64 = 0.05;

/// A 2x2 matrix, row-major: `rows[0]` is the displacement-like row,
/// `rows[1]` is the velocity-like row. Columns are the two horizontal
/// components (x = NS, y = EW).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Mat2x2 {
    rows: [[f64; 2]; 2],
}

impl Mat2x2 {
    const fn zero() -> Self {
        Self { rows: [[0.0, 0.0], [0.0, 0.0]] }
    }

    /// `self * other`, both 2x2.
    fn matmul(&self, other: &Mat2x2) -> Mat2x2 {
        let a = &self.rows;
        let b = &other.rows;
        let mut out = Mat2x2::zero();
        for i in 0..2 {
            for j in 0..2 {
                out.rows[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j];
            }
        }
        out
    }

    fn add(&self, other: &Mat2x2) -> Mat2x2 {
        let mut out = Mat2x2::zero();
        for i in 0..2 {
            for j in 0..2 {
                out.rows[i][j] = self.rows[i][j] + other.rows[i][j];
            }
        }
        out
    }
}

/// Precomputed step-update matrices for one oscillator, derived once from
/// its natural period, the shared damping ratio, and the sample interval.
#[derive(Debug, Clone, Copy)]
struct OscillatorMatrices {
    a: Mat2x2,
    b: Mat2x2,
}

/// Exact Nigam-Jennings transition matrices for a damped SDOF oscillator of
/// angular frequency `omega`, damping ratio `zeta`, driven by a
/// piecewise-linear forcing term over step `dt`.
fn oscillator_matrices(omega: f64, zeta: f64, dt: f64) -> OscillatorMatrices {
    let d = (1.0 - zeta * zeta).sqrt();
    let omega_d = omega * d;
    let phi = omega_d * dt;
    let e = (-zeta * omega * dt).exp();
    let s = phi.sin();
    let c = phi.cos();

    let a1 = (zeta / d) * s;
    let a2 = s * e / d;

    let a = Mat2x2 {
        rows: [[e * (a1 + c), a2 / omega], [-a2 * omega, e * (-a1 + c)]],
    };

    let omega2 = omega * omega;

    let c_disp = (1.0 / omega2)
        * (2.0 * zeta / (omega * dt)
            + e * (((1.0 - 2.0 * zeta * zeta) / (omega_d * dt) - zeta / d) * s
                - (1.0 + 2.0 * zeta / (omega * dt)) * c));

    let d_disp = (1.0 / omega2)
        * (1.0 - 2.0 * zeta / (omega * dt)
            + e * ((2.0 * zeta * zeta - 1.0) / (omega_d * dt) * s + (2.0 * zeta / (omega * dt)) * c));

    let c_vel = (1.0 / omega2)
        * (-1.0 / dt + e * ((omega / d + zeta / (dt * d)) * s + c / dt));

    let d_vel = (1.0 - e * (a1 + c)) / (omega2 * dt);

    let b = Mat2x2 {
        rows: [[c_disp, d_disp], [c_vel, d_vel]],
    };

    OscillatorMatrices { a, b }
}

/// A bank of 32 SDOF oscillators tracking spectral velocity of absolute
/// acceleration (SVA) over the long-period band.
#[derive(Debug, Clone)]
pub struct RealtimeLPGMCalculator {
    damping: f64,
    delta_t: f64,
    matrices: Vec<OscillatorMatrices>,
    buffers: Vec<Mat2x2>,
    prefilter: IIRFilterGroup<Vec3>,
    velocity: Vec3,
    filtered_acceleration: Vec3,
    sva: [f64; OSCILLATOR_COUNT],
}

impl RealtimeLPGMCalculator {
    /// Build the oscillator bank for a sample rate (Hz) and common damping
    /// ratio. Panics if `sample_rate <= 0` or `damping` is outside `(0, 1)`:
    /// both are caller errors (§4.5).
    pub fn new(sample_rate: f64, damping: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be positive");
        assert!(damping > 0.0 && damping < 1.0, "damping must be in (0, 1)");

        let delta_t = 1.0 / sample_rate;
        let matrices: Vec<OscillatorMatrices> = (0..OSCILLATOR_COUNT)
            .map(|k| {
                let period = PERIOD_BASE_SECONDS + PERIOD_STEP_SECONDS * k as f64;
                let omega = 2.0 * std::f64::consts::PI / period;
                oscillator_matrices(omega, damping, delta_t)
            })
            .collect();

        let prefilter_coeffs = butterworth_highpass_2(PREFILTER_CUTOFF_HZ, sample_rate);
        let prefilter = IIRFilterGroup::new(vec![BiquadSection::from_array(prefilter_coeffs)], 1.0);

        Self {
            damping,
            delta_t,
            buffers: vec![Mat2x2::zero(); OSCILLATOR_COUNT],
            matrices,
            prefilter,
            velocity: Vec3::default(),
            filtered_acceleration: Vec3::default(),
            sva: [0.0; OSCILLATOR_COUNT],
        }
    }

    /// Construct with the default common damping ratio of 0.05.
    pub fn with_default_damping(sample_rate: f64) -> Self {
        Self::new(sample_rate, 0.05)
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Feed one 3-component acceleration sample (NS, EW, UD) through the
    /// highpass prefilter, integrate velocity, and advance every oscillator.
    pub fn update(&mut self, acceleration: Vec3) {
        let prev_filtered = self.filtered_acceleration;
        let filtered = self.prefilter.update(acceleration);
        self.filtered_acceleration = filtered;

        self.velocity.x += (prev_filtered.x + filtered.x) as f64 * self.delta_t / 2.0;
        self.velocity.y += (prev_filtered.y + filtered.y) as f64 * self.delta_t / 2.0;
        self.velocity.z += (prev_filtered.z + filtered.z) as f64 * self.delta_t / 2.0;

        let m = Mat2x2 {
            rows: [[prev_filtered.x as f64, prev_filtered.y as f64], [filtered.x as f64, filtered.y as f64]],
        };

        for k in 0..OSCILLATOR_COUNT {
            let mats = &self.matrices[k];
            let buf = self.buffers[k];
            let updated = mats.a.matmul(&buf).add(&mats.b.matmul(&m));
            self.buffers[k] = updated;

            let vx = updated.rows[1][0] + self.velocity.x;
            let vy = updated.rows[1][1] + self.velocity.y;
            self.sva[k] = (vx * vx + vy * vy).sqrt();
        }
    }

    /// The prefiltered acceleration from the most recent `update` call.
    pub fn filtered_acceleration(&self) -> Vec3 {
        self.filtered_acceleration
    }

    /// Cumulative ground velocity integrated from the prefiltered
    /// acceleration via the trapezoidal rule.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Per-oscillator spectral velocity of absolute acceleration.
    pub fn sva(&self) -> &[f64; OSCILLATOR_COUNT] {
        &self.sva
    }

    /// The long-period ground motion indicator: the maximum SVA across all
    /// 32 oscillators.
    pub fn max_sva(&self) -> f64 {
        self.sva.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Natural period (seconds) of oscillator `k`.
    pub fn period(k: usize) -> f64 {
        PERIOD_BASE_SECONDS + PERIOD_STEP_SECONDS * k as f64
    }
}
