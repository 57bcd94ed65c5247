//! Real-time seismic signal processing for K-NET/KiK-net strong-motion
//! data: a cascaded biquad IIR filter group, a JMA "Shindo" intensity
//! filter preset, a long-period ground-motion (LPGM) oscillator bank, a
//! "bleeding" order-statistic delay line, and a decoder for the Kyoshin
//! WIN32 binary container that carries raw station waveforms and
//! calibration metadata.
//!
//! The DSP primitives (`biquad`, `shindo`, `lpgm`, `bleeding`) are
//! single-owner, non-thread-safe state machines: each `update`/`add` is a
//! bounded, allocation-free computation with no I/O and no suspension
//! points. Callers that want to process multiple stations concurrently
//! should own one [`pipeline::StationPipeline`] per station.
//!
//! The [`win32`] decoder consumes a complete byte slice and performs no
//! concurrent reads; it surfaces every structural mismatch as a
//! [`error::FormatError`] without attempting to resynchronize.

/// Vector operator capability and concrete scalar/3-component instances.
pub mod vector;

/// Cascaded biquad IIR filter group.
pub mod biquad;

/// Pure IIR coefficient generators (Butterworth highpass, bilinear
/// transform).
pub mod coefficients;

/// Realtime JMA Shindo intensity filter preset.
pub mod shindo;

/// Realtime long-period ground motion (LPGM) oscillator bank.
pub mod lpgm;

/// Bleeding delay line: a FIFO synchronized with an order-statistic index.
pub mod bleeding;

/// `(mantissa, scale)` scaled-number utility.
pub mod scaled_number;

/// WIN32 decoder error type.
pub mod error;

/// Kyoshin WIN32 container decoder.
pub mod win32;

/// Per-station pipeline orchestration convenience type.
pub mod pipeline;

pub use bleeding::BleedingDelayLine;
pub use biquad::{BiquadSection, IIRFilterGroup};
pub use error::FormatError;
pub use lpgm::RealtimeLPGMCalculator;
pub use pipeline::{PipelineOutput, StationPipeline};
pub use scaled_number::ScaledNumber;
pub use shindo::RealtimeShindoFilter;
pub use vector::{Vec3, VectorOps};
pub use win32::{parse_win32, ChannelData, Data, SecondBlock};
