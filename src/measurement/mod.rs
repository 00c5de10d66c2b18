//! Spectrum measurements.
//!
//! The analyzer reports two kinds of comma-separated lines: a wavelength scale
//! (nanometers, strictly ascending) and intensity samples that line up with it
//! position by position. Both are fixed-length [`SampleVector`]s.

pub mod sample_vector;

pub use sample_vector::{parse_line, SampleVector, SAMPLE_LEN};
