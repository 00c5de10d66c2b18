//! Fixed-length device readings and the line validator.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::SampleError;

/// Number of values in every well-formed scale or sample line.
pub const SAMPLE_LEN: usize = 640;

/// An immutable, cheaply cloned vector of device readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleVector(Arc<[i64]>);

impl SampleVector {
    /// Values as a slice.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// True if every value is greater than the one before it.
    pub fn is_strictly_ascending(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0] < pair[1])
    }
}

impl Deref for SampleVector {
    type Target = [i64];

    fn deref(&self) -> &[i64] {
        &self.0
    }
}

impl From<Vec<i64>> for SampleVector {
    fn from(values: Vec<i64>) -> Self {
        Self(values.into())
    }
}

impl Serialize for SampleVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Parse one raw device line.
///
/// The line is trimmed and split on commas; every token must be a base-10
/// integer and there must be exactly [`SAMPLE_LEN`] of them. With
/// `require_ascending` the values must also be strictly ascending, which is
/// what distinguishes a wavelength scale from an intensity sample.
///
/// # Errors
/// A non-numeric token rejects the line whatever its length. Otherwise the
/// length is checked before the ordering.
pub fn parse_line(line: &str, require_ascending: bool) -> Result<SampleVector, SampleError> {
    let mut values = Vec::with_capacity(SAMPLE_LEN);
    let mut ascending = true;

    for (index, token) in line.trim().split(',').enumerate() {
        let value: i64 = token.parse().map_err(|_| SampleError::InvalidToken {
            index,
            token: token.to_string(),
        })?;
        if let Some(&previous) = values.last() {
            ascending &= previous < value;
        }
        values.push(value);
    }

    if values.len() != SAMPLE_LEN {
        return Err(SampleError::WrongLength {
            expected: SAMPLE_LEN,
            actual: values.len(),
        });
    }
    if require_ascending && !ascending {
        return Err(SampleError::NotAscending);
    }
    Ok(SampleVector::from(values))
}
