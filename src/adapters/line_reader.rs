//! Newline framing over a polled byte stream.

use std::io::{BufRead, BufReader, ErrorKind, Read};

use super::LineSource;
use crate::error::{DeviceError, DeviceResult};

/// Splits a blocking reader with a poll timeout into lines.
///
/// A read that times out yields `Ok(None)` and keeps whatever part of the
/// current line has arrived, so slow devices never lose bytes between polls.
pub struct LineReader<R> {
    reader: BufReader<R>,
    /// Bytes of a line whose terminator has not arrived yet.
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    /// Wrap `inner`, buffering up to `capacity` bytes per fill.
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, inner),
            pending: Vec::new(),
        }
    }
}

impl<R: Read + Send + 'static> LineSource for LineReader<R> {
    fn read_line(&mut self) -> DeviceResult<Option<String>> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) => Err(DeviceError::ShortRead),
            Ok(_) if self.pending.last() == Some(&b'\n') => {
                let line = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                Ok(Some(line))
            }
            // EOF in the middle of a line
            Ok(_) => Err(DeviceError::ShortRead),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(DeviceError::Read(e)),
        }
    }
}
