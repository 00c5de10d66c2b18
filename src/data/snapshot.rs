//! Last-known-good scale and sample.
//!
//! The session is the only writer. Readers take a short read lock and leave with
//! a clone of the shared vectors, so a later update never changes data already
//! handed out. Each write replaces a whole vector; nothing is mutated in place.

use std::sync::{Arc, PoisonError, RwLock};

use crate::measurement::SampleVector;

/// Both published vectors, read under one lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// The wavelength scale, if one has been captured.
    pub wavelengths: Option<SampleVector>,
    /// The latest intensity sample, if one has been captured.
    pub intensities: Option<SampleVector>,
}

/// Thread-safe holder of the published [`Snapshot`].
///
/// Only the vectors live under this lock; the device connection has its own,
/// held by the session.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Snapshot>>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current wavelength scale.
    pub fn wavelengths(&self) -> Option<SampleVector> {
        self.read().wavelengths.clone()
    }

    /// The latest intensity sample.
    pub fn intensities(&self) -> Option<SampleVector> {
        self.read().intensities.clone()
    }

    /// Both vectors as of one instant.
    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    /// Replace the wavelength scale. Returns true if one was already published.
    pub fn publish_wavelengths(&self, scale: SampleVector) -> bool {
        self.write(|snapshot| snapshot.wavelengths.replace(scale).is_some())
    }

    /// Replace the intensity sample. Returns true if one was already published.
    pub fn publish_intensities(&self, sample: SampleVector) -> bool {
        self.write(|snapshot| snapshot.intensities.replace(sample).is_some())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        // writers only assign, so a poisoned value is still consistent
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write<R>(&self, update: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_reports_absent() {
        let store = SnapshotStore::new();
        assert!(store.wavelengths().is_none());
        assert!(store.intensities().is_none());
        assert_eq!(store.snapshot(), Snapshot::default());
    }

    #[test]
    fn test_reads_are_idempotent() {
        let store = SnapshotStore::new();
        store.publish_wavelengths(SampleVector::from(vec![1, 2, 3]));
        assert_eq!(store.wavelengths(), store.wavelengths());
        assert_eq!(store.intensities(), None);
    }

    #[test]
    fn test_publish_replaces_and_reports_previous() {
        let store = SnapshotStore::new();
        assert!(!store.publish_intensities(SampleVector::from(vec![5, 1])));
        let handed_out = store.intensities().expect("sample");

        assert!(store.publish_intensities(SampleVector::from(vec![7, 2])));
        assert_eq!(handed_out.as_slice(), &[5, 1]);
        assert_eq!(store.intensities().expect("sample").as_slice(), &[7, 2]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = SnapshotStore::new();
        let reader = store.clone();
        store.publish_wavelengths(SampleVector::from(vec![400, 401]));
        assert_eq!(
            reader.snapshot().wavelengths,
            Some(SampleVector::from(vec![400, 401]))
        );
    }

    #[test]
    fn test_concurrent_readers_see_whole_vectors() {
        let store = SnapshotStore::new();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if let Some(sample) = store.intensities() {
                            assert_eq!(sample.len(), 8);
                            assert!(sample.iter().all(|v| *v == sample[0]));
                        }
                    }
                })
            })
            .collect();
        for round in 0..1000 {
            store.publish_intensities(SampleVector::from(vec![round; 8]));
        }
        for reader in readers {
            reader.join().expect("reader");
        }
    }
}
