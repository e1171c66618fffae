//! Thread-safe projector handle
//!
//! Every mutating call holds the write lock for its whole duration, so adds
//! and iterations from different threads never interleave.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::point::DataPoint;
use crate::projection::ProjectionMethod;
use crate::projector::Projector;

#[derive(Debug, Clone)]
pub struct SharedProjector {
    inner: Arc<RwLock<Projector>>,
}

impl SharedProjector {
    pub fn new(projector: Projector) -> Self {
        Self {
            inner: Arc::new(RwLock::new(projector)),
        }
    }

    pub fn add_datapoint(&self, vector: impl Into<DataPoint>) -> Result<bool> {
        self.inner.write().add_datapoint(vector)
    }

    pub fn iterate(&self, times: usize) -> Result<f64> {
        self.inner.write().iterate(times)
    }

    pub fn set_method(&self, method: ProjectionMethod) -> Result<()> {
        self.inner.write().set_method(method)
    }

    /// Snapshot of the projected coordinates.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.inner.read().coordinates()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn error(&self) -> f64 {
        self.inner.read().error()
    }

    /// Run `f` with shared access.
    pub fn with_read<T>(&self, f: impl FnOnce(&Projector) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access.
    pub fn with_write<T>(&self, f: impl FnOnce(&mut Projector) -> T) -> T {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectorConfig;
    use std::thread;

    #[test]
    fn concurrent_adds_and_iterations() {
        let config = ProjectorConfig {
            method: ProjectionMethod::Sammon,
            tolerance: -1.0,
            seed: Some(7),
            ..ProjectorConfig::default()
        };
        let shared = SharedProjector::new(Projector::new(2, config).unwrap());

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let handle = shared.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        handle.add_datapoint([t as f64, i as f64]).unwrap();
                        handle.iterate(1).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(shared.len(), 40);
        assert_eq!(shared.coordinates().len(), 40);
        shared.with_read(|p| assert_eq!(p.upstairs().len(), p.downstairs().len()));
        assert!(shared.iterate(3).unwrap().is_finite());
    }

    #[test]
    fn with_write_exposes_projector() {
        let shared = SharedProjector::new(Projector::new(3, ProjectorConfig::default()).unwrap());
        shared.with_write(|p| p.add_datapoint([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(shared.len(), 1);
        assert!(!shared.is_empty());
    }
}
