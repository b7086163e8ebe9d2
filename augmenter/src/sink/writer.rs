//! Bounded pool of background writers.
//!
//! Jobs go through a bounded channel to a fixed set of worker threads, so a
//! slow disk blocks submission instead of piling up unbounded writers. Each
//! failure is sent on an error channel and reported by [`WriterPool::finish`].

use std::{
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
};

use burn::tensor::TensorData;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::{
    codec::VolumeCodec,
    error::{AugmentError, AugmentResult},
    volume::SpatialMetadata,
};

/// Sizing of a [`WriterPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterPoolConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Jobs that may wait in the queue before submission blocks.
    pub queue_capacity: usize,
}

impl Default for WriterPoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 16,
        }
    }
}

/// One file to encode.
#[derive(Debug, Clone)]
pub struct WriteJob {
    pub data: TensorData,
    /// Spatial referencing to stamp on the output.
    pub metadata: Option<SpatialMetadata>,
    pub path: PathBuf,
}

/// Fixed-size writer pool.
pub struct WriterPool {
    jobs: Option<Sender<WriteJob>>,
    errors: Receiver<AugmentError>,
    workers: Vec<JoinHandle<usize>>,
}

impl WriterPool {
    /// Spawn the worker threads.
    pub fn new(codec: Arc<dyn VolumeCodec>, config: WriterPoolConfig) -> Self {
        let (job_tx, job_rx) = bounded::<WriteJob>(config.queue_capacity.max(1));
        let (error_tx, error_rx) = unbounded();

        let workers = (0..config.workers.max(1))
            .map(|_| {
                let jobs = job_rx.clone();
                let errors = error_tx.clone();
                let codec = Arc::clone(&codec);
                thread::spawn(move || {
                    let mut written = 0;
                    for job in jobs {
                        match codec.write(&job.data, job.metadata.as_ref(), &job.path) {
                            Ok(()) => {
                                tracing::debug!(path = %job.path.display(), "volume written");
                                written += 1;
                            }
                            Err(e) => {
                                tracing::error!(path = %job.path.display(), error = %e, "write failed");
                                let _ = errors.send(e);
                            }
                        }
                    }
                    written
                })
            })
            .collect();

        Self {
            jobs: Some(job_tx),
            errors: error_rx,
            workers,
        }
    }

    /// Queue a write, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::WriteFailed`] when no worker is left to take
    /// the job.
    pub fn submit(&self, job: WriteJob) -> AugmentResult<()> {
        let Some(jobs) = &self.jobs else {
            return Err(AugmentError::WriteFailed {
                path: job.path,
                reason: "writer pool is closed".into(),
            });
        };
        jobs.send(job).map_err(|e| AugmentError::WriteFailed {
            path: e.into_inner().path,
            reason: "writer pool is closed".into(),
        })
    }

    /// Close the queue, wait for every queued write and report the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::WriteFailures`] when at least one write failed
    /// or a worker panicked.
    pub fn finish(mut self) -> AugmentResult<usize> {
        self.jobs.take();

        let mut written = 0;
        let mut failures: Vec<String> = Vec::new();
        for worker in std::mem::take(&mut self.workers) {
            match worker.join() {
                Ok(count) => written += count,
                Err(_) => failures.push("a writer thread panicked".into()),
            }
        }
        failures.extend(self.errors.try_iter().map(|e| e.to_string()));

        match failures.first() {
            None => Ok(written),
            Some(first) => Err(AugmentError::WriteFailures {
                count: failures.len(),
                first: first.clone(),
            }),
        }
    }
}

impl Drop for WriterPool {
    fn drop(&mut self) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Mutex};

    use super::*;

    #[derive(Default)]
    struct RecordingCodec {
        written: Mutex<Vec<(PathBuf, bool)>>,
    }

    impl VolumeCodec for RecordingCodec {
        fn read(&self, path: &Path) -> AugmentResult<crate::codec::DecodedVolume> {
            Err(AugmentError::ReadFailed {
                path: path.to_path_buf(),
                reason: "write-only".into(),
            })
        }

        fn write(&self, _: &TensorData, metadata: Option<&SpatialMetadata>, path: &Path) -> AugmentResult<()> {
            if path.ends_with("fail.nrrd") {
                return Err(AugmentError::WriteFailed {
                    path: path.to_path_buf(),
                    reason: "disk full".into(),
                });
            }
            self.written.lock().unwrap().push((path.to_path_buf(), metadata.is_some()));
            Ok(())
        }
    }

    fn job(name: &str) -> WriteJob {
        WriteJob {
            data: TensorData::new(vec![0.0_f32; 4], [2, 2]),
            metadata: Some(SpatialMetadata::identity(vec![2, 2])),
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn finish_waits_for_every_write() {
        let codec = Arc::new(RecordingCodec::default());
        let pool = WriterPool::new(
            codec.clone(),
            WriterPoolConfig {
                workers: 2,
                queue_capacity: 1,
            },
        );
        for i in 0..10 {
            pool.submit(job(&format!("out/{i}.nrrd"))).unwrap();
        }

        assert_eq!(pool.finish().unwrap(), 10);
        let written = codec.written.lock().unwrap();
        assert_eq!(written.len(), 10);
        assert!(written.iter().all(|(_, with_metadata)| *with_metadata));
    }

    #[test]
    fn failures_are_collected() {
        let codec = Arc::new(RecordingCodec::default());
        let pool = WriterPool::new(codec, WriterPoolConfig::default());
        pool.submit(job("out/ok.nrrd")).unwrap();
        pool.submit(job("out/fail.nrrd")).unwrap();
        pool.submit(job("other/fail.nrrd")).unwrap();

        let err = pool.finish().unwrap_err();
        assert!(matches!(err, AugmentError::WriteFailures { count: 2, .. }));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn zero_sized_configs_still_make_progress() {
        let codec = Arc::new(RecordingCodec::default());
        let pool = WriterPool::new(
            codec,
            WriterPoolConfig {
                workers: 0,
                queue_capacity: 0,
            },
        );
        pool.submit(job("out/a.nrrd")).unwrap();
        assert_eq!(pool.finish().unwrap(), 1);
    }
}
