//! Parallel load stage.

use super::pool::WorkerPool;
use crate::core::image::LoadedImage;
use crate::core::loader::{ImageLoader, SortOrder};
use crate::events::{Event, EventSender, LoadEvent, LoadProgress};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A path that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// What the load stage hands to the partitioner
#[derive(Debug, Default)]
pub struct LoadStageOutput {
    /// Successfully loaded images, sorted
    pub images: Vec<LoadedImage>,
    /// Paths that failed, in path order
    pub failures: Vec<LoadFailure>,
}

/// Fans image loads out across the worker pool
pub struct LoadStage<'a> {
    loader: &'a dyn ImageLoader,
    pool: &'a WorkerPool,
    sort_order: SortOrder,
}

impl<'a> LoadStage<'a> {
    pub fn new(loader: &'a dyn ImageLoader, pool: &'a WorkerPool, sort_order: SortOrder) -> Self {
        Self {
            loader,
            pool,
            sort_order,
        }
    }

    /// Load every path; failures are reported and skipped, never fatal.
    pub fn run(&self, paths: Vec<PathBuf>, events: &EventSender) -> LoadStageOutput {
        let total = paths.len();
        events.send(Event::Load(LoadEvent::Started {
            total_images: total,
        }));

        let completed = AtomicUsize::new(0);
        let results = self.pool.map(paths, |path| {
            let result = self.loader.load(&path);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;

            let outcome = match result {
                Ok(image) => Ok(image),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping image: {}", e);
                    events.send(Event::Load(LoadEvent::Failed {
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                    Err(LoadFailure {
                        path: e.path().clone(),
                        reason: e.to_string(),
                    })
                }
            };

            events.send(Event::Load(LoadEvent::Progress(LoadProgress {
                completed: done,
                total,
                current_path: path,
            })));
            outcome
        });

        let mut output = LoadStageOutput::default();
        for result in results {
            match result {
                Ok(image) => output.images.push(image),
                Err(failure) => output.failures.push(failure),
            }
        }

        // Completion order must not leak into batch order
        let order = self.sort_order;
        output.images.sort_by(|a, b| order.compare(a, b));
        output.failures.sort_by(|a, b| a.path.cmp(&b.path));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::events::{null_sender, EventChannel};
    use image::RgbImage;
    use std::path::Path;

    /// Loads any path whose file name does not start with "bad"
    struct NameLoader;

    impl ImageLoader for NameLoader {
        fn load(&self, path: &Path) -> Result<LoadedImage, LoadError> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("bad") {
                return Err(LoadError::Decode {
                    path: path.to_path_buf(),
                    reason: "corrupt".to_string(),
                });
            }
            Ok(LoadedImage::new(path, RgbImage::new(2, 2)))
        }
    }

    fn run(paths: &[&str]) -> LoadStageOutput {
        let pool = WorkerPool::new(3).unwrap();
        LoadStage::new(&NameLoader, &pool, SortOrder::FileName).run(
            paths.iter().map(PathBuf::from).collect(),
            &null_sender(),
        )
    }

    #[test]
    fn invalid_path_is_reported_separately() {
        let output = run(&["/shots/c.jpg", "/shots/bad_b.jpg", "/shots/a.jpg"]);

        let loaded: Vec<_> = output.images.iter().map(|i| i.path.clone()).collect();
        assert_eq!(
            loaded,
            vec![PathBuf::from("/shots/a.jpg"), PathBuf::from("/shots/c.jpg")]
        );
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].path, PathBuf::from("/shots/bad_b.jpg"));
        assert!(output.failures[0].reason.contains("corrupt"));
    }

    #[test]
    fn output_is_sorted_regardless_of_input_order() {
        let names: Vec<String> = (0..30).rev().map(|i| format!("/shots/{:02}.jpg", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let output = run(&refs);
        let paths: Vec<_> = output.images.iter().map(|i| i.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();

        assert_eq!(paths.len(), 30);
        assert_eq!(paths, sorted);
    }

    #[test]
    fn every_failure_is_announced() {
        let pool = WorkerPool::new(2).unwrap();
        let (sender, receiver) = EventChannel::new();

        LoadStage::new(&NameLoader, &pool, SortOrder::FileName).run(
            vec![PathBuf::from("/shots/bad_1.jpg"), PathBuf::from("/shots/ok.jpg")],
            &sender,
        );
        drop(sender);

        let failed: Vec<_> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Load(LoadEvent::Failed { path, .. }) => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(failed, vec![PathBuf::from("/shots/bad_1.jpg")]);
    }
}
