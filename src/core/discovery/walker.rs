//! Directory walking with walkdir.

use super::{filter::ImageFilter, DiscoveryResult, ImageDiscovery};
use crate::error::DiscoverError;
use crate::events::{DiscoverEvent, Event, EventSender};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for input discovery
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth; `Some(1)` lists a directory without recursing
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: Some(1),
            extensions: None,
        }
    }
}

/// Discovery over directories (and individual files) on disk
pub struct WalkDirDiscovery {
    config: DiscoveryConfig,
    filter: ImageFilter,
}

impl WalkDirDiscovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self { config, filter }
    }

    fn walk_root(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<PathBuf>, Vec<DiscoverError>), DiscoverError> {
        if !root.exists() {
            return Err(DiscoverError::NotFound {
                path: root.to_path_buf(),
            });
        }

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            .filter_entry(|e| include_hidden || e.depth() == 0 || !ImageFilter::is_hidden(e.path()));

        let mut paths = Vec::new();
        let mut errors = Vec::new();

        for entry in entries {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() && !entry.path().is_file() {
                        continue;
                    }
                    if !self.filter.should_include(entry.path()) {
                        continue;
                    }
                    events.send(Event::Discover(DiscoverEvent::ImageFound {
                        path: entry.path().to_path_buf(),
                    }));
                    paths.push(entry.into_path());
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let permission_denied = e
                        .io_error()
                        .is_some_and(|io| io.kind() == std::io::ErrorKind::PermissionDenied);

                    let error = if permission_denied {
                        DiscoverError::PermissionDenied { path: path.clone() }
                    } else {
                        DiscoverError::ReadEntry {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    tracing::warn!(path = %path.display(), "{}", error);
                    events.send(Event::Discover(DiscoverEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok((paths, errors))
    }
}

impl ImageDiscovery for WalkDirDiscovery {
    fn discover(
        &self,
        roots: &[PathBuf],
        events: &EventSender,
    ) -> Result<DiscoveryResult, DiscoverError> {
        events.send(Event::Discover(DiscoverEvent::Started {
            roots: roots.to_vec(),
        }));

        let mut paths = Vec::new();
        let mut errors = Vec::new();

        for root in roots {
            match self.walk_root(root, events) {
                Ok((found, root_errors)) => {
                    paths.extend(found);
                    errors.extend(root_errors);
                }
                Err(e) => {
                    tracing::warn!(root = %root.display(), "{}", e);
                    events.send(Event::Discover(DiscoverEvent::Error {
                        path: root.clone(),
                        message: e.to_string(),
                    }));
                    errors.push(e);
                }
            }
        }

        paths.sort();
        paths.dedup();

        events.send(Event::Discover(DiscoverEvent::Completed {
            total_images: paths.len(),
        }));

        Ok(DiscoveryResult { paths, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    fn discover(config: DiscoveryConfig, roots: &[PathBuf]) -> DiscoveryResult {
        WalkDirDiscovery::new(config)
            .discover(roots, &null_sender())
            .unwrap()
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let result = discover(DiscoveryConfig::default(), &[dir.path().to_path_buf()]);

        assert!(result.paths.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn results_are_sorted_by_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "c.jpg");
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.png");
        touch(dir.path(), "readme.txt");

        let result = discover(DiscoveryConfig::default(), &[dir.path().to_path_buf()]);
        let names: Vec<_> = result
            .paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, ["a.jpg", "b.png", "c.jpg"]);
    }

    #[test]
    fn does_not_recurse_by_default() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        touch(dir.path(), "top.jpg");
        touch(&nested, "deep.jpg");

        let shallow = discover(DiscoveryConfig::default(), &[dir.path().to_path_buf()]);
        assert_eq!(shallow.paths.len(), 1);

        let recursive = discover(
            DiscoveryConfig {
                max_depth: None,
                ..Default::default()
            },
            &[dir.path().to_path_buf()],
        );
        assert_eq!(recursive.paths.len(), 2);
    }

    #[test]
    fn hidden_files_are_skipped_by_default() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "visible.jpg");
        touch(dir.path(), ".hidden.jpg");

        let result = discover(DiscoveryConfig::default(), &[dir.path().to_path_buf()]);
        assert_eq!(result.paths.len(), 1);
        assert!(result.paths[0].ends_with("visible.jpg"));
    }

    #[test]
    fn a_root_may_be_a_single_file() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "one.jpg");

        let result = discover(DiscoveryConfig::default(), &[file.clone(), file.clone()]);
        assert_eq!(result.paths, vec![file]);
    }

    #[test]
    fn missing_root_is_recorded_not_fatal() {
        let result = discover(
            DiscoveryConfig::default(),
            &[PathBuf::from("/nonexistent/pano/input")],
        );

        assert!(result.paths.is_empty());
        assert!(matches!(
            result.errors.as_slice(),
            [DiscoverError::NotFound { .. }]
        ));
    }
}
