//! Extension and hidden-file filtering for discovery.

use std::collections::HashSet;
use std::path::Path;

/// Extensions accepted when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff"];

/// Decides which files are candidate source photos
pub struct ImageFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl ImageFilter {
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include dot-files
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Replace the accepted extensions (case-insensitive, without the dot)
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with('.'))
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && Self::is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_camera_formats() {
        let filter = ImageFilter::new();
        assert!(filter.should_include(Path::new("/shots/IMG_0001.JPG")));
        assert!(filter.should_include(Path::new("/shots/pano_02.png")));
        assert!(filter.should_include(Path::new("/shots/scan.tiff")));
    }

    #[test]
    fn excludes_non_images() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/shots/notes.txt")));
        assert!(!filter.should_include(Path::new("/shots/clip.mp4")));
        assert!(!filter.should_include(Path::new("/shots/no_extension")));
    }

    #[test]
    fn hidden_files_are_opt_in() {
        let path = Path::new("/shots/.thumb.jpg");
        assert!(!ImageFilter::new().should_include(path));
        assert!(ImageFilter::new().with_hidden(true).should_include(path));
    }

    #[test]
    fn custom_extensions_replace_defaults() {
        let filter = ImageFilter::new().with_extensions(&[".JPG".to_string()]);
        assert!(filter.should_include(Path::new("/shots/a.jpg")));
        assert!(!filter.should_include(Path::new("/shots/a.png")));
    }
}
