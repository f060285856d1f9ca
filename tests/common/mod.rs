//! Shared fakes for the pipeline integration tests.
#![allow(dead_code)]

use image::{Rgb, RgbImage};
use panorama_stitcher::core::discovery::{DiscoveryResult, ImageDiscovery};
use panorama_stitcher::core::engine::{StitchEngine, StitchOutcome};
use panorama_stitcher::core::image::LoadedImage;
use panorama_stitcher::core::loader::ImageLoader;
use panorama_stitcher::error::{DiscoverError, FailureCode, LoadError};
use panorama_stitcher::events::EventSender;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// `/virtual/img_07.jpg` style paths
pub fn virtual_paths(count: usize) -> Vec<PathBuf> {
    (0..count).map(|i| virtual_path(&format!("img_{:02}", i))).collect()
}

pub fn virtual_path(stem: &str) -> PathBuf {
    PathBuf::from(format!("/virtual/{}.jpg", stem))
}

/// Returns a fixed path list
pub struct StaticDiscovery {
    paths: Vec<PathBuf>,
}

impl StaticDiscovery {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl ImageDiscovery for StaticDiscovery {
    fn discover(
        &self,
        _roots: &[PathBuf],
        _events: &EventSender,
    ) -> Result<DiscoveryResult, DiscoverError> {
        Ok(DiscoveryResult {
            paths: self.paths.clone(),
            errors: Vec::new(),
        })
    }
}

/// Encodes the number in `img_NN` as a single red pixel; `bad_*` fails
#[derive(Default)]
pub struct IdLoader {
    calls: Arc<Mutex<usize>>,
}

impl IdLoader {
    pub fn calls(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

impl ImageLoader for IdLoader {
    fn load(&self, path: &Path) -> Result<LoadedImage, LoadError> {
        *self.calls.lock().unwrap() += 1;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let id = stem
            .strip_prefix("img_")
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| LoadError::Decode {
                path: path.to_path_buf(),
                reason: "not an image".to_string(),
            })?;

        Ok(LoadedImage::new(path, RgbImage::from_pixel(1, 1, Rgb([id, 0, 0]))))
    }
}

/// Row of ids carried by an image (red channel of row 0)
pub fn ids(image: &RgbImage) -> Vec<u8> {
    (0..image.width()).map(|x| image.get_pixel(x, 0)[0]).collect()
}

/// Concatenates its inputs left to right and records every call.
///
/// Fails with `code` whenever the first input starts with one of `fail_on`.
pub struct RecordingEngine {
    fail_on: Vec<u8>,
    code: FailureCode,
    calls: Arc<Mutex<Vec<Vec<Vec<u8>>>>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::failing_on(Vec::new(), FailureCode::HomographyEstimationFailed)
    }

    pub fn failing_on(fail_on: Vec<u8>, code: FailureCode) -> Self {
        Self {
            fail_on,
            code,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every call, as the id rows of its inputs
    pub fn calls(&self) -> Arc<Mutex<Vec<Vec<Vec<u8>>>>> {
        Arc::clone(&self.calls)
    }
}

/// Calls whose inputs are partial panoramas rather than single photos
pub fn merge_calls(calls: &[Vec<Vec<u8>>]) -> Vec<Vec<Vec<u8>>> {
    calls
        .iter()
        .filter(|inputs| inputs.iter().any(|row| row.len() > 1))
        .cloned()
        .collect()
}

impl StitchEngine for RecordingEngine {
    fn stitch(&self, images: &[&RgbImage]) -> StitchOutcome {
        let rows: Vec<Vec<u8>> = images.iter().map(|image| ids(image)).collect();
        self.calls.lock().unwrap().push(rows.clone());

        if images.len() < 2 {
            return Err(FailureCode::NeedMoreImages);
        }
        if rows
            .first()
            .and_then(|row| row.first())
            .is_some_and(|id| self.fail_on.contains(id))
        {
            return Err(self.code);
        }

        let joined: Vec<u8> = rows.concat();
        Ok(RgbImage::from_fn(joined.len() as u32, 1, |x, _| {
            Rgb([joined[x as usize], 0, 0])
        }))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Deterministic noise texture
pub fn scene(width: u32, height: u32, seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            noise(x, y, seed),
            noise(x, y, seed ^ 0x55),
            noise(x, y, seed ^ 0xAA),
        ])
    })
}

fn noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed;
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h >> 24) as u8
}
