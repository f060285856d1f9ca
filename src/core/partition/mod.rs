//! # Partition Module
//!
//! Splits the ordered image sequence into overlapping, fixed-size batches
//! that can be stitched independently.
//!
//! ## Windowing
//! Windows start at `0, stride, 2 * stride, ...` where
//! `stride = batch_size - overlap`, and each takes up to `batch_size`
//! images. Adjacent windows therefore share `overlap` images.
//!
//! The last window may be shorter than `batch_size`. A window with a single
//! image cannot be stitched and is dropped, so a lone trailing image is
//! excluded from the panorama. This is kept as-is rather than folded into
//! the previous batch; `dropped_trailing` reports how many images it affects.

use crate::core::image::LoadedImage;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

/// Validated batch size and overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionParams {
    batch_size: usize,
    overlap: usize,
}

impl PartitionParams {
    /// Validate `batch_size >= 2` and `overlap < batch_size`
    pub fn new(batch_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if batch_size < 2 {
            return Err(ConfigError::InvalidBatchSize { value: batch_size });
        }
        if overlap >= batch_size {
            return Err(ConfigError::InvalidOverlap {
                overlap,
                batch_size,
            });
        }
        Ok(Self {
            batch_size,
            overlap,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Step between the start indices of consecutive batches
    pub fn stride(&self) -> usize {
        self.batch_size - self.overlap
    }
}

impl Default for PartitionParams {
    fn default() -> Self {
        Self {
            batch_size: 4,
            overlap: 1,
        }
    }
}

/// Compute the batch windows for a sequence of `len` images.
///
/// Returns no windows when `len < 2`.
pub fn plan(len: usize, params: &PartitionParams) -> Vec<Range<usize>> {
    (0..len)
        .step_by(params.stride())
        .map(|start| start..(start + params.batch_size).min(len))
        .filter(|window| window.len() > 1)
        .collect()
}

/// Number of trailing images that no window covers
pub fn dropped_trailing(len: usize, params: &PartitionParams) -> usize {
    let covered = plan(len, params).last().map(|w| w.end).unwrap_or(0);
    len - covered
}

/// An ordered, overlapping window of loaded images.
///
/// Holds shared references: the overlap images of two neighbouring batches
/// are the same allocation.
#[derive(Debug, Clone)]
pub struct ImageBatch {
    /// Position of this batch in the partition
    pub index: usize,
    /// Index of the first image in the sorted sequence
    pub start: usize,
    /// Images in stitch order
    pub images: Vec<Arc<LoadedImage>>,
}

impl ImageBatch {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Range of sequence indices covered by this batch
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.images.len()
    }

    /// Source paths of the images in this batch
    pub fn paths(&self) -> Vec<PathBuf> {
        self.images.iter().map(|image| image.path().to_path_buf()).collect()
    }
}

/// Build overlapping batches from the ordered image sequence
pub fn partition(images: &[Arc<LoadedImage>], params: &PartitionParams) -> Vec<ImageBatch> {
    plan(images.len(), params)
        .into_iter()
        .enumerate()
        .map(|(index, window)| ImageBatch {
            index,
            start: window.start,
            images: images[window].to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn images(count: usize) -> Vec<Arc<LoadedImage>> {
        (0..count)
            .map(|i| {
                Arc::new(LoadedImage::new(
                    format!("/shots/{:03}.jpg", i),
                    RgbImage::new(1, 1),
                ))
            })
            .collect()
    }

    fn params(batch_size: usize, overlap: usize) -> PartitionParams {
        PartitionParams::new(batch_size, overlap).unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            PartitionParams::new(1, 0),
            Err(ConfigError::InvalidBatchSize { value: 1 })
        );
        assert_eq!(
            PartitionParams::new(4, 4),
            Err(ConfigError::InvalidOverlap {
                overlap: 4,
                batch_size: 4
            })
        );
        assert!(PartitionParams::new(2, 1).is_ok());
    }

    #[test]
    fn ten_images_batch_four_overlap_one() {
        assert_eq!(plan(10, &params(4, 1)), vec![0..4, 3..7, 6..10]);
        assert_eq!(dropped_trailing(10, &params(4, 1)), 0);
    }

    #[test]
    fn fewer_than_two_images_yield_no_batches() {
        assert!(plan(0, &params(4, 1)).is_empty());
        assert!(plan(1, &params(4, 1)).is_empty());
        assert!(partition(&images(1), &params(4, 1)).is_empty());
    }

    #[test]
    fn trailing_single_image_is_dropped() {
        // stride 3: windows at 0, 3, 6; the one at 6 holds a single image
        assert_eq!(plan(7, &params(3, 0)), vec![0..3, 3..6]);
        assert_eq!(dropped_trailing(7, &params(3, 0)), 1);
    }

    #[test]
    fn short_remainder_batch_is_kept() {
        assert_eq!(plan(5, &params(4, 1)), vec![0..4, 3..5]);
    }

    #[test]
    fn batch_lengths_stay_within_bounds() {
        for len in 2..30 {
            for batch_size in 2..7 {
                for overlap in 0..batch_size {
                    let p = params(batch_size, overlap);
                    let windows = plan(len, &p);
                    assert!(!windows.is_empty(), "len={len} p={p:?}");
                    for window in windows {
                        assert!(window.len() >= 2 && window.len() <= batch_size);
                    }
                }
            }
        }
    }

    #[test]
    fn adjacent_batches_share_overlap_by_identity() {
        let source = images(10);
        let batches = partition(&source, &params(4, 1));
        assert_eq!(batches.len(), 3);

        for pair in batches.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            let tail = &left.images[left.len() - 1..];
            let head = &right.images[..1];
            assert!(Arc::ptr_eq(&tail[0], &head[0]));
        }
    }

    #[test]
    fn wider_overlap_is_shared_in_order() {
        let source = images(9);
        let p = params(5, 2);
        let batches = partition(&source, &p);

        for pair in batches.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            if right.len() < p.overlap() {
                continue;
            }
            for k in 0..p.overlap() {
                let a = &left.images[left.len() - p.overlap() + k];
                let b = &right.images[k];
                assert!(Arc::ptr_eq(a, b));
            }
        }
    }

    #[test]
    fn batch_records_its_range() {
        let batches = partition(&images(10), &params(4, 1));
        assert_eq!(batches[1].index, 1);
        assert_eq!(batches[1].range(), 3..7);
        assert!(batches[1].paths()[0].ends_with("003.jpg"));
    }
}
