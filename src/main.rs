//! # pano-stitch CLI
//!
//! Command-line interface for the panorama stitcher.
//!
//! ## Usage
//! ```bash
//! pano-stitch stitch "unstitched images" -o finalStitchedOutput.png
//! pano-stitch stitch ~/Trip --batch-size 6 --overlap 2 --output-format json
//! pano-stitch plan ~/Trip
//! ```

mod cli;

use panorama_stitcher::Result;

fn main() -> Result<()> {
    cli::run()
}
