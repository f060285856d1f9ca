//! # Events Module
//!
//! Progress reporting for the stitching pipeline.
//!
//! The pipeline emits events through a channel so a front end (the CLI
//! progress bar, a JSON log, a GUI) can follow it without the core knowing
//! who is listening.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Stitch(StitchEvent::BatchFailed { batch, code, .. }) = event {
//!             eprintln!("batch {batch} failed: {code}");
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender);
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
