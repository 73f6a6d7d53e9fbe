//! # Events Module
//!
//! Progress and diagnostic reporting for whatever front end drives the
//! library (GUI, CLI, tests).
//!
//! ## Design
//! The core emits events through channels; per-item failures travel here
//! instead of unwinding the batch that produced them.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Progress(p) = event {
//!             println!("{:?}: {}/{}", p.batch, p.completed, p.total);
//!         }
//!     }
//! });
//!
//! let library = Library::builder(root).events(sender).open()?;
//! library.reconcile("All")?;
//! ```

mod channel;
mod progress;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use progress::{progress_increment, ProgressMonitor};
pub use types::*;
