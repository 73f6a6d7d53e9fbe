//! # Imaging Module
//!
//! Pixel-level work: decoding, orientation, downsampling and the date stamp.

mod decode;
mod orient;
mod resize;
mod stamp;

pub use decode::FastDecoder;
pub use orient::{apply_orientation, rotate_pixels};
pub use resize::{fit_within, FastResizer};
pub use stamp::{contrast_color, draw_text, mean_luminance, stamp_date, SAMPLE_REGION};
