//! Onset detection and note segmentation
//!
//! - Energy envelope thresholding with an adaptive threshold
//! - Two-state hysteresis gate committing note onsets
//! - Segmentation into note boundaries
//! - Energy flux onset-strength envelope (tempo input)

pub mod energy_flux;
pub mod gate;
pub mod segmenter;
pub mod threshold;
