//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - Energy envelopes and shared statistics
//! - Onset detection and note segmentation
//! - Pitch tracking (YIN) and per-note pitch analysis
//! - Period estimation (tempo)
//! - Sustain and timing metrics
//! - Raw-signal descriptors and MFCCs

pub mod descriptors;
pub mod energy;
pub mod mfcc;
pub mod onset;
pub mod period;
pub mod pitch;
pub mod stats;
pub mod sustain;
pub mod timing;
