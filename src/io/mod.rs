//! Audio I/O modules
//!
//! Audio decoding using Symphonia and the mono signal type the pipeline
//! consumes.

pub mod decoder;
pub mod signal;
