//! djihud Telemetry
//!
//! Turns the subtitle-style side file DJI aircraft record next to their
//! footage into a time-indexed model:
//! - **Parser:** numbered cues with `HH:MM:SS,mmm --> HH:MM:SS,mmm` ranges
//!   and firmware-dependent metadata tokens
//! - **Frame:** one parsed cue
//! - **Track:** the immutable, ordered frame sequence with interpolated
//!   sampling and cached flight summary metrics
//!
//! Timecodes are held as integer milliseconds so long tracks never drift.

pub mod frame;
pub mod geo;
pub mod parser;
pub mod timecode;
pub mod track;

pub use frame::*;
pub use parser::*;
pub use track::*;
