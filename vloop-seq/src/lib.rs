//! # vloop sequencer (vloop-seq)
//!
//! Drives a list of embedded video players through a looping playlist:
//! resolve each entry's URL, play it the configured number of times, pause,
//! advance, and wrap around, optionally gated by daily schedule windows.
//!
//! The player runtime sits behind the [`player::PlayerAdapter`] trait. The
//! binary uses the simulated adapter and a line-oriented console.

pub mod config;
pub mod console;
pub mod error;
pub mod playback;
pub mod player;
pub mod schedule;
pub mod url_resolver;

pub use error::{Error, Result};
