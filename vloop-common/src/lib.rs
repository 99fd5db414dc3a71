//! # vloop Common Library
//!
//! Shared code for the vloop crates including:
//! - Error types
//! - Event types (VloopEvent enum) and the EventBus
//! - Configuration file resolution
//! - Time-of-day helpers and the Clock abstraction
//! - Identifier utilities

pub mod config;
pub mod error;
pub mod events;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use time::{Clock, FixedClock, SystemClock};
