//! Sparks Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging and error handling for the Sparks audio library.
//!
//! - **Types**: the Rank → Stage → Unit → Track tree and identifier helpers
//! - **Logging**: tracing subscriber setup shared by every binary
//! - **Progress**: per-listener track and unit progress persisted as JSON
//!
//! # Example
//!
//! ```
//! use sparks_common::types::{AudioData, RankId};
//!
//! let data = AudioData::empty();
//! assert!(data.rank(RankId::WingRunner).is_none());
//! ```

pub mod error;
pub mod logging;
pub mod progress;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SparksError};
pub use types::{AudioData, Rank, RankId, Stage, Track, TrackResolution, Unit};
