//! Shelfnorm Core
//!
//! Platform-agnostic core types, traits, and error handling for Shelfnorm.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Audio Types**: `AudioBuffer` (planar f64 channels), `SampleRate`
//! - **Collaborator Traits**: `LoudnessMeter`, `LoudnessNormalization`,
//!   `AudioSource`, `AudioSink`
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use shelfnorm_core::{AudioBuffer, SampleRate};
//!
//! let buffer = AudioBuffer::new(
//!     vec![vec![0.0, 0.5, -0.5], vec![0.0, 0.25, -0.25]],
//!     SampleRate::DVD_QUALITY,
//! )
//! .unwrap();
//!
//! assert_eq!(buffer.channel_count(), 2);
//! assert_eq!(buffer.frames(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{AudioSink, AudioSource, LoudnessMeter, LoudnessNormalization};
pub use types::{AudioBuffer, SampleRate};
