/// Domain types for Shelfnorm
mod audio;

pub use audio::{AudioBuffer, SampleRate};
