//! Shelving EQ
//!
//! - **shelf**: closed-form RBJ low/high shelf design into normalized
//!   second-order sections
//! - **cascade**: per-channel stateful filtering through a cascade of sections

mod cascade;
mod shelf;

pub use cascade::{apply, filter_buffer, SectionCascadeFilter};
pub use shelf::{design, validate, FilterKind, FilterSpec, SosCoefficients, BUTTERWORTH_Q};
