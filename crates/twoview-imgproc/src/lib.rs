#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// panorama composition module.
pub mod compose;

/// Error types for the image processing module.
pub mod error;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallization utilities.
pub mod parallel;

/// image geometric transforms module.
pub mod warp;

pub use crate::compose::{compose_panorama, BlendMode, CanvasExtent, ComposeParams, Panorama};
pub use crate::error::ComposeError;
