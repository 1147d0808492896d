//! The dual-mask multi-band blender.
//!
//! A conventional multi-band blender uses one mask per tile both to weight
//! the Laplacian contribution and to accumulate the normalization
//! denominator. This blender decouples the two: a smooth *weight mask*
//! drives the denominator, a sharp *blend mask* drives pixel contribution.
//! Callers that do not need the split simply pass the same mask twice.

mod multiband;
pub use multiband::*;

mod weight;
pub use weight::*;
