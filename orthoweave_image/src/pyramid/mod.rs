//! Gaussian/Laplacian pyramid kernels used by the multi-band blender.
//!
//! All operations use the separable 5-tap binomial kernel. Pyramid levels
//! keep the contract that coordinate `(x, y)` at level `i` corresponds to
//! canvas coordinate `(x << i, y << i)` of the buffer they were built from.

mod kernel;
pub use kernel::*;

mod laplacian;
pub use laplacian::*;
