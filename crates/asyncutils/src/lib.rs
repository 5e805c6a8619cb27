//! Small async stream adapters.
//!
//! Only the things that more than one crate in the workspace needs, and that
//! [`futures`] doesn't already ship, end up here.

mod rechunk;

pub use crate::rechunk::Rechunk;
