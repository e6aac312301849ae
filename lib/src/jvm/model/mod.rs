//! Methods and fields under construction
//!
//! Builders keep everything in terms of names, types, and instruction handles so that they can
//! be freely edited. Finishing a builder resolves it against a constants pool into a snapshot
//! that only refers to constant indices and byte positions:
//!
//!   - __Method__ is built using [`MethodBuilder`] and finished into a [`Method`]
//!   - __Field__ is built using [`FieldBuilder`] and finished into a [`Field`]

mod field;
mod method;

pub use field::*;
pub use method::*;
