//! Assemble and analyze JVM method bodies
//!
//! The [`jvm`] module has everything needed to build up a method body one instruction at a time:
//! a deduplicating constants pool, typed instructions with their stack effects, a mutable
//! instruction list with branch target bookkeeping, position resolution (including widening of
//! far branches), and the `max_stack`/`max_locals` analyses. Writing the final class file is left
//! to the caller.

pub mod jvm;
mod settings;
mod util;

pub use settings::*;
