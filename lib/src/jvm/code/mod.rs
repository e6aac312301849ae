//! Bytecode representation and assembly
//!
//! ### Structure
//!
//! Method bodies are built up as an [`InstructionList`]: a sequence of typed [`Instruction`]s
//! addressed by stable [`InstructionHandle`]s. Handles survive moves and in-place swaps, but not
//! deletion. Everything that points into the code (branches, exception handler ranges, line
//! numbers, local variable ranges) is a [`Targeter`], and the list keeps a reverse index from
//! each handle to whatever targets it. Deleting something that is still targeted fails with the
//! full set of targeters, so the caller can redirect them and try again.
//!
//! Per-opcode data (mnemonic, length, stack effects, exceptions, [`InstructionFlags`]) for the
//! [whole instruction set][0] lives in one static table keyed by [`Opcode`]. Only instructions
//! whose stack effects depend on the constants pool (field accesses, invocations, `ldc`) need
//! more than a table lookup.
//!
//! ### Positions
//!
//! Byte positions are only known once [`InstructionList::resolve_positions`] has run, since
//! switches need alignment padding and far branches need wider encodings. See
//! [`jump_encoding`] for how that fixed point is reached. After that, [`InstructionList::encode`]
//! produces the `(position, opcode, operands)` triples that a class file writer serializes.
//!
//! ### Analysis
//!
//! [`max_stack`] and [`max_locals`] compute the values needed by the `Code` attribute.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se18/html/jvms-6.html#jvms-6.5

mod factory;
mod instruction_list;
mod instructions;
pub mod jump_encoding;
mod opcodes;
mod select;
mod stack_depth;

pub use factory::*;
pub use instruction_list::*;
pub use instructions::*;
pub use jump_encoding::{ResolutionStats, SIGNED_16BIT_JUMP_RANGE};
pub use opcodes::*;
pub use select::*;
pub use stack_depth::*;
