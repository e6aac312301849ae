use super::class_file::{Constant, ConstantIndex, ConstantPoolOverflow};
use super::code::{Instruction, InstructionHandle, Targeter};
use super::{BinaryName, UnqualifiedName};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The constants pool has no room left for this constant
    ConstantPoolOverflow {
        constant: Constant,
        offset: usize,
    },

    /// Index does not refer to any constant (index 0, or past the end of the pool)
    MissingConstant(ConstantIndex),

    /// Index is the unusable slot following a `long` or `double` constant
    UnusableConstantSlot(ConstantIndex),

    /// Constant exists, but is not of the expected kind
    UnexpectedConstant {
        index: ConstantIndex,
        expected: &'static str,
    },

    IoError(std::io::Error),
    BadDescriptor(String),
    MalformedName(String),
    InvalidSettings(String),

    /// Local variable slot does not fit in the 16-bit slot space
    InvalidLocalIndex(usize),

    /// Arrays must have between 1 and 255 dimensions
    InvalidArrayDimensions(usize),

    /// Only `final` fields can carry a `ConstantValue`
    ConstantValueOnNonFinalField(UnqualifiedName),

    /// Constant value does not match the type of the field
    IncompatibleConstantValue {
        field: UnqualifiedName,
        descriptor: String,
    },

    /// Instruction is malformed (eg. an opcode used with the wrong operand shape)
    InvalidInstruction(String),

    /// Handle does not belong to (or was deleted from) the instruction list
    InvalidHandle(InstructionHandle),

    /// Instructions still referenced by targeters cannot be deleted
    TargeterConflict(TargeterConflict),

    /// Positions were requested after a structural edit without resolving them again
    UnresolvedPositions,

    /// A short branch ended up out of range after position resolution (indicates a bug)
    JumpOverflow {
        branch: InstructionHandle,
        displacement: isize,
    },

    /// The operand stack would underflow at this instruction
    StackUnderflow(InstructionHandle),

    /// Methods that are neither `abstract` nor `native` need at least one instruction
    MethodCodeEmpty,

    /// Exception handler or local variable range does not end after it starts
    InvertedCodeRange { start_pc: u16, end_pc: u16 },

    MethodCodeOverflow(usize),
    MethodCodeMaxStackOverflow(usize),
    MethodCodeMaxLocalsOverflow(usize),

    /// Class hierarchy lookup failed
    MissingClass(BinaryName),

    /// Opcode byte is not part of the instruction set
    UnknownOpcode(u8),
}

/// Failed attempt to delete instructions which are still the target of something
///
/// The list is left untouched. Callers are expected to redirect every targeter (eg. to the
/// successor of the deleted range) and then retry the deletion.
#[derive(Debug)]
pub struct TargeterConflict {
    pub orphans: Vec<Orphan>,
}

/// Instruction that would have been deleted, along with everything still targeting it
#[derive(Debug)]
pub struct Orphan {
    pub handle: InstructionHandle,
    pub instruction: Instruction,
    pub targeters: Vec<Targeter>,
}

impl TargeterConflict {
    /// Every targeter across all of the orphans
    pub fn targeters(&self) -> impl Iterator<Item = &Targeter> + '_ {
        self.orphans.iter().flat_map(|orphan| orphan.targeters.iter())
    }
}

impl From<ConstantPoolOverflow> for Error {
    fn from(overflow: ConstantPoolOverflow) -> Error {
        Error::ConstantPoolOverflow {
            constant: overflow.constant,
            offset: overflow.offset as usize,
        }
    }
}

impl From<TargeterConflict> for Error {
    fn from(conflict: TargeterConflict) -> Error {
        Error::TargeterConflict(conflict)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConstantPoolOverflow { constant, offset } => write!(
                f,
                "constant pool overflow at offset {} adding {:?}",
                offset, constant
            ),
            Error::MissingConstant(idx) => write!(f, "no constant at index #{}", idx.0),
            Error::UnusableConstantSlot(idx) => {
                write!(f, "index #{} is the second slot of a wide constant", idx.0)
            }
            Error::UnexpectedConstant { index, expected } => {
                write!(f, "constant #{} is not a {}", index.0, expected)
            }
            Error::IoError(err) => write!(f, "i/o error: {}", err),
            Error::BadDescriptor(msg) => write!(f, "bad descriptor: {}", msg),
            Error::MalformedName(msg) => write!(f, "malformed name: {}", msg),
            Error::InvalidSettings(msg) => write!(f, "invalid settings: {}", msg),
            Error::InvalidLocalIndex(slot) => write!(f, "local variable slot {} is out of range", slot),
            Error::InvalidArrayDimensions(dims) => {
                write!(f, "arrays need 1 to 255 dimensions, not {}", dims)
            }
            Error::ConstantValueOnNonFinalField(name) => {
                write!(f, "field '{}' is not final, so it cannot have a constant value", name)
            }
            Error::IncompatibleConstantValue { field, descriptor } => write!(
                f,
                "constant value does not fit field '{}' of type {}",
                field, descriptor
            ),
            Error::InvalidInstruction(msg) => write!(f, "invalid instruction: {}", msg),
            Error::InvalidHandle(handle) => write!(f, "{:?} is not in the instruction list", handle),
            Error::TargeterConflict(conflict) => {
                write!(f, "instructions are still targeted by")?;
                for targeter in conflict.targeters() {
                    write!(f, " {:?}", targeter)?;
                }
                Ok(())
            }
            Error::UnresolvedPositions => write!(f, "instruction positions are not resolved"),
            Error::JumpOverflow {
                branch,
                displacement,
            } => write!(f, "branch {:?} cannot jump {} bytes", branch, displacement),
            Error::StackUnderflow(handle) => write!(f, "operand stack underflows at {:?}", handle),
            Error::MethodCodeEmpty => write!(f, "method code is empty"),
            Error::InvertedCodeRange { start_pc, end_pc } => {
                write!(f, "code range [{}, {}) is empty or inverted", start_pc, end_pc)
            }
            Error::MethodCodeOverflow(len) => write!(f, "method code is {} bytes long", len),
            Error::MethodCodeMaxStackOverflow(depth) => {
                write!(f, "operand stack needs {} words", depth)
            }
            Error::MethodCodeMaxLocalsOverflow(slots) => {
                write!(f, "local variables need {} slots", slots)
            }
            Error::MissingClass(name) => write!(f, "class '{}' cannot be resolved", name),
            Error::UnknownOpcode(op) => write!(f, "unknown opcode 0x{:02x}", op),
        }
    }
}

impl std::error::Error for Error {}
