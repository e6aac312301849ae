//! Maximum operand stack depth and local variable count of method bodies
//!
//! Valid bytecode has the same stack depth at a given instruction no matter which path was taken
//! to reach it, so each instruction only needs to be visited once. The analysis follows the
//! control flow graph from the method entry and from every exception handler (which start with
//! just the caught exception on the stack).

use super::{BranchKind, Instruction, InstructionFlags, InstructionHandle, InstructionList};
use crate::jvm::class_file::ConstantsPool;
use crate::jvm::Error;
use crate::util::Width;
use std::collections::HashSet;
use std::convert::TryFrom;

/// Compute the maximum operand stack depth
///
/// `handler_entries` are the first instructions of exception handlers. Nothing here depends on
/// resolved positions.
pub fn max_stack(
    list: &InstructionList,
    handler_entries: impl IntoIterator<Item = InstructionHandle>,
    pool: &ConstantsPool,
) -> Result<u16, Error> {
    let mut worklist: Vec<(InstructionHandle, isize)> = vec![];
    let mut seeded: HashSet<InstructionHandle> = HashSet::new();
    for handler in handler_entries {
        list.get(handler)?;
        if seeded.insert(handler) {
            log::trace!("Exception handler entry {} starts at depth 1", handler);
            worklist.push((handler, 1));
        }
    }
    if let Some(first) = list.first() {
        worklist.push((first, 0));
    }

    let mut visited: HashSet<InstructionHandle> = HashSet::new();
    let mut max_depth: isize = 0;

    while let Some((start, start_depth)) = worklist.pop() {
        let mut cursor = Some(start);
        let mut depth = start_depth;
        max_depth = max_depth.max(depth);

        while let Some(handle) = cursor {
            if !visited.insert(handle) {
                break;
            }
            let instruction = list.get(handle)?;

            depth -= instruction.consume_stack(pool)? as isize;
            if depth < 0 {
                return Err(Error::StackUnderflow(handle));
            }
            depth += instruction.produce_stack(pool)? as isize;
            max_depth = max_depth.max(depth);

            let next = list.next(handle)?;
            cursor = match instruction {
                Instruction::Branch(BranchKind::Jsr, target) => {
                    // The return address pushed by `jsr` gets consumed by `ret`
                    worklist.push((*target, depth));
                    if let Some(next) = next {
                        worklist.push((next, depth - 1));
                    }
                    None
                }
                Instruction::Branch(kind, target) => {
                    worklist.push((*target, depth));
                    if kind.is_conditional() {
                        next
                    } else {
                        None
                    }
                }
                Instruction::Switch(select) => {
                    for target in select.targets() {
                        worklist.push((target, depth));
                    }
                    None
                }
                _ if instruction.flags().contains(InstructionFlags::TERMINAL) => None,
                _ => next,
            };
        }
    }

    u16::try_from(max_depth).map_err(|_| Error::MethodCodeMaxStackOverflow(max_depth as usize))
}

/// Compute the number of local variable slots needed
///
/// This is the biggest of: the parameter slots (including `this`), the slots touched by
/// instructions, and the slots of entries in the local variable table (given as slot and width).
pub fn max_locals(
    list: &InstructionList,
    parameter_slots: usize,
    local_variables: impl IntoIterator<Item = (usize, usize)>,
) -> Result<u16, Error> {
    let mut max_locals = parameter_slots;
    for (_, instruction) in list.iter() {
        let used = match instruction {
            Instruction::Load(kind, slot) | Instruction::Store(kind, slot) => {
                *slot as usize + kind.width()
            }
            Instruction::IInc(slot, _) | Instruction::Ret(slot) => *slot as usize + 1,
            _ => continue,
        };
        max_locals = max_locals.max(used);
    }
    for (slot, width) in local_variables {
        max_locals = max_locals.max(slot + width);
    }
    u16::try_from(max_locals).map_err(|_| Error::MethodCodeMaxLocalsOverflow(max_locals))
}
