//! Resolve instruction positions, widening branches whose targets are too far away
//!
//! Most branch instructions have a signed 16-bit relative offset. When a target is further away
//! than that, the branch must switch to a wide encoding:
//!
//! ```text,ignore,no_run
//!     goto L2               goto_w L2
//!
//!     if* L2                ifnot* L1
//!                           goto_w L2
//! L1: ...         =>    L1: ...
//! ```
//!
//! ### Termination
//!
//! This is a fixed point problem because widening a branch makes it longer, which can push other
//! branches out of range. Each pass computes tentative positions and widens every short branch
//! that could be out of range once every remaining short branch is widened. A branch is only ever
//! widened once, so the process stops after at most one more pass than there are branches.
//!
//! ### Switch padding
//!
//! The padding of `tableswitch`/`lookupswitch` depends on the position of the instruction. While
//! stabilizing, switches are assumed to have the maximum padding (3 bytes). Actual padding can
//! only be smaller, which never makes a displacement bigger. The final pass then computes the
//! real positions with the real padding.

use super::{Instruction, InstructionHandle, InstructionList};
use crate::jvm::Error;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Range of relative jump offsets supported by `goto`, `jsr`, and `if*` branch instructions
pub const SIGNED_16BIT_JUMP_RANGE: RangeInclusive<isize> =
    RangeInclusive::new(i16::MIN as isize, i16::MAX as isize);

/// Outcome of resolving positions
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ResolutionStats {
    /// Stabilization passes (the last one is the one that widened nothing)
    pub passes: usize,

    /// Number of branches using a wide encoding
    pub widened: usize,

    /// Total length of the method body in bytes
    pub code_length: usize,
}

/// Assign final positions to every instruction in the list
///
/// All previous widening decisions are discarded first. The `short_jump_range` parameter should
/// always be `SIGNED_16BIT_JUMP_RANGE` - it is a parameter only for unit testing purposes.
pub fn resolve_positions(
    list: &mut InstructionList,
    short_jump_range: &RangeInclusive<isize>,
) -> Result<ResolutionStats, Error> {
    let mut layout: Vec<(InstructionHandle, bool)> = list
        .layout()
        .into_iter()
        .map(|(handle, _)| (handle, false))
        .collect();
    let index: HashMap<InstructionHandle, usize> = layout
        .iter()
        .enumerate()
        .map(|(idx, (handle, _))| (*handle, idx))
        .collect();

    // Stabilization
    let mut passes = 0;
    loop {
        passes += 1;

        let mut positions: Vec<isize> = Vec::with_capacity(layout.len());
        let mut offset: isize = 0;
        let mut max_growth: isize = 0;
        for (handle, widened) in &layout {
            positions.push(offset);
            let instruction = list.get(*handle)?;
            offset += match instruction {
                Instruction::Switch(select) => select.length(0) as isize,
                _ => instruction.length(offset as u32, *widened) as isize,
            };
            if let (Instruction::Branch(kind, _), false) = (instruction, *widened) {
                max_growth += kind.widening_growth() as isize;
            }
        }

        let mut widened_this_pass = 0;
        for (idx, (handle, widened)) in layout.iter_mut().enumerate() {
            if *widened {
                continue;
            }
            if let Instruction::Branch(_, target) = list.get(*handle)? {
                let displacement = positions[index[target]] - positions[idx];
                let worst_case = displacement + displacement.signum() * max_growth;
                if !short_jump_range.contains(&worst_case) {
                    log::trace!(
                        "Widening {} (displacement {}, could become {})",
                        handle,
                        displacement,
                        worst_case
                    );
                    *widened = true;
                    widened_this_pass += 1;
                }
            }
        }

        log::trace!("Pass {} widened {} branches", passes, widened_this_pass);
        if widened_this_pass == 0 {
            break;
        }
    }

    // Address fixing
    let mut offset: usize = 0;
    for (handle, widened) in &layout {
        list.set_layout(*handle, offset as u32, *widened)?;
        offset += list.get(*handle)?.length(offset as u32, *widened);
    }
    list.mark_positions_resolved();

    for (handle, widened) in &layout {
        if let (Instruction::Branch(_, target), false) = (list.get(*handle)?, *widened) {
            let displacement = list.position(*target)? as isize - list.position(*handle)? as isize;
            if !short_jump_range.contains(&displacement) {
                return Err(Error::JumpOverflow {
                    branch: *handle,
                    displacement,
                });
            }
        }
    }

    let widened = layout.iter().filter(|(_, widened)| *widened).count();
    log::debug!(
        "Resolved {} instructions ({} bytes) in {} passes, {} wide branches",
        layout.len(),
        offset,
        passes,
        widened
    );
    Ok(ResolutionStats {
        passes,
        widened,
        code_length: offset,
    })
}
