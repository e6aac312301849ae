use super::{jump_encoding, BranchKind, Instruction, Opcode, ResolutionStats, ResolvedInstruction};
use crate::jvm::class_file::ConstantsPool;
use crate::jvm::{Error, Orphan, TargeterConflict};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;

/// Stable reference to an instruction in an [`InstructionList`]
///
/// Handles survive moves, swaps of the underlying instruction, and edits elsewhere in the list.
/// They are never reused, so a handle to a deleted instruction stays invalid forever.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct InstructionHandle(pub(crate) u32);

impl fmt::Display for InstructionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Handle to an instruction known to be a single-target branch
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct BranchHandle(InstructionHandle);

impl BranchHandle {
    pub fn handle(self) -> InstructionHandle {
        self.0
    }
}

impl From<BranchHandle> for InstructionHandle {
    fn from(branch: BranchHandle) -> InstructionHandle {
        branch.0
    }
}

/// Something referring to an instruction handle, which must be kept consistent when the
/// instruction is moved or deleted
///
/// Everything except branches is identified by an id chosen by whoever owns the entity (eg. the
/// index of an exception handler in the method being built).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Targeter {
    Branch(InstructionHandle),
    ExceptionHandler(usize),
    LineNumber(usize),
    LocalVariable(usize),
}

#[derive(Debug)]
struct Node {
    instruction: Instruction,
    prev: Option<InstructionHandle>,
    next: Option<InstructionHandle>,

    /// Offset from the start of the method (only meaningful if positions are resolved)
    position: u32,

    /// Whether a branch uses its wide encoding
    widened: bool,
}

/// Mutable, doubly linked sequence of instructions
///
/// Instructions live in an arena indexed by their handle. Branch targets are stored as handles,
/// and the list keeps the reverse index (handle to targeters) itself, so deleting an instruction
/// only needs to check one set.
///
/// Branches can only target instructions that are already in the list. Forward jumps are built by
/// appending a placeholder at the jump site, and swapping it for the branch with
/// [`InstructionList::set_instruction`] once the target exists.
#[derive(Debug, Default)]
pub struct InstructionList {
    nodes: Vec<Option<Node>>,
    first: Option<InstructionHandle>,
    last: Option<InstructionHandle>,
    len: usize,
    targeters: HashMap<InstructionHandle, HashSet<Targeter>>,

    /// Positions are invalidated by any structural edit
    positions_valid: bool,
}

impl InstructionList {
    pub fn new() -> InstructionList {
        InstructionList::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, handle: InstructionHandle) -> bool {
        matches!(self.nodes.get(handle.0 as usize), Some(Some(_)))
    }

    pub fn first(&self) -> Option<InstructionHandle> {
        self.first
    }

    pub fn last(&self) -> Option<InstructionHandle> {
        self.last
    }

    pub fn next(&self, handle: InstructionHandle) -> Result<Option<InstructionHandle>, Error> {
        self.node(handle).map(|node| node.next)
    }

    pub fn prev(&self, handle: InstructionHandle) -> Result<Option<InstructionHandle>, Error> {
        self.node(handle).map(|node| node.prev)
    }

    pub fn get(&self, handle: InstructionHandle) -> Result<&Instruction, Error> {
        self.node(handle).map(|node| &node.instruction)
    }

    /// Instructions in order, along with their handles
    pub fn iter(&self) -> impl Iterator<Item = (InstructionHandle, &Instruction)> + '_ {
        self.nodes_in_order()
            .map(|(handle, node)| (handle, &node.instruction))
    }

    fn nodes_in_order(&self) -> impl Iterator<Item = (InstructionHandle, &Node)> + '_ {
        let mut cursor = self.first;
        std::iter::from_fn(move || {
            let handle = cursor?;
            let node = self.nodes[handle.0 as usize].as_ref()?;
            cursor = node.next;
            Some((handle, node))
        })
    }

    fn node(&self, handle: InstructionHandle) -> Result<&Node, Error> {
        match self.nodes.get(handle.0 as usize) {
            Some(Some(node)) => Ok(node),
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    fn node_mut(&mut self, handle: InstructionHandle) -> Result<&mut Node, Error> {
        match self.nodes.get_mut(handle.0 as usize) {
            Some(Some(node)) => Ok(node),
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    // ----------------------------------------------------------------------------------------
    // Adding instructions

    /// Add an instruction to the end of the list
    pub fn append(&mut self, instruction: Instruction) -> Result<InstructionHandle, Error> {
        let handle = self.allocate(instruction)?;
        self.link_after(self.last, handle, handle);
        Ok(handle)
    }

    /// Add a branch to the end of the list
    pub fn append_branch(
        &mut self,
        kind: BranchKind,
        target: InstructionHandle,
    ) -> Result<BranchHandle, Error> {
        self.append(Instruction::Branch(kind, target))
            .map(BranchHandle)
    }

    /// Add an instruction to the start of the list
    pub fn insert(&mut self, instruction: Instruction) -> Result<InstructionHandle, Error> {
        let handle = self.allocate(instruction)?;
        self.link_after(None, handle, handle);
        Ok(handle)
    }

    /// Add an instruction right before an existing one
    pub fn insert_before(
        &mut self,
        before: InstructionHandle,
        instruction: Instruction,
    ) -> Result<InstructionHandle, Error> {
        let prev = self.node(before)?.prev;
        let handle = self.allocate(instruction)?;
        self.link_after(prev, handle, handle);
        Ok(handle)
    }

    /// Add an instruction right after an existing one
    pub fn append_after(
        &mut self,
        after: InstructionHandle,
        instruction: Instruction,
    ) -> Result<InstructionHandle, Error> {
        self.node(after)?;
        let handle = self.allocate(instruction)?;
        self.link_after(Some(after), handle, handle);
        Ok(handle)
    }

    /// Create a detached node for the instruction and register its branch targets
    fn allocate(&mut self, instruction: Instruction) -> Result<InstructionHandle, Error> {
        instruction.validate()?;
        self.check_targets(&instruction)?;

        let handle = InstructionHandle(self.nodes.len() as u32);
        self.register_targets(handle, &instruction);
        self.nodes.push(Some(Node {
            instruction,
            prev: None,
            next: None,
            position: 0,
            widened: false,
        }));
        self.len += 1;
        Ok(handle)
    }

    fn check_targets(&self, instruction: &Instruction) -> Result<(), Error> {
        for target in instruction.targets() {
            self.node(target)?;
        }
        Ok(())
    }

    fn register_targets(&mut self, handle: InstructionHandle, instruction: &Instruction) {
        for target in instruction.targets() {
            self.targeters
                .entry(target)
                .or_default()
                .insert(Targeter::Branch(handle));
        }
    }

    fn unregister_targets(&mut self, handle: InstructionHandle, instruction: &Instruction) {
        for target in instruction.targets() {
            self.forget_targeter(target, &Targeter::Branch(handle));
        }
    }

    fn forget_targeter(&mut self, target: InstructionHandle, targeter: &Targeter) -> bool {
        let removed = match self.targeters.get_mut(&target) {
            Some(targeters) => targeters.remove(targeter),
            None => false,
        };
        if matches!(self.targeters.get(&target), Some(targeters) if targeters.is_empty()) {
            self.targeters.remove(&target);
        }
        removed
    }

    /// Splice the already linked chain `first..=last` in after `after` (or at the very start)
    fn link_after(
        &mut self,
        after: Option<InstructionHandle>,
        first: InstructionHandle,
        last: InstructionHandle,
    ) {
        let next = match after {
            None => self.first.replace(first),
            Some(after) => self.nodes[after.0 as usize]
                .as_mut()
                .and_then(|node| node.next.replace(first)),
        };
        if let Some(node) = self.nodes[first.0 as usize].as_mut() {
            node.prev = after;
        }
        if let Some(node) = self.nodes[last.0 as usize].as_mut() {
            node.next = next;
        }
        match next {
            None => self.last = Some(last),
            Some(next) => {
                if let Some(node) = self.nodes[next.0 as usize].as_mut() {
                    node.prev = Some(last);
                }
            }
        }
        self.positions_valid = false;
    }

    /// Detach the chain `first..=last`, leaving its internal links intact
    fn unlink(&mut self, first: InstructionHandle, last: InstructionHandle) {
        let prev = self.nodes[first.0 as usize]
            .as_mut()
            .and_then(|node| node.prev.take());
        let next = self.nodes[last.0 as usize]
            .as_mut()
            .and_then(|node| node.next.take());
        match prev {
            None => self.first = next,
            Some(prev) => {
                if let Some(node) = self.nodes[prev.0 as usize].as_mut() {
                    node.next = next;
                }
            }
        }
        match next {
            None => self.last = prev,
            Some(next) => {
                if let Some(node) = self.nodes[next.0 as usize].as_mut() {
                    node.prev = prev;
                }
            }
        }
        self.positions_valid = false;
    }

    /// Handles from `from` to `to` (inclusive), following `next` links
    fn range(
        &self,
        from: InstructionHandle,
        to: InstructionHandle,
    ) -> Result<Vec<InstructionHandle>, Error> {
        self.node(to)?;
        let mut handles = vec![from];
        let mut cursor = from;
        while cursor != to {
            cursor = self.node(cursor)?.next.ok_or(Error::InvalidHandle(to))?;
            handles.push(cursor);
        }
        Ok(handles)
    }

    // ----------------------------------------------------------------------------------------
    // Changing instructions

    /// Swap the instruction behind a handle, keeping the handle and its targeters
    ///
    /// Returns the instruction that was replaced.
    pub fn set_instruction(
        &mut self,
        handle: InstructionHandle,
        instruction: Instruction,
    ) -> Result<Instruction, Error> {
        self.node(handle)?;
        instruction.validate()?;
        self.check_targets(&instruction)?;

        let new_targets = instruction.targets();
        let node = self.node_mut(handle)?;
        node.widened = false;
        let previous = std::mem::replace(&mut node.instruction, instruction);
        self.unregister_targets(handle, &previous);
        for target in new_targets {
            self.targeters
                .entry(target)
                .or_default()
                .insert(Targeter::Branch(handle));
        }
        self.positions_valid = false;
        Ok(previous)
    }

    /// Change the target of a branch
    pub fn set_target(
        &mut self,
        branch: BranchHandle,
        target: InstructionHandle,
    ) -> Result<(), Error> {
        self.node(target)?;
        let handle = branch.handle();
        let old_target = match &mut self.node_mut(handle)?.instruction {
            Instruction::Branch(_, current) => std::mem::replace(current, target),
            other => {
                let msg = format!("{} is not a single target branch", other);
                return Err(Error::InvalidInstruction(msg));
            }
        };
        self.forget_targeter(old_target, &Targeter::Branch(handle));
        self.targeters
            .entry(target)
            .or_default()
            .insert(Targeter::Branch(handle));
        self.positions_valid = false;
        Ok(())
    }

    /// Current target of a branch
    pub fn branch_target(&self, branch: BranchHandle) -> Result<InstructionHandle, Error> {
        match self.get(branch.handle())? {
            Instruction::Branch(_, target) => Ok(*target),
            other => Err(Error::InvalidInstruction(format!(
                "{} is not a single target branch",
                other
            ))),
        }
    }

    /// Make every branch (including switches) jumping to `old` jump to `new` instead
    ///
    /// Other targeters of `old` are left alone. Returns the number of branches redirected.
    pub fn redirect_branches(
        &mut self,
        old: InstructionHandle,
        new: InstructionHandle,
    ) -> Result<usize, Error> {
        self.node(old)?;
        self.node(new)?;
        if old == new {
            return Ok(0);
        }

        let branches: Vec<InstructionHandle> = self
            .targeters(old)
            .into_iter()
            .filter_map(|targeter| match targeter {
                Targeter::Branch(branch) => Some(branch),
                _ => None,
            })
            .collect();
        for branch in &branches {
            self.node_mut(*branch)?.instruction.replace_target(old, new);
            self.forget_targeter(old, &Targeter::Branch(*branch));
            self.targeters
                .entry(new)
                .or_default()
                .insert(Targeter::Branch(*branch));
        }
        if !branches.is_empty() {
            self.positions_valid = false;
        }
        Ok(branches.len())
    }

    // ----------------------------------------------------------------------------------------
    // Removing and moving instructions

    /// Delete an instruction that nothing targets
    ///
    /// If anything still targets the instruction, the list is left unchanged and the error
    /// carries the instruction along with its complete set of targeters.
    pub fn delete(&mut self, handle: InstructionHandle) -> Result<Instruction, Error> {
        self.delete_range(handle, handle)
            .map(|mut deleted| deleted.remove(0))
    }

    /// Delete every instruction from `from` to `to` (inclusive)
    ///
    /// Branches inside the range targeting other instructions in the range do not count as
    /// conflicts, since they are deleted too.
    pub fn delete_range(
        &mut self,
        from: InstructionHandle,
        to: InstructionHandle,
    ) -> Result<Vec<Instruction>, Error> {
        let handles = self.range(from, to)?;
        let doomed: HashSet<InstructionHandle> = handles.iter().copied().collect();

        let mut orphans = vec![];
        for handle in &handles {
            let targeters: Vec<Targeter> = self
                .targeters(*handle)
                .into_iter()
                .filter(|targeter| !matches!(targeter, Targeter::Branch(b) if doomed.contains(b)))
                .collect();
            if !targeters.is_empty() {
                orphans.push(Orphan {
                    handle: *handle,
                    instruction: self.node(*handle)?.instruction.clone(),
                    targeters,
                });
            }
        }
        if !orphans.is_empty() {
            return Err(Error::from(TargeterConflict { orphans }));
        }

        self.unlink(from, to);
        let mut deleted = vec![];
        for handle in handles {
            if let Some(node) = self.nodes[handle.0 as usize].take() {
                self.unregister_targets(handle, &node.instruction);
                self.targeters.remove(&handle);
                self.len -= 1;
                deleted.push(node.instruction);
            }
        }
        Ok(deleted)
    }

    /// Move the instructions from `from` to `to` (inclusive) after `after` (or to the very start
    /// if `after` is `None`)
    pub fn move_range(
        &mut self,
        from: InstructionHandle,
        to: InstructionHandle,
        after: Option<InstructionHandle>,
    ) -> Result<(), Error> {
        let handles = self.range(from, to)?;
        if let Some(after) = after {
            self.node(after)?;
            if handles.contains(&after) {
                let msg = format!("cannot move {}..{} after {}", from, to, after);
                return Err(Error::InvalidInstruction(msg));
            }
        }
        self.unlink(from, to);
        self.link_after(after, from, to);
        Ok(())
    }

    /// Replace `nop`s with whatever follows them, redirecting branches to them
    ///
    /// A `nop` is kept if it is last or if something other than a branch still targets it.
    /// Returns the number of `nop`s removed.
    pub fn remove_nops(&mut self) -> Result<usize, Error> {
        let nops: Vec<(InstructionHandle, Option<InstructionHandle>)> = self
            .nodes_in_order()
            .filter(|(_, node)| node.instruction == Instruction::NOP)
            .map(|(handle, node)| (handle, node.next))
            .collect();

        let mut removed = 0;
        for (nop, next) in nops {
            let next = match next {
                Some(next) => next,
                None if self.targeters(nop).is_empty() => {
                    self.delete(nop)?;
                    removed += 1;
                    continue;
                }
                None => continue,
            };
            self.redirect_branches(nop, next)?;
            if self.targeters(nop).is_empty() {
                self.delete(nop)?;
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("Removed {} nops", removed);
        }
        Ok(removed)
    }

    /// Deep copy of the list, along with the mapping from old handles to new ones
    ///
    /// Branch targets are remapped into the copy. Other targeters are not copied.
    #[allow(clippy::type_complexity)]
    pub fn copy(
        &self,
    ) -> Result<(InstructionList, HashMap<InstructionHandle, InstructionHandle>), Error> {
        let mut copy = InstructionList::new();
        let mut mapping = HashMap::new();
        for (handle, _) in self.iter() {
            mapping.insert(handle, copy.append(Instruction::NOP)?);
        }
        for (handle, instruction) in self.iter() {
            let mut instruction = instruction.clone();
            instruction.map_targets(|target| mapping.get(&target).copied().unwrap_or(target));
            copy.set_instruction(mapping[&handle], instruction)?;
        }
        Ok((copy, mapping))
    }

    // ----------------------------------------------------------------------------------------
    // Targeters

    /// Everything currently targeting the instruction
    pub fn targeters(&self, handle: InstructionHandle) -> Vec<Targeter> {
        let mut targeters: Vec<Targeter> = self
            .targeters
            .get(&handle)
            .map(|targeters| targeters.iter().copied().collect())
            .unwrap_or_default();
        targeters.sort();
        targeters
    }

    /// Register a non-branch targeter (branches register themselves)
    pub fn add_targeter(
        &mut self,
        handle: InstructionHandle,
        targeter: Targeter,
    ) -> Result<(), Error> {
        self.node(handle)?;
        self.targeters.entry(handle).or_default().insert(targeter);
        Ok(())
    }

    /// Unregister a targeter, returning whether it was registered
    pub fn remove_targeter(&mut self, handle: InstructionHandle, targeter: &Targeter) -> bool {
        self.forget_targeter(handle, targeter)
    }

    // ----------------------------------------------------------------------------------------
    // Positions and encoding

    /// Compute the final position of every instruction, widening branches as needed
    ///
    /// `short_jump_range` is the displacement range reachable by short branches (normally
    /// [`jump_encoding::SIGNED_16BIT_JUMP_RANGE`]).
    pub fn resolve_positions(
        &mut self,
        short_jump_range: &RangeInclusive<isize>,
    ) -> Result<ResolutionStats, Error> {
        jump_encoding::resolve_positions(self, short_jump_range)
    }

    pub fn positions_resolved(&self) -> bool {
        self.positions_valid
    }

    /// Position of an instruction (positions must be resolved)
    pub fn position(&self, handle: InstructionHandle) -> Result<u32, Error> {
        let node = self.node(handle)?;
        if self.positions_valid {
            Ok(node.position)
        } else {
            Err(Error::UnresolvedPositions)
        }
    }

    /// Whether a branch was promoted to its wide encoding during position resolution
    pub fn is_widened(&self, handle: InstructionHandle) -> Result<bool, Error> {
        self.node(handle).map(|node| node.widened)
    }

    /// Instruction starting at a given position (positions must be resolved)
    pub fn find_handle(&self, position: u32) -> Option<InstructionHandle> {
        if !self.positions_valid {
            return None;
        }
        self.nodes_in_order()
            .find(|(_, node)| node.position == position)
            .map(|(handle, _)| handle)
    }

    /// Total length of the encoded instructions (positions must be resolved)
    pub fn code_length(&self) -> Result<usize, Error> {
        if !self.positions_valid {
            return Err(Error::UnresolvedPositions);
        }
        match self.last {
            None => Ok(0),
            Some(last) => {
                let node = self.node(last)?;
                let length = node.instruction.length(node.position, node.widened);
                Ok(node.position as usize + length)
            }
        }
    }

    /// Handles in order, along with whether they are currently widened
    pub(super) fn layout(&self) -> Vec<(InstructionHandle, bool)> {
        self.nodes_in_order()
            .map(|(handle, node)| (handle, node.widened))
            .collect()
    }

    pub(super) fn set_layout(
        &mut self,
        handle: InstructionHandle,
        position: u32,
        widened: bool,
    ) -> Result<(), Error> {
        let node = self.node_mut(handle)?;
        node.position = position;
        node.widened = widened;
        Ok(())
    }

    pub(super) fn mark_positions_resolved(&mut self) {
        self.positions_valid = true;
    }

    /// Encode every instruction at its resolved position
    pub fn encode(&self, pool: &ConstantsPool) -> Result<Vec<ResolvedInstruction>, Error> {
        if !self.positions_valid {
            return Err(Error::UnresolvedPositions);
        }
        let position_of = |handle: InstructionHandle| self.position(handle);
        let mut resolved = Vec::with_capacity(self.len);
        for (handle, node) in self.nodes_in_order() {
            node.instruction.encode(
                handle,
                node.position,
                node.widened,
                pool,
                &position_of,
                &mut resolved,
            )?;
        }
        Ok(resolved)
    }

    /// Human readable listing, one instruction per line
    ///
    /// Lines and jump targets are labelled with positions when they are resolved, and with
    /// handles otherwise.
    pub fn listing(&self, pool: Option<&ConstantsPool>) -> String {
        let label = |handle: InstructionHandle| match self.position(handle) {
            Ok(position) => position.to_string(),
            Err(_) => handle.to_string(),
        };

        let mut listing = String::new();
        for (handle, node) in self.nodes_in_order() {
            let line = node.instruction.render_with(pool, &label);
            let widened = if node.widened { " (wide)" } else { "" };
            listing.push_str(&format!("{:>6}: {}{}\n", label(handle), line, widened));
        }
        listing
    }

    /// Opcodes in order (mostly useful for tests and logging)
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.iter().map(|(_, instruction)| instruction.opcode()).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::code::{LocalKind, OrdComparison, Select};

    fn simple(opcode: Opcode) -> Instruction {
        Instruction::Simple(opcode)
    }

    #[test]
    fn appending_and_inserting() {
        let mut list = InstructionList::new();
        let b = list.append(simple(Opcode::ICONST_1)).unwrap();
        let d = list.append(simple(Opcode::IRETURN)).unwrap();
        let a = list.insert(simple(Opcode::ICONST_0)).unwrap();
        let c = list.insert_before(d, simple(Opcode::IADD)).unwrap();
        list.append_after(d, simple(Opcode::NOP)).unwrap();

        assert_eq!(
            list.opcodes(),
            vec![Opcode::ICONST_0, Opcode::ICONST_1, Opcode::IADD, Opcode::IRETURN, Opcode::NOP]
        );
        assert_eq!(list.len(), 5);
        assert_eq!(list.first(), Some(a));
        assert_eq!(list.next(a).unwrap(), Some(b));
        assert_eq!(list.prev(d).unwrap(), Some(c));
    }

    #[test]
    fn forward_branch_through_placeholder() {
        let mut list = InstructionList::new();
        let jump = list.append(Instruction::NOP).unwrap();
        list.append(simple(Opcode::ICONST_1)).unwrap();
        let target = list.append(Instruction::RETURN).unwrap();
        list.set_instruction(jump, Instruction::Branch(BranchKind::Goto, target))
            .unwrap();

        assert_eq!(list.targeters(target), vec![Targeter::Branch(jump)]);
        assert_eq!(list.branch_target(BranchHandle(jump)).unwrap(), target);
    }

    #[test]
    fn branch_to_missing_handle() {
        let mut list = InstructionList::new();
        let result = list.append(Instruction::Branch(BranchKind::Goto, InstructionHandle(9)));
        assert!(matches!(result, Err(Error::InvalidHandle(InstructionHandle(9)))));
        assert!(list.is_empty());
    }

    #[test]
    fn deleting_targeted_instruction_fails_without_changes() {
        let mut list = InstructionList::new();
        let target = list.append(simple(Opcode::ICONST_0)).unwrap();
        let branch = list.append_branch(BranchKind::Goto, target).unwrap();
        list.add_targeter(target, Targeter::LocalVariable(0)).unwrap();

        match list.delete(target) {
            Err(Error::TargeterConflict(conflict)) => {
                assert_eq!(conflict.orphans.len(), 1);
                assert_eq!(conflict.orphans[0].handle, target);
                assert_eq!(
                    conflict.orphans[0].targeters,
                    vec![Targeter::Branch(branch.handle()), Targeter::LocalVariable(0)]
                );
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(list.len(), 2);
        assert!(list.contains(target));
        assert_eq!(list.targeters(target).len(), 2);
    }

    #[test]
    fn redirect_then_delete() {
        let mut list = InstructionList::new();
        let old = list.append(Instruction::NOP).unwrap();
        let new = list.append(Instruction::RETURN).unwrap();
        let branch = list.append_branch(BranchKind::If(OrdComparison::EQ), old).unwrap();

        assert_eq!(list.redirect_branches(old, new).unwrap(), 1);
        assert_eq!(list.branch_target(branch).unwrap(), new);
        assert!(list.targeters(old).is_empty());
        assert_eq!(list.delete(old).unwrap(), Instruction::NOP);
        assert!(!list.contains(old));
        assert!(matches!(list.get(old), Err(Error::InvalidHandle(_))));
    }

    #[test]
    fn deleting_a_branch_unregisters_it() {
        let mut list = InstructionList::new();
        let target = list.append(Instruction::RETURN).unwrap();
        let branch = list.append_branch(BranchKind::Goto, target).unwrap();
        list.delete(branch.handle()).unwrap();
        assert!(list.targeters(target).is_empty());
        list.delete(target).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
    }

    #[test]
    fn delete_range_ignores_internal_branches() {
        let mut list = InstructionList::new();
        let keep = list.append(simple(Opcode::ICONST_0)).unwrap();
        let loop_head = list.append(simple(Opcode::ICONST_1)).unwrap();
        let back = list.append_branch(BranchKind::Goto, loop_head).unwrap();
        let end = list.append(Instruction::RETURN).unwrap();

        let deleted = list.delete_range(loop_head, back.handle()).unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(list.opcodes(), vec![Opcode::ICONST_0, Opcode::RETURN]);
        assert_eq!(list.next(keep).unwrap(), Some(end));

        // A branch from outside the range does conflict
        let target = list.append(simple(Opcode::POP)).unwrap();
        list.append_branch(BranchKind::Goto, target).unwrap();
        assert!(matches!(
            list.delete_range(end, target),
            Err(Error::TargeterConflict(_))
        ));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn moving_ranges() {
        let mut list = InstructionList::new();
        let a = list.append(simple(Opcode::ICONST_0)).unwrap();
        let b = list.append(simple(Opcode::ICONST_1)).unwrap();
        let c = list.append(simple(Opcode::ICONST_2)).unwrap();
        let d = list.append(simple(Opcode::ICONST_3)).unwrap();

        list.move_range(a, b, Some(d)).unwrap();
        assert_eq!(
            list.opcodes(),
            vec![Opcode::ICONST_2, Opcode::ICONST_3, Opcode::ICONST_0, Opcode::ICONST_1]
        );
        assert_eq!(list.last(), Some(b));

        list.move_range(d, a, None).unwrap();
        assert_eq!(
            list.opcodes(),
            vec![Opcode::ICONST_3, Opcode::ICONST_0, Opcode::ICONST_2, Opcode::ICONST_1]
        );
        assert_eq!(list.first(), Some(d));
        assert_eq!(list.prev(c).unwrap(), Some(a));

        assert!(list.move_range(d, a, Some(d)).is_err());
    }

    #[test]
    fn swapping_instructions_rewires_targets() {
        let mut list = InstructionList::new();
        let first = list.append(simple(Opcode::ICONST_0)).unwrap();
        let second = list.append(simple(Opcode::ICONST_1)).unwrap();
        let branch = list.append_branch(BranchKind::Goto, first).unwrap();

        let select = Select::new(vec![(0, first), (1, second)], second, 1).unwrap();
        let previous = list
            .set_instruction(branch.handle(), Instruction::Switch(select))
            .unwrap();
        assert!(previous.is_branch());
        assert_eq!(list.targeters(first), vec![Targeter::Branch(branch.handle())]);
        assert_eq!(list.targeters(second), vec![Targeter::Branch(branch.handle())]);

        list.set_instruction(branch.handle(), Instruction::RETURN)
            .unwrap();
        assert!(list.targeters(first).is_empty());
        assert!(list.targeters(second).is_empty());
    }

    #[test]
    fn swapping_one_instruction_leaves_equal_ones_alone() {
        let mut list = InstructionList::new();
        let a = list.append(simple(Opcode::IADD)).unwrap();
        let b = list.append(simple(Opcode::IADD)).unwrap();
        list.set_instruction(a, simple(Opcode::ISUB)).unwrap();
        assert_eq!(list.get(b).unwrap(), &simple(Opcode::IADD));
    }

    #[test]
    fn handles_are_never_reused() {
        let mut list = InstructionList::new();
        let a = list.append(Instruction::NOP).unwrap();
        list.delete(a).unwrap();
        let b = list.append(Instruction::NOP).unwrap();
        assert_ne!(a, b);
        assert!(list.set_target(BranchHandle(b), a).is_err());
    }

    #[test]
    fn removing_nops() {
        let mut list = InstructionList::new();
        let nop = list.append(Instruction::NOP).unwrap();
        let ret = list.append(Instruction::RETURN).unwrap();
        let kept = list.append(Instruction::NOP).unwrap();
        let branch = list.append_branch(BranchKind::Goto, nop).unwrap();
        list.add_targeter(kept, Targeter::LineNumber(0)).unwrap();

        assert_eq!(list.remove_nops().unwrap(), 1);
        assert_eq!(list.branch_target(branch).unwrap(), ret);
        assert_eq!(list.opcodes(), vec![Opcode::RETURN, Opcode::NOP, Opcode::GOTO]);
    }

    #[test]
    fn copies_are_independent() {
        let mut list = InstructionList::new();
        let target = list.append(simple(Opcode::ICONST_0)).unwrap();
        let branch = list.append_branch(BranchKind::Goto, target).unwrap();

        let (mut copy, mapping) = list.copy().unwrap();
        let copied_branch = BranchHandle(mapping[&branch.handle()]);
        assert_eq!(copy.branch_target(copied_branch).unwrap(), mapping[&target]);
        assert_eq!(
            copy.targeters(mapping[&target]),
            vec![Targeter::Branch(copied_branch.handle())]
        );

        copy.set_instruction(mapping[&target], Instruction::RETURN)
            .unwrap();
        assert_eq!(list.get(target).unwrap(), &simple(Opcode::ICONST_0));
    }

    #[test]
    fn positions_are_invalidated_by_edits() {
        let mut list = InstructionList::new();
        let first = list.append(simple(Opcode::ICONST_0)).unwrap();
        let second = list.append(Instruction::Load(LocalKind::Int, 7)).unwrap();
        list.append(simple(Opcode::IRETURN)).unwrap();

        list.resolve_positions(&jump_encoding::SIGNED_16BIT_JUMP_RANGE)
            .unwrap();
        assert_eq!(list.position(second).unwrap(), 1);
        assert_eq!(list.code_length().unwrap(), 4);
        assert_eq!(list.find_handle(1), Some(second));
        assert_eq!(list.find_handle(2), None);

        list.insert_before(first, Instruction::NOP).unwrap();
        assert!(matches!(list.position(second), Err(Error::UnresolvedPositions)));
        assert_eq!(list.find_handle(1), None);
    }
}
