use crate::jvm::class_file::{ClassConstantIndex, ConstantsPool, Utf8ConstantIndex};
use crate::jvm::code::{
    max_locals, max_stack, Instruction, InstructionHandle, InstructionList, ResolvedInstruction,
    Targeter,
};
use crate::jvm::{
    BinaryName, Error, FieldType, MethodAccessFlags, MethodDescriptor, Name, RenderDescriptor,
    UnqualifiedName,
};
use crate::util::Width;
use crate::Settings;
use std::convert::TryFrom;

/// Maximum length of the code of a method, in bytes
pub const MAX_CODE_LENGTH: usize = 65535;

/// Range of instructions protected by an exception handler
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExceptionHandler {
    /// First protected instruction
    pub start: InstructionHandle,

    /// Last protected instruction (inclusive)
    pub end: InstructionHandle,

    /// First instruction of the handler
    pub handler: InstructionHandle,

    /// Class of exceptions caught (`None` catches everything)
    pub catch_type: Option<BinaryName>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LineNumber {
    pub start: InstructionHandle,
    pub line: u16,
}

/// Local variable, live from `start` to `end` (inclusive)
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LocalVariable {
    pub name: UnqualifiedName,
    pub field_type: FieldType,
    pub slot: u16,
    pub start: InstructionHandle,
    pub end: InstructionHandle,
}

/// Method under construction
///
/// The code and everything pointing into it (exception handlers, line numbers, local variables)
/// are kept in terms of instruction handles until [`MethodBuilder::finish`] resolves them into
/// byte positions. Exception handlers, line numbers, and local variables are registered as
/// targeters on the instructions they point to, so the instruction list refuses to delete those
/// instructions until they are redirected.
pub struct MethodBuilder {
    pub access_flags: MethodAccessFlags,

    /// Class containing the method
    pub class_name: BinaryName,

    pub name: UnqualifiedName,
    pub descriptor: MethodDescriptor,

    /// Names of the parameters, used for local variable table entries covering the whole body
    ///
    /// Either leave this empty or name every parameter.
    pub argument_names: Vec<UnqualifiedName>,

    /// Method body
    pub code: InstructionList,

    /// Checked exceptions declared in the `throws` clause
    pub exceptions: Vec<BinaryName>,

    // Indexed by targeter id. Removed entries leave `None` behind so that ids stay stable.
    exception_handlers: Vec<Option<ExceptionHandler>>,
    line_numbers: Vec<Option<LineNumber>>,
    local_variables: Vec<Option<LocalVariable>>,
}

impl MethodBuilder {
    pub fn new(
        access_flags: MethodAccessFlags,
        class_name: BinaryName,
        name: UnqualifiedName,
        descriptor: MethodDescriptor,
    ) -> MethodBuilder {
        MethodBuilder {
            access_flags,
            class_name,
            name,
            descriptor,
            argument_names: vec![],
            code: InstructionList::new(),
            exceptions: vec![],
            exception_handlers: vec![],
            line_numbers: vec![],
            local_variables: vec![],
        }
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    /// Local variable slots taken up by parameters (including `this`)
    pub fn parameter_slots(&self) -> usize {
        self.descriptor.parameter_length(!self.is_static())
    }

    /// Slot of the first local variable after the parameters
    pub fn first_free_slot(&self) -> usize {
        self.parameter_slots()
    }

    /// Declare a checked exception thrown by the method
    pub fn add_exception(&mut self, class: BinaryName) {
        if !self.exceptions.contains(&class) {
            self.exceptions.push(class);
        }
    }

    // ----------------------------------------------------------------------------------------
    // Exception handlers

    /// Protect `start..=end` with a handler starting at `handler`, returning the handler id
    pub fn add_exception_handler(
        &mut self,
        start: InstructionHandle,
        end: InstructionHandle,
        handler: InstructionHandle,
        catch_type: Option<BinaryName>,
    ) -> Result<usize, Error> {
        let id = self.exception_handlers.len();
        self.register(Targeter::ExceptionHandler(id), &[start, end, handler])?;
        self.exception_handlers.push(Some(ExceptionHandler {
            start,
            end,
            handler,
            catch_type,
        }));
        Ok(id)
    }

    pub fn remove_exception_handler(&mut self, id: usize) -> Option<ExceptionHandler> {
        let removed = self.exception_handlers.get_mut(id)?.take()?;
        let targeter = Targeter::ExceptionHandler(id);
        for handle in [removed.start, removed.end, removed.handler] {
            self.code.remove_targeter(handle, &targeter);
        }
        Some(removed)
    }

    /// Exception handlers in the order they were added (which is the order they get matched in)
    pub fn exception_handlers(&self) -> impl Iterator<Item = (usize, &ExceptionHandler)> + '_ {
        live_entries(&self.exception_handlers)
    }

    // ----------------------------------------------------------------------------------------
    // Line numbers

    /// Mark `start` as the first instruction of a source line, returning the entry id
    pub fn add_line_number(&mut self, start: InstructionHandle, line: u16) -> Result<usize, Error> {
        let id = self.line_numbers.len();
        self.register(Targeter::LineNumber(id), &[start])?;
        self.line_numbers.push(Some(LineNumber { start, line }));
        Ok(id)
    }

    pub fn remove_line_number(&mut self, id: usize) -> Option<LineNumber> {
        let removed = self.line_numbers.get_mut(id)?.take()?;
        self.code
            .remove_targeter(removed.start, &Targeter::LineNumber(id));
        Some(removed)
    }

    pub fn line_numbers(&self) -> impl Iterator<Item = (usize, &LineNumber)> + '_ {
        live_entries(&self.line_numbers)
    }

    // ----------------------------------------------------------------------------------------
    // Local variables

    /// Describe a local variable live over `start..=end`, returning the entry id
    pub fn add_local_variable(
        &mut self,
        name: UnqualifiedName,
        field_type: FieldType,
        slot: usize,
        start: InstructionHandle,
        end: InstructionHandle,
    ) -> Result<usize, Error> {
        let slot = u16::try_from(slot).map_err(|_| Error::InvalidLocalIndex(slot))?;
        let id = self.local_variables.len();
        self.register(Targeter::LocalVariable(id), &[start, end])?;
        self.local_variables.push(Some(LocalVariable {
            name,
            field_type,
            slot,
            start,
            end,
        }));
        Ok(id)
    }

    pub fn remove_local_variable(&mut self, id: usize) -> Option<LocalVariable> {
        let removed = self.local_variables.get_mut(id)?.take()?;
        let targeter = Targeter::LocalVariable(id);
        for handle in [removed.start, removed.end] {
            self.code.remove_targeter(handle, &targeter);
        }
        Some(removed)
    }

    pub fn local_variables(&self) -> impl Iterator<Item = (usize, &LocalVariable)> + '_ {
        live_entries(&self.local_variables)
    }

    /// Register `targeter` on every handle, rolling back if any of them is invalid
    fn register(&mut self, targeter: Targeter, handles: &[InstructionHandle]) -> Result<(), Error> {
        for handle in handles {
            self.code.get(*handle)?;
        }
        for handle in handles {
            self.code.add_targeter(*handle, targeter)?;
        }
        Ok(())
    }

    // ----------------------------------------------------------------------------------------
    // Editing

    /// Move every targeter of `old` (branches, exception handlers, line numbers, local variables)
    /// over to `new`
    ///
    /// This is what to do with the targeters reported by a failed deletion. Returns the number
    /// of targeters moved.
    pub fn redirect_targeters(
        &mut self,
        old: InstructionHandle,
        new: InstructionHandle,
    ) -> Result<usize, Error> {
        self.code.get(new)?;
        let mut redirected = self.code.redirect_branches(old, new)?;
        for targeter in self.code.targeters(old) {
            if self.redirect_targeter(targeter, old, new)? {
                redirected += 1;
            }
        }
        Ok(redirected)
    }

    /// Move only the local variable ranges starting or ending at `old` over to `new`
    pub fn redirect_local_variables(
        &mut self,
        old: InstructionHandle,
        new: InstructionHandle,
    ) -> Result<usize, Error> {
        self.code.get(new)?;
        let mut redirected = 0;
        for targeter in self.code.targeters(old) {
            if let Targeter::LocalVariable(_) = targeter {
                if self.redirect_targeter(targeter, old, new)? {
                    redirected += 1;
                }
            }
        }
        Ok(redirected)
    }

    fn redirect_targeter(
        &mut self,
        targeter: Targeter,
        old: InstructionHandle,
        new: InstructionHandle,
    ) -> Result<bool, Error> {
        let swap = |handle: &mut InstructionHandle| {
            if *handle == old {
                *handle = new;
            }
        };
        match targeter {
            Targeter::Branch(_) => return Ok(false),
            Targeter::ExceptionHandler(id) => {
                if let Some(Some(entry)) = self.exception_handlers.get_mut(id) {
                    swap(&mut entry.start);
                    swap(&mut entry.end);
                    swap(&mut entry.handler);
                }
            }
            Targeter::LineNumber(id) => {
                if let Some(Some(entry)) = self.line_numbers.get_mut(id) {
                    swap(&mut entry.start);
                }
            }
            Targeter::LocalVariable(id) => {
                if let Some(Some(entry)) = self.local_variables.get_mut(id) {
                    swap(&mut entry.start);
                    swap(&mut entry.end);
                }
            }
        }
        self.code.remove_targeter(old, &targeter);
        self.code.add_targeter(new, targeter)?;
        Ok(true)
    }

    /// Remove `nop`s, moving whatever targets them to the following instruction
    ///
    /// A trailing `nop` that something still targets is kept. Returns the number removed.
    pub fn remove_nops(&mut self) -> Result<usize, Error> {
        let nops: Vec<InstructionHandle> = self
            .code
            .iter()
            .filter(|(_, instruction)| **instruction == Instruction::NOP)
            .map(|(handle, _)| handle)
            .collect();

        let mut removed = 0;
        for nop in nops {
            if let Some(next) = self.code.next(nop)? {
                self.redirect_targeters(nop, next)?;
            }
            if self.code.targeters(nop).is_empty() {
                self.code.delete(nop)?;
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("Removed {} nops from {}", removed, self.name);
        }
        Ok(removed)
    }

    // ----------------------------------------------------------------------------------------
    // Finishing

    /// Compute the maximum operand stack depth of the current code
    pub fn max_stack(&self, pool: &ConstantsPool) -> Result<u16, Error> {
        let handlers = self.exception_handlers().map(|(_, entry)| entry.handler);
        max_stack(&self.code, handlers, pool)
    }

    /// Compute the number of local variable slots needed by the current code
    pub fn max_locals(&self) -> Result<u16, Error> {
        let locals = self
            .local_variables()
            .map(|(_, local)| (local.slot as usize, local.field_type.width()));
        max_locals(&self.code, self.parameter_slots(), locals)
    }

    /// Resolve the code and all tables into their final form
    ///
    /// Stack and local analyses run first, then positions get resolved. Constants needed by the
    /// method (names, descriptors, catch types) are added to `pool`.
    pub fn finish(&mut self, pool: &mut ConstantsPool, settings: &Settings) -> Result<Method, Error> {
        let name_index = pool.add_utf8(self.name.as_str())?;
        let descriptor_index = pool.add_utf8(self.descriptor.render())?;
        let exceptions = self
            .exceptions
            .iter()
            .map(|class| pool.add_class(class.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let code = if self.access_flags.has_no_code() {
            if !self.code.is_empty() {
                let msg = format!("abstract or native method {} has code", self.name);
                return Err(Error::InvalidInstruction(msg));
            }
            None
        } else {
            Some(self.finish_code(pool, settings)?)
        };

        Ok(Method {
            access_flags: self.access_flags,
            name_index,
            descriptor_index,
            code,
            exceptions,
        })
    }

    fn finish_code(&mut self, pool: &mut ConstantsPool, settings: &Settings) -> Result<Code, Error> {
        if settings.remove_nops {
            self.remove_nops()?;
        }
        if self.code.is_empty() {
            return Err(Error::MethodCodeEmpty);
        }

        let max_stack = if settings.compute_max_stack {
            self.max_stack(pool)?
        } else {
            0
        };
        let max_locals = if settings.compute_max_locals {
            self.max_locals()?
        } else {
            let slots = self.parameter_slots();
            u16::try_from(slots).map_err(|_| Error::MethodCodeMaxLocalsOverflow(slots))?
        };

        let stats = self.code.resolve_positions(&settings.short_jump_range)?;
        if stats.code_length > MAX_CODE_LENGTH {
            return Err(Error::MethodCodeOverflow(stats.code_length));
        }
        log::debug!(
            "Resolved {}.{} in {} passes ({} bytes, {} wide branches)",
            self.class_name,
            self.name,
            stats.passes,
            stats.code_length,
            stats.widened
        );
        let instructions = self.code.encode(pool)?;

        let mut exception_table = vec![];
        for (_, entry) in self.exception_handlers() {
            let catch_type = match &entry.catch_type {
                None => None,
                Some(class) => Some(pool.add_class(class.as_str())?),
            };
            let (start_pc, end_pc) = self.pc_range(entry.start, entry.end)?;
            exception_table.push(ExceptionTableEntry {
                start_pc,
                end_pc,
                handler_pc: self.start_pc(entry.handler)?,
                catch_type,
            });
        }

        let mut line_numbers = vec![];
        for (_, entry) in self.line_numbers() {
            line_numbers.push(LineNumberEntry {
                start_pc: self.start_pc(entry.start)?,
                line_number: entry.line,
            });
        }

        let mut local_variables = self.argument_local_variables(pool, stats.code_length)?;
        for (_, local) in self.local_variables() {
            let (start_pc, end_pc) = self.pc_range(local.start, local.end)?;
            local_variables.push(LocalVariableEntry {
                start_pc,
                length: end_pc - start_pc,
                name_index: pool.add_utf8(local.name.as_str())?,
                descriptor_index: pool.add_utf8(local.field_type.render())?,
                index: local.slot,
            });
        }

        Ok(Code {
            max_stack,
            max_locals,
            code_length: stats.code_length as u32,
            instructions,
            exception_table,
            line_numbers,
            local_variables,
        })
    }

    /// Entries for `this` and named parameters, spanning the whole body
    fn argument_local_variables(
        &self,
        pool: &mut ConstantsPool,
        code_length: usize,
    ) -> Result<Vec<LocalVariableEntry>, Error> {
        let mut entries = vec![];
        if self.argument_names.is_empty() {
            return Ok(entries);
        }
        if self.argument_names.len() != self.descriptor.parameters.len() {
            let msg = format!(
                "{} argument names for {} parameters",
                self.argument_names.len(),
                self.descriptor.parameters.len()
            );
            return Err(Error::InvalidInstruction(msg));
        }

        let length = code_length as u16;
        let mut slot: usize = 0;
        if !self.is_static() {
            let this_type = FieldType::object(self.class_name.clone());
            entries.push(LocalVariableEntry {
                start_pc: 0,
                length,
                name_index: pool.add_utf8(UnqualifiedName::THIS.as_str())?,
                descriptor_index: pool.add_utf8(this_type.render())?,
                index: 0,
            });
            slot += 1;
        }
        for (name, parameter) in self.argument_names.iter().zip(&self.descriptor.parameters) {
            entries.push(LocalVariableEntry {
                start_pc: 0,
                length,
                name_index: pool.add_utf8(name.as_str())?,
                descriptor_index: pool.add_utf8(parameter.render())?,
                index: slot as u16,
            });
            slot += parameter.width();
        }
        Ok(entries)
    }

    fn start_pc(&self, handle: InstructionHandle) -> Result<u16, Error> {
        self.code.position(handle).map(|position| position as u16)
    }

    /// Position right after an instruction (the end of the code if it is last)
    fn end_pc(&self, handle: InstructionHandle) -> Result<u16, Error> {
        let end = match self.code.next(handle)? {
            Some(next) => self.code.position(next)? as usize,
            None => self.code.code_length()?,
        };
        Ok(end as u16)
    }

    /// Byte range covered by `start..=end`, which must not be inverted
    fn pc_range(
        &self,
        start: InstructionHandle,
        end: InstructionHandle,
    ) -> Result<(u16, u16), Error> {
        let start_pc = self.start_pc(start)?;
        let end_pc = self.end_pc(end)?;
        if start_pc >= end_pc {
            return Err(Error::InvertedCodeRange { start_pc, end_pc });
        }
        Ok((start_pc, end_pc))
    }
}

fn live_entries<T>(entries: &[Option<T>]) -> impl Iterator<Item = (usize, &T)> + '_ {
    entries
        .iter()
        .enumerate()
        .filter_map(|(id, entry)| entry.as_ref().map(|entry| (id, entry)))
}

/// Finished method, with every name and type resolved into the constants pool
#[derive(Debug)]
pub struct Method {
    pub access_flags: MethodAccessFlags,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,

    /// Missing for `abstract` and `native` methods
    pub code: Option<Code>,

    /// Classes of the declared checked exceptions
    pub exceptions: Vec<ClassConstantIndex>,
}

/// Contents of the `Code` attribute, with everything expressed in byte positions
#[derive(Debug)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_length: u32,
    pub instructions: Vec<ResolvedInstruction>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub line_numbers: Vec<LineNumberEntry>,
    pub local_variables: Vec<LocalVariableEntry>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,

    /// Exclusive
    pub end_pc: u16,
    pub handler_pc: u16,

    /// `None` catches everything (eg. for `finally`)
    pub catch_type: Option<ClassConstantIndex>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, PartialEq, Eq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,
    pub index: u16,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::code::{BranchKind, LocalKind, Opcode};
    use crate::jvm::ParseDescriptor;

    fn builder(descriptor: &str, access_flags: MethodAccessFlags) -> MethodBuilder {
        MethodBuilder::new(
            access_flags,
            BinaryName::from_string(String::from("me/Example")).unwrap(),
            UnqualifiedName::from_string(String::from("run")).unwrap(),
            MethodDescriptor::parse(descriptor).unwrap(),
        )
    }

    fn name(name: &str) -> UnqualifiedName {
        UnqualifiedName::from_string(String::from(name)).unwrap()
    }

    #[test]
    fn parameter_slots() {
        let instance = builder("(JI)V", MethodAccessFlags::PUBLIC);
        assert_eq!(instance.parameter_slots(), 4);
        let static_method = builder("(JI)V", MethodAccessFlags::STATIC);
        assert_eq!(static_method.first_free_slot(), 3);
    }

    #[test]
    fn targeters_block_deletion() {
        let mut method = builder("()V", MethodAccessFlags::STATIC);
        let start = method.code.append(Instruction::NOP).unwrap();
        let end = method.code.append(Instruction::NOP).unwrap();
        let handler = method.code.append(Instruction::ATHROW).unwrap();
        let ret = method.code.append(Instruction::RETURN).unwrap();
        let id = method
            .add_exception_handler(start, end, handler, None)
            .unwrap();
        method.add_line_number(start, 7).unwrap();

        match method.code.delete(start) {
            Err(Error::TargeterConflict(conflict)) => {
                assert_eq!(conflict.orphans.len(), 1);
                assert_eq!(
                    conflict.orphans[0].targeters,
                    vec![Targeter::ExceptionHandler(id), Targeter::LineNumber(0)]
                );
            }
            other => panic!("expected a targeter conflict, got {:?}", other),
        }
        assert_eq!(method.code.len(), 4);

        assert_eq!(method.redirect_targeters(start, end).unwrap(), 2);
        method.code.delete(start).unwrap();
        let (_, entry) = method.exception_handlers().next().unwrap();
        assert_eq!((entry.start, entry.end), (end, end));
        assert_eq!(method.line_numbers().next().unwrap().1.start, end);

        assert!(method.remove_exception_handler(id).is_some());
        assert!(method.remove_exception_handler(id).is_none());
        assert_eq!(method.code.targeters(handler), vec![]);
        assert_eq!(method.code.targeters(ret), vec![]);
    }

    #[test]
    fn nops_are_removed_with_their_targeters() {
        let mut method = builder("()V", MethodAccessFlags::STATIC);
        let nop = method.code.append(Instruction::NOP).unwrap();
        let ret = method.code.append(Instruction::RETURN).unwrap();
        method.code.insert(Instruction::Branch(BranchKind::Goto, nop)).unwrap();
        method.add_line_number(nop, 3).unwrap();
        method
            .add_local_variable(name("x"), FieldType::int(), 0, nop, ret)
            .unwrap();

        assert_eq!(method.remove_nops().unwrap(), 1);
        assert_eq!(method.code.opcodes(), vec![Opcode::GOTO, Opcode::RETURN]);
        assert_eq!(method.line_numbers().next().unwrap().1.start, ret);
        let (_, local) = method.local_variables().next().unwrap();
        assert_eq!((local.start, local.end), (ret, ret));
    }

    #[test]
    fn finishing_resolves_tables() {
        let mut method = builder("(I)I", MethodAccessFlags::PUBLIC);
        method.argument_names = vec![name("value")];
        let load = method.code.append(Instruction::Load(LocalKind::Int, 1)).unwrap();
        let ret = method.code.append(Instruction::Simple(Opcode::IRETURN)).unwrap();
        let handler = method.code.append(Instruction::ATHROW).unwrap();
        method.code.insert_before(load, Instruction::NOP).unwrap();
        method
            .add_exception_handler(load, ret, handler, Some(BinaryName::RUNTIMEEXCEPTION))
            .unwrap();
        method.add_line_number(load, 12).unwrap();

        let mut pool = ConstantsPool::new();
        let settings = Settings {
            remove_nops: true,
            ..Settings::default()
        };
        let finished = method.finish(&mut pool, &settings).unwrap();
        let code = finished.code.unwrap();

        // nop removed: iload_1, ireturn, athrow
        assert_eq!(code.code_length, 3);
        assert_eq!(code.max_stack, 1);
        assert_eq!(code.max_locals, 2);
        assert_eq!(
            code.exception_table,
            vec![ExceptionTableEntry {
                start_pc: 0,
                end_pc: 2,
                handler_pc: 2,
                catch_type: pool.lookup_class("java/lang/RuntimeException"),
            }]
        );
        assert_eq!(
            code.line_numbers,
            vec![LineNumberEntry {
                start_pc: 0,
                line_number: 12
            }]
        );
        let local_names: Vec<&str> = code
            .local_variables
            .iter()
            .map(|local| pool.get_utf8(local.name_index).unwrap())
            .collect();
        assert_eq!(local_names, vec!["this", "value"]);
        assert_eq!(code.local_variables[1].index, 1);
        assert_eq!(pool.get_utf8(finished.name_index).unwrap(), "run");
    }

    #[test]
    fn abstract_methods_have_no_code() {
        let mut method = builder("()V", MethodAccessFlags::ABSTRACT | MethodAccessFlags::PUBLIC);
        method.add_exception(BinaryName::EXCEPTION);
        method.add_exception(BinaryName::EXCEPTION);
        let mut pool = ConstantsPool::new();
        let finished = method.finish(&mut pool, &Settings::default()).unwrap();
        assert!(finished.code.is_none());
        assert_eq!(finished.exceptions.len(), 1);

        method.code.append(Instruction::RETURN).unwrap();
        assert!(matches!(
            method.finish(&mut pool, &Settings::default()),
            Err(Error::InvalidInstruction(_))
        ));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let mut method = builder("()V", MethodAccessFlags::STATIC);
        let first = method.code.append(Instruction::NOP).unwrap();
        let second = method.code.append(Instruction::NOP).unwrap();
        method.code.append(Instruction::RETURN).unwrap();
        let handler = method.code.append(Instruction::Simple(Opcode::POP)).unwrap();
        method.code.append(Instruction::RETURN).unwrap();

        let id = method
            .add_exception_handler(second, first, handler, None)
            .unwrap();
        let mut pool = ConstantsPool::new();
        assert!(matches!(
            method.finish(&mut pool, &Settings::default()),
            Err(Error::InvertedCodeRange {
                start_pc: 1,
                end_pc: 1
            })
        ));

        method.remove_exception_handler(id).unwrap();
        method
            .add_local_variable(name("x"), FieldType::int(), 0, second, first)
            .unwrap();
        assert!(matches!(
            method.finish(&mut pool, &Settings::default()),
            Err(Error::InvertedCodeRange {
                start_pc: 1,
                end_pc: 1
            })
        ));
    }

    #[test]
    fn concrete_methods_need_code() {
        let mut pool = ConstantsPool::new();
        let mut method = builder("()V", MethodAccessFlags::STATIC);
        assert!(matches!(
            method.finish(&mut pool, &Settings::default()),
            Err(Error::MethodCodeEmpty)
        ));

        method.code.append(Instruction::NOP).unwrap();
        let settings = Settings {
            remove_nops: true,
            ..Settings::default()
        };
        assert!(matches!(
            method.finish(&mut pool, &settings),
            Err(Error::MethodCodeEmpty)
        ));
    }

    #[test]
    fn invalid_local_slots() {
        let mut method = builder("()V", MethodAccessFlags::STATIC);
        let ret = method.code.append(Instruction::RETURN).unwrap();
        assert!(matches!(
            method.add_local_variable(name("x"), FieldType::int(), 70000, ret, ret),
            Err(Error::InvalidLocalIndex(70000))
        ));
        assert_eq!(method.code.targeters(ret), vec![]);
    }
}
