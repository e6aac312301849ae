//! Typed JVM instructions
//!
//! The representation is a little more convenient than the raw instruction set:
//!
//!   - `wide` never shows up on its own. Local variable instructions carry a 16-bit slot and pick
//!     their short (`iload_2`), regular (`iload 7`), or `wide` form when encoded.
//!
//!   - Branches are grouped into one variant with a `BranchKind`. This helps with repetitive
//!     pattern matches and simplifies tasks like inverting a branch condition. Whether a branch
//!     uses its short or wide encoding is decided during position resolution, not here.
//!
//!   - Anything without operands (arithmetic, array accesses, returns, ...) is just
//!     `Instruction::Simple` around its opcode, and gets its stack effects from the opcode table.

use super::{InstructionFlags, InstructionHandle, Opcode, Select};
use crate::jvm::class_file::{
    ClassConstantIndex, ConstantIndex, ConstantsPool, FieldRefConstantIndex,
    InvokeDynamicConstantIndex, MethodRefConstantIndex,
};
use crate::jvm::{BaseType, Error, FieldType, Serialize};
use crate::util::Width;
use byteorder::WriteBytesExt;
use std::convert::TryFrom;
use std::fmt;
use std::io::Result as IoResult;
use std::ops::Not;

/// Method body instruction
#[derive(Clone, Debug)]
pub enum Instruction {
    /// Any instruction without operands (`iadd`, `aaload`, `return`, `athrow`, `iconst_1`, ...)
    Simple(Opcode),
    BiPush(i8),
    SiPush(i16),
    Ldc(ConstantIndex), // covers both `ldc` and `ldc_w`
    Ldc2(ConstantIndex),
    Load(LocalKind, u16), // covers `iload`, `iload_{0,3}`, and `wide iload` (same for other kinds)
    Store(LocalKind, u16),
    IInc(u16, i16),
    Ret(u16),
    Field(FieldAccess, FieldRefConstantIndex),
    Invoke(InvokeType, MethodRefConstantIndex),
    InvokeDynamic(InvokeDynamicConstantIndex),
    New(ClassConstantIndex),
    NewArray(BaseType),
    ANewArray(ClassConstantIndex),
    MultiANewArray(ClassConstantIndex, u8),
    CheckCast(ClassConstantIndex),
    InstanceOf(ClassConstantIndex),
    Branch(BranchKind, InstructionHandle),
    Switch(Select),
}

/// Branch instructions are never equal to each other, not even to themselves: each one is a
/// distinct targeter and the target bookkeeping relies on telling them apart.
impl PartialEq for Instruction {
    fn eq(&self, other: &Instruction) -> bool {
        use Instruction::*;

        match (self, other) {
            (Simple(op1), Simple(op2)) => op1 == op2,
            (BiPush(b1), BiPush(b2)) => b1 == b2,
            (SiPush(s1), SiPush(s2)) => s1 == s2,
            (Ldc(i1), Ldc(i2)) | (Ldc2(i1), Ldc2(i2)) => i1 == i2,
            (Load(k1, s1), Load(k2, s2)) | (Store(k1, s1), Store(k2, s2)) => k1 == k2 && s1 == s2,
            (IInc(s1, i1), IInc(s2, i2)) => s1 == s2 && i1 == i2,
            (Ret(s1), Ret(s2)) => s1 == s2,
            (Field(a1, f1), Field(a2, f2)) => a1 == a2 && f1 == f2,
            (Invoke(t1, m1), Invoke(t2, m2)) => t1 == t2 && m1 == m2,
            (InvokeDynamic(i1), InvokeDynamic(i2)) => i1 == i2,
            (New(c1), New(c2))
            | (ANewArray(c1), ANewArray(c2))
            | (CheckCast(c1), CheckCast(c2))
            | (InstanceOf(c1), InstanceOf(c2)) => c1 == c2,
            (NewArray(t1), NewArray(t2)) => t1.array_type_code() == t2.array_type_code(),
            (MultiANewArray(c1, d1), MultiANewArray(c2, d2)) => c1 == c2 && d1 == d2,
            _ => false,
        }
    }
}

impl Instruction {
    /// Shorthand for the instructions without operands
    pub const NOP: Instruction = Instruction::Simple(Opcode::NOP);
    pub const RETURN: Instruction = Instruction::Simple(Opcode::RETURN);
    pub const ATHROW: Instruction = Instruction::Simple(Opcode::ATHROW);

    /// Opcode this instruction encodes to (for `wide` forms, the opcode being widened)
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Simple(opcode) => *opcode,
            Instruction::BiPush(_) => Opcode::BIPUSH,
            Instruction::SiPush(_) => Opcode::SIPUSH,
            Instruction::Ldc(idx) if idx.0 > 255 => Opcode::LDC_W,
            Instruction::Ldc(_) => Opcode::LDC,
            Instruction::Ldc2(_) => Opcode::LDC2_W,
            Instruction::Load(kind, slot) => kind.load_opcode(*slot),
            Instruction::Store(kind, slot) => kind.store_opcode(*slot),
            Instruction::IInc(_, _) => Opcode::IINC,
            Instruction::Ret(_) => Opcode::RET,
            Instruction::Field(access, _) => access.opcode(),
            Instruction::Invoke(typ, _) => typ.opcode(),
            Instruction::InvokeDynamic(_) => Opcode::INVOKEDYNAMIC,
            Instruction::New(_) => Opcode::NEW,
            Instruction::NewArray(_) => Opcode::NEWARRAY,
            Instruction::ANewArray(_) => Opcode::ANEWARRAY,
            Instruction::MultiANewArray(_, _) => Opcode::MULTIANEWARRAY,
            Instruction::CheckCast(_) => Opcode::CHECKCAST,
            Instruction::InstanceOf(_) => Opcode::INSTANCEOF,
            Instruction::Branch(kind, _) => kind.opcode(),
            Instruction::Switch(select) => select.opcode(),
        }
    }

    pub fn flags(&self) -> InstructionFlags {
        self.opcode().flags()
    }

    /// Exceptions that executing the instruction could throw
    pub fn exceptions(&self) -> &'static [&'static str] {
        self.opcode().info().map_or(&[], |info| info.exceptions)
    }

    /// Check the operands are well-formed
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Instruction::Simple(opcode) => {
                let info = opcode.info()?;
                if info.length != Some(1) || info.flags.contains(InstructionFlags::LOCAL_VARIABLE)
                {
                    let msg = format!("`{}` cannot be used without operands", opcode);
                    return Err(Error::InvalidInstruction(msg));
                }
            }
            Instruction::MultiANewArray(_, 0) => {
                let msg = String::from("`multianewarray` needs at least one dimension");
                return Err(Error::InvalidInstruction(msg));
            }
            _ => (),
        }
        Ok(())
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Instruction::Branch(..) | Instruction::Switch(_))
    }

    /// Does this instruction need a `wide` prefix?
    pub fn is_wide(&self) -> bool {
        match self {
            Instruction::Load(_, slot) | Instruction::Store(_, slot) | Instruction::Ret(slot) => {
                *slot > 255
            }
            Instruction::IInc(slot, increment) => *slot > 255 || i8::try_from(*increment).is_err(),
            _ => false,
        }
    }

    /// Encoded length in bytes
    ///
    /// Switches depend on their `position` (for padding) and branches depend on whether they have
    /// been `widened` during position resolution.
    pub fn length(&self, position: u32, widened: bool) -> usize {
        match self {
            Instruction::Load(_, 0..=3) | Instruction::Store(_, 0..=3) => 1,
            Instruction::Load(..) | Instruction::Store(..) | Instruction::Ret(_) => {
                if self.is_wide() {
                    4
                } else {
                    2
                }
            }
            Instruction::IInc(..) => {
                if self.is_wide() {
                    6
                } else {
                    3
                }
            }
            Instruction::Ldc(idx) if idx.0 > 255 => 3,
            Instruction::Branch(kind, _) => kind.length(widened),
            Instruction::Switch(select) => select.length(position),
            _ => self
                .opcode()
                .info()
                .ok()
                .and_then(|info| info.length)
                .map_or(1, usize::from),
        }
    }

    /// Number of operand stack words popped
    pub fn consume_stack(&self, pool: &ConstantsPool) -> Result<usize, Error> {
        let consumed = match self {
            Instruction::Field(access, field) => {
                let width = pool.field_type(*field)?.width();
                match access {
                    FieldAccess::GetStatic => 0,
                    FieldAccess::PutStatic => width,
                    FieldAccess::GetField => 1,
                    FieldAccess::PutField => 1 + width,
                }
            }
            Instruction::Invoke(typ, method) => pool
                .method_descriptor(*method)?
                .parameter_length(typ.has_receiver()),
            Instruction::InvokeDynamic(call_site) => {
                pool.method_descriptor(*call_site)?.parameter_length(false)
            }
            Instruction::MultiANewArray(_, dimensions) => *dimensions as usize,
            _ => self.opcode().info()?.consume as usize,
        };
        Ok(consumed)
    }

    /// Number of operand stack words pushed
    pub fn produce_stack(&self, pool: &ConstantsPool) -> Result<usize, Error> {
        let produced = match self {
            Instruction::Field(access, field) if access.is_get() => {
                pool.field_type(*field)?.width()
            }
            Instruction::Field(_, _) => 0,
            Instruction::Invoke(_, method) => pool.method_descriptor(*method)?.return_length(),
            Instruction::InvokeDynamic(call_site) => {
                pool.method_descriptor(*call_site)?.return_length()
            }
            Instruction::Ldc(idx) | Instruction::Ldc2(idx) => pool.constant_width(*idx)?,
            _ => self.opcode().info()?.produce as usize,
        };
        Ok(produced)
    }

    /// Handles this instruction may jump to
    pub fn targets(&self) -> Vec<InstructionHandle> {
        match self {
            Instruction::Branch(_, target) => vec![*target],
            Instruction::Switch(select) => select.targets(),
            _ => vec![],
        }
    }

    /// Rewrite every jump target through `map`
    pub fn map_targets(&mut self, mut map: impl FnMut(InstructionHandle) -> InstructionHandle) {
        match self {
            Instruction::Branch(_, target) => *target = map(*target),
            Instruction::Switch(select) => select.map_targets(map),
            _ => (),
        }
    }

    /// Point every jump to `old` at `new` instead, returning whether anything changed
    pub fn replace_target(&mut self, old: InstructionHandle, new: InstructionHandle) -> bool {
        let mut changed = false;
        self.map_targets(|target| {
            if target == old {
                changed = true;
                new
            } else {
                target
            }
        });
        changed
    }

    /// Encode the instruction at its resolved position
    ///
    /// Most instructions encode to exactly one resolved instruction. A widened conditional branch
    /// is the exception: it becomes the inverted condition hopping over a `goto_w`.
    pub fn encode(
        &self,
        handle: InstructionHandle,
        position: u32,
        widened: bool,
        pool: &ConstantsPool,
        position_of: &dyn Fn(InstructionHandle) -> Result<u32, Error>,
        out: &mut Vec<ResolvedInstruction>,
    ) -> Result<(), Error> {
        fn put(operands: &mut Vec<u8>, value: impl Serialize) -> Result<(), Error> {
            value.serialize(operands).map_err(Error::IoError)
        }

        let displacement = |target: InstructionHandle, from: u32| -> Result<i64, Error> {
            Ok(position_of(target)? as i64 - from as i64)
        };
        let overflow = |displacement: i64| Error::JumpOverflow {
            branch: handle,
            displacement: displacement as isize,
        };

        let mut opcode = self.opcode();
        let mut operands = vec![];
        let wide = self.is_wide();
        if wide {
            operands.push(opcode.0);
            opcode = Opcode::WIDE;
        }
        let put_slot = |operands: &mut Vec<u8>, slot: u16| {
            if wide {
                put(operands, slot)
            } else {
                put(operands, slot as u8)
            }
        };

        match self {
            Instruction::Simple(_) => (),
            Instruction::BiPush(byte) => put(&mut operands, *byte)?,
            Instruction::SiPush(short) => put(&mut operands, *short)?,
            Instruction::Ldc(idx) => {
                pool.check_loadable(*idx, false)?;
                match u8::try_from(idx.0) {
                    Ok(narrow) => put(&mut operands, narrow)?,
                    Err(_) => put(&mut operands, idx.0)?,
                }
            }
            Instruction::Ldc2(idx) => {
                pool.check_loadable(*idx, true)?;
                put(&mut operands, idx.0)?;
            }
            Instruction::Load(_, 0..=3) | Instruction::Store(_, 0..=3) => (),
            Instruction::Load(_, slot) | Instruction::Store(_, slot) | Instruction::Ret(slot) => {
                put_slot(&mut operands, *slot)?
            }
            Instruction::IInc(slot, increment) => {
                put_slot(&mut operands, *slot)?;
                if wide {
                    put(&mut operands, *increment)?;
                } else {
                    put(&mut operands, *increment as i8)?;
                }
            }
            Instruction::Field(_, idx) => put(&mut operands, ConstantIndex::from(*idx).0)?,
            Instruction::Invoke(typ, idx) => {
                put(&mut operands, ConstantIndex::from(*idx).0)?;
                if let InvokeType::Interface = typ {
                    let count = pool.method_descriptor(*idx)?.parameter_length(true);
                    let count = u8::try_from(count).map_err(|_| {
                        Error::InvalidInstruction(format!("{} argument words", count))
                    })?;
                    put(&mut operands, count)?;
                    put(&mut operands, 0u8)?;
                }
            }
            Instruction::InvokeDynamic(idx) => {
                put(&mut operands, ConstantIndex::from(*idx).0)?;
                put(&mut operands, 0u16)?;
            }
            Instruction::New(class)
            | Instruction::ANewArray(class)
            | Instruction::CheckCast(class)
            | Instruction::InstanceOf(class) => put(&mut operands, ConstantIndex::from(*class).0)?,
            Instruction::NewArray(base_type) => put(&mut operands, base_type.array_type_code())?,
            Instruction::MultiANewArray(class, dimensions) => {
                put(&mut operands, ConstantIndex::from(*class).0)?;
                put(&mut operands, *dimensions)?;
            }
            Instruction::Branch(_, target) if !widened => {
                let jump = displacement(*target, position)?;
                put(&mut operands, i16::try_from(jump).map_err(|_| overflow(jump))?)?;
            }
            Instruction::Branch(kind, target) => match kind.wide_opcode() {
                Some(wide_opcode) => {
                    let jump = displacement(*target, position)?;
                    opcode = wide_opcode;
                    put(&mut operands, i32::try_from(jump).map_err(|_| overflow(jump))?)?;
                }
                None => {
                    let mut skip = vec![];
                    put(&mut skip, 8i16)?;
                    out.push(ResolvedInstruction {
                        position,
                        opcode: kind.inverted().opcode(),
                        operands: skip,
                    });

                    let goto_position = position + 3;
                    let jump = displacement(*target, goto_position)?;
                    put(&mut operands, i32::try_from(jump).map_err(|_| overflow(jump))?)?;
                    out.push(ResolvedInstruction {
                        position: goto_position,
                        opcode: Opcode::GOTO_W,
                        operands,
                    });
                    return Ok(());
                }
            },
            Instruction::Switch(select) => select.encode_operands(position, position_of, &mut operands)?,
        }

        out.push(ResolvedInstruction {
            position,
            opcode,
            operands,
        });
        Ok(())
    }

    /// Render the instruction, showing jump targets with `label` and resolving constants if a
    /// pool is provided
    pub fn render_with(
        &self,
        pool: Option<&ConstantsPool>,
        label: &dyn Fn(InstructionHandle) -> String,
    ) -> String {
        let constant = |idx: ConstantIndex| -> String {
            match pool.map(|pool| render_constant(pool, idx)) {
                Some(rendered) => format!("#{} // {}", idx.0, rendered),
                None => format!("#{}", idx.0),
            }
        };

        let opcode = self.opcode();
        match self {
            Instruction::Simple(_)
            | Instruction::Load(_, 0..=3)
            | Instruction::Store(_, 0..=3) => opcode.to_string(),
            Instruction::BiPush(byte) => format!("{} {}", opcode, byte),
            Instruction::SiPush(short) => format!("{} {}", opcode, short),
            Instruction::Ldc(idx) | Instruction::Ldc2(idx) => {
                format!("{} {}", opcode, constant(*idx))
            }
            Instruction::Load(_, slot) | Instruction::Store(_, slot) | Instruction::Ret(slot) => {
                format!("{} {}", opcode, slot)
            }
            Instruction::IInc(slot, increment) => format!("{} {} {}", opcode, slot, increment),
            Instruction::Field(_, idx) => format!("{} {}", opcode, constant((*idx).into())),
            Instruction::Invoke(_, idx) => format!("{} {}", opcode, constant((*idx).into())),
            Instruction::InvokeDynamic(idx) => format!("{} {}", opcode, constant((*idx).into())),
            Instruction::New(class)
            | Instruction::ANewArray(class)
            | Instruction::CheckCast(class)
            | Instruction::InstanceOf(class) => format!("{} {}", opcode, constant((*class).into())),
            Instruction::NewArray(base_type) => format!("{} {}", opcode, base_type.java_name()),
            Instruction::MultiANewArray(class, dimensions) => {
                format!("{} {} {}", opcode, constant((*class).into()), dimensions)
            }
            Instruction::Branch(_, target) => format!("{} {}", opcode, label(*target)),
            Instruction::Switch(select) => select.render_with(label),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with(None, &|handle| handle.to_string()))
    }
}

/// Short human readable summary of a constant
fn render_constant(pool: &ConstantsPool, idx: ConstantIndex) -> String {
    use crate::jvm::class_file::Constant;

    let rendered = match pool.get(idx) {
        Ok(Constant::Class(_)) => pool.class_name(idx).map(String::from),
        Ok(Constant::String(utf8)) => pool.get_utf8(*utf8).map(|s| format!("{:?}", s)),
        Ok(Constant::Integer(i)) => Ok(i.to_string()),
        Ok(Constant::Float(f)) => Ok(format!("{}f", f)),
        Ok(Constant::Long(l)) => Ok(format!("{}L", l)),
        Ok(Constant::Double(d)) => Ok(format!("{}d", d)),
        Ok(Constant::FieldRef(..)) | Ok(Constant::MethodRef { .. }) => pool
            .member_ref(idx)
            .map(|member| format!("{}.{}:{}", member.class, member.name, member.descriptor)),
        Ok(Constant::InvokeDynamic {
            bootstrap_method,
            method_descriptor,
        }) => pool
            .name_and_type(*method_descriptor)
            .map(|(name, descriptor)| format!("#{}:{}:{}", bootstrap_method, name, descriptor)),
        Ok(other) => Ok(String::from(other.kind_name())),
        Err(err) => Err(err),
    };
    rendered.unwrap_or_else(|err| format!("<{}>", err))
}

/// Instruction with its final position and encoded operands
///
/// This is what gets handed off to whatever writes out the `Code` attribute.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResolvedInstruction {
    /// Offset of the opcode from the start of the method body
    pub position: u32,
    pub opcode: Opcode,

    /// Operand bytes (including `tableswitch`/`lookupswitch` padding)
    pub operands: Vec<u8>,
}

impl ResolvedInstruction {
    /// Number of bytes taken up by the opcode and its operands
    pub fn encoded_length(&self) -> usize {
        1 + self.operands.len()
    }
}

impl Serialize for ResolvedInstruction {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> IoResult<()> {
        self.opcode.0.serialize(writer)?;
        for byte in &self.operands {
            byte.serialize(writer)?;
        }
        Ok(())
    }
}

/// Kind of value held in a local variable
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum LocalKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl LocalKind {
    /// Local variable kind for values of this type (`boolean`, `byte`, `char`, `short` are ints)
    pub fn for_type(field_type: &FieldType) -> LocalKind {
        match field_type {
            FieldType::Base(BaseType::Long) => LocalKind::Long,
            FieldType::Base(BaseType::Float) => LocalKind::Float,
            FieldType::Base(BaseType::Double) => LocalKind::Double,
            FieldType::Base(_) => LocalKind::Int,
            FieldType::Ref(_) => LocalKind::Reference,
        }
    }

    fn load_opcode(self, slot: u16) -> Opcode {
        let (short_form_start, normal_form) = match self {
            LocalKind::Int => (Opcode::ILOAD_0, Opcode::ILOAD),
            LocalKind::Long => (Opcode::LLOAD_0, Opcode::LLOAD),
            LocalKind::Float => (Opcode::FLOAD_0, Opcode::FLOAD),
            LocalKind::Double => (Opcode::DLOAD_0, Opcode::DLOAD),
            LocalKind::Reference => (Opcode::ALOAD_0, Opcode::ALOAD),
        };
        LocalKind::local_opcode(short_form_start, normal_form, slot)
    }

    fn store_opcode(self, slot: u16) -> Opcode {
        let (short_form_start, normal_form) = match self {
            LocalKind::Int => (Opcode::ISTORE_0, Opcode::ISTORE),
            LocalKind::Long => (Opcode::LSTORE_0, Opcode::LSTORE),
            LocalKind::Float => (Opcode::FSTORE_0, Opcode::FSTORE),
            LocalKind::Double => (Opcode::DSTORE_0, Opcode::DSTORE),
            LocalKind::Reference => (Opcode::ASTORE_0, Opcode::ASTORE),
        };
        LocalKind::local_opcode(short_form_start, normal_form, slot)
    }

    /// The load/store instructions follow the same pattern: slots 0-3 have dedicated opcodes,
    /// everything else uses the regular form with an operand
    fn local_opcode(short_form_start: Opcode, normal_form: Opcode, slot: u16) -> Opcode {
        match slot {
            0..=3 => Opcode(short_form_start.0 + slot as u8),
            _ => normal_form,
        }
    }

    /// Return instruction for values of this kind
    pub fn return_opcode(self) -> Opcode {
        match self {
            LocalKind::Int => Opcode::IRETURN,
            LocalKind::Long => Opcode::LRETURN,
            LocalKind::Float => Opcode::FRETURN,
            LocalKind::Double => Opcode::DRETURN,
            LocalKind::Reference => Opcode::ARETURN,
        }
    }
}

impl Width for LocalKind {
    fn width(&self) -> usize {
        match self {
            LocalKind::Long | LocalKind::Double => 2,
            _ => 1,
        }
    }
}

/// Field instructions
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum FieldAccess {
    GetStatic,
    PutStatic,
    GetField,
    PutField,
}

impl FieldAccess {
    pub fn opcode(self) -> Opcode {
        match self {
            FieldAccess::GetStatic => Opcode::GETSTATIC,
            FieldAccess::PutStatic => Opcode::PUTSTATIC,
            FieldAccess::GetField => Opcode::GETFIELD,
            FieldAccess::PutField => Opcode::PUTFIELD,
        }
    }

    pub fn is_get(self) -> bool {
        matches!(self, FieldAccess::GetStatic | FieldAccess::GetField)
    }

    pub fn is_static(self) -> bool {
        matches!(self, FieldAccess::GetStatic | FieldAccess::PutStatic)
    }
}

/// Type of method to invoke
///
/// Note: `invokedynamic` is kept separate because its constant is not a method reference.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum InvokeType {
    Virtual,
    Special,
    Static,
    Interface,
}

impl InvokeType {
    pub fn opcode(self) -> Opcode {
        match self {
            InvokeType::Virtual => Opcode::INVOKEVIRTUAL,
            InvokeType::Special => Opcode::INVOKESPECIAL,
            InvokeType::Static => Opcode::INVOKESTATIC,
            InvokeType::Interface => Opcode::INVOKEINTERFACE,
        }
    }

    /// Does the method get called on an object (which is then an implicit first argument)?
    pub fn has_receiver(self) -> bool {
        !matches!(self, InvokeType::Static)
    }
}

/// Binary comparison operators available for `int` branches
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum OrdComparison {
    EQ,
    GE,
    GT,
    LE,
    LT,
    NE,
}

impl Not for OrdComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            OrdComparison::EQ => OrdComparison::NE,
            OrdComparison::GE => OrdComparison::LT,
            OrdComparison::GT => OrdComparison::LE,
            OrdComparison::LE => OrdComparison::GT,
            OrdComparison::LT => OrdComparison::GE,
            OrdComparison::NE => OrdComparison::EQ,
        }
    }
}

/// Equality/inequality comparison operators
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum EqComparison {
    EQ,
    NE,
}

impl Not for EqComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            EqComparison::EQ => EqComparison::NE,
            EqComparison::NE => EqComparison::EQ,
        }
    }
}

/// Single-target branch instructions
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BranchKind {
    /// Compare an `int` to zero (`ifeq`, `iflt`, ...)
    If(OrdComparison),

    /// Compare two `int`s (`if_icmpeq`, `if_icmplt`, ...)
    IfICmp(OrdComparison),

    /// Compare two references (`if_acmpeq`, `if_acmpne`)
    IfACmp(EqComparison),

    /// Compare a reference to `null` (`ifnull`, `ifnonnull`)
    IfNull(EqComparison),

    Goto,
    Jsr,
}

impl BranchKind {
    /// Opcode of the short form
    pub fn opcode(self) -> Opcode {
        match self {
            BranchKind::If(OrdComparison::EQ) => Opcode::IFEQ,
            BranchKind::If(OrdComparison::NE) => Opcode::IFNE,
            BranchKind::If(OrdComparison::LT) => Opcode::IFLT,
            BranchKind::If(OrdComparison::GE) => Opcode::IFGE,
            BranchKind::If(OrdComparison::GT) => Opcode::IFGT,
            BranchKind::If(OrdComparison::LE) => Opcode::IFLE,
            BranchKind::IfICmp(OrdComparison::EQ) => Opcode::IF_ICMPEQ,
            BranchKind::IfICmp(OrdComparison::NE) => Opcode::IF_ICMPNE,
            BranchKind::IfICmp(OrdComparison::LT) => Opcode::IF_ICMPLT,
            BranchKind::IfICmp(OrdComparison::GE) => Opcode::IF_ICMPGE,
            BranchKind::IfICmp(OrdComparison::GT) => Opcode::IF_ICMPGT,
            BranchKind::IfICmp(OrdComparison::LE) => Opcode::IF_ICMPLE,
            BranchKind::IfACmp(EqComparison::EQ) => Opcode::IF_ACMPEQ,
            BranchKind::IfACmp(EqComparison::NE) => Opcode::IF_ACMPNE,
            BranchKind::IfNull(EqComparison::EQ) => Opcode::IFNULL,
            BranchKind::IfNull(EqComparison::NE) => Opcode::IFNONNULL,
            BranchKind::Goto => Opcode::GOTO,
            BranchKind::Jsr => Opcode::JSR,
        }
    }

    /// Inverse of `opcode`, accepting the `_w` forms too
    pub fn from_opcode(opcode: Opcode) -> Option<BranchKind> {
        const ORD: [OrdComparison; 6] = [
            OrdComparison::EQ,
            OrdComparison::NE,
            OrdComparison::LT,
            OrdComparison::GE,
            OrdComparison::GT,
            OrdComparison::LE,
        ];
        let kind = match opcode.0 {
            0x99..=0x9e => BranchKind::If(ORD[(opcode.0 - 0x99) as usize]),
            0x9f..=0xa4 => BranchKind::IfICmp(ORD[(opcode.0 - 0x9f) as usize]),
            0xa5 => BranchKind::IfACmp(EqComparison::EQ),
            0xa6 => BranchKind::IfACmp(EqComparison::NE),
            0xc6 => BranchKind::IfNull(EqComparison::EQ),
            0xc7 => BranchKind::IfNull(EqComparison::NE),
            0xa7 | 0xc8 => BranchKind::Goto,
            0xa8 | 0xc9 => BranchKind::Jsr,
            _ => return None,
        };
        Some(kind)
    }

    /// Opcode of the wide form, if there is a dedicated one
    pub fn wide_opcode(self) -> Option<Opcode> {
        match self {
            BranchKind::Goto => Some(Opcode::GOTO_W),
            BranchKind::Jsr => Some(Opcode::JSR_W),
            _ => None,
        }
    }

    pub fn is_conditional(self) -> bool {
        !matches!(self, BranchKind::Goto | BranchKind::Jsr)
    }

    /// Branch taken in exactly the cases this one is not (`goto` and `jsr` are unchanged)
    pub fn inverted(self) -> BranchKind {
        match self {
            BranchKind::If(op) => BranchKind::If(!op),
            BranchKind::IfICmp(op) => BranchKind::IfICmp(!op),
            BranchKind::IfACmp(op) => BranchKind::IfACmp(!op),
            BranchKind::IfNull(op) => BranchKind::IfNull(!op),
            BranchKind::Goto | BranchKind::Jsr => self,
        }
    }

    /// Encoded length
    ///
    /// Widened conditional branches are encoded as the inverted condition followed by a `goto_w`.
    pub fn length(self, widened: bool) -> usize {
        match (widened, self.wide_opcode()) {
            (false, _) => 3,
            (true, Some(_)) => 5,
            (true, None) => 8,
        }
    }

    /// Extra bytes needed if the branch gets widened
    pub fn widening_growth(self) -> usize {
        self.length(true) - self.length(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::ConstantValue;

    fn h(n: u32) -> InstructionHandle {
        InstructionHandle(n)
    }

    fn encode(insn: &Instruction, position: u32, widened: bool) -> Vec<ResolvedInstruction> {
        let pool = ConstantsPool::new();
        let positions = |handle: InstructionHandle| Ok(handle.0);
        let mut out = vec![];
        insn.encode(h(0), position, widened, &pool, &positions, &mut out)
            .unwrap();
        out
    }

    #[test]
    fn equality() {
        let target = h(3);
        let goto = Instruction::Branch(BranchKind::Goto, target);
        assert_ne!(goto, goto.clone());
        assert_eq!(Instruction::Simple(Opcode::IADD), Instruction::Simple(Opcode::IADD));
        assert_ne!(Instruction::Simple(Opcode::IADD), Instruction::Simple(Opcode::ISUB));
        assert_eq!(
            Instruction::NewArray(BaseType::Int),
            Instruction::NewArray(BaseType::Int)
        );
        assert_ne!(
            Instruction::NewArray(BaseType::Int),
            Instruction::NewArray(BaseType::Long)
        );
        assert_ne!(
            Instruction::Ldc(ConstantIndex(1)),
            Instruction::Ldc(ConstantIndex(2))
        );
        assert_eq!(
            Instruction::Load(LocalKind::Int, 4),
            Instruction::Load(LocalKind::Int, 4)
        );
    }

    #[test]
    fn local_variable_forms() {
        let short = Instruction::Load(LocalKind::Int, 2);
        assert_eq!(short.opcode(), Opcode::ILOAD_2);
        assert_eq!(short.length(0, false), 1);
        assert_eq!(encode(&short, 0, false)[0].operands, Vec::<u8>::new());

        let normal = Instruction::Store(LocalKind::Reference, 200);
        assert_eq!(normal.opcode(), Opcode::ASTORE);
        assert_eq!(normal.length(0, false), 2);
        assert_eq!(encode(&normal, 0, false)[0].operands, vec![200]);

        let wide = Instruction::Load(LocalKind::Double, 300);
        assert!(wide.is_wide());
        assert_eq!(wide.length(0, false), 4);
        let encoded = encode(&wide, 0, false);
        assert_eq!(encoded[0].opcode, Opcode::WIDE);
        assert_eq!(encoded[0].operands, vec![0x18, 0x01, 0x2c]);

        let iinc = Instruction::IInc(1, 1000);
        assert!(iinc.is_wide());
        assert_eq!(iinc.length(0, false), 6);
        assert_eq!(Instruction::IInc(1, -3).length(0, false), 3);
        assert_eq!(encode(&Instruction::IInc(1, -3), 0, false)[0].operands, vec![1, 0xfd]);
    }

    #[test]
    fn ldc_forms() {
        let mut pool = ConstantsPool::new();
        let idx = pool.add_value(&ConstantValue::Integer(123_456)).unwrap();
        let insn = Instruction::Ldc(idx);
        assert_eq!(insn.opcode(), Opcode::LDC);
        assert_eq!(insn.produce_stack(&pool).unwrap(), 1);
        assert_eq!(Instruction::Ldc(ConstantIndex(256)).opcode(), Opcode::LDC_W);
        assert_eq!(Instruction::Ldc(ConstantIndex(256)).length(0, false), 3);

        let long = pool.add_long(1 << 40).unwrap();
        assert_eq!(Instruction::Ldc2(long).produce_stack(&pool).unwrap(), 2);

        let mut out = vec![];
        let result = Instruction::Ldc(long).encode(h(0), 0, false, &pool, &|h| Ok(h.0), &mut out);
        assert!(matches!(result, Err(Error::UnexpectedConstant { .. })));
    }

    #[test]
    fn symbolic_stack_effects() {
        let mut pool = ConstantsPool::new();
        let println = pool
            .add_methodref("java/io/PrintStream", "println", "(J)V")
            .unwrap();
        let virtual_call = Instruction::Invoke(InvokeType::Virtual, println);
        assert_eq!(virtual_call.consume_stack(&pool).unwrap(), 3);
        assert_eq!(virtual_call.produce_stack(&pool).unwrap(), 0);

        let max = pool.add_methodref("java/lang/Math", "max", "(DD)D").unwrap();
        let static_call = Instruction::Invoke(InvokeType::Static, max);
        assert_eq!(static_call.consume_stack(&pool).unwrap(), 4);
        assert_eq!(static_call.produce_stack(&pool).unwrap(), 2);

        let out = pool
            .add_fieldref("java/lang/System", "out", "Ljava/io/PrintStream;")
            .unwrap();
        let get = Instruction::Field(FieldAccess::GetStatic, out);
        assert_eq!(get.consume_stack(&pool).unwrap(), 0);
        assert_eq!(get.produce_stack(&pool).unwrap(), 1);

        let counter = pool.add_fieldref("Counter", "total", "J").unwrap();
        let put = Instruction::Field(FieldAccess::PutField, counter);
        assert_eq!(put.consume_stack(&pool).unwrap(), 3);
        assert_eq!(put.produce_stack(&pool).unwrap(), 0);

        let class = pool.add_class("[[[I").unwrap();
        let multi = Instruction::MultiANewArray(class, 3);
        assert_eq!(multi.consume_stack(&pool).unwrap(), 3);
        assert_eq!(multi.produce_stack(&pool).unwrap(), 1);
    }

    #[test]
    fn interface_invoke_counts_arguments() {
        let mut pool = ConstantsPool::new();
        let put = pool
            .add_interface_methodref("java/util/Map", "put", "(Ljava/lang/Object;J)V")
            .unwrap();
        let mut out = vec![];
        Instruction::Invoke(InvokeType::Interface, put)
            .encode(h(0), 0, false, &pool, &|h| Ok(h.0), &mut out)
            .unwrap();
        let idx = ConstantIndex::from(put).0.to_be_bytes();
        assert_eq!(out[0].operands, vec![idx[0], idx[1], 4, 0]);
    }

    #[test]
    fn branch_encodings() {
        let short = Instruction::Branch(BranchKind::If(OrdComparison::LT), h(20));
        let encoded = encode(&short, 10, false);
        assert_eq!(encoded[0].opcode, Opcode::IFLT);
        assert_eq!(encoded[0].operands, vec![0, 10]);

        let goto_w = Instruction::Branch(BranchKind::Goto, h(4));
        let encoded = encode(&goto_w, 10, true);
        assert_eq!(encoded[0].opcode, Opcode::GOTO_W);
        assert_eq!(encoded[0].operands, vec![0xff, 0xff, 0xff, 0xfa]);
        assert_eq!(goto_w.length(10, true), 5);

        let widened = Instruction::Branch(BranchKind::IfNull(EqComparison::EQ), h(100));
        assert_eq!(widened.length(10, true), 8);
        let encoded = encode(&widened, 10, true);
        assert_eq!(
            encoded,
            vec![
                ResolvedInstruction {
                    position: 10,
                    opcode: Opcode::IFNONNULL,
                    operands: vec![0, 8],
                },
                ResolvedInstruction {
                    position: 13,
                    opcode: Opcode::GOTO_W,
                    operands: vec![0, 0, 0, 87],
                },
            ]
        );
    }

    #[test]
    fn short_branch_overflow() {
        let branch = Instruction::Branch(BranchKind::Goto, h(40_000));
        let mut out = vec![];
        let result = branch.encode(
            h(7),
            0,
            false,
            &ConstantsPool::new(),
            &|h| Ok(h.0),
            &mut out,
        );
        match result {
            Err(Error::JumpOverflow {
                branch,
                displacement,
            }) => {
                assert_eq!(branch, h(7));
                assert_eq!(displacement, 40_000);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
    }

    #[test]
    fn branch_kinds() {
        assert_eq!(
            BranchKind::from_opcode(Opcode::IF_ICMPGE),
            Some(BranchKind::IfICmp(OrdComparison::GE))
        );
        assert_eq!(BranchKind::from_opcode(Opcode::GOTO_W), Some(BranchKind::Goto));
        assert_eq!(BranchKind::from_opcode(Opcode::IADD), None);
        assert_eq!(
            BranchKind::If(OrdComparison::GT).inverted(),
            BranchKind::If(OrdComparison::LE)
        );
        assert_eq!(BranchKind::Jsr.widening_growth(), 2);
        assert_eq!(BranchKind::IfICmp(OrdComparison::EQ).widening_growth(), 5);
    }

    #[test]
    fn validation() {
        assert!(Instruction::Simple(Opcode::IADD).validate().is_ok());
        assert!(Instruction::Simple(Opcode::BIPUSH).validate().is_err());
        assert!(Instruction::Simple(Opcode::ILOAD_0).validate().is_err());
        assert!(Instruction::Simple(Opcode::WIDE).validate().is_err());
        assert!(Instruction::Simple(Opcode(0xfe)).validate().is_err());
        let mut pool = ConstantsPool::new();
        let class = pool.add_class("[[I").unwrap();
        assert!(Instruction::MultiANewArray(class, 0).validate().is_err());
        assert!(Instruction::MultiANewArray(class, 2).validate().is_ok());
    }

    #[test]
    fn rendering() {
        let mut pool = ConstantsPool::new();
        let string = pool.add_string("hi").unwrap();
        let ldc = Instruction::Ldc(string.into());
        assert_eq!(ldc.to_string(), format!("ldc #{}", ConstantIndex::from(string).0));
        assert_eq!(
            ldc.render_with(Some(&pool), &|h| h.to_string()),
            format!("ldc #{} // \"hi\"", ConstantIndex::from(string).0)
        );
        assert_eq!(Instruction::Load(LocalKind::Long, 1).to_string(), "lload_1");
        assert_eq!(Instruction::IInc(4, -1).to_string(), "iinc 4 -1");
        assert_eq!(Instruction::NewArray(BaseType::Int).to_string(), "newarray int");
    }
}
