use super::{FieldAccess, Instruction, InstructionHandle, InvokeType, LocalKind, Opcode, Select};
use crate::jvm::class_file::{ConstantValue, ConstantsPool};
use crate::jvm::{
    ArrayType, Error, FieldType, MethodDescriptor, RefType, RenderDescriptor, UnqualifiedName,
    Name,
};
use crate::Settings;
use std::convert::TryFrom;

/// Build instructions without having to think about the constants pool or the shortest encoding
///
/// Every helper adds whatever constants the instruction needs to the pool and returns the
/// instruction, ready to be appended to an `InstructionList`.
pub struct InstructionFactory<'a> {
    pub pool: &'a mut ConstantsPool,
    pub settings: &'a Settings,
}

impl<'a> InstructionFactory<'a> {
    pub fn new(pool: &'a mut ConstantsPool, settings: &'a Settings) -> InstructionFactory<'a> {
        InstructionFactory { pool, settings }
    }

    /// Push a constant onto the stack
    ///
    /// Small values use the dedicated instructions (`iconst_*`, `bipush`, `sipush`, `fconst_*`,
    /// `lconst_*`, `dconst_*`), everything else goes through `ldc`/`ldc_w`/`ldc2_w`.
    pub fn constant(&mut self, value: &ConstantValue) -> Result<Instruction, Error> {
        let instruction = match value {
            ConstantValue::Integer(integer) => match *integer {
                -1..=5 => {
                    let opcode = Opcode::ICONST_0.0 as i32 + integer;
                    Instruction::Simple(Opcode(opcode as u8))
                }
                i if i8::try_from(i).is_ok() => Instruction::BiPush(i as i8),
                i if i16::try_from(i).is_ok() => Instruction::SiPush(i as i16),
                _ => Instruction::Ldc(self.pool.add_value(value)?),
            },

            // Compare bits so that `-0.0` does not turn into `fconst_0`
            ConstantValue::Float(float) if float.to_bits() == 0.0f32.to_bits() => {
                Instruction::Simple(Opcode::FCONST_0)
            }
            ConstantValue::Float(float) if *float == 1.0 => Instruction::Simple(Opcode::FCONST_1),
            ConstantValue::Float(float) if *float == 2.0 => Instruction::Simple(Opcode::FCONST_2),

            ConstantValue::Long(0) => Instruction::Simple(Opcode::LCONST_0),
            ConstantValue::Long(1) => Instruction::Simple(Opcode::LCONST_1),

            ConstantValue::Double(double) if double.to_bits() == 0.0f64.to_bits() => {
                Instruction::Simple(Opcode::DCONST_0)
            }
            ConstantValue::Double(double) if *double == 1.0 => Instruction::Simple(Opcode::DCONST_1),

            ConstantValue::Long(_) | ConstantValue::Double(_) => {
                Instruction::Ldc2(self.pool.add_value(value)?)
            }
            ConstantValue::Float(_) | ConstantValue::String(_) => {
                Instruction::Ldc(self.pool.add_value(value)?)
            }
        };
        Ok(instruction)
    }

    /// Push `null`
    pub fn null(&self) -> Instruction {
        Instruction::Simple(Opcode::ACONST_NULL)
    }

    /// Push a `java/lang/Class` object for the type
    pub fn class_literal(&mut self, ref_type: &RefType) -> Result<Instruction, Error> {
        let class = self.pool.add_ref_type(ref_type)?;
        Ok(Instruction::Ldc(class.into()))
    }

    /// Load a local variable of the given type
    pub fn load(&self, field_type: &FieldType, slot: usize) -> Result<Instruction, Error> {
        Ok(Instruction::Load(LocalKind::for_type(field_type), local_slot(slot)?))
    }

    /// Store into a local variable of the given type
    pub fn store(&self, field_type: &FieldType, slot: usize) -> Result<Instruction, Error> {
        Ok(Instruction::Store(LocalKind::for_type(field_type), local_slot(slot)?))
    }

    /// Increment an `int` local variable
    pub fn increment(&self, slot: usize, increment: i16) -> Result<Instruction, Error> {
        Ok(Instruction::IInc(local_slot(slot)?, increment))
    }

    /// Return from the method (`None` for `void`)
    pub fn return_(&self, return_type: Option<&FieldType>) -> Instruction {
        match return_type {
            None => Instruction::RETURN,
            Some(typ) => Instruction::Simple(LocalKind::for_type(typ).return_opcode()),
        }
    }

    /// Invoke a method, adding the method reference (or interface method reference) to the pool
    pub fn invoke(
        &mut self,
        kind: InvokeType,
        class: &str,
        name: &str,
        descriptor: &MethodDescriptor,
    ) -> Result<Instruction, Error> {
        let rendered = descriptor.render();
        let method = if kind == InvokeType::Interface {
            self.pool.add_interface_methodref(class, name, &rendered)?
        } else {
            self.pool.add_methodref(class, name, &rendered)?
        };
        Ok(Instruction::Invoke(kind, method))
    }

    /// Invoke dynamic call site bootstrapped by the given entry of the `BootstrapMethods`
    /// attribute
    pub fn invoke_dynamic(
        &mut self,
        bootstrap_method: u16,
        name: &UnqualifiedName,
        descriptor: &MethodDescriptor,
    ) -> Result<Instruction, Error> {
        let call_site =
            self.pool
                .add_invoke_dynamic(bootstrap_method, name.as_str(), &descriptor.render())?;
        Ok(Instruction::InvokeDynamic(call_site))
    }

    pub fn field_access(
        &mut self,
        access: FieldAccess,
        class: &str,
        name: &str,
        field_type: &FieldType,
    ) -> Result<Instruction, Error> {
        let field = self.pool.add_fieldref(class, name, &field_type.render())?;
        Ok(Instruction::Field(access, field))
    }

    /// Allocate an uninitialized object (the constructor still needs to be called)
    pub fn new_object(&mut self, class: &str) -> Result<Instruction, Error> {
        Ok(Instruction::New(self.pool.add_class(class)?))
    }

    /// Allocate an array with `dimensions` dimensions of `element_type`
    ///
    /// The dimension lengths are expected on the stack. One dimension uses `newarray` (base
    /// types) or `anewarray` (everything else), several use `multianewarray`.
    pub fn new_array(
        &mut self,
        element_type: &FieldType,
        dimensions: usize,
    ) -> Result<Instruction, Error> {
        match (dimensions, element_type) {
            (0, _) => Err(Error::InvalidArrayDimensions(0)),
            (1, FieldType::Base(base)) => Ok(Instruction::NewArray(*base)),
            (1, FieldType::Ref(ref_type)) => {
                Ok(Instruction::ANewArray(self.pool.add_ref_type(ref_type)?))
            }
            (dimensions, _) if dimensions > ArrayType::MAX_DIMENSIONS => {
                Err(Error::InvalidArrayDimensions(dimensions))
            }
            _ => {
                let mut array_type = RefType::array(element_type.clone())?;
                for _ in 1..dimensions {
                    array_type = RefType::array(FieldType::Ref(array_type))?;
                }
                let class = self.pool.add_ref_type(&array_type)?;
                Ok(Instruction::MultiANewArray(class, dimensions as u8))
            }
        }
    }

    pub fn check_cast(&mut self, ref_type: &RefType) -> Result<Instruction, Error> {
        Ok(Instruction::CheckCast(self.pool.add_ref_type(ref_type)?))
    }

    pub fn instance_of(&mut self, ref_type: &RefType) -> Result<Instruction, Error> {
        Ok(Instruction::InstanceOf(self.pool.add_ref_type(ref_type)?))
    }

    /// Switch over the match values, using the configured maximum gap to pick its form
    pub fn select(
        &self,
        matches: Vec<(i32, InstructionHandle)>,
        default: InstructionHandle,
    ) -> Result<Instruction, Error> {
        Select::new(matches, default, self.settings.max_switch_gap).map(Instruction::Switch)
    }
}

fn local_slot(slot: usize) -> Result<u16, Error> {
    u16::try_from(slot).map_err(|_| Error::InvalidLocalIndex(slot))
}
