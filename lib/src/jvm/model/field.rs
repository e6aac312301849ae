use crate::jvm::class_file::{ConstantIndex, ConstantValue, ConstantsPool, Utf8ConstantIndex};
use crate::jvm::{
    BaseType, BinaryName, Error, FieldAccessFlags, FieldType, Name, RefType, RenderDescriptor,
    UnqualifiedName,
};

/// Field under construction
pub struct FieldBuilder {
    pub access_flags: FieldAccessFlags,
    pub name: UnqualifiedName,
    pub field_type: FieldType,

    /// Initial value, stored in the `ConstantValue` attribute
    constant_value: Option<ConstantValue>,
}

impl FieldBuilder {
    pub fn new(
        access_flags: FieldAccessFlags,
        name: UnqualifiedName,
        field_type: FieldType,
    ) -> FieldBuilder {
        FieldBuilder {
            access_flags,
            name,
            field_type,
            constant_value: None,
        }
    }

    pub fn constant_value(&self) -> Option<&ConstantValue> {
        self.constant_value.as_ref()
    }

    /// Set the constant initial value of a `final` field
    ///
    /// `int` constants initialize `int`, `short`, `char`, `byte`, and `boolean` fields. Strings
    /// only initialize `java/lang/String` fields.
    pub fn set_constant_value(&mut self, value: ConstantValue) -> Result<(), Error> {
        if !self.access_flags.contains(FieldAccessFlags::FINAL) {
            return Err(Error::ConstantValueOnNonFinalField(self.name.clone()));
        }

        let compatible = match (&value, &self.field_type) {
            (ConstantValue::Integer(_), FieldType::Base(base)) => matches!(
                base,
                BaseType::Int | BaseType::Short | BaseType::Char | BaseType::Byte | BaseType::Boolean
            ),
            (ConstantValue::Long(_), FieldType::Base(BaseType::Long)) => true,
            (ConstantValue::Float(_), FieldType::Base(BaseType::Float)) => true,
            (ConstantValue::Double(_), FieldType::Base(BaseType::Double)) => true,
            (ConstantValue::String(_), FieldType::Ref(RefType::Object(class))) => {
                class == &BinaryName::STRING
            }
            _ => false,
        };
        if !compatible {
            return Err(Error::IncompatibleConstantValue {
                field: self.name.clone(),
                descriptor: self.field_type.render(),
            });
        }

        self.constant_value = Some(value);
        Ok(())
    }

    pub fn clear_constant_value(&mut self) -> Option<ConstantValue> {
        self.constant_value.take()
    }

    /// Resolve the field into the constants pool
    ///
    /// Fails if the field carries a constant value but `FINAL` was cleared since it was set.
    pub fn finish(&self, pool: &mut ConstantsPool) -> Result<Field, Error> {
        if self.constant_value.is_some() && !self.access_flags.contains(FieldAccessFlags::FINAL) {
            return Err(Error::ConstantValueOnNonFinalField(self.name.clone()));
        }
        let name_index = pool.add_utf8(self.name.as_str())?;
        let descriptor_index = pool.add_utf8(self.field_type.render())?;
        let constant_value = match &self.constant_value {
            None => None,
            Some(value) => Some(pool.add_value(value)?),
        };
        Ok(Field {
            access_flags: self.access_flags,
            name_index,
            descriptor_index,
            constant_value,
        })
    }
}

/// Finished field, with every name and type resolved into the constants pool
#[derive(Debug)]
pub struct Field {
    pub access_flags: FieldAccessFlags,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,
    pub constant_value: Option<ConstantIndex>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn field(flags: FieldAccessFlags, field_type: FieldType) -> FieldBuilder {
        let name = UnqualifiedName::from_string(String::from("LIMIT")).unwrap();
        FieldBuilder::new(flags, name, field_type)
    }

    #[test]
    fn constant_values_need_final() {
        let mut limit = field(FieldAccessFlags::STATIC, FieldType::int());
        assert!(matches!(
            limit.set_constant_value(ConstantValue::Integer(3)),
            Err(Error::ConstantValueOnNonFinalField(_))
        ));
        assert!(limit.constant_value().is_none());
    }

    #[test]
    fn constant_values_match_types() {
        let flags = FieldAccessFlags::STATIC | FieldAccessFlags::FINAL;

        let mut flag = field(flags, FieldType::boolean());
        flag.set_constant_value(ConstantValue::Integer(1)).unwrap();
        assert!(matches!(
            flag.set_constant_value(ConstantValue::Long(1)),
            Err(Error::IncompatibleConstantValue { descriptor, .. }) if descriptor == "Z"
        ));

        let mut string = field(flags, FieldType::object(BinaryName::STRING));
        string
            .set_constant_value(ConstantValue::String(String::from("hi")))
            .unwrap();
        let mut object = field(flags, FieldType::object(BinaryName::OBJECT));
        assert!(object
            .set_constant_value(ConstantValue::String(String::from("hi")))
            .is_err());
    }

    #[test]
    fn finishing() {
        let flags = FieldAccessFlags::STATIC | FieldAccessFlags::FINAL;
        let mut limit = field(flags, FieldType::long());
        limit.set_constant_value(ConstantValue::Long(1 << 40)).unwrap();

        let mut pool = ConstantsPool::new();
        let finished = limit.finish(&mut pool).unwrap();
        assert_eq!(pool.get_utf8(finished.name_index).unwrap(), "LIMIT");
        assert_eq!(pool.get_utf8(finished.descriptor_index).unwrap(), "J");
        assert_eq!(finished.constant_value, pool.lookup_long(1 << 40));
    }

    #[test]
    fn clearing_final_keeps_constant_out() {
        let mut limit = field(FieldAccessFlags::STATIC | FieldAccessFlags::FINAL, FieldType::int());
        limit.set_constant_value(ConstantValue::Integer(10)).unwrap();
        limit.access_flags.remove(FieldAccessFlags::FINAL);

        let mut pool = ConstantsPool::new();
        assert!(matches!(
            limit.finish(&mut pool),
            Err(Error::ConstantValueOnNonFinalField(_))
        ));

        limit.clear_constant_value();
        assert!(limit.finish(&mut pool).unwrap().constant_value.is_none());
    }
}
