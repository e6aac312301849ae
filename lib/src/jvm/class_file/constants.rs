use crate::jvm::{
    normalize_class_name, Error, FieldType, MethodDescriptor, ParseDescriptor, RefType,
};
use crate::util::{Offset, OffsetResult, OffsetVec, Width};
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::result::Result;

/// Minimum number of free entries kept in the backing storage before it gets doubled
const MIN_HEADROOM: usize = 16;

/// Class file constants pool builder
///
/// Every `add_*` method is "get or insert": adding the same (kind, content) pair twice always
/// returns the same index, no matter what was added in between. The `lookup_*` methods answer the
/// same question without ever inserting anything.
///
/// Index 0 is reserved, and `long`/`double` constants take up two slots. Once the pool is fully
/// built up, it can be consumed into its final list of entries with [`ConstantsPool::into_entries`].
pub struct ConstantsPool {
    constants: OffsetVec<Constant>,

    utf8s: HashMap<String, Utf8ConstantIndex>,
    classes: HashMap<Utf8ConstantIndex, ClassConstantIndex>,
    strings: HashMap<Utf8ConstantIndex, StringConstantIndex>,
    integers: HashMap<i32, ConstantIndex>,
    floats: HashMap<u32, ConstantIndex>,
    longs: HashMap<i64, ConstantIndex>,
    doubles: HashMap<u64, ConstantIndex>,
    name_and_types: HashMap<(Utf8ConstantIndex, Utf8ConstantIndex), NameAndTypeConstantIndex>,
    fieldrefs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), FieldRefConstantIndex>,
    methodrefs:
        HashMap<(ClassConstantIndex, NameAndTypeConstantIndex, bool), MethodRefConstantIndex>,
    method_handles: HashMap<(HandleKind, ConstantIndex), ConstantIndex>,
    method_types: HashMap<Utf8ConstantIndex, ConstantIndex>,
    invoke_dynamics: HashMap<(u16, NameAndTypeConstantIndex), InvokeDynamicConstantIndex>,
    modules: HashMap<Utf8ConstantIndex, ConstantIndex>,
    packages: HashMap<Utf8ConstantIndex, ConstantIndex>,
}

impl Default for ConstantsPool {
    fn default() -> Self {
        ConstantsPool::new()
    }
}

impl ConstantsPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantsPool {
        ConstantsPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            strings: HashMap::new(),
            integers: HashMap::new(),
            floats: HashMap::new(),
            longs: HashMap::new(),
            doubles: HashMap::new(),
            name_and_types: HashMap::new(),
            fieldrefs: HashMap::new(),
            methodrefs: HashMap::new(),
            method_handles: HashMap::new(),
            method_types: HashMap::new(),
            invoke_dynamics: HashMap::new(),
            modules: HashMap::new(),
            packages: HashMap::new(),
        }
    }

    /// Number of slots used, including the reserved slot 0 and the unusable halves of wide
    /// constants (this is the `constant_pool_count` of the class file)
    pub fn len(&self) -> usize {
        self.constants.offset_len().0
    }

    /// Number of constants in the pool
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.len() == 0
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65535, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let offset = self.constants.offset_len().0;

        // Detect if the next constant would overflow the pool
        if offset + constant.width() > u16::MAX as usize + 1 {
            return Err(ConstantPoolOverflow {
                constant,
                offset: offset as u16,
            });
        }

        self.constants.ensure_headroom(MIN_HEADROOM);
        log::trace!("Adding constant #{} = {:?}", offset, constant);
        self.constants.push(constant);
        Ok(ConstantIndex(offset as u16))
    }

    /// Consume the pool and return the final list of entries, indexed by constant index
    ///
    /// Slot 0 and the second slot of every `long`/`double` are `None`.
    pub fn into_entries(self) -> Vec<Option<Constant>> {
        let mut entries: Vec<Option<Constant>> = Vec::with_capacity(self.len());
        entries.push(None);
        for (_, constant) in self.constants.into_entries() {
            let width = constant.width();
            entries.push(Some(constant));
            for _ in 1..width {
                entries.push(None);
            }
        }
        entries
    }

    /// Iterate over all the constants, along with their index
    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &Constant)> + '_ {
        self.constants
            .iter()
            .map(|(offset, _, constant)| (ConstantIndex(offset.0 as u16), constant))
    }

    /// Look up the constant at an index
    pub fn get(&self, index: impl Into<ConstantIndex>) -> Result<&Constant, Error> {
        let index = index.into();
        match self.constants.get_offset(Offset(index.0 as usize)) {
            OffsetResult::Ok(_, constant) => Ok(constant),
            OffsetResult::InvalidOffset(_) => Err(Error::UnusableConstantSlot(index)),
            OffsetResult::TooSmall | OffsetResult::TooLarge => Err(Error::MissingConstant(index)),
        }
    }

    // ----------------------------------------------------------------------------------------
    // Adding constants

    /// Get or insert a utf8 constant
    pub fn add_utf8<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        utf8: S,
    ) -> Result<Utf8ConstantIndex, ConstantPoolOverflow> {
        let cow = utf8.into();

        if let Some(idx) = self.utf8s.get::<str>(cow.borrow()) {
            Ok(*idx)
        } else {
            let owned = cow.into_owned();
            let constant = Constant::Utf8(owned.clone());
            let idx = Utf8ConstantIndex(self.push_constant(constant)?);
            self.utf8s.insert(owned, idx);
            Ok(idx)
        }
    }

    /// Get or insert a class constant
    ///
    /// The name may use either `.` or `/` as a package separator. Array classes are named by
    /// their descriptor (eg. `[I`).
    pub fn add_class(&mut self, name: &str) -> Result<ClassConstantIndex, ConstantPoolOverflow> {
        let name = self.add_utf8(normalize_class_name(name))?;
        if let Some(idx) = self.classes.get(&name) {
            Ok(*idx)
        } else {
            let idx = ClassConstantIndex(self.push_constant(Constant::Class(name))?);
            self.classes.insert(name, idx);
            Ok(idx)
        }
    }

    /// Get or insert the class constant for a reference type (possibly an array type)
    pub fn add_ref_type(
        &mut self,
        ref_type: &RefType,
    ) -> Result<ClassConstantIndex, ConstantPoolOverflow> {
        self.add_class(&ref_type.class_name())
    }

    /// Get or insert a string constant
    pub fn add_string(&mut self, string: &str) -> Result<StringConstantIndex, ConstantPoolOverflow> {
        let utf8 = self.add_utf8(string)?;
        if let Some(idx) = self.strings.get(&utf8) {
            Ok(*idx)
        } else {
            let idx = StringConstantIndex(self.push_constant(Constant::String(utf8))?);
            self.strings.insert(utf8, idx);
            Ok(idx)
        }
    }

    pub fn add_integer(&mut self, integer: i32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.integers.get(&integer) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Integer(integer))?;
            self.integers.insert(integer, idx);
            Ok(idx)
        }
    }

    /// Get or insert a float constant
    ///
    /// Floats are deduplicated by their bit pattern, so `0.0` and `-0.0` are distinct, and
    /// identical NaNs are shared.
    pub fn add_float(&mut self, float: f32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let bits = float.to_bits();
        if let Some(idx) = self.floats.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Float(float))?;
            self.floats.insert(bits, idx);
            Ok(idx)
        }
    }

    pub fn add_long(&mut self, long: i64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.longs.get(&long) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Long(long))?;
            self.longs.insert(long, idx);
            Ok(idx)
        }
    }

    /// Get or insert a double constant (deduplicated by bit pattern, like floats)
    pub fn add_double(&mut self, double: f64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let bits = double.to_bits();
        if let Some(idx) = self.doubles.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Double(double))?;
            self.doubles.insert(bits, idx);
            Ok(idx)
        }
    }

    /// Get or insert whatever constant is needed to load the value with `ldc`/`ldc2_w`
    pub fn add_value(&mut self, value: &ConstantValue) -> Result<ConstantIndex, ConstantPoolOverflow> {
        match value {
            ConstantValue::Integer(integer) => self.add_integer(*integer),
            ConstantValue::Float(float) => self.add_float(*float),
            ConstantValue::Long(long) => self.add_long(*long),
            ConstantValue::Double(double) => self.add_double(*double),
            ConstantValue::String(string) => self.add_string(string).map(Into::into),
        }
    }

    /// Get or insert a name & type constant
    pub fn add_name_and_type(
        &mut self,
        name: &str,
        descriptor: &str,
    ) -> Result<NameAndTypeConstantIndex, ConstantPoolOverflow> {
        let name = self.add_utf8(name)?;
        let descriptor = self.add_utf8(descriptor)?;
        let key = (name, descriptor);
        if let Some(idx) = self.name_and_types.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::NameAndType { name, descriptor };
            let idx = NameAndTypeConstantIndex(self.push_constant(constant)?);
            self.name_and_types.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a `CONSTANT_Fieldref_info`
    pub fn add_fieldref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<FieldRefConstantIndex, ConstantPoolOverflow> {
        let class = self.add_class(class)?;
        let name_and_type = self.add_name_and_type(name, descriptor)?;
        let key = (class, name_and_type);
        if let Some(idx) = self.fieldrefs.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::FieldRef(class, name_and_type);
            let idx = FieldRefConstantIndex(self.push_constant(constant)?);
            self.fieldrefs.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a `CONSTANT_Methodref_info`
    pub fn add_methodref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<MethodRefConstantIndex, ConstantPoolOverflow> {
        self.add_method_or_interface_methodref(class, name, descriptor, false)
    }

    /// Get or insert a `CONSTANT_InterfaceMethodref_info`
    pub fn add_interface_methodref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<MethodRefConstantIndex, ConstantPoolOverflow> {
        self.add_method_or_interface_methodref(class, name, descriptor, true)
    }

    fn add_method_or_interface_methodref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
        is_interface: bool,
    ) -> Result<MethodRefConstantIndex, ConstantPoolOverflow> {
        let class = self.add_class(class)?;
        let name_and_type = self.add_name_and_type(name, descriptor)?;
        let key = (class, name_and_type, is_interface);
        if let Some(idx) = self.methodrefs.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            };
            let idx = MethodRefConstantIndex(self.push_constant(constant)?);
            self.methodrefs.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a method handle constant
    ///
    /// The member should be a field reference for the field handle kinds and a method reference
    /// for the rest.
    pub fn add_method_handle(
        &mut self,
        handle_kind: HandleKind,
        member: ConstantIndex,
    ) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let key = (handle_kind, member);
        if let Some(idx) = self.method_handles.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::MethodHandle {
                handle_kind,
                member,
            };
            let idx = self.push_constant(constant)?;
            self.method_handles.insert(key, idx);
            Ok(idx)
        }
    }

    pub fn add_method_type(&mut self, descriptor: &str) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let descriptor = self.add_utf8(descriptor)?;
        if let Some(idx) = self.method_types.get(&descriptor) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::MethodType { descriptor })?;
            self.method_types.insert(descriptor, idx);
            Ok(idx)
        }
    }

    /// Get or insert an invoke dynamic constant
    ///
    /// The bootstrap method is an index into the `BootstrapMethods` attribute of the class.
    pub fn add_invoke_dynamic(
        &mut self,
        bootstrap_method: u16,
        name: &str,
        descriptor: &str,
    ) -> Result<InvokeDynamicConstantIndex, ConstantPoolOverflow> {
        let method_descriptor = self.add_name_and_type(name, descriptor)?;
        let key = (bootstrap_method, method_descriptor);
        if let Some(idx) = self.invoke_dynamics.get(&key) {
            Ok(*idx)
        } else {
            let constant = Constant::InvokeDynamic {
                bootstrap_method,
                method_descriptor,
            };
            let idx = InvokeDynamicConstantIndex(self.push_constant(constant)?);
            self.invoke_dynamics.insert(key, idx);
            Ok(idx)
        }
    }

    pub fn add_module(&mut self, name: &str) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let name = self.add_utf8(name)?;
        if let Some(idx) = self.modules.get(&name) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Module(name))?;
            self.modules.insert(name, idx);
            Ok(idx)
        }
    }

    /// Get or insert a package constant (the name uses `/` separators, like class names)
    pub fn add_package(&mut self, name: &str) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let name = self.add_utf8(normalize_class_name(name))?;
        if let Some(idx) = self.packages.get(&name) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Package(name))?;
            self.packages.insert(name, idx);
            Ok(idx)
        }
    }

    /// Import a constant from another pool into this one
    ///
    /// Constants that the imported constant refers to (eg. the class and name & type of a method
    /// reference) are imported too, so the result never mentions indices of the other pool. The
    /// foreign constant is fully resolved before anything is added here, so a dangling reference
    /// in the other pool leaves this pool untouched.
    pub fn add_constant(
        &mut self,
        index: ConstantIndex,
        from: &ConstantsPool,
    ) -> Result<ConstantIndex, Error> {
        let symbolic = from.symbolic_constant(index)?;
        log::trace!("Importing foreign constant #{} = {:?}", index.0, symbolic);
        self.add_symbolic(&symbolic)
    }

    fn add_symbolic(&mut self, symbolic: &SymbolicConstant) -> Result<ConstantIndex, Error> {
        let idx: ConstantIndex = match symbolic {
            SymbolicConstant::Utf8(utf8) => self.add_utf8(utf8.as_str())?.into(),
            SymbolicConstant::Class(name) => self.add_class(name)?.into(),
            SymbolicConstant::String(string) => self.add_string(string)?.into(),
            SymbolicConstant::Integer(integer) => self.add_integer(*integer)?,
            SymbolicConstant::Float(float) => self.add_float(*float)?,
            SymbolicConstant::Long(long) => self.add_long(*long)?,
            SymbolicConstant::Double(double) => self.add_double(*double)?,
            SymbolicConstant::NameAndType(name, descriptor) => {
                self.add_name_and_type(name, descriptor)?.into()
            }
            SymbolicConstant::FieldRef(member) => self
                .add_fieldref(&member.class, &member.name, &member.descriptor)?
                .into(),
            SymbolicConstant::MethodRef(member) => self
                .add_method_or_interface_methodref(
                    &member.class,
                    &member.name,
                    &member.descriptor,
                    member.is_interface,
                )?
                .into(),
            SymbolicConstant::MethodHandle(handle_kind, member) => {
                let member = self.add_symbolic(member)?;
                self.add_method_handle(*handle_kind, member)?
            }
            SymbolicConstant::MethodType(descriptor) => self.add_method_type(descriptor)?,
            SymbolicConstant::InvokeDynamic(bootstrap_method, name, descriptor) => self
                .add_invoke_dynamic(*bootstrap_method, name, descriptor)?
                .into(),
            SymbolicConstant::Module(name) => self.add_module(name)?,
            SymbolicConstant::Package(name) => self.add_package(name)?,
        };
        Ok(idx)
    }

    /// Resolve a constant and everything it refers to into an index-free representation
    fn symbolic_constant(&self, index: ConstantIndex) -> Result<SymbolicConstant, Error> {
        let symbolic = match self.get(index)? {
            Constant::Utf8(utf8) => SymbolicConstant::Utf8(utf8.clone()),
            Constant::Class(name) => SymbolicConstant::Class(self.get_utf8(*name)?.to_owned()),
            Constant::String(string) => {
                SymbolicConstant::String(self.get_utf8(*string)?.to_owned())
            }
            Constant::Integer(integer) => SymbolicConstant::Integer(*integer),
            Constant::Float(float) => SymbolicConstant::Float(*float),
            Constant::Long(long) => SymbolicConstant::Long(*long),
            Constant::Double(double) => SymbolicConstant::Double(*double),
            Constant::NameAndType { name, descriptor } => SymbolicConstant::NameAndType(
                self.get_utf8(*name)?.to_owned(),
                self.get_utf8(*descriptor)?.to_owned(),
            ),
            Constant::FieldRef(..) => SymbolicConstant::FieldRef(self.member_ref(index)?.into_owned()),
            Constant::MethodRef { .. } => {
                SymbolicConstant::MethodRef(self.member_ref(index)?.into_owned())
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                let member = self.symbolic_constant(*member)?;
                SymbolicConstant::MethodHandle(*handle_kind, Box::new(member))
            }
            Constant::MethodType { descriptor } => {
                SymbolicConstant::MethodType(self.get_utf8(*descriptor)?.to_owned())
            }
            Constant::InvokeDynamic {
                bootstrap_method,
                method_descriptor,
            } => {
                let (name, descriptor) = self.name_and_type(*method_descriptor)?;
                SymbolicConstant::InvokeDynamic(
                    *bootstrap_method,
                    name.to_owned(),
                    descriptor.to_owned(),
                )
            }
            Constant::Module(name) => SymbolicConstant::Module(self.get_utf8(*name)?.to_owned()),
            Constant::Package(name) => SymbolicConstant::Package(self.get_utf8(*name)?.to_owned()),
        };
        Ok(symbolic)
    }

    // ----------------------------------------------------------------------------------------
    // Looking up constants without adding them

    pub fn lookup_utf8(&self, utf8: &str) -> Option<Utf8ConstantIndex> {
        self.utf8s.get(utf8).copied()
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassConstantIndex> {
        let name = self.lookup_utf8(&normalize_class_name(name))?;
        self.classes.get(&name).copied()
    }

    pub fn lookup_string(&self, string: &str) -> Option<StringConstantIndex> {
        let utf8 = self.lookup_utf8(string)?;
        self.strings.get(&utf8).copied()
    }

    pub fn lookup_integer(&self, integer: i32) -> Option<ConstantIndex> {
        self.integers.get(&integer).copied()
    }

    pub fn lookup_float(&self, float: f32) -> Option<ConstantIndex> {
        self.floats.get(&float.to_bits()).copied()
    }

    pub fn lookup_long(&self, long: i64) -> Option<ConstantIndex> {
        self.longs.get(&long).copied()
    }

    pub fn lookup_double(&self, double: f64) -> Option<ConstantIndex> {
        self.doubles.get(&double.to_bits()).copied()
    }

    pub fn lookup_name_and_type(
        &self,
        name: &str,
        descriptor: &str,
    ) -> Option<NameAndTypeConstantIndex> {
        let key = (self.lookup_utf8(name)?, self.lookup_utf8(descriptor)?);
        self.name_and_types.get(&key).copied()
    }

    pub fn lookup_fieldref(
        &self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<FieldRefConstantIndex> {
        let key = (
            self.lookup_class(class)?,
            self.lookup_name_and_type(name, descriptor)?,
        );
        self.fieldrefs.get(&key).copied()
    }

    pub fn lookup_methodref(
        &self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<MethodRefConstantIndex> {
        self.lookup_method_or_interface_methodref(class, name, descriptor, false)
    }

    pub fn lookup_interface_methodref(
        &self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<MethodRefConstantIndex> {
        self.lookup_method_or_interface_methodref(class, name, descriptor, true)
    }

    fn lookup_method_or_interface_methodref(
        &self,
        class: &str,
        name: &str,
        descriptor: &str,
        is_interface: bool,
    ) -> Option<MethodRefConstantIndex> {
        let key = (
            self.lookup_class(class)?,
            self.lookup_name_and_type(name, descriptor)?,
            is_interface,
        );
        self.methodrefs.get(&key).copied()
    }

    // ----------------------------------------------------------------------------------------
    // Resolving constants

    pub fn get_utf8(&self, index: impl Into<ConstantIndex>) -> Result<&str, Error> {
        let index = index.into();
        match self.get(index)? {
            Constant::Utf8(utf8) => Ok(utf8),
            _ => Err(Error::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Name of a class constant (for array classes, this is the array descriptor)
    pub fn class_name(&self, index: impl Into<ConstantIndex>) -> Result<&str, Error> {
        let index = index.into();
        match self.get(index)? {
            Constant::Class(name) => self.get_utf8(*name),
            _ => Err(Error::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    pub fn name_and_type(
        &self,
        index: impl Into<ConstantIndex>,
    ) -> Result<(&str, &str), Error> {
        let index = index.into();
        match self.get(index)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.get_utf8(*name)?, self.get_utf8(*descriptor)?))
            }
            _ => Err(Error::UnexpectedConstant {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Resolve a field or method reference into its class, name, and descriptor
    pub fn member_ref(&self, index: impl Into<ConstantIndex>) -> Result<MemberRef<'_>, Error> {
        let index = index.into();
        let (class, name_and_type, is_interface) = match self.get(index)? {
            Constant::FieldRef(class, name_and_type) => (*class, *name_and_type, false),
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => (*class, *name_and_type, *is_interface),
            _ => {
                return Err(Error::UnexpectedConstant {
                    index,
                    expected: "Fieldref or Methodref",
                })
            }
        };
        let (name, descriptor) = self.name_and_type(name_and_type)?;
        Ok(MemberRef {
            class: self.class_name(class)?,
            name,
            descriptor,
            is_interface,
        })
    }

    /// Type of the field referred to by a field reference
    pub fn field_type(&self, index: FieldRefConstantIndex) -> Result<FieldType, Error> {
        let descriptor = self.member_ref(index)?.descriptor;
        FieldType::parse(descriptor).map_err(|err| Error::BadDescriptor(err.to_string()))
    }

    /// Descriptor of a method reference or of an invoke dynamic call site
    pub fn method_descriptor(
        &self,
        index: impl Into<ConstantIndex>,
    ) -> Result<MethodDescriptor, Error> {
        let index = index.into();
        let descriptor = match self.get(index)? {
            Constant::InvokeDynamic {
                method_descriptor, ..
            } => self.name_and_type(*method_descriptor)?.1,
            _ => self.member_ref(index)?.descriptor,
        };
        MethodDescriptor::parse(descriptor).map_err(|err| Error::BadDescriptor(err.to_string()))
    }

    /// Check that the constant can be loaded with `ldc`/`ldc_w` (if `wide` is false) or with
    /// `ldc2_w` (if `wide` is true)
    pub fn check_loadable(&self, index: ConstantIndex, wide: bool) -> Result<(), Error> {
        let loadable = match self.get(index)? {
            Constant::Long(_) | Constant::Double(_) => wide,
            Constant::Integer(_)
            | Constant::Float(_)
            | Constant::String(_)
            | Constant::Class(_)
            | Constant::MethodHandle { .. }
            | Constant::MethodType { .. } => !wide,
            _ => false,
        };
        if loadable {
            Ok(())
        } else {
            Err(Error::UnexpectedConstant {
                index,
                expected: if wide {
                    "Long or Double"
                } else {
                    "loadable constant"
                },
            })
        }
    }

    /// Number of operand stack words pushed when loading this constant
    pub fn constant_width(&self, index: impl Into<ConstantIndex>) -> Result<usize, Error> {
        self.get(index).map(|constant| constant.width())
    }
}

#[derive(Debug)]
pub struct ConstantPoolOverflow {
    pub constant: Constant,
    pub offset: u16,
}

/// Resolved field or method reference
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MemberRef<'a> {
    pub class: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub is_interface: bool,
}

impl<'a> MemberRef<'a> {
    fn into_owned(self) -> OwnedMemberRef {
        OwnedMemberRef {
            class: self.class.to_owned(),
            name: self.name.to_owned(),
            descriptor: self.descriptor.to_owned(),
            is_interface: self.is_interface,
        }
    }
}

#[derive(Debug)]
struct OwnedMemberRef {
    class: String,
    name: String,
    descriptor: String,
    is_interface: bool,
}

/// Constant with all indices replaced by what they point to, so it can move between pools
#[derive(Debug)]
enum SymbolicConstant {
    Utf8(String),
    Class(String),
    String(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    NameAndType(String, String),
    FieldRef(OwnedMemberRef),
    MethodRef(OwnedMemberRef),
    MethodHandle(HandleKind, Box<SymbolicConstant>),
    MethodType(String),
    InvokeDynamic(u16, String, String),
    Module(String),
    Package(String),
}

/// Value that can be pushed with an `ldc`-family instruction or stored as a field's
/// `ConstantValue`
#[derive(Clone, PartialEq, Debug)]
pub enum ConstantValue {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
}

impl Width for ConstantValue {
    fn width(&self) -> usize {
        match self {
            ConstantValue::Long(_) | ConstantValue::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Constants as in the constant pool
///
/// See [the JVM spec][0] for the full list of constant kinds.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Field
    FieldRef(ClassConstantIndex, NameAndTypeConstantIndex),

    /// Method (this combines `Methodref` and `InterfaceMethodref`)
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant raw string value
    Utf8(String),

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,

        /// Depending on the method kind, this points to different things:
        ///
        ///   - `FieldRef` for `GetField`, `GetStatic`, `PutField`, `PutStatic`
        ///   - `MethodRef` for the rest
        member: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: Utf8ConstantIndex },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        method_descriptor: NameAndTypeConstantIndex,
    },

    /// Module (only in `module-info` classes)
    Module(Utf8ConstantIndex),

    /// Package exported or opened by a module
    Package(Utf8ConstantIndex),
}

impl Constant {
    /// Name of the `CONSTANT_*_info` structure
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::Class(_) => "Class",
            Constant::FieldRef(..) => "Fieldref",
            Constant::MethodRef {
                is_interface: false,
                ..
            } => "Methodref",
            Constant::MethodRef {
                is_interface: true, ..
            } => "InterfaceMethodref",
            Constant::String(_) => "String",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::Utf8(_) => "Utf8",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType { .. } => "MethodType",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
            Constant::Module(_) => "Module",
            Constant::Package(_) => "Package",
        }
    }
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. Quoting
/// the JVM spec:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct StringConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct NameAndTypeConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct FieldRefConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct MethodRefConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct InvokeDynamicConstantIndex(ConstantIndex);

macro_rules! typed_constant_index {
    ($($typed:ident),*) => {
        $(
            impl From<$typed> for ConstantIndex {
                fn from(typed: $typed) -> ConstantIndex {
                    typed.0
                }
            }
        )*
    };
}

typed_constant_index!(
    Utf8ConstantIndex,
    StringConstantIndex,
    NameAndTypeConstantIndex,
    ClassConstantIndex,
    FieldRefConstantIndex,
    MethodRefConstantIndex,
    InvokeDynamicConstantIndex
);

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    /// `reference_kind` byte of the `CONSTANT_MethodHandle_info`
    pub const fn reference_kind(self) -> u8 {
        match self {
            HandleKind::GetField => 1,
            HandleKind::GetStatic => 2,
            HandleKind::PutField => 3,
            HandleKind::PutStatic => 4,
            HandleKind::InvokeVirtual => 5,
            HandleKind::InvokeStatic => 6,
            HandleKind::InvokeSpecial => 7,
            HandleKind::NewInvokeSpecial => 8,
            HandleKind::InvokeInterface => 9,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn utf8_is_deduplicated() {
        let mut pool = ConstantsPool::new();
        let hello = pool.add_utf8("hello").unwrap();
        let world = pool.add_utf8("world").unwrap();
        assert_eq!(pool.add_utf8(String::from("hello")).unwrap(), hello);
        assert_eq!(pool.add_utf8("world").unwrap(), world);
        assert_ne!(hello, world);
        assert_eq!(pool.constant_count(), 2);
        assert_eq!(ConstantIndex::from(hello), ConstantIndex(1));
    }

    #[test]
    fn distinct_indices_match_distinct_constants() {
        let mut pool = ConstantsPool::new();
        let mut indices = std::collections::HashSet::new();
        for round in 0..3 {
            for s in ["a", "b", "c", "a"] {
                indices.insert(ConstantIndex::from(pool.add_utf8(s).unwrap()));
            }
            indices.insert(pool.add_integer(7).unwrap());
            indices.insert(pool.add_long(7).unwrap());
            assert_eq!(indices.len(), 5, "round {}", round);
        }
        assert_eq!(pool.constant_count(), 5);
    }

    #[test]
    fn class_is_reused_across_member_kinds() {
        let mut pool = ConstantsPool::new();
        let method = pool
            .add_methodref("java/io/PrintStream", "println", "(I)V")
            .unwrap();
        let field = pool
            .add_fieldref("java.io.PrintStream", "out", "Ljava/io/PrintStream;")
            .unwrap();

        let method_class = match pool.get(method).unwrap() {
            Constant::MethodRef { class, .. } => *class,
            other => panic!("unexpected constant {:?}", other),
        };
        let field_class = match pool.get(field).unwrap() {
            Constant::FieldRef(class, _) => *class,
            other => panic!("unexpected constant {:?}", other),
        };
        assert_eq!(method_class, field_class);
        assert_eq!(
            pool.iter()
                .filter(|(_, constant)| matches!(constant, Constant::Class(_)))
                .count(),
            1
        );
    }

    #[test]
    fn method_and_interface_method_refs_are_distinct() {
        let mut pool = ConstantsPool::new();
        let method = pool.add_methodref("a/B", "m", "()V").unwrap();
        let interface_method = pool.add_interface_methodref("a/B", "m", "()V").unwrap();
        assert_ne!(method, interface_method);
        assert_eq!(pool.lookup_methodref("a.B", "m", "()V"), Some(method));
        assert_eq!(
            pool.lookup_interface_methodref("a/B", "m", "()V"),
            Some(interface_method)
        );
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let mut pool = ConstantsPool::new();
        let long = pool.add_long(1 << 40).unwrap();
        let after = pool.add_integer(3).unwrap();
        assert_eq!(long, ConstantIndex(1));
        assert_eq!(after, ConstantIndex(3));
        assert_eq!(pool.len(), 4);

        assert!(matches!(pool.get(ConstantIndex(0)), Err(Error::MissingConstant(_))));
        assert!(matches!(
            pool.get(ConstantIndex(2)),
            Err(Error::UnusableConstantSlot(ConstantIndex(2)))
        ));
        assert!(matches!(pool.get(ConstantIndex(4)), Err(Error::MissingConstant(_))));

        let entries = pool.into_entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], None);
        assert_eq!(entries[1], Some(Constant::Long(1 << 40)));
        assert_eq!(entries[2], None);
        assert_eq!(entries[3], Some(Constant::Integer(3)));
    }

    #[test]
    fn floats_are_keyed_by_bits() {
        let mut pool = ConstantsPool::new();
        let zero = pool.add_float(0.0).unwrap();
        let negative_zero = pool.add_float(-0.0).unwrap();
        assert_ne!(zero, negative_zero);
        assert_eq!(pool.add_double(f64::NAN).unwrap(), pool.add_double(f64::NAN).unwrap());
    }

    #[test]
    fn lookups_do_not_insert() {
        let mut pool = ConstantsPool::new();
        assert_eq!(pool.lookup_utf8("x"), None);
        assert_eq!(pool.lookup_fieldref("a/B", "x", "I"), None);
        assert_eq!(pool.lookup_string("x"), None);
        assert!(pool.is_empty());

        let string = pool.add_string("x").unwrap();
        assert_eq!(pool.lookup_string("x"), Some(string));
        assert!(pool.lookup_utf8("x").is_some());
        assert_eq!(pool.lookup_class("x"), None);
    }

    #[test]
    fn pool_overflow() {
        let mut pool = ConstantsPool::new();
        for i in 0..65534 {
            pool.add_integer(i).unwrap();
        }
        // Slot 65535 is the last usable one, and a `long` would need 65536 too
        assert!(matches!(
            pool.add_long(0),
            Err(ConstantPoolOverflow { offset: 65535, .. })
        ));
        assert_eq!(pool.add_integer(-1).unwrap(), ConstantIndex(65535));
        assert!(pool.add_integer(-2).is_err());
        assert_eq!(pool.len(), 65536);
    }

    #[test]
    fn import_from_other_pool() {
        let mut other = ConstantsPool::new();
        other.add_integer(42).unwrap();
        let method = other
            .add_interface_methodref("java/util/List", "size", "()I")
            .unwrap();
        let handle = other
            .add_method_handle(HandleKind::InvokeInterface, method.into())
            .unwrap();

        let mut pool = ConstantsPool::new();
        let existing_class = pool.add_class("java/util/List").unwrap();
        let imported = pool.add_constant(handle, &other).unwrap();

        let member = match pool.get(imported).unwrap() {
            Constant::MethodHandle {
                handle_kind: HandleKind::InvokeInterface,
                member,
            } => *member,
            other => panic!("unexpected constant {:?}", other),
        };
        let resolved = pool.member_ref(member).unwrap();
        assert_eq!(resolved.class, "java/util/List");
        assert_eq!(resolved.name, "size");
        assert_eq!(resolved.descriptor, "()I");
        assert!(resolved.is_interface);
        assert_eq!(pool.lookup_class("java/util/List"), Some(existing_class));

        // Importing again does not add anything
        let count = pool.constant_count();
        assert_eq!(pool.add_constant(handle, &other).unwrap(), imported);
        assert_eq!(pool.constant_count(), count);
    }

    #[test]
    fn failed_import_leaves_pool_untouched() {
        let mut other = ConstantsPool::new();
        let name = other.add_utf8("oops").unwrap();
        // Handle pointing at a slot that doesn't exist in `other`
        let dangling = other
            .add_method_handle(HandleKind::InvokeStatic, ConstantIndex(100))
            .unwrap();

        let mut pool = ConstantsPool::new();
        assert!(matches!(
            pool.add_constant(dangling, &other),
            Err(Error::MissingConstant(ConstantIndex(100)))
        ));
        assert!(pool.is_empty());
        assert!(matches!(
            pool.add_constant(ConstantIndex(0), &other),
            Err(Error::MissingConstant(_))
        ));
        pool.add_constant(name.into(), &other).unwrap();
        assert_eq!(pool.lookup_utf8("oops").map(ConstantIndex::from), Some(ConstantIndex(1)));
    }

    #[test]
    fn resolving_descriptors() {
        let mut pool = ConstantsPool::new();
        let field = pool.add_fieldref("a/B", "x", "J").unwrap();
        let method = pool
            .add_methodref("a/B", "m", "(IJLjava/lang/String;)D")
            .unwrap();
        let indy = pool
            .add_invoke_dynamic(0, "apply", "(I)Ljava/lang/Object;")
            .unwrap();

        assert_eq!(pool.field_type(field).unwrap(), FieldType::long());
        assert_eq!(pool.method_descriptor(method).unwrap().parameter_length(false), 4);
        assert_eq!(pool.method_descriptor(indy).unwrap().return_length(), 1);
        assert!(matches!(
            pool.method_descriptor(field),
            Err(Error::BadDescriptor(_))
        ));
        assert!(pool.check_loadable(method.into(), false).is_err());
        let long = pool.add_long(3).unwrap();
        assert!(pool.check_loadable(long, true).is_ok());
        assert!(pool.check_loadable(long, false).is_err());
    }
}
