use super::{BinaryName, Error as JvmError, Name};
use crate::util::Width;
use std::io::{Error, ErrorKind, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Utility trait for converting descriptors to and from string representations
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Write the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

pub trait ParseDescriptor: Sized {
    /// Parse a descriptor from a string
    fn parse(source: &str) -> Result<Self> {
        let mut chars = source.chars().peekable();
        let ret = Self::parse_from(&mut chars)?;
        match chars.next() {
            None => Ok(ret),
            Some(c) => {
                let msg = format!("Unexpected leftover input '{}'", c);
                Err(Error::new(ErrorKind::InvalidInput, msg))
            }
        }
    }

    /// Read the descriptor from a character buffer
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self>;
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    /// Array type code used by `newarray`
    pub const fn array_type_code(self) -> u8 {
        match self {
            BaseType::Boolean => 4,
            BaseType::Char => 5,
            BaseType::Float => 6,
            BaseType::Double => 7,
            BaseType::Byte => 8,
            BaseType::Short => 9,
            BaseType::Int => 10,
            BaseType::Long => 11,
        }
    }

    /// Inverse of `array_type_code`
    pub const fn from_array_type_code(code: u8) -> Option<BaseType> {
        match code {
            4 => Some(BaseType::Boolean),
            5 => Some(BaseType::Char),
            6 => Some(BaseType::Float),
            7 => Some(BaseType::Double),
            8 => Some(BaseType::Byte),
            9 => Some(BaseType::Short),
            10 => Some(BaseType::Int),
            11 => Some(BaseType::Long),
            _ => None,
        }
    }

    /// Name as it would appear in Java source
    pub const fn java_name(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }
}

impl Width for BaseType {
    fn width(&self) -> usize {
        match self {
            BaseType::Double | BaseType::Long => 2,
            _ => 1,
        }
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        let c = match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        };
        write_to.push(c);
    }
}

impl ParseDescriptor for BaseType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let typ = match source.next() {
            Some('B') => BaseType::Byte,
            Some('C') => BaseType::Char,
            Some('D') => BaseType::Double,
            Some('F') => BaseType::Float,
            Some('I') => BaseType::Int,
            Some('J') => BaseType::Long,
            Some('S') => BaseType::Short,
            Some('Z') => BaseType::Boolean,
            Some(c) => {
                let msg = format!("Invalid base type character '{}'", c);
                return Err(Error::new(ErrorKind::InvalidInput, msg));
            }
            None => {
                let msg = "Missing base type character";
                return Err(Error::new(ErrorKind::UnexpectedEof, msg));
            }
        };
        Ok(typ)
    }
}

/// Type of the innermost elements of an array
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ElementType {
    Base(BaseType),
    Object(BinaryName),
}

/// Array type, with at least one (and at most 255) dimensions
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType {
    element_type: ElementType,
    dimensions: u8,
}

impl ArrayType {
    /// Maximum number of dimensions the class file format admits
    pub const MAX_DIMENSIONS: usize = 255;

    pub fn new(element_type: ElementType, dimensions: usize) -> std::result::Result<Self, JvmError> {
        if dimensions < 1 || dimensions > Self::MAX_DIMENSIONS {
            return Err(JvmError::InvalidArrayDimensions(dimensions));
        }
        Ok(ArrayType {
            element_type,
            dimensions: dimensions as u8,
        })
    }

    /// Underlying element type (`A` is the underlying element type of `A[][]`)
    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    /// Total number of dimensions in the array type
    pub fn dimensions(&self) -> usize {
        self.dimensions as usize
    }

    /// Type of the values stored in the outermost array (`A[]` for `A[][]`)
    pub fn component_type(&self) -> FieldType {
        if self.dimensions > 1 {
            FieldType::Ref(RefType::Array(ArrayType {
                element_type: self.element_type.clone(),
                dimensions: self.dimensions - 1,
            }))
        } else {
            match &self.element_type {
                ElementType::Base(base) => FieldType::Base(*base),
                ElementType::Object(name) => FieldType::object(name.clone()),
            }
        }
    }
}

impl RenderDescriptor for ArrayType {
    fn render_to(&self, write_to: &mut String) {
        for _ in 0..self.dimensions {
            write_to.push('[');
        }
        match &self.element_type {
            ElementType::Base(base) => base.render_to(write_to),
            ElementType::Object(name) => name.render_to(write_to),
        }
    }
}

impl ParseDescriptor for ArrayType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let mut dimensions = 0;
        while source.next_if_eq(&'[').is_some() {
            dimensions += 1;
        }
        let element_type = match source.peek().copied() {
            Some('L') => ElementType::Object(BinaryName::parse_from(source)?),
            _ => ElementType::Base(BaseType::parse_from(source)?),
        };
        ArrayType::new(element_type, dimensions).map_err(|_| {
            let msg = format!("Array type has {} dimensions", dimensions);
            Error::new(ErrorKind::InvalidInput, msg)
        })
    }
}

impl RenderDescriptor for BinaryName {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('L');
        write_to.push_str(self.as_str());
        write_to.push(';');
    }
}

impl ParseDescriptor for BinaryName {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        if let Some('L') = source.next() {
            let mut class_name = String::new();
            loop {
                let c: char = source.next().ok_or_else(|| {
                    let msg = format!("Missing terminator for 'L{}'", class_name);
                    Error::new(ErrorKind::UnexpectedEof, msg)
                })?;
                if c == ';' {
                    return BinaryName::from_string(class_name)
                        .map_err(|msg| Error::new(ErrorKind::InvalidInput, msg));
                } else {
                    class_name.push(c)
                }
            }
        } else {
            Err(Error::new(
                ErrorKind::InvalidInput,
                "Expected object type to start with `L`",
            ))
        }
    }
}

/// Reference type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefType {
    Object(BinaryName),
    Array(ArrayType),
}

impl RefType {
    /// Array with one more dimension whose components have the given type
    pub fn array(component: FieldType) -> std::result::Result<RefType, JvmError> {
        let array_type = match component {
            FieldType::Base(base) => ArrayType::new(ElementType::Base(base), 1)?,
            FieldType::Ref(RefType::Object(name)) => ArrayType::new(ElementType::Object(name), 1)?,
            FieldType::Ref(RefType::Array(arr)) => {
                ArrayType::new(arr.element_type, arr.dimensions as usize + 1)?
            }
        };
        Ok(RefType::Array(array_type))
    }

    /// Name used to refer to this type in a `CONSTANT_Class_info`
    ///
    /// Objects use their binary name, but arrays use their descriptor. See [this section of the
    /// spec][0] for more.
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4.1
    pub fn class_name(&self) -> String {
        match self {
            RefType::Object(name) => String::from(name.as_str()),
            RefType::Array(arr) => arr.render(),
        }
    }

    /// Inverse of `class_name`
    pub fn from_class_name(name: &str) -> Result<RefType> {
        if name.starts_with('[') {
            ArrayType::parse(name).map(RefType::Array)
        } else {
            BinaryName::from_string(String::from(name))
                .map(RefType::Object)
                .map_err(|msg| Error::new(ErrorKind::InvalidInput, msg))
        }
    }
}

impl RenderDescriptor for RefType {
    fn render_to(&self, write_to: &mut String) {
        match self {
            RefType::Object(cls) => cls.render_to(write_to),
            RefType::Array(arr) => arr.render_to(write_to),
        }
    }
}

impl ParseDescriptor for RefType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L') => BinaryName::parse_from(source).map(RefType::Object),
            Some('[') => ArrayType::parse_from(source).map(RefType::Array),
            Some(c) => {
                let msg = format!("Invalid reference type character '{}'", c);
                Err(Error::new(ErrorKind::InvalidInput, msg))
            }
            None => Err(Error::new(ErrorKind::UnexpectedEof, "Missing reference type")),
        }
    }
}

/// Type of a field, local variable, or operand stack value
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType {
    Base(BaseType),
    Ref(RefType),
}

/// `long` and `double` take two words, everything else takes one
impl Width for FieldType {
    fn width(&self) -> usize {
        match self {
            FieldType::Base(base_type) => base_type.width(),
            FieldType::Ref(_) => 1,
        }
    }
}

impl FieldType {
    pub const fn object(class_name: BinaryName) -> FieldType {
        FieldType::Ref(RefType::Object(class_name))
    }

    /// Array of the given element type and number of dimensions
    pub fn array(
        element_type: ElementType,
        dimensions: usize,
    ) -> std::result::Result<FieldType, JvmError> {
        ArrayType::new(element_type, dimensions).map(|arr| FieldType::Ref(RefType::Array(arr)))
    }

    pub const fn int() -> FieldType {
        FieldType::Base(BaseType::Int)
    }

    pub const fn long() -> FieldType {
        FieldType::Base(BaseType::Long)
    }

    pub const fn float() -> FieldType {
        FieldType::Base(BaseType::Float)
    }

    pub const fn double() -> FieldType {
        FieldType::Base(BaseType::Double)
    }

    pub const fn boolean() -> FieldType {
        FieldType::Base(BaseType::Boolean)
    }
}

impl RenderDescriptor for FieldType {
    fn render_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.render_to(write_to),
            FieldType::Ref(reference_type) => reference_type.render_to(write_to),
        }
    }
}

impl ParseDescriptor for FieldType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            None => Err(Error::new(ErrorKind::UnexpectedEof, "Missing field type")),
            Some('L' | '[') => RefType::parse_from(source).map(FieldType::Ref),
            Some(_) => BaseType::parse_from(source).map(FieldType::Base),
        }
    }
}

/// Signature of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,

    /// `None` is for `void` (ie. no return)
    pub return_type: Option<FieldType>,
}

impl MethodDescriptor {
    /// Total length of parameters in words (not the same as the length of the vector),
    /// which must be 255 or less for it to be valid
    pub fn parameter_length(&self, has_this_param: bool) -> usize {
        let this_len = if has_this_param { 1 } else { 0 };
        this_len
            + self
                .parameters
                .iter()
                .map(|param| param.width())
                .sum::<usize>()
    }

    /// Number of words pushed onto the stack on return
    pub fn return_length(&self) -> usize {
        self.return_type.as_ref().map_or(0, |ret| ret.width())
    }
}

impl RenderDescriptor for MethodDescriptor {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.render_to(write_to),
        };
    }
}

impl ParseDescriptor for MethodDescriptor {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        if source.next_if_eq(&'(').is_none() {
            let msg = "Expected '(' for method";
            return Err(Error::new(ErrorKind::InvalidInput, msg));
        }

        let mut parameters = vec![];
        while source.next_if_eq(&')').is_none() {
            if source.peek().is_none() {
                let msg = "Expected ')' for method";
                return Err(Error::new(ErrorKind::UnexpectedEof, msg));
            }
            parameters.push(FieldType::parse_from(source)?);
        }

        let return_type = if source.next_if_eq(&'V').is_some() {
            None
        } else {
            Some(FieldType::parse_from(source)?)
        };

        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fmt::Debug;

    fn round_trip<T: RenderDescriptor + ParseDescriptor + Debug + Eq>(rendered: &str, parsed: T) {
        assert_eq!(rendered, parsed.render());
        assert_eq!(T::parse(rendered).unwrap(), parsed);
    }

    #[test]
    fn field_types() {
        round_trip("J", FieldType::long());
        round_trip("Ljava/lang/Object;", FieldType::object(BinaryName::OBJECT));
        round_trip(
            "[[[D",
            FieldType::array(ElementType::Base(BaseType::Double), 3).unwrap(),
        );
        round_trip(
            "[Ljava/lang/String;",
            FieldType::array(ElementType::Object(BinaryName::STRING), 1).unwrap(),
        );
    }

    #[test]
    fn method_descriptors() {
        let descriptor = MethodDescriptor {
            parameters: vec![
                FieldType::int(),
                FieldType::double(),
                FieldType::object(BinaryName::INTEGER),
            ],
            return_type: Some(FieldType::object(BinaryName::OBJECT)),
        };
        assert_eq!(descriptor.parameter_length(false), 4);
        assert_eq!(descriptor.parameter_length(true), 5);
        round_trip("(IDLjava/lang/Integer;)Ljava/lang/Object;", descriptor);
        round_trip(
            "()V",
            MethodDescriptor {
                parameters: vec![],
                return_type: None,
            },
        );
        assert!(MethodDescriptor::parse("(I").is_err());
    }

    #[test]
    fn array_dimensions_are_bounded() {
        let int = ElementType::Base(BaseType::Int);
        assert!(matches!(
            ArrayType::new(int.clone(), 0),
            Err(JvmError::InvalidArrayDimensions(0))
        ));
        assert!(ArrayType::new(int.clone(), 255).is_ok());
        assert!(ArrayType::new(int, 256).is_err());
        assert!(FieldType::parse(&"[".repeat(256)).is_err());
    }

    #[test]
    fn component_types() {
        let nested = ArrayType::new(ElementType::Base(BaseType::Int), 2).unwrap();
        assert_eq!(nested.component_type().render(), "[I");
        let array = RefType::array(FieldType::object(BinaryName::STRING)).unwrap();
        assert_eq!(array.class_name(), "[Ljava/lang/String;");
        assert_eq!(
            RefType::from_class_name("java/lang/String").unwrap(),
            RefType::Object(BinaryName::STRING)
        );
    }
}
