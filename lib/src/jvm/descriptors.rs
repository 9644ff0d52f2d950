use super::{abbreviate_java_lang, BinaryName, Error, Name};
use crate::util::Width;
use std::iter::Peekable;
use std::str::Chars;

/// Utility trait for parsing descriptors out of their string representations
pub trait ParseDescriptor: Sized {
    /// Parse a descriptor from a string
    fn parse(source: &str) -> Result<Self, Error> {
        let mut chars = source.chars().peekable();
        let ret = Self::parse_from(&mut chars)?;
        match chars.next() {
            None => Ok(ret),
            Some(c) => Err(Error::BadDescriptor(format!(
                "Unexpected leftover input '{}' in '{}'",
                c, source
            ))),
        }
    }

    /// Read the descriptor from a character buffer
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, Error>;
}

/// Utility trait for spelling types the way Java source would (`java.lang.String[]`)
pub trait SourceName {
    /// Turn the type into its source spelling
    fn source_name(&self) -> String {
        let mut string = String::new();
        self.source_name_to(&mut string);
        string
    }

    /// Write the source spelling of the type to a string
    fn source_name_to(&self, write_to: &mut String);
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

impl Width for BaseType {
    fn width(&self) -> usize {
        match self {
            BaseType::Byte
            | BaseType::Char
            | BaseType::Float
            | BaseType::Int
            | BaseType::Short
            | BaseType::Boolean => 1,
            BaseType::Double | BaseType::Long => 2,
        }
    }
}

impl BaseType {
    /// Descriptor character for the type
    pub const fn descriptor_char(&self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    /// Element type of a `newarray` instruction, from its `atype` operand
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-6.html#jvms-6.5.newarray
    pub const fn from_array_code(atype: i32) -> Option<BaseType> {
        match atype {
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
}

impl SourceName for BaseType {
    fn source_name_to(&self, write_to: &mut String) {
        let name = match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        };
        write_to.push_str(name);
    }
}

impl ParseDescriptor for BaseType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, Error> {
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
                return Err(Error::BadDescriptor(msg));
            }
            None => {
                let msg = String::from("Missing base type character");
                return Err(Error::BadDescriptor(msg));
            }
        };
        Ok(typ)
    }
}

/// Reference type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefType<Class> {
    Object(Class),
    ObjectArray(ArrayType<Class>),
    PrimitiveArray(ArrayType<BaseType>),
}

/// Generic array type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType<T> {
    /// Additional dimensions (`A[]` has 0 additional dimensions, `A[][][][]` has 3)
    pub additional_dimensions: usize,

    /// Underlying element type (`A` is the underlying element type of `A[][]`)
    pub element_type: T,
}

impl<T> ArrayType<T> {
    /// Total number of dimensions in the array type
    ///
    /// This is always just `additional_dimensions + 1`
    pub const fn dimensions(&self) -> usize {
        self.additional_dimensions + 1
    }
}

impl<T: SourceName> SourceName for ArrayType<T> {
    fn source_name_to(&self, write_to: &mut String) {
        self.element_type.source_name_to(write_to);
        for _ in 0..self.dimensions() {
            write_to.push_str("[]");
        }
    }
}

impl SourceName for BinaryName {
    fn source_name_to(&self, write_to: &mut String) {
        write_to.push_str(&self.as_str().replace('/', "."));
    }
}

impl ParseDescriptor for BinaryName {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, Error> {
        if let Some('L') = source.next() {
            let mut class_name = String::new();
            loop {
                let c: char = source.next().ok_or_else(|| {
                    Error::BadDescriptor(format!("Missing terminator for 'L{}'", class_name))
                })?;
                if c == ';' {
                    return BinaryName::from_string(class_name).map_err(Error::BadDescriptor);
                } else {
                    class_name.push(c)
                }
            }
        } else {
            Err(Error::BadDescriptor(String::from(
                "Expected object type to start with `L`",
            )))
        }
    }
}

impl<C: SourceName> SourceName for RefType<C> {
    fn source_name_to(&self, write_to: &mut String) {
        match self {
            RefType::Object(cls) => cls.source_name_to(write_to),
            RefType::PrimitiveArray(arr) => arr.source_name_to(write_to),
            RefType::ObjectArray(arr) => arr.source_name_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for RefType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, Error> {
        Ok(match source.peek().copied() {
            Some('L') => RefType::Object(C::parse_from(source)?),
            Some('[') => {
                source.next();
                let mut additional_dimensions = 0;
                while let Some('[') = source.peek().copied() {
                    additional_dimensions += 1;
                    source.next();
                }
                if let Some('L') = source.peek().copied() {
                    RefType::ObjectArray(ArrayType {
                        additional_dimensions,
                        element_type: C::parse_from(source)?,
                    })
                } else {
                    RefType::PrimitiveArray(ArrayType {
                        additional_dimensions,
                        element_type: BaseType::parse_from(source)?,
                    })
                }
            }
            Some(c) => {
                let msg = format!("Invalid reference type character '{}'", c);
                return Err(Error::BadDescriptor(msg));
            }
            None => {
                return Err(Error::BadDescriptor(String::from("Missing field type")));
            }
        })
    }
}

/// Type of a class, instance, or local variable
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType<Class> {
    Base(BaseType),
    Ref(RefType<Class>),
}

impl<C> Width for FieldType<C> {
    fn width(&self) -> usize {
        match self {
            FieldType::Base(base_type) => base_type.width(),
            FieldType::Ref(_) => 1,
        }
    }
}

impl<C> FieldType<C> {
    /// Class at the core of the type, if any (`String` for both `String` and `String[][]`)
    pub fn element_class(&self) -> Option<&C> {
        match self {
            FieldType::Ref(RefType::Object(class)) => Some(class),
            FieldType::Ref(RefType::ObjectArray(arr)) => Some(&arr.element_type),
            FieldType::Base(_) | FieldType::Ref(RefType::PrimitiveArray(_)) => None,
        }
    }

    /// Number of array dimensions (0 for non-arrays)
    pub fn dimensions(&self) -> usize {
        match self {
            FieldType::Base(_) | FieldType::Ref(RefType::Object(_)) => 0,
            FieldType::Ref(RefType::ObjectArray(arr)) => arr.dimensions(),
            FieldType::Ref(RefType::PrimitiveArray(arr)) => arr.dimensions(),
        }
    }
}

impl FieldType<BinaryName> {
    /// Source spelling with classes directly inside `java.lang` abbreviated
    pub fn abbreviated_source_name(&self) -> String {
        abbreviate_java_lang(&self.source_name()).to_owned()
    }
}

impl<C: SourceName> SourceName for FieldType<C> {
    fn source_name_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.source_name_to(write_to),
            FieldType::Ref(reference_type) => reference_type.source_name_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for FieldType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, Error> {
        match source.peek().copied() {
            None => Err(Error::BadDescriptor(String::from("Missing field type"))),
            Some('B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z') => {
                BaseType::parse_from(source).map(FieldType::Base)
            }
            Some('L' | '[') => RefType::parse_from(source).map(FieldType::Ref),
            Some(c) => {
                let msg = format!("Invalid field type character '{}'", c);
                Err(Error::BadDescriptor(msg))
            }
        }
    }
}

/// Signature of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor<Class> {
    pub parameters: Vec<FieldType<Class>>,
    pub return_type: Option<FieldType<Class>>, // `None` is for `void` (ie. no return)
}

impl<C: ParseDescriptor> ParseDescriptor for MethodDescriptor<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, Error> {
        // Assert open paren
        if let Some('(') = source.next() {
        } else {
            let msg = String::from("Expected '(' for method");
            return Err(Error::BadDescriptor(msg));
        }

        // Parse parameters
        let mut parameters = vec![];
        while source.peek().copied() != Some(')') {
            parameters.push(FieldType::<C>::parse_from(source)?);
        }

        // Assert close paren
        if let Some(')') = source.next() {
        } else {
            let msg = String::from("Expected ')' for method");
            return Err(Error::BadDescriptor(msg));
        }

        // Parse return
        let return_type = if let Some('V') = source.peek().copied() {
            let _ = source.next();
            None
        } else {
            Some(FieldType::<C>::parse_from(source)?)
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

    type FT = FieldType<BinaryName>;

    fn source_name(descriptor: &str) -> String {
        FT::parse(descriptor).unwrap().source_name()
    }

    #[test]
    fn base_types() {
        assert_eq!(source_name("B"), "byte");
        assert_eq!(source_name("C"), "char");
        assert_eq!(source_name("D"), "double");
        assert_eq!(source_name("F"), "float");
        assert_eq!(source_name("I"), "int");
        assert_eq!(source_name("J"), "long");
        assert_eq!(source_name("S"), "short");
        assert_eq!(source_name("Z"), "boolean");
        assert!(FT::parse("V").is_err());
    }

    #[test]
    fn field_types() {
        assert_eq!(source_name("Ljava/lang/Object;"), "java.lang.Object");
        assert_eq!(source_name("[[[D"), "double[][][]");
        assert_eq!(source_name("[Ljava/lang/String;"), "java.lang.String[]");

        let strings = FT::parse("[[Ljava/lang/String;").unwrap();
        assert_eq!(strings.dimensions(), 2);
        assert_eq!(strings.element_class().map(|class| class.as_str()), Some("java/lang/String"));
        assert_eq!(strings.abbreviated_source_name(), "String[][]");
        assert_eq!(FT::parse("[I").unwrap().element_class(), None);
    }

    #[test]
    fn malformed_field_types() {
        assert!(FT::parse("Ljava/lang/Object").is_err());
        assert!(FT::parse("II").is_err());
        assert!(FT::parse("").is_err());
        assert!(FT::parse("[").is_err());
    }

    #[test]
    fn method_descriptors() {
        let descriptor =
            MethodDescriptor::<BinaryName>::parse("(IDLjava/lang/Integer;)Ljava/lang/Object;")
                .unwrap();
        assert_eq!(descriptor.parameters.len(), 3);
        let widths: Vec<usize> = descriptor.parameters.iter().map(Width::width).collect();
        assert_eq!(widths, vec![1, 2, 1]);
        assert_eq!(
            descriptor.return_type.map(|typ| typ.source_name()),
            Some(String::from("java.lang.Object"))
        );

        let void = MethodDescriptor::<BinaryName>::parse("()V").unwrap();
        assert!(void.parameters.is_empty());
        assert_eq!(void.return_type, None);
        assert!(MethodDescriptor::<BinaryName>::parse("(I").is_err());
    }
}
