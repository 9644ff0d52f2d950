use crate::jvm::Error;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Access flags on classes
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.1-200-E.1
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags on fields
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.5-200-A.1
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

/// Kind of declaration an access flag is attached to
///
/// Several bits in the class file mean different things depending on whether they are found on a
/// class, field, method, or module requirement. `Any` is used for flags which mean the same thing
/// everywhere.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AccessTarget {
    Any,
    Class,
    Field,
    Method,
    Module,
}

impl AccessTarget {
    /// Narrow two targets down to one
    ///
    /// `Any` is the identity. Two distinct concrete targets are mutually exclusive.
    pub fn combine(self, other: AccessTarget) -> Result<AccessTarget, Error> {
        match (self, other) {
            (AccessTarget::Any, target) | (target, AccessTarget::Any) => Ok(target),
            (left, right) if left == right => Ok(left),
            (left, right) => Err(Error::IncompatibleAccessTargets(left, right)),
        }
    }
}

impl fmt::Display for AccessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessTarget::Any => "any",
            AccessTarget::Class => "class",
            AccessTarget::Field => "field",
            AccessTarget::Method => "method",
            AccessTarget::Module => "module",
        };
        f.write_str(name)
    }
}

/// Every access flag that can be named
///
/// Flags sharing a bit (eg. `Volatile` and `Bridge`) are told apart by their [`AccessTarget`].
/// `Record` and `Deprecated` are pseudo-flags outside the 16 bits of the class file.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AccessFlag {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Super,
    Synchronized,
    Open,
    Transitive,
    Volatile,
    Bridge,
    Varargs,
    Transient,
    Native,
    Interface,
    Abstract,
    Strict,
    Synthetic,
    Annotation,
    Enum,
    Module,
    Mandated,
    Record,
    Deprecated,
}

/// Class bits that are conveyed by the shape of the declaration rather than by a modifier
const STRUCTURAL_CLASS_ACCESS: u32 = AccessFlag::Enum.bits()
    | AccessFlag::Interface.bits()
    | AccessFlag::Annotation.bits()
    | AccessFlag::Static.bits()
    | AccessFlag::Super.bits()
    | AccessFlag::Synthetic.bits()
    | AccessFlag::Record.bits();

/// Marker rendered for a bit with no meaning for the requested target
pub const UNKNOWN_ACCESS: &str = "???";

impl AccessFlag {
    pub const ALL: [AccessFlag; 24] = [
        AccessFlag::Public,
        AccessFlag::Private,
        AccessFlag::Protected,
        AccessFlag::Static,
        AccessFlag::Final,
        AccessFlag::Super,
        AccessFlag::Synchronized,
        AccessFlag::Open,
        AccessFlag::Transitive,
        AccessFlag::Volatile,
        AccessFlag::Bridge,
        AccessFlag::Varargs,
        AccessFlag::Transient,
        AccessFlag::Native,
        AccessFlag::Interface,
        AccessFlag::Abstract,
        AccessFlag::Strict,
        AccessFlag::Synthetic,
        AccessFlag::Annotation,
        AccessFlag::Enum,
        AccessFlag::Module,
        AccessFlag::Mandated,
        AccessFlag::Record,
        AccessFlag::Deprecated,
    ];

    /// Raw bit value
    pub const fn bits(self) -> u32 {
        match self {
            AccessFlag::Public => 0x0001,
            AccessFlag::Private => 0x0002,
            AccessFlag::Protected => 0x0004,
            AccessFlag::Static => 0x0008,
            AccessFlag::Final => 0x0010,
            AccessFlag::Super
            | AccessFlag::Synchronized
            | AccessFlag::Open
            | AccessFlag::Transitive => 0x0020,
            AccessFlag::Volatile | AccessFlag::Bridge => 0x0040,
            AccessFlag::Varargs | AccessFlag::Transient => 0x0080,
            AccessFlag::Native => 0x0100,
            AccessFlag::Interface => 0x0200,
            AccessFlag::Abstract => 0x0400,
            AccessFlag::Strict => 0x0800,
            AccessFlag::Synthetic => 0x1000,
            AccessFlag::Annotation => 0x2000,
            AccessFlag::Enum => 0x4000,
            AccessFlag::Module | AccessFlag::Mandated => 0x8000,
            AccessFlag::Record => 0x10000,
            AccessFlag::Deprecated => 0x20000,
        }
    }

    /// Declaration kind this flag belongs to
    pub const fn target(self) -> AccessTarget {
        match self {
            AccessFlag::Public
            | AccessFlag::Private
            | AccessFlag::Protected
            | AccessFlag::Static
            | AccessFlag::Final
            | AccessFlag::Abstract
            | AccessFlag::Synthetic
            | AccessFlag::Enum
            | AccessFlag::Deprecated => AccessTarget::Any,
            AccessFlag::Super
            | AccessFlag::Interface
            | AccessFlag::Annotation
            | AccessFlag::Module
            | AccessFlag::Record => AccessTarget::Class,
            AccessFlag::Transitive | AccessFlag::Volatile | AccessFlag::Transient => {
                AccessTarget::Field
            }
            AccessFlag::Synchronized
            | AccessFlag::Bridge
            | AccessFlag::Varargs
            | AccessFlag::Native
            | AccessFlag::Strict => AccessTarget::Method,
            AccessFlag::Open | AccessFlag::Mandated => AccessTarget::Module,
        }
    }

    /// Source keyword, or a comment placeholder for flags Java source has no keyword for
    pub const fn keyword(self) -> &'static str {
        match self {
            AccessFlag::Public => "public",
            AccessFlag::Private => "private",
            AccessFlag::Protected => "protected",
            AccessFlag::Static => "static",
            AccessFlag::Final => "final",
            AccessFlag::Super => "/* super */",
            AccessFlag::Synchronized => "synchronized",
            AccessFlag::Open => "open",
            AccessFlag::Transitive => "transitive",
            AccessFlag::Volatile => "volatile",
            AccessFlag::Bridge => "/* bridge */",
            AccessFlag::Varargs => "/* varargs */",
            AccessFlag::Transient => "transient",
            AccessFlag::Native => "native",
            AccessFlag::Interface => "/* interface */",
            AccessFlag::Abstract => "abstract",
            AccessFlag::Strict => "strictfp",
            AccessFlag::Synthetic => "/* synthetic */",
            AccessFlag::Annotation => "/* annotation */",
            AccessFlag::Enum => "/* enum */",
            AccessFlag::Module => "/* module */",
            AccessFlag::Mandated => "mandated",
            AccessFlag::Record => "/* record */",
            AccessFlag::Deprecated => "/* deprecated */",
        }
    }

    /// Look up a flag by name (eg. `ACC_PUBLIC`, `public`, `STRICTFP`)
    pub fn from_name(name: &str) -> Result<AccessFlag, Error> {
        let upper = name.to_ascii_uppercase();
        let bare = upper.strip_prefix("ACC_").unwrap_or(&upper);
        let flag = match bare {
            "PUBLIC" => AccessFlag::Public,
            "PRIVATE" => AccessFlag::Private,
            "PROTECTED" => AccessFlag::Protected,
            "STATIC" => AccessFlag::Static,
            "FINAL" => AccessFlag::Final,
            "SUPER" => AccessFlag::Super,
            "SYNCHRONIZED" => AccessFlag::Synchronized,
            "OPEN" => AccessFlag::Open,
            "TRANSITIVE" => AccessFlag::Transitive,
            "VOLATILE" => AccessFlag::Volatile,
            "BRIDGE" => AccessFlag::Bridge,
            "VARARGS" => AccessFlag::Varargs,
            "TRANSIENT" => AccessFlag::Transient,
            "NATIVE" => AccessFlag::Native,
            "INTERFACE" => AccessFlag::Interface,
            "ABSTRACT" => AccessFlag::Abstract,
            "STRICT" | "STRICTFP" => AccessFlag::Strict,
            "SYNTHETIC" => AccessFlag::Synthetic,
            "ANNOTATION" => AccessFlag::Annotation,
            "ENUM" => AccessFlag::Enum,
            "MODULE" => AccessFlag::Module,
            "MANDATED" => AccessFlag::Mandated,
            "RECORD" => AccessFlag::Record,
            "DEPRECATED" => AccessFlag::Deprecated,
            _ => return Err(Error::UnrecognizedAccessName(name.to_owned())),
        };
        Ok(flag)
    }

    /// Find the flag a bit stands for on a given target
    ///
    /// A bit carried by a single flag resolves to that flag whatever the target. A shared bit
    /// only resolves when exactly one of its flags belongs to `target`.
    pub fn resolve(bits: u32, target: AccessTarget) -> Option<AccessFlag> {
        let mut candidates = AccessFlag::ALL.iter().filter(|flag| flag.bits() == bits);
        let first = *candidates.next()?;
        let rest: Vec<AccessFlag> = candidates.copied().collect();
        if rest.is_empty() {
            return Some(first);
        }
        let mut matching = std::iter::once(first)
            .chain(rest)
            .filter(|flag| flag.target() == target);
        match (matching.next(), matching.next()) {
            (Some(flag), None) => Some(flag),
            _ => None,
        }
    }
}

/// Parse a flag name into its raw bits (`"0"` is accepted for the empty set)
pub fn parse_access(name: &str) -> Result<u32, Error> {
    if name == "0" {
        return Ok(0);
    }
    AccessFlag::from_name(name).map(AccessFlag::bits)
}

/// Declaration kind a flag name is restricted to
pub fn access_category(name: &str) -> Result<AccessTarget, Error> {
    if name == "0" {
        return Ok(AccessTarget::Any);
    }
    AccessFlag::from_name(name).map(AccessFlag::target)
}

/// Render a single access bit for the given kind of declaration
pub fn stringify_access(bits: u32, target: AccessTarget) -> &'static str {
    if bits == 0 {
        return "0";
    }
    match AccessFlag::resolve(bits, target) {
        Some(flag) => flag.keyword(),
        None => UNKNOWN_ACCESS,
    }
}

/// Render every set bit of `access` in ascending bit order, separated by single spaces
///
/// For classes, the bits that the rest of the header already conveys are dropped first.
pub fn render_modifiers(access: u32, target: AccessTarget) -> String {
    let mut access = if target == AccessTarget::Class {
        access & !STRUCTURAL_CLASS_ACCESS
    } else {
        access
    };

    let mut rendered = String::new();
    let mut bit: u32 = 1;
    while access != 0 {
        if access & bit != 0 {
            access ^= bit;
            if !rendered.is_empty() {
                rendered.push(' ');
            }
            rendered.push_str(stringify_access(bit, target));
        }
        bit = bit.wrapping_shl(1);
    }
    rendered
}

#[cfg(test)]
mod test {
    use super::*;

    const TARGETS: [AccessTarget; 4] = [
        AccessTarget::Class,
        AccessTarget::Field,
        AccessTarget::Method,
        AccessTarget::Module,
    ];

    #[test]
    fn combine_targets() {
        for target in TARGETS {
            assert_eq!(AccessTarget::Any.combine(target).unwrap(), target);
            assert_eq!(target.combine(AccessTarget::Any).unwrap(), target);
            assert_eq!(target.combine(target).unwrap(), target);
        }
        assert_eq!(
            AccessTarget::Any.combine(AccessTarget::Any).unwrap(),
            AccessTarget::Any
        );
        assert!(matches!(
            AccessTarget::Class.combine(AccessTarget::Field),
            Err(Error::IncompatibleAccessTargets(
                AccessTarget::Class,
                AccessTarget::Field
            ))
        ));
    }

    #[test]
    fn keywords_survive_parsing() {
        let keywords = [
            "public",
            "private",
            "protected",
            "static",
            "final",
            "synchronized",
            "open",
            "transitive",
            "volatile",
            "transient",
            "native",
            "abstract",
            "strictfp",
            "mandated",
        ];
        for keyword in keywords {
            let bits = parse_access(keyword).unwrap();
            let target = access_category(keyword).unwrap();
            assert_eq!(stringify_access(bits, target), keyword, "{}", keyword);

            let prefixed = format!("ACC_{}", keyword.to_uppercase());
            assert_eq!(parse_access(&prefixed).unwrap(), bits);
        }
    }

    #[test]
    fn unrecognized_names() {
        assert!(matches!(
            parse_access("sealed"),
            Err(Error::UnrecognizedAccessName(name)) if name == "sealed"
        ));
        assert!(access_category("ACC_").is_err());
        assert_eq!(parse_access("0").unwrap(), 0);
        assert_eq!(access_category("0").unwrap(), AccessTarget::Any);
    }

    #[test]
    fn shared_bits_depend_on_target() {
        assert_eq!(stringify_access(0x20, AccessTarget::Class), "/* super */");
        assert_eq!(stringify_access(0x20, AccessTarget::Method), "synchronized");
        assert_eq!(stringify_access(0x20, AccessTarget::Module), "open");
        assert_eq!(stringify_access(0x40, AccessTarget::Field), "volatile");
        assert_eq!(stringify_access(0x40, AccessTarget::Method), "/* bridge */");
        assert_eq!(stringify_access(0x40, AccessTarget::Class), UNKNOWN_ACCESS);
        assert_eq!(stringify_access(0x80, AccessTarget::Method), "/* varargs */");
        assert_eq!(stringify_access(0x8000, AccessTarget::Class), "/* module */");
        assert_eq!(stringify_access(0x8000, AccessTarget::Module), "mandated");
        assert_eq!(stringify_access(0x20, AccessTarget::Any), UNKNOWN_ACCESS);
        assert_eq!(stringify_access(0x3, AccessTarget::Any), UNKNOWN_ACCESS);
        assert_eq!(stringify_access(0, AccessTarget::Field), "0");
    }

    #[test]
    fn modifiers_in_bit_order() {
        let access = (MethodAccessFlags::PUBLIC
            | MethodAccessFlags::STATIC
            | MethodAccessFlags::FINAL
            | MethodAccessFlags::SYNTHETIC)
            .bits();
        assert_eq!(
            render_modifiers(access.into(), AccessTarget::Method),
            "public static final /* synthetic */"
        );
        assert_eq!(render_modifiers(0, AccessTarget::Field), "");
    }

    #[test]
    fn class_modifiers_drop_structural_bits() {
        let access = (ClassAccessFlags::PUBLIC
            | ClassAccessFlags::SUPER
            | ClassAccessFlags::ABSTRACT
            | ClassAccessFlags::INTERFACE)
            .bits();
        assert_eq!(
            render_modifiers(access.into(), AccessTarget::Class),
            "public abstract"
        );
        let enum_access = (ClassAccessFlags::FINAL | ClassAccessFlags::ENUM).bits();
        assert_eq!(
            render_modifiers(enum_access.into(), AccessTarget::Class),
            "final"
        );
        assert_eq!(
            render_modifiers(AccessFlag::Record.bits(), AccessTarget::Class),
            ""
        );
    }
}
