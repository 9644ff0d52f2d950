use std::borrow::Cow;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Names of methods, fields
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Names of classes and interfaces, in internal form (`java/lang/Object`)
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct BinaryName(Cow<'static, str>);

/// Extracts the raw underlying string name
impl AsRef<str> for UnqualifiedName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Extracts the raw underlying string name
impl AsRef<str> for BinaryName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

pub trait Name: Sized {
    /// Check if a string would be a valid name
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Extact the raw underlying string data:
    fn as_cow(&self) -> &Cow<'static, str>;

    /// Extact the raw underlying string name
    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;
}

impl Name for UnqualifiedName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.contains(&['.', ';', '[', '/'][..]) {
            Err(format!(
                "Unqualified name '{}' contains an illegal character",
                name
            ))
        } else if name.is_empty() {
            Err(format!("Unqualified name '{}' is empty", name))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(UnqualifiedName(Cow::Owned(name))),
            Err(msg) => Err(msg),
        }
    }
}

impl Name for BinaryName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            Err(format!("Binary name '{}' is empty", name))
        } else {
            name.split('/').map(UnqualifiedName::check_valid).collect()
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(BinaryName(Cow::Owned(name))),
            Err(msg) => Err(msg),
        }
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}
impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}
impl Display for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}
impl Display for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl UnqualifiedName {
    const fn name(value: &'static str) -> UnqualifiedName {
        UnqualifiedName(Cow::Borrowed(value))
    }

    // Special unqualified names - only these are allowed to have angle brackets in them
    pub const INIT: Self = Self::name("<init>");
    pub const CLINIT: Self = Self::name("<clinit>");
}

impl BinaryName {
    const fn name(value: &'static str) -> BinaryName {
        BinaryName(Cow::Borrowed(value))
    }

    pub const OBJECT: Self = Self::name("java/lang/Object");

    /// Package part of the name, in source form (`java/util/Map$Entry` gives `java.util`)
    pub fn package(&self) -> Option<String> {
        self.as_str()
            .rfind('/')
            .map(|separator| self.as_str()[..separator].replace('/', "."))
    }

    /// Class name without its package (`java/util/Map$Entry` gives `Map$Entry`)
    pub fn simple_name(&self) -> &str {
        let name = self.as_str();
        match name.rfind('/') {
            Some(separator) => &name[separator + 1..],
            None => name,
        }
    }

    /// Source form of the name, with classes directly inside `java.lang` abbreviated
    pub fn abbreviated(&self) -> String {
        abbreviate_java_lang(&self.as_str().replace('/', ".")).to_owned()
    }
}

/// Drop the `java.lang.` prefix off a dotted type name, unless the type lives in a subpackage
///
/// Trailing array brackets are left alone (`java.lang.String[]` becomes `String[]`).
pub fn abbreviate_java_lang(dotted: &str) -> &str {
    match dotted.strip_prefix("java.lang.") {
        Some(rest) if !rest.contains('.') => rest,
        _ => dotted,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn binary(name: &str) -> BinaryName {
        BinaryName::from_string(name.to_owned()).unwrap()
    }

    #[test]
    fn validation() {
        assert!(BinaryName::from_string(String::from("a/b/C")).is_ok());
        assert!(BinaryName::from_string(String::from("a.b.C")).is_err());
        assert!(BinaryName::from_string(String::from("a//C")).is_err());
        assert!(UnqualifiedName::from_string(String::from("field")).is_ok());
        assert!(UnqualifiedName::from_string(String::from("[I")).is_err());
    }

    #[test]
    fn package_and_simple_name() {
        let entry = binary("java/util/Map$Entry");
        assert_eq!(entry.package().as_deref(), Some("java.util"));
        assert_eq!(entry.simple_name(), "Map$Entry");

        let default_package = binary("Main");
        assert_eq!(default_package.package(), None);
        assert_eq!(default_package.simple_name(), "Main");
    }

    #[test]
    fn java_lang_abbreviation() {
        assert_eq!(binary("java/lang/Runnable").abbreviated(), "Runnable");
        assert_eq!(
            binary("java/lang/invoke/MethodHandle").abbreviated(),
            "java.lang.invoke.MethodHandle"
        );
        assert_eq!(binary("a/b/C").abbreviated(), "a.b.C");
        assert_eq!(abbreviate_java_lang("java.lang.String[][]"), "String[][]");
    }
}
