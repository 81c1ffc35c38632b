//! Registration keys.
//!
//! A [`RegistrationKey`] is either a Rust type ([`TypeKey`]) or a
//! case-sensitive string such as a deliverable name or alias. Both kinds
//! share one flat namespace: a type key never collides with a name key,
//! but two equal type keys (or two equal names) do.

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use chauffeur_support::rendering::shorten_type_name;

/// Identifies a Rust type inside the registry.
///
/// Combines the [`TypeId`] used for equality with the type name used
/// in diagnostics.
///
/// # Examples
/// ```
/// use chauffeur_registry::key::TypeKey;
///
/// let key = TypeKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.short_name(), "String");
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Creates a key for type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of this type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without module paths.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.type_name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// The identity under which a registration is looked up.
///
/// # Examples
/// ```
/// use chauffeur_registry::key::{RegistrationKey, TypeKey};
///
/// let by_type = RegistrationKey::of::<String>();
/// let by_name = RegistrationKey::from("publish");
///
/// assert_ne!(by_type, by_name);
/// assert_eq!(by_name, RegistrationKey::name("publish"));
/// assert_ne!(by_name, RegistrationKey::name("Publish"));
/// assert_eq!(by_type, RegistrationKey::from(TypeKey::of::<String>()));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum RegistrationKey {
    /// Keyed by a Rust type.
    Type(TypeKey),
    /// Keyed by a deliverable name or alias.
    Name(Cow<'static, str>),
}

impl RegistrationKey {
    /// Creates a type key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// Creates a name key.
    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Name(name.into())
    }

    /// Returns the type, if this is a type key.
    pub fn as_type(&self) -> Option<&TypeKey> {
        match self {
            Self::Type(key) => Some(key),
            Self::Name(_) => None,
        }
    }

    /// Returns the name, if this is a name key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Type(_) => None,
            Self::Name(name) => Some(name.as_ref()),
        }
    }
}

impl From<TypeKey> for RegistrationKey {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl From<&'static str> for RegistrationKey {
    fn from(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<String> for RegistrationKey {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl fmt::Debug for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "RegistrationKey::Type({})", key.type_name()),
            Self::Name(name) => write!(f, "RegistrationKey::Name({name:?})"),
        }
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "type {}", key.type_name()),
            Self::Name(name) => write!(f, "name {name:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Publisher;

    #[test]
    fn key_of_type() {
        let key = TypeKey::of::<Publisher>();
        assert!(key.type_name().contains("Publisher"));
        assert_eq!(key.short_name(), "Publisher");
    }

    #[test]
    fn key_equality_same_type() {
        assert_eq!(RegistrationKey::of::<String>(), RegistrationKey::of::<String>());
    }

    #[test]
    fn key_inequality_different_types() {
        assert_ne!(RegistrationKey::of::<String>(), RegistrationKey::of::<i32>());
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_ne!(RegistrationKey::name("pub"), RegistrationKey::name("PUB"));
    }

    #[test]
    fn borrowed_and_owned_names_are_equal() {
        assert_eq!(
            RegistrationKey::from("rollback"),
            RegistrationKey::from(String::from("rollback"))
        );
    }

    #[test]
    fn type_and_name_never_collide() {
        let type_name = std::any::type_name::<Publisher>();
        assert_ne!(RegistrationKey::of::<Publisher>(), RegistrationKey::name(type_name));
    }

    #[test]
    fn key_in_hashmap() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(RegistrationKey::of::<String>(), "string");
        map.insert(RegistrationKey::name("publish"), "publish");
        assert_eq!(map.get(&RegistrationKey::of::<String>()), Some(&"string"));
        assert_eq!(map.get(&RegistrationKey::from("publish")), Some(&"publish"));
        assert_eq!(map.get(&RegistrationKey::of::<bool>()), None);
    }

    #[test]
    fn display_names_the_kind() {
        assert_eq!(RegistrationKey::name("pub").to_string(), "name \"pub\"");
        assert_eq!(RegistrationKey::of::<u8>().to_string(), "type u8");
    }

    #[test]
    fn unsized_type_key() {
        trait Output {}
        let key = TypeKey::of::<dyn Output>();
        assert!(key.type_name().contains("Output"));
    }
}
