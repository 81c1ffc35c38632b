//! Error types for registry operations.
//!
//! Two families live here. Configuration faults (duplicate keys, a missing
//! sentinel, a deliverable without a name) abort initialization. Resolution
//! faults (no usable constructor, type mismatch) surface from `resolve`.
//! Plain absence is not an error: resolving an unknown key yields `Ok(None)`.

use std::fmt;

use chauffeur_support::rendering::{render_chain, render_names};

use crate::key::{RegistrationKey, TypeKey};
use crate::record::{RecordId, ResolutionKind};

/// Main error type for all registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A key was bound twice.
    #[error("{}", .0)]
    DuplicateRegistration(DuplicateRegistrationError),

    /// A reflective registration has no constructor the registry can call.
    #[error("{}", .0)]
    NoUsableConstructor(NoUsableConstructorError),

    /// A deliverable descriptor carries no canonical name.
    #[error(
        "Deliverable {type_name} declares no canonical name\n  \
         Hint: add #[deliverable(name = \"...\")] or return a named descriptor"
    )]
    MissingCanonicalName { type_name: &'static str },

    /// The fallback deliverable was never registered.
    #[error(
        "Sentinel deliverable {sentinel:?} is not registered\n  \
         Hint: register a deliverable named {sentinel:?} before building the container"
    )]
    MissingSentinel { sentinel: String },

    /// A typed resolve asked for a different type than the record produces.
    #[error(
        "Type mismatch resolving {key}: expected {expected}, \
         but the registration produces {produced}"
    )]
    TypeMismatch {
        key: RegistrationKey,
        expected: &'static str,
        produced: TypeKey,
    },

    /// A type key was bound to a record producing a different type.
    #[error(
        "Can't bind {key} to a registration producing {produced}\n  \
         Hint: use alias_as or register_as with a conversion into the key's type"
    )]
    KeyTypeMismatch { key: RegistrationKey, produced: TypeKey },

    /// A record id that this store never issued.
    #[error("No registration with id {id:?} in this store")]
    UnknownRecord { id: RecordId },

    /// A name lookup landed on a registration that is not a deliverable.
    #[error("{key} is bound to {produced}, which was not registered as a deliverable")]
    NotADeliverable { key: RegistrationKey, produced: TypeKey },

    /// A build plugin reported its own failure.
    #[error("Build plugin {plugin} failed: {source}")]
    PluginFailed {
        plugin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RegistryError {
    /// Wraps an arbitrary error raised by a build plugin.
    pub fn plugin(
        plugin: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::PluginFailed {
            plugin: plugin.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for faults that should abort initialization.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRegistration(_)
                | Self::MissingCanonicalName { .. }
                | Self::MissingSentinel { .. }
                | Self::KeyTypeMismatch { .. }
                | Self::UnknownRecord { .. }
                | Self::PluginFailed { .. }
        )
    }
}

/// Error when a key is already bound.
///
/// The existing binding is left untouched.
#[derive(Debug)]
pub struct DuplicateRegistrationError {
    /// The key that was bound twice
    pub key: RegistrationKey,
    /// How the existing record resolves
    pub existing_kind: ResolutionKind,
    /// What the existing record produces
    pub existing_type: TypeKey,
    /// What the rejected registration would have produced
    pub attempted_type: TypeKey,
}

impl fmt::Display for DuplicateRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Can't register {}: duplicate, already registered as {} producing {}",
            self.key, self.existing_kind, self.existing_type,
        )?;
        if self.attempted_type != self.existing_type {
            write!(f, "\n  Rejected registration produced {}", self.attempted_type)?;
        }
        write!(f, "\n  Hint: every name, alias and type may be bound only once")
    }
}

/// Error when no constructor survives selection.
///
/// Carries the resolution chain that led here, so a failure deep in
/// the graph names its consumers.
#[derive(Debug)]
pub struct NoUsableConstructorError {
    /// The type that could not be built
    pub produced: TypeKey,
    /// Types being resolved when the failure happened, outermost first
    pub chain: Vec<TypeKey>,
    /// Labels of the constructors that were excluded
    pub rejected: Vec<&'static str>,
}

impl fmt::Display for NoUsableConstructorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No usable constructor for {}", self.produced)?;

        if self.chain.len() > 1 {
            let names: Vec<String> = self.chain.iter().map(TypeKey::short_name).collect();
            write!(f, "\n  While resolving: {}", render_chain(&names))?;
        }

        write!(f, "\n  Rejected constructors: {}", render_names(&self.rejected))?;
        write!(
            f,
            "\n  Hint: constructors taking text or bool parameters are never selected; \
             register a factory instead"
        )
    }
}

/// Convenient Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
