//! Registration records.
//!
//! A [`Registration`] describes how to produce a value: by calling a
//! factory, or by selecting and invoking one of a type's declared
//! constructors. Several keys may share one record.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::catalog::{Deliverable, DeliverableDescriptor};
use crate::constructor::{ErasedConstructor, Injectable, Instance};
use crate::key::{RegistrationKey, TypeKey};

/// Side effect applied to a freshly built instance before it is returned.
pub type Hook = Rc<dyn Fn(&mut dyn Any)>;

pub(crate) type FactoryFn = Rc<dyn Fn() -> Instance>;

/// Turns a built deliverable back into a trait object.
pub(crate) type DeliverableCast = fn(Instance) -> Option<Box<dyn Deliverable>>;

/// How a record produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    /// Calls a zero-argument producer on every resolve.
    Factory,
    /// Selects a declared constructor and resolves its parameters.
    Reflective,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKind::Factory => write!(f, "Factory"),
            ResolutionKind::Reflective => write!(f, "Reflective"),
        }
    }
}

/// Index of a record inside its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    /// Position of the record in registration order.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

pub(crate) enum Blueprint {
    Factory(FactoryFn),
    Reflective(Vec<ErasedConstructor>),
    /// Interface-only: there is nothing concrete to build.
    Abstract,
}

#[derive(Clone, Copy)]
pub(crate) struct DeliverableView {
    pub descriptor: DeliverableDescriptor,
    pub cast: DeliverableCast,
}

/// Registration entry for a single producible value.
pub struct Registration {
    produced: TypeKey,
    primary_key: RegistrationKey,
    blueprint: Blueprint,
    after_creation: Option<Hook>,
    deliverable: Option<DeliverableView>,
}

impl Registration {
    pub(crate) fn factory<T: 'static>(
        primary_key: RegistrationKey,
        factory: impl Fn() -> T + 'static,
    ) -> Self {
        Self::with_blueprint(
            TypeKey::of::<T>(),
            primary_key,
            Blueprint::Factory(Rc::new(move || Box::new(factory()) as Instance)),
        )
    }

    pub(crate) fn reflective<T: Injectable>(primary_key: RegistrationKey) -> Self {
        let constructors = T::constructors()
            .into_iter()
            .map(|constructor| constructor.erase())
            .collect();
        Self::with_blueprint(TypeKey::of::<T>(), primary_key, Blueprint::Reflective(constructors))
    }

    pub(crate) fn abstract_type<T: ?Sized + 'static>(primary_key: RegistrationKey) -> Self {
        Self::with_blueprint(TypeKey::of::<T>(), primary_key, Blueprint::Abstract)
    }

    fn with_blueprint(
        produced: TypeKey,
        primary_key: RegistrationKey,
        blueprint: Blueprint,
    ) -> Self {
        Self {
            produced,
            primary_key,
            blueprint,
            after_creation: None,
            deliverable: None,
        }
    }

    pub(crate) fn into_deliverable(mut self, view: DeliverableView) -> Self {
        self.deliverable = Some(view);
        self
    }

    /// The concrete type this record instantiates.
    #[inline]
    pub fn produced(&self) -> TypeKey {
        self.produced
    }

    /// The key this record was first registered under.
    #[inline]
    pub fn primary_key(&self) -> &RegistrationKey {
        &self.primary_key
    }

    /// How this record resolves. Interface-only records report `Reflective`.
    pub fn kind(&self) -> ResolutionKind {
        match self.blueprint {
            Blueprint::Factory(_) => ResolutionKind::Factory,
            Blueprint::Reflective(_) | Blueprint::Abstract => ResolutionKind::Reflective,
        }
    }

    /// Returns `true` for interface-only records, which always resolve to nothing.
    pub fn is_abstract(&self) -> bool {
        matches!(self.blueprint, Blueprint::Abstract)
    }

    /// Returns `true` when an after-creation hook is set.
    pub fn has_after_creation(&self) -> bool {
        self.after_creation.is_some()
    }

    /// Labels of the declared constructors, in declaration order.
    pub fn constructor_labels(&self) -> Vec<&'static str> {
        match &self.blueprint {
            Blueprint::Reflective(constructors) => {
                constructors.iter().map(ErasedConstructor::label).collect()
            }
            Blueprint::Factory(_) | Blueprint::Abstract => Vec::new(),
        }
    }

    /// The deliverable metadata, if the catalog registered this record.
    pub fn descriptor(&self) -> Option<&DeliverableDescriptor> {
        self.deliverable.as_ref().map(|view| &view.descriptor)
    }

    pub(crate) fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    pub(crate) fn after_creation(&self) -> Option<&Hook> {
        self.after_creation.as_ref()
    }

    /// Sets the hook, returning `true` if an earlier one was replaced.
    pub(crate) fn set_after_creation(&mut self, hook: Hook) -> bool {
        self.after_creation.replace(hook).is_some()
    }

    pub(crate) fn deliverable_cast(&self) -> Option<DeliverableCast> {
        self.deliverable.map(|view| view.cast)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("produced", &self.produced)
            .field("primary_key", &self.primary_key)
            .field("kind", &self.kind())
            .field("abstract", &self.is_abstract())
            .field("constructors", &self.constructor_labels())
            .field("after_creation", &self.has_after_creation())
            .field("deliverable", &self.descriptor())
            .finish()
    }
}
