//! Resolution: turning a key into a fresh instance.
//!
//! # Algorithm
//! 1. Look up the binding. No binding means absent (`Ok(None)`).
//! 2. Factory records call their producer.
//! 3. Interface-only records are absent.
//! 4. Reflective records pick a constructor with
//!    [`select_constructor`], resolve each parameter by its type through
//!    this same resolver (absent parameters stay `None`), then invoke it.
//! 5. The after-creation hook, if any, sees the instance before it is
//!    returned.
//! 6. A binding that carries a conversion turns the instance into the
//!    key's type, so a consumer asking for `Rc<dyn Trait>` receives the
//!    concrete record's value.
//!
//! Nothing is memoized: every call builds anew. Cyclic constructor
//! graphs recurse without bound; they are a wiring mistake the
//! resolver does not detect.

use std::any::type_name;

use tracing::trace;

use crate::constructor::{Arguments, Instance, select_constructor};
use crate::error::{NoUsableConstructorError, RegistryError, Result};
use crate::key::{RegistrationKey, TypeKey};
use crate::record::{Blueprint, RecordId, Registration};
use crate::store::{Conversion, RegistrationStore};

/// Resolves keys against a borrowed [`RegistrationStore`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'s> {
    store: &'s RegistrationStore,
}

impl<'s> Resolver<'s> {
    /// Creates a resolver over `store`.
    pub fn new(store: &'s RegistrationStore) -> Self {
        Self { store }
    }

    /// Resolves `T` by its own type key.
    pub fn resolve<T: 'static>(&self) -> Result<Option<T>> {
        self.resolve_as(&RegistrationKey::of::<T>())
    }

    /// Resolves `key` and downcasts the instance to `T`.
    ///
    /// # Errors
    /// [`RegistryError::TypeMismatch`] when the record bound to `key`
    /// produces something other than `T`, plus anything
    /// [`resolve_key`](Self::resolve_key) reports.
    pub fn resolve_as<T: 'static>(&self, key: &RegistrationKey) -> Result<Option<T>> {
        let Some((record, conversion)) = self.store.lookup_binding(key) else {
            trace!(key = %key, "No registration");
            return Ok(None);
        };

        // Check before building so a mismatch has no side effects.
        let delivered = conversion.map_or(record.produced(), Conversion::target);
        if delivered != TypeKey::of::<T>() && !record.is_abstract() {
            return Err(type_mismatch::<T>(key, delivered));
        }

        match self.build_bound(key, record, conversion, &mut Vec::new())? {
            Some(instance) => downcast::<T>(key, delivered, instance).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves `key` to a type-erased instance.
    ///
    /// Returns `Ok(None)` when nothing is registered under `key`, or when
    /// the record is interface-only.
    ///
    /// # Errors
    /// [`RegistryError::NoUsableConstructor`] when the record, or any
    /// dependency it pulls in, has no constructor surviving selection.
    pub fn resolve_key(&self, key: &RegistrationKey) -> Result<Option<Instance>> {
        match self.store.lookup_binding(key) {
            Some((record, conversion)) => {
                trace!(key = %key, produced = %record.produced(), "Resolving");
                self.build_bound(key, record, conversion, &mut Vec::new())
            }
            None => {
                trace!(key = %key, "No registration");
                Ok(None)
            }
        }
    }

    /// Resolves a record directly by id.
    pub fn resolve_record(&self, id: RecordId) -> Result<Option<Instance>> {
        match self.store.get(id) {
            Some(record) => self.build(record, &mut Vec::new()),
            None => Ok(None),
        }
    }

    fn build_bound(
        &self,
        key: &RegistrationKey,
        record: &Registration,
        conversion: Option<&Conversion>,
        chain: &mut Vec<TypeKey>,
    ) -> Result<Option<Instance>> {
        let Some(instance) = self.build(record, chain)? else {
            return Ok(None);
        };
        let Some(conversion) = conversion else {
            return Ok(Some(instance));
        };

        trace!(key = %key, produced = %record.produced(), "Converting for binding");
        conversion
            .apply(instance)
            .map(Some)
            .ok_or_else(|| RegistryError::TypeMismatch {
                key: key.clone(),
                expected: conversion.target().type_name(),
                produced: record.produced(),
            })
    }

    fn build(
        &self,
        record: &Registration,
        chain: &mut Vec<TypeKey>,
    ) -> Result<Option<Instance>> {
        let mut instance = match record.blueprint() {
            Blueprint::Factory(factory) => {
                trace!(produced = %record.produced(), "Calling factory");
                factory()
            }
            Blueprint::Abstract => {
                trace!(
                    produced = %record.produced(),
                    "Interface-only registration resolves to nothing"
                );
                return Ok(None);
            }
            Blueprint::Reflective(constructors) => {
                chain.push(record.produced());

                let selected = select_constructor(constructors.iter().map(|c| c.params()))
                    .ok_or_else(|| {
                        RegistryError::NoUsableConstructor(NoUsableConstructorError {
                            produced: record.produced(),
                            chain: chain.clone(),
                            rejected: record.constructor_labels(),
                        })
                    })?;
                let constructor = &constructors[selected];
                trace!(
                    produced = %record.produced(),
                    constructor = constructor.label(),
                    params = constructor.params().len(),
                    "Selected constructor"
                );

                let mut values = Vec::with_capacity(constructor.params().len());
                for param in constructor.params() {
                    values.push(self.resolve_param(param.key(), chain)?);
                }

                chain.pop();
                constructor.invoke(Arguments::new(values))
            }
        };

        if let Some(hook) = record.after_creation() {
            trace!(produced = %record.produced(), "Running after-creation hook");
            hook(&mut *instance);
        }

        Ok(Some(instance))
    }

    fn resolve_param(
        &self,
        param: TypeKey,
        chain: &mut Vec<TypeKey>,
    ) -> Result<Option<Instance>> {
        let key = RegistrationKey::Type(param);
        match self.store.lookup_binding(&key) {
            Some((record, conversion)) => self.build_bound(&key, record, conversion, chain),
            None => {
                trace!(param = %param, "Parameter not registered, passing it as absent");
                Ok(None)
            }
        }
    }
}

fn type_mismatch<T>(key: &RegistrationKey, produced: TypeKey) -> RegistryError {
    RegistryError::TypeMismatch {
        key: key.clone(),
        expected: type_name::<T>(),
        produced,
    }
}

/// Downcasts a built instance to `T`, reporting a mismatch as an error.
pub(crate) fn downcast<T: 'static>(
    key: &RegistrationKey,
    produced: TypeKey,
    instance: Instance,
) -> Result<T> {
    instance
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| type_mismatch::<T>(key, produced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::{Constructor, Injectable};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default, PartialEq)]
    struct Settings {
        retries: u32,
    }

    impl Injectable for Settings {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new("Settings::new", |_| Settings { retries: 3 })]
        }
    }

    #[derive(Debug)]
    struct Writer {
        settings: Option<Settings>,
    }

    impl Injectable for Writer {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![
                Constructor::new("Writer::new", |args: &mut Arguments| Writer {
                    settings: args.next::<Settings>(),
                })
                .param::<Settings>(),
            ]
        }
    }

    struct Labelled;

    impl Injectable for Labelled {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![
                Constructor::new("Labelled::with_label", |_| Labelled).param::<String>(),
                Constructor::new("Labelled::verbose", |_| Labelled).param::<bool>(),
            ]
        }
    }

    fn reflective<T: Injectable>() -> (RegistrationKey, Registration) {
        let key = RegistrationKey::of::<T>();
        (key.clone(), Registration::reflective::<T>(key))
    }

    fn store_with(records: Vec<(RegistrationKey, Registration)>) -> RegistrationStore {
        let mut store = RegistrationStore::new();
        for (key, record) in records {
            store.register(key, record).unwrap();
        }
        store
    }

    #[test]
    fn absent_key_resolves_to_none() {
        let store = RegistrationStore::new();
        let resolver = Resolver::new(&store);
        assert!(resolver.resolve::<Settings>().unwrap().is_none());
        assert!(resolver.resolve_key(&RegistrationKey::name("publish")).unwrap().is_none());
    }

    #[test]
    fn reflective_resolution_builds_dependencies() {
        let store = store_with(vec![reflective::<Settings>(), reflective::<Writer>()]);

        let writer: Writer = Resolver::new(&store).resolve().unwrap().unwrap();
        assert_eq!(writer.settings, Some(Settings { retries: 3 }));
    }

    #[test]
    fn missing_dependency_leaves_slot_empty() {
        let store = store_with(vec![(
            RegistrationKey::of::<Writer>(),
            Registration::reflective::<Writer>(RegistrationKey::of::<Writer>()),
        )]);

        let writer: Writer = Resolver::new(&store).resolve().unwrap().unwrap();
        assert!(writer.settings.is_none());
    }

    #[test]
    fn factory_is_called_on_every_resolve() {
        let calls = Rc::new(Cell::new(0u32));
        let store = store_with(vec![(
            RegistrationKey::of::<u32>(),
            Registration::factory(RegistrationKey::of::<u32>(), {
                let calls = calls.clone();
                move || {
                    calls.set(calls.get() + 1);
                    calls.get()
                }
            }),
        )]);

        let resolver = Resolver::new(&store);
        let values: Vec<u32> = (0..3)
            .map(|_| resolver.resolve::<u32>().unwrap().unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn abstract_record_resolves_to_none() {
        trait Output {}
        let store = store_with(vec![(
            RegistrationKey::of::<Rc<dyn Output>>(),
            Registration::abstract_type::<Rc<dyn Output>>(RegistrationKey::of::<Rc<dyn Output>>()),
        )]);

        assert!(Resolver::new(&store).resolve::<Rc<dyn Output>>().unwrap().is_none());
    }

    #[test]
    fn literal_only_constructors_fail() {
        let store = store_with(vec![(
            RegistrationKey::of::<Labelled>(),
            Registration::reflective::<Labelled>(RegistrationKey::of::<Labelled>()),
        )]);

        match Resolver::new(&store).resolve::<Labelled>() {
            Err(RegistryError::NoUsableConstructor(err)) => {
                assert_eq!(err.produced, TypeKey::of::<Labelled>());
                assert_eq!(err.rejected, vec!["Labelled::with_label", "Labelled::verbose"]);
            }
            Err(other) => panic!("Expected NoUsableConstructor, got: {other:?}"),
            Ok(_) => panic!("Expected NoUsableConstructor, got an instance"),
        }
    }

    #[test]
    fn inner_failure_reports_the_chain() {
        struct NeedsLabelled;
        impl Injectable for NeedsLabelled {
            fn constructors() -> Vec<Constructor<Self>> {
                vec![Constructor::new("NeedsLabelled::new", |_| NeedsLabelled).param::<Labelled>()]
            }
        }

        let store = store_with(vec![reflective::<Labelled>(), reflective::<NeedsLabelled>()]);

        match Resolver::new(&store).resolve::<NeedsLabelled>() {
            Err(RegistryError::NoUsableConstructor(err)) => {
                let expected = vec![TypeKey::of::<NeedsLabelled>(), TypeKey::of::<Labelled>()];
                assert_eq!(err.chain, expected);
            }
            Err(other) => panic!("Expected NoUsableConstructor, got: {other:?}"),
            Ok(_) => panic!("Expected NoUsableConstructor, got an instance"),
        }
    }

    #[test]
    fn hook_runs_before_return() {
        let mut record = Registration::reflective::<Settings>(RegistrationKey::of::<Settings>());
        record.set_after_creation(Rc::new(|instance: &mut dyn std::any::Any| {
            if let Some(settings) = instance.downcast_mut::<Settings>() {
                settings.retries = 9;
            }
        }));
        let store = store_with(vec![(RegistrationKey::of::<Settings>(), record)]);

        let settings: Settings = Resolver::new(&store).resolve().unwrap().unwrap();
        assert_eq!(settings.retries, 9);
    }

    #[test]
    fn typed_resolve_of_wrong_type_is_a_mismatch() {
        let store = store_with(vec![(
            RegistrationKey::name("answer"),
            Registration::factory(RegistrationKey::name("answer"), || 42u8),
        )]);

        let resolver = Resolver::new(&store);
        assert_eq!(resolver.resolve_as::<u8>(&RegistrationKey::name("answer")).unwrap(), Some(42));
        assert!(matches!(
            resolver.resolve_as::<u16>(&RegistrationKey::name("answer")),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }
}
