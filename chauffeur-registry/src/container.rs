//! # The Container
//!
//! Population happens on a [`ContainerBuilder`]; [`build()`](ContainerBuilder::build)
//! checks the sentinel and freezes the registrations into a [`Container`].
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──register*/register_from──> RegistrationStore
//!        │
//!     build()  (sentinel check)
//!        ▼
//!    Container ──resolve / resolve_command_by_name──> fresh instances
//! ```
//!
//! # Examples
//! ```rust
//! use chauffeur_registry::prelude::*;
//!
//! struct Greeting(String);
//!
//! impl Injectable for Greeting {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new("Greeting::default", |_| Greeting("hello".into()))]
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut builder = Container::builder().require_sentinel(false);
//! builder.register::<Greeting>()?;
//! let container = builder.build()?;
//!
//! let greeting: Greeting = container.resolve()?.expect("registered");
//! assert_eq!(greeting.0, "hello");
//! # Ok(())
//! # }
//! ```

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;

use once_cell::unsync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::builder::RegistrationBuilder;
use crate::catalog::{self, Catalog, Deliverable, DeliverableDescriptor, Describe};
use crate::constructor::{Injectable, Instance};
use crate::error::{RegistryError, Result};
use crate::key::RegistrationKey;
use crate::plugin::BuildDependencies;
use crate::record::{RecordId, Registration};
use crate::resolver::Resolver;
use crate::settings::ContainerSettings;
use crate::store::{Conversion, RegistrationStore};
use chauffeur_support::rendering::suggest_similar;

/// How many near-miss names a failed command lookup reports.
const MAX_SUGGESTIONS: usize = 3;

// ============================================================
// ContainerBuilder
// ============================================================

/// Collects registrations, then builds a [`Container`].
///
/// Every `register*` method fails fast on a key that is already bound;
/// initialization is expected to abort on the first error.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    store: RegistrationStore,
    settings: ContainerSettings,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback deliverable's name (default `"unknown"`).
    pub fn sentinel(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.settings = self.settings.with_sentinel(name);
        self
    }

    /// Whether [`build`](Self::build) insists on the sentinel (default `true`).
    pub fn require_sentinel(mut self, require: bool) -> Self {
        self.settings = self.settings.with_require_sentinel(require);
        self
    }

    /// Replaces all settings at once.
    pub fn with_settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The current settings.
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    // ── Reflective ──

    /// Registers `T` under its own type, built through its constructor table.
    pub fn register<T: Injectable>(&mut self) -> Result<RegistrationBuilder<'_, T>> {
        self.register_keyed::<T>(RegistrationKey::of::<T>())
    }

    /// Registers `T` under an explicit key, built through its constructor table.
    ///
    /// Reflective records still resolve their parameters by type, so a
    /// `T` registered only under a name is never injected implicitly.
    ///
    /// # Errors
    /// [`RegistryError::KeyTypeMismatch`] if `key` is the type key of
    /// anything but `T`; use [`register_as`](Self::register_as) for that.
    pub fn register_keyed<T: Injectable>(
        &mut self,
        key: impl Into<RegistrationKey>,
    ) -> Result<RegistrationBuilder<'_, T>> {
        let key = key.into();
        let id = self.store.register(key.clone(), Registration::reflective::<T>(key))?;
        Ok(RegistrationBuilder::new(&mut self.store, id))
    }

    /// Registers `T` under the type key of `K` only, built through `T`'s
    /// constructor table and converted with `convert`.
    ///
    /// `T` itself stays unregistered; resolving `K` yields the converted
    /// value.
    pub fn register_as<T, K>(
        &mut self,
        convert: impl Fn(T) -> K + 'static,
    ) -> Result<RegistrationBuilder<'_, T>>
    where
        T: Injectable,
        K: 'static,
    {
        let record = Registration::reflective::<T>(RegistrationKey::of::<K>());
        let id = self.store.register_as(record, Conversion::new(convert))?;
        Ok(RegistrationBuilder::new(&mut self.store, id))
    }

    /// Registers an interface-only type. Resolving it yields nothing.
    ///
    /// Useful as a placeholder a later alias or plugin replaces, and as a
    /// parameter type constructors may accept as absent.
    pub fn register_abstract<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<RegistrationBuilder<'_, T>> {
        let key = RegistrationKey::of::<T>();
        let id = self.store.register(key.clone(), Registration::abstract_type::<T>(key))?;
        Ok(RegistrationBuilder::new(&mut self.store, id))
    }

    // ── Factory ──

    /// Registers `factory` as the producer of `T`.
    ///
    /// Called on every resolve.
    pub fn register_factory<T: 'static>(
        &mut self,
        factory: impl Fn() -> T + 'static,
    ) -> Result<RegistrationBuilder<'_, T>> {
        let key = RegistrationKey::of::<T>();
        let id = self.store.register(key.clone(), Registration::factory(key, factory))?;
        Ok(RegistrationBuilder::new(&mut self.store, id))
    }

    /// Registers a pre-built value, cloned on every resolve.
    ///
    /// Wrap services in `Rc<T>` for cheap sharing.
    pub fn register_instance<T: Clone + 'static>(
        &mut self,
        value: T,
    ) -> Result<RegistrationBuilder<'_, T>> {
        self.register_factory(move || value.clone())
    }

    /// Registers a factory that runs once, on first resolve.
    ///
    /// The value is cached (via `OnceCell`) and cloned afterwards. The
    /// after-creation hook still runs on every clone handed out.
    pub fn register_lazy<T: Clone + 'static>(
        &mut self,
        factory: impl Fn() -> T + 'static,
    ) -> Result<RegistrationBuilder<'_, T>> {
        let cell: OnceCell<T> = OnceCell::new();
        self.register_factory(move || cell.get_or_init(&factory).clone())
    }

    // ── Deliverables ──

    /// Registers deliverable `C` under its canonical name and every alias.
    ///
    /// # Errors
    /// [`RegistryError::MissingCanonicalName`] if `C` declares no name,
    /// [`RegistryError::DuplicateRegistration`] if the name or an alias
    /// is already bound.
    pub fn register_deliverable<C>(&mut self) -> Result<RegistrationBuilder<'_, C>>
    where
        C: Deliverable + Describe + Injectable,
    {
        let id = catalog::register_deliverable::<C>(&mut self.store)?;
        Ok(RegistrationBuilder::new(&mut self.store, id))
    }

    /// Registers every deliverable in `catalog`.
    pub fn register_catalog(&mut self, catalog: &Catalog) -> Result<Vec<RecordId>> {
        info!(deliverables = catalog.len(), "Registering catalog");
        catalog.register_into(&mut self.store)
    }

    // ── Plugins ──

    /// Runs a [`BuildDependencies`] plugin against this builder.
    #[instrument(skip_all, fields(plugin = plugin.name()))]
    pub fn register_from(&mut self, plugin: &dyn BuildDependencies) -> Result<()> {
        let before = self.store.len();
        plugin.build(self)?;
        debug!(added = self.store.len() - before, "Plugin registered its dependencies");
        Ok(())
    }

    // ── Resolution during population ──

    /// Resolves `T` from what is registered so far.
    ///
    /// Plugins use this to read services an earlier plugin provided.
    pub fn resolve<T: 'static>(&self) -> Result<Option<T>> {
        self.resolver().resolve()
    }

    /// Resolves `key` as `T` from what is registered so far.
    pub fn resolve_as<T: 'static>(&self, key: &RegistrationKey) -> Result<Option<T>> {
        self.resolver().resolve_as(key)
    }

    /// A resolver over the registrations made so far.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store)
    }

    /// The registrations made so far.
    pub fn store(&self) -> &RegistrationStore {
        &self.store
    }

    // ── Build ──

    /// Freezes the registrations into a [`Container`].
    ///
    /// # Errors
    /// [`RegistryError::MissingSentinel`] when the sentinel is required
    /// but not registered, [`RegistryError::NotADeliverable`] when the
    /// sentinel name is bound to something that is not a deliverable.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(
            keys = self.store.len(),
            records = self.store.record_count(),
            "Building container"
        );

        if self.settings.require_sentinel() {
            let key = RegistrationKey::name(self.settings.sentinel().to_owned());
            match self.store.lookup(&key) {
                None => {
                    return Err(RegistryError::MissingSentinel {
                        sentinel: self.settings.sentinel().to_owned(),
                    });
                }
                Some(record) if record.descriptor().is_none() => {
                    return Err(RegistryError::NotADeliverable {
                        key,
                        produced: record.produced(),
                    });
                }
                Some(_) => {}
            }
        }

        info!("Container built successfully");
        Ok(Container {
            store: self.store,
            settings: self.settings,
        })
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// The populated, read-only registry.
///
/// Created by [`ContainerBuilder::build()`] or [`Container::bootstrap`].
/// Every resolve builds a fresh instance.
pub struct Container {
    store: RegistrationStore,
    settings: ContainerSettings,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Registers `catalog`, runs each plugin in order, then builds.
    ///
    /// This is the usual startup sequence of a host.
    #[instrument(skip_all, fields(deliverables = catalog.len(), plugins = plugins.len()))]
    pub fn bootstrap(catalog: &Catalog, plugins: &[&dyn BuildDependencies]) -> Result<Self> {
        let mut builder = Self::builder();
        builder.register_catalog(catalog)?;
        for plugin in plugins {
            builder.register_from(*plugin)?;
        }
        builder.build()
    }

    /// Resolve `T` by its own type.
    ///
    /// ```rust,ignore
    /// let writer: Option<Writer> = container.resolve()?;
    /// ```
    pub fn resolve<T: 'static>(&self) -> Result<Option<T>> {
        self.resolver().resolve()
    }

    /// Resolve `key` as `T`.
    pub fn resolve_as<T: 'static>(&self, key: &RegistrationKey) -> Result<Option<T>> {
        self.resolver().resolve_as(key)
    }

    /// Resolve `key` to a type-erased instance.
    pub fn resolve_key(&self, key: &RegistrationKey) -> Result<Option<Instance>> {
        self.resolver().resolve_key(key)
    }

    /// Builds the deliverable registered under `name` (canonical or alias).
    ///
    /// Unknown names fall back to the sentinel deliverable.
    ///
    /// # Errors
    /// [`RegistryError::MissingSentinel`] if `name` is unknown and no
    /// sentinel is registered; [`RegistryError::NotADeliverable`] if the
    /// name is bound to an ordinary service.
    pub fn resolve_command_by_name(&self, name: &str) -> Result<Box<dyn Deliverable>> {
        let key = RegistrationKey::name(name.to_owned());
        if let Some(record) = self.store.lookup(&key) {
            debug!(command = name, "Resolving deliverable");
            return self.build_deliverable(&key, record);
        }

        let suggestions = self.suggest(name);
        debug!(
            command = name,
            sentinel = self.settings.sentinel(),
            suggestions = ?suggestions,
            "Unknown command, falling back to sentinel"
        );

        let sentinel = RegistrationKey::name(self.settings.sentinel().to_owned());
        let record = self
            .store
            .lookup(&sentinel)
            .ok_or_else(|| RegistryError::MissingSentinel {
                sentinel: self.settings.sentinel().to_owned(),
            })?;
        self.build_deliverable(&sentinel, record)
    }

    /// Builds one instance of every registered deliverable.
    ///
    /// A deliverable reachable through several aliases appears once, in
    /// registration order.
    pub fn resolve_all_deliverables(&self) -> Result<Vec<Box<dyn Deliverable>>> {
        self.store
            .all_distinct_records()
            .filter(|(_, record)| record.descriptor().is_some())
            .map(|(_, record)| self.build_deliverable(record.primary_key(), record))
            .collect()
    }

    /// Metadata of every registered deliverable, without building any.
    pub fn deliverables(&self) -> Vec<DeliverableDescriptor> {
        self.store
            .all_distinct_records()
            .filter_map(|(_, record)| record.descriptor().copied())
            .collect()
    }

    /// Registered deliverable names close to `name`, best first.
    pub fn suggest(&self, name: &str) -> Vec<String> {
        let candidates: Vec<&str> = self
            .store
            .names()
            .into_iter()
            .filter(|candidate| *candidate != self.settings.sentinel())
            .filter(|candidate| {
                self.store
                    .lookup(&RegistrationKey::name(candidate.to_string()))
                    .is_some_and(|record| record.descriptor().is_some())
            })
            .collect();
        suggest_similar(name, &candidates, MAX_SUGGESTIONS)
    }

    /// A resolver over this container's registrations.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store)
    }

    /// The frozen registrations.
    pub fn store(&self) -> &RegistrationStore {
        &self.store
    }

    /// The settings the container was built with.
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    fn build_deliverable(
        &self,
        key: &RegistrationKey,
        record: &Registration,
    ) -> Result<Box<dyn Deliverable>> {
        let not_a_deliverable = || RegistryError::NotADeliverable {
            key: key.clone(),
            produced: record.produced(),
        };

        let cast = record.deliverable_cast().ok_or_else(not_a_deliverable)?;
        let instance = self.resolver().resolve_key(key)?.ok_or_else(not_a_deliverable)?;
        cast(instance).ok_or_else(|| {
            warn!(key = %key, produced = %record.produced(), "Deliverable cast failed");
            RegistryError::TypeMismatch {
                key: key.clone(),
                expected: type_name::<Box<dyn Deliverable>>(),
                produced: record.produced(),
            }
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("keys", &self.store.len())
            .field("records", &self.store.record_count())
            .field("sentinel", &self.settings.sentinel())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::builder::RegistrationBuilder;
    pub use crate::catalog::{
        Catalog, CatalogEntry, Deliverable, DeliverableDescriptor, DeliverableResponse, Describe,
    };
    pub use crate::constructor::{Arguments, Constructor, Injectable, Instance};
    pub use crate::error::{RegistryError, Result};
    pub use crate::key::{RegistrationKey, TypeKey};
    pub use crate::plugin::BuildDependencies;
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
