//! Deliverables and the command catalog.
//!
//! A deliverable is a named command. Its canonical name and aliases are
//! static metadata ([`DeliverableDescriptor`]) readable without building
//! an instance. The [`Catalog`] registers each deliverable once under its
//! canonical name and binds every alias to that same record.
//!
//! Deliverables reach a catalog in one of two ways:
//! - an explicit list: `Catalog::new().with::<Publish>().with::<Rollback>()`
//! - link-time discovery: types submitted through `inventory` (what
//!   `#[deliverable(..., discover)]` emits) are collected by
//!   [`Catalog::discover`].

use std::any::{Any, type_name};
use std::fmt;

use tracing::debug;

use crate::constructor::{Injectable, Instance};
use crate::error::{RegistryError, Result};
use crate::key::RegistrationKey;
use crate::record::{DeliverableView, RecordId, Registration};
use crate::store::RegistrationStore;

/// What the host should do after a deliverable ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliverableResponse {
    /// Keep reading commands.
    Continue,
    /// The command failed; keep going unless running non-interactively.
    FinishedWithError,
    /// Stop the host.
    Shutdown,
}

/// A command the host can run by name.
pub trait Deliverable: Any {
    /// Runs the command. `command` is the name or alias it was invoked by.
    fn run(&mut self, command: &str, args: &[String]) -> DeliverableResponse;

    /// The concrete type name, for diagnostics.
    fn type_name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl fmt::Debug for dyn Deliverable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deliverable({})", self.type_name())
    }
}

/// Static metadata of a deliverable type.
pub trait Describe {
    /// The canonical name and aliases.
    fn descriptor() -> DeliverableDescriptor;
}

/// Canonical name and aliases of a deliverable.
///
/// # Examples
/// ```
/// use chauffeur_registry::catalog::DeliverableDescriptor;
///
/// const PUBLISH: DeliverableDescriptor =
///     DeliverableDescriptor::named("publish").with_aliases(&["pub"]);
///
/// assert_eq!(PUBLISH.name(), Some("publish"));
/// assert_eq!(PUBLISH.aliases(), &["pub"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverableDescriptor {
    name: Option<&'static str>,
    aliases: &'static [&'static str],
}

impl DeliverableDescriptor {
    /// A descriptor with a canonical name and no aliases.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            aliases: &[],
        }
    }

    /// A descriptor without a canonical name; registering it fails.
    pub const fn unnamed() -> Self {
        Self { name: None, aliases: &[] }
    }

    /// Replaces the aliases.
    pub const fn with_aliases(self, aliases: &'static [&'static str]) -> Self {
        Self {
            name: self.name,
            aliases,
        }
    }

    /// The declared canonical name, if any.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// The declared aliases.
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// The canonical name, treating blank names as missing.
    pub fn canonical_name(&self) -> Option<&'static str> {
        self.name.filter(|name| !name.trim().is_empty())
    }
}

/// A deliverable type ready to be registered.
///
/// Built with [`CatalogEntry::of`]; `const` so it can be submitted to
/// `inventory` from a static context.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    type_name: fn() -> &'static str,
    descriptor: fn() -> DeliverableDescriptor,
    register: fn(&mut RegistrationStore) -> Result<RecordId>,
}

impl CatalogEntry {
    /// The entry for deliverable type `C`.
    pub const fn of<C: Deliverable + Describe + Injectable>() -> Self {
        Self {
            type_name: type_name::<C>,
            descriptor: C::descriptor,
            register: register_deliverable::<C>,
        }
    }

    /// The deliverable's type name.
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// The deliverable's metadata.
    pub fn descriptor(&self) -> DeliverableDescriptor {
        (self.descriptor)()
    }

    /// Registers the deliverable into `store`.
    pub fn register(&self, store: &mut RegistrationStore) -> Result<RecordId> {
        (self.register)(store)
    }
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("type_name", &self.type_name())
            .field("descriptor", &self.descriptor())
            .finish()
    }
}

inventory::collect!(CatalogEntry);

/// The set of deliverables to register at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every deliverable submitted through `inventory` in this binary.
    ///
    /// Link order is not stable, so entries are sorted by type name.
    pub fn discover() -> Self {
        let mut entries: Vec<CatalogEntry> =
            inventory::iter::<CatalogEntry>.into_iter().copied().collect();
        entries.sort_by_key(CatalogEntry::type_name);
        debug!(discovered = entries.len(), "Discovered deliverables");
        Self { entries }
    }

    /// Adds deliverable `C`.
    pub fn with<C: Deliverable + Describe + Injectable>(mut self) -> Self {
        self.entries.push(CatalogEntry::of::<C>());
        self
    }

    /// Adds an entry.
    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    /// The entries, in registration order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of deliverables in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog holds no deliverables.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers every entry into `store`.
    ///
    /// # Errors
    /// Stops at the first [`RegistryError::MissingCanonicalName`] or
    /// [`RegistryError::DuplicateRegistration`]; initialization is
    /// expected to abort.
    pub fn register_into(&self, store: &mut RegistrationStore) -> Result<Vec<RecordId>> {
        self.entries.iter().map(|entry| entry.register(store)).collect()
    }
}

/// Registers deliverable `C` under its canonical name and every alias.
pub(crate) fn register_deliverable<C: Deliverable + Describe + Injectable>(
    store: &mut RegistrationStore,
) -> Result<RecordId> {
    let descriptor = C::descriptor();
    let name = descriptor
        .canonical_name()
        .ok_or(RegistryError::MissingCanonicalName {
            type_name: type_name::<C>(),
        })?;

    let view = DeliverableView {
        descriptor,
        cast: cast_deliverable::<C>,
    };
    let record = Registration::reflective::<C>(RegistrationKey::from(name)).into_deliverable(view);
    let id = store.register(RegistrationKey::from(name), record)?;

    for alias in descriptor.aliases() {
        store.bind(RegistrationKey::from(*alias), id)?;
    }

    debug!(
        canonical = name,
        aliases = descriptor.aliases().len(),
        deliverable = type_name::<C>(),
        "Registered deliverable"
    );
    Ok(id)
}

fn cast_deliverable<C: Deliverable>(instance: Instance) -> Option<Box<dyn Deliverable>> {
    instance.downcast::<C>().ok().map(|deliverable| deliverable as Box<dyn Deliverable>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::Constructor;
    use crate::resolver::Resolver;

    struct Publish;
    struct Rollback;
    struct Nameless;
    struct Clashing;

    macro_rules! deliverable {
        ($ty:ident, $descriptor:expr) => {
            impl Deliverable for $ty {
                fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
                    DeliverableResponse::Continue
                }
            }

            impl Describe for $ty {
                fn descriptor() -> DeliverableDescriptor {
                    $descriptor
                }
            }

            impl Injectable for $ty {
                fn constructors() -> Vec<Constructor<Self>> {
                    vec![Constructor::new(stringify!($ty), |_| $ty)]
                }
            }
        };
    }

    deliverable!(Publish, DeliverableDescriptor::named("publish").with_aliases(&["pub"]));
    deliverable!(Rollback, DeliverableDescriptor::named("rollback"));
    deliverable!(Nameless, DeliverableDescriptor::unnamed().with_aliases(&["anon"]));
    deliverable!(Clashing, DeliverableDescriptor::named("clash").with_aliases(&["pub"]));

    fn build(store: &RegistrationStore, name: &'static str) -> Box<dyn Deliverable> {
        let record = store.lookup(&RegistrationKey::from(name)).unwrap();
        let instance = Resolver::new(store)
            .resolve_key(&RegistrationKey::from(name))
            .unwrap()
            .unwrap();
        (record.deliverable_cast().unwrap())(instance).unwrap()
    }

    #[test]
    fn name_and_alias_share_one_record() {
        let mut store = RegistrationStore::new();
        let ids = Catalog::new()
            .with::<Publish>()
            .with::<Rollback>()
            .register_into(&mut store)
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(store.lookup_id(&RegistrationKey::from("pub")), Some(ids[0]));
        assert_eq!(store.lookup_id(&RegistrationKey::from("publish")), Some(ids[0]));
        assert_eq!(store.lookup_id(&RegistrationKey::from("rollback")), Some(ids[1]));
        assert_eq!(store.all_distinct_records().count(), 2);

        assert_eq!(build(&store, "pub").type_name(), type_name::<Publish>());
        assert_eq!(build(&store, "publish").type_name(), type_name::<Publish>());
        assert_eq!(build(&store, "rollback").type_name(), type_name::<Rollback>());
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut store = RegistrationStore::new();
        let result = Catalog::new().with::<Nameless>().register_into(&mut store);

        assert!(matches!(result, Err(RegistryError::MissingCanonicalName { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn blank_name_counts_as_missing() {
        let descriptor = DeliverableDescriptor::named("  ");
        assert_eq!(descriptor.canonical_name(), None);
    }

    #[test]
    fn alias_collision_is_a_duplicate() {
        let mut store = RegistrationStore::new();
        let result = Catalog::new().with::<Publish>().with::<Clashing>().register_into(&mut store);

        match result {
            Err(RegistryError::DuplicateRegistration(err)) => {
                assert_eq!(err.key, RegistrationKey::from("pub"));
            }
            other => panic!("Expected DuplicateRegistration, got: {other:?}"),
        }
        // "pub" still belongs to the first deliverable
        assert_eq!(build(&store, "pub").type_name(), type_name::<Publish>());
    }

    #[test]
    fn entries_read_metadata_without_building() {
        let entry = CatalogEntry::of::<Publish>();
        assert_eq!(entry.descriptor().name(), Some("publish"));
        assert!(entry.type_name().ends_with("Publish"));
    }

    #[test]
    fn deliverable_debug_names_the_type() {
        let deliverable: Box<dyn Deliverable> = Box::new(Rollback);
        assert!(format!("{deliverable:?}").contains("Rollback"));
    }
}
