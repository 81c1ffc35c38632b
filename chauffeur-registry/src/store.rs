//! Registration store: maps keys to records.
//!
//! Records live in an arena in registration order; keys point at them
//! by [`RecordId`]. Uniqueness is enforced per key, never per record,
//! so a deliverable's name and its aliases legitimately share one record.
//!
//! A type key always delivers its own type. Binding a record under the
//! type key of something else (an interface, say) needs a [`Conversion`]
//! from the produced type into the key's type.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::constructor::Instance;
use crate::error::{DuplicateRegistrationError, RegistryError, Result};
use crate::key::{RegistrationKey, TypeKey};
use crate::record::{RecordId, Registration};

type ConvertFn = Rc<dyn Fn(Instance) -> Option<Instance>>;

/// Turns a record's built instance into the type its binding key names.
#[derive(Clone)]
pub(crate) struct Conversion {
    source: TypeKey,
    target: TypeKey,
    convert: ConvertFn,
}

impl Conversion {
    pub(crate) fn new<T: 'static, K: 'static>(convert: impl Fn(T) -> K + 'static) -> Self {
        Self {
            source: TypeKey::of::<T>(),
            target: TypeKey::of::<K>(),
            convert: Rc::new(move |instance: Instance| {
                let value = instance.downcast::<T>().ok()?;
                Some(Box::new(convert(*value)) as Instance)
            }),
        }
    }

    /// The type the binding key delivers.
    pub(crate) fn target(&self) -> TypeKey {
        self.target
    }

    fn ensure_source(&self, key: &RegistrationKey, produced: TypeKey) -> Result<()> {
        if self.source == produced {
            Ok(())
        } else {
            Err(RegistryError::KeyTypeMismatch { key: key.clone(), produced })
        }
    }

    /// Converts `instance`; `None` if it is not of the source type.
    pub(crate) fn apply(&self, instance: Instance) -> Option<Instance> {
        (self.convert)(instance)
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conversion({} -> {})", self.source, self.target)
    }
}

#[derive(Debug, Clone)]
struct Binding {
    id: RecordId,
    conversion: Option<Conversion>,
}

/// Stores every registration for one container.
///
/// Populated once during initialization and read-only afterwards.
/// There is no unregistration.
#[derive(Debug, Default)]
pub struct RegistrationStore {
    bindings: HashMap<RegistrationKey, Binding>,
    records: Vec<Registration>,
}

impl RegistrationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` under `key`.
    ///
    /// # Errors
    /// - [`RegistryError::DuplicateRegistration`] if `key` is already
    ///   bound. The rejected record is dropped, the existing one is left
    ///   untouched.
    /// - [`RegistryError::KeyTypeMismatch`] if `key` is the type key of
    ///   something other than what the record produces.
    pub fn register(&mut self, key: RegistrationKey, record: Registration) -> Result<RecordId> {
        self.ensure_vacant(&key, &record)?;
        ensure_key_fits(&key, record.produced())?;
        Ok(self.insert(key, record, None))
    }

    /// Stores `record` under the type key of the conversion's target.
    pub(crate) fn register_as(
        &mut self,
        record: Registration,
        conversion: Conversion,
    ) -> Result<RecordId> {
        let key = RegistrationKey::Type(conversion.target());
        self.ensure_vacant(&key, &record)?;
        conversion.ensure_source(&key, record.produced())?;
        Ok(self.insert(key, record, Some(conversion)))
    }

    fn insert(
        &mut self,
        key: RegistrationKey,
        record: Registration,
        conversion: Option<Conversion>,
    ) -> RecordId {
        let id = RecordId(self.records.len());
        debug!(
            key = %key,
            kind = %record.kind(),
            produced = %record.produced(),
            converted = conversion.is_some(),
            "Registered dependency"
        );
        self.records.push(record);
        self.bindings.insert(key, Binding { id, conversion });
        id
    }

    /// Binds an additional `key` to an existing record.
    ///
    /// # Errors
    /// - [`RegistryError::UnknownRecord`] if `id` was not issued by this
    ///   store.
    /// - [`RegistryError::DuplicateRegistration`] if `key` is already
    ///   bound, even when it is bound to the same record.
    /// - [`RegistryError::KeyTypeMismatch`] if `key` is the type key of
    ///   something other than what the record produces.
    pub fn bind(&mut self, key: RegistrationKey, id: RecordId) -> Result<()> {
        let record = self.get(id).ok_or(RegistryError::UnknownRecord { id })?;
        self.ensure_vacant(&key, record)?;
        ensure_key_fits(&key, record.produced())?;

        debug!(alias = %key, primary = %record.primary_key(), "Registered alias");
        self.bindings.insert(key, Binding { id, conversion: None });
        Ok(())
    }

    /// Binds the type key of the conversion's target to an existing record.
    pub(crate) fn bind_as(&mut self, id: RecordId, conversion: Conversion) -> Result<()> {
        let key = RegistrationKey::Type(conversion.target());
        let record = self.get(id).ok_or(RegistryError::UnknownRecord { id })?;
        self.ensure_vacant(&key, record)?;
        conversion.ensure_source(&key, record.produced())?;

        debug!(alias = %key, primary = %record.primary_key(), "Registered converting alias");
        self.bindings.insert(key, Binding { id, conversion: Some(conversion) });
        Ok(())
    }

    fn ensure_vacant(&self, key: &RegistrationKey, attempted: &Registration) -> Result<()> {
        match self.lookup(key) {
            Some(existing) => {
                Err(RegistryError::DuplicateRegistration(DuplicateRegistrationError {
                    key: key.clone(),
                    existing_kind: existing.kind(),
                    existing_type: existing.produced(),
                    attempted_type: attempted.produced(),
                }))
            }
            None => Ok(()),
        }
    }

    /// Looks up the record bound to `key`.
    pub fn lookup(&self, key: &RegistrationKey) -> Option<&Registration> {
        self.lookup_id(key).and_then(|id| self.get(id))
    }

    /// Looks up the record bound to `key` and the binding's conversion.
    pub(crate) fn lookup_binding(
        &self,
        key: &RegistrationKey,
    ) -> Option<(&Registration, Option<&Conversion>)> {
        let binding = self.bindings.get(key)?;
        let record = self.get(binding.id)?;
        Some((record, binding.conversion.as_ref()))
    }

    /// Looks up the id of the record bound to `key`.
    pub fn lookup_id(&self, key: &RegistrationKey) -> Option<RecordId> {
        self.bindings.get(key).map(|binding| binding.id)
    }

    /// Returns `true` if `key` is bound.
    pub fn contains(&self, key: &RegistrationKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// Returns the record with the given id.
    pub fn get(&self, id: RecordId) -> Option<&Registration> {
        self.records.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: RecordId) -> Option<&mut Registration> {
        self.records.get_mut(id.0)
    }

    /// Every distinct record, once each, in registration order.
    ///
    /// A record reachable through several keys still appears once.
    pub fn all_distinct_records(&self) -> impl Iterator<Item = (RecordId, &Registration)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (RecordId(index), record))
    }

    /// Every key bound to the record, sorted for stable output.
    pub fn keys_for(&self, id: RecordId) -> Vec<&RegistrationKey> {
        let mut keys: Vec<&RegistrationKey> = self
            .bindings
            .iter()
            .filter(|(_, binding)| binding.id == id)
            .map(|(key, _)| key)
            .collect();
        keys.sort_by_key(|key| key.to_string());
        keys
    }

    /// Every name key, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .bindings
            .keys()
            .filter_map(RegistrationKey::as_name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of bound keys.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns the number of distinct records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn ensure_key_fits(key: &RegistrationKey, produced: TypeKey) -> Result<()> {
    match key.as_type() {
        Some(expected) if *expected != produced => Err(RegistryError::KeyTypeMismatch {
            key: key.clone(),
            produced,
        }),
        _ => Ok(()),
    }
}
