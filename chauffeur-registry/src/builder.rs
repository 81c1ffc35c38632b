//! Fluent follow-ups on a fresh registration.
//!
//! Every `register*` call on [`ContainerBuilder`](crate::container::ContainerBuilder)
//! hands back a [`RegistrationBuilder`] for the record it just created:
//!
//! ```rust
//! use chauffeur_registry::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let mut builder = Container::builder().require_sentinel(false);
//! builder
//!     .register_factory(|| String::from("postgres://localhost"))?
//!     .alias("database-url")?
//!     .on_created(|url| url.push_str("/chauffeur"));
//!
//! let container = builder.build()?;
//! let url: Option<String> = container.resolve_as(&"database-url".into())?;
//! assert_eq!(url.as_deref(), Some("postgres://localhost/chauffeur"));
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::key::RegistrationKey;
use crate::record::RecordId;
use crate::store::{Conversion, RegistrationStore};

/// Adds aliases or an after-creation hook to one record.
///
/// `T` is the type the record produces.
pub struct RegistrationBuilder<'s, T: ?Sized> {
    store: &'s mut RegistrationStore,
    record: RecordId,
    _produced: PhantomData<fn() -> T>,
}

impl<'s, T: ?Sized + 'static> RegistrationBuilder<'s, T> {
    pub(crate) fn new(store: &'s mut RegistrationStore, record: RecordId) -> Self {
        Self {
            store,
            record,
            _produced: PhantomData,
        }
    }

    /// Binds `key` to this same record.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateRegistration`](crate::error::RegistryError::DuplicateRegistration)
    /// if `key` is already bound.
    pub fn alias(self, key: impl Into<RegistrationKey>) -> Result<Self> {
        self.store.bind(key.into(), self.record)?;
        Ok(self)
    }

    /// The id of the record being configured.
    pub fn id(&self) -> RecordId {
        self.record
    }
}

impl<T: 'static> RegistrationBuilder<'_, T> {
    /// Binds the type key of `K` to this same record, converting each
    /// built `T` with `convert`.
    ///
    /// This is how a concrete service is exposed as an interface:
    ///
    /// ```rust
    /// use std::rc::Rc;
    /// use chauffeur_registry::prelude::*;
    ///
    /// trait Clock {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// struct FixedClock;
    ///
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> u64 {
    ///         7
    ///     }
    /// }
    ///
    /// # fn main() -> Result<()> {
    /// let mut builder = Container::builder().require_sentinel(false);
    /// builder
    ///     .register_factory(|| Rc::new(FixedClock))?
    ///     .alias_as(|clock| clock as Rc<dyn Clock>)?;
    ///
    /// let clock: Option<Rc<dyn Clock>> = builder.build()?.resolve()?;
    /// assert_eq!(clock.map(|clock| clock.now()), Some(7));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// [`RegistryError::DuplicateRegistration`](crate::error::RegistryError::DuplicateRegistration)
    /// if `K` is already bound.
    pub fn alias_as<K: 'static>(self, convert: impl Fn(T) -> K + 'static) -> Result<Self> {
        self.store.bind_as(self.record, Conversion::new(convert))?;
        Ok(self)
    }

    /// Runs `hook` on every freshly built instance before it is returned.
    ///
    /// A record holds one hook; calling this again replaces the earlier
    /// hook (last write wins).
    pub fn on_created(self, hook: impl Fn(&mut T) + 'static) -> Self {
        let hook = Rc::new(move |instance: &mut dyn Any| {
            if let Some(instance) = instance.downcast_mut::<T>() {
                hook(instance);
            }
        });

        if let Some(record) = self.store.get_mut(self.record) {
            if record.set_after_creation(hook) {
                debug!(produced = %record.produced(), "Replaced after-creation hook");
            } else {
                debug!(produced = %record.produced(), "Registered after-creation hook");
            }
        }
        self
    }
}
