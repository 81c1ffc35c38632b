//! Registration store, resolver, and command catalog for Chauffeur.

pub mod builder;
pub mod catalog;
pub mod constructor;
pub mod container;
pub mod error;
pub mod key;
pub mod plugin;
pub mod record;
pub mod resolver;
pub mod settings;
pub mod store;

pub use builder::RegistrationBuilder;
pub use catalog::{
    Catalog, CatalogEntry, Deliverable, DeliverableDescriptor, DeliverableResponse, Describe,
};
pub use constructor::{
    Arguments, Constructor, Injectable, Instance, Param, ParamKind, select_constructor,
};
pub use container::{Container, ContainerBuilder, prelude};
pub use error::{RegistryError, Result};
pub use key::{RegistrationKey, TypeKey};
pub use plugin::BuildDependencies;
pub use record::{RecordId, Registration, ResolutionKind};
pub use resolver::Resolver;
pub use settings::ContainerSettings;
pub use store::RegistrationStore;

#[doc(hidden)]
pub use inventory;
