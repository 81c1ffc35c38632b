//! # Chauffeur: a minimal dependency registry for command hosts
//!
//! Registers services and named commands ("deliverables"), builds fresh
//! instances on every resolve, and routes unknown command names to a
//! sentinel deliverable.
//!
//! ```rust
//! use chauffeur::prelude::*;
//!
//! #[derive(Injectable, Describe)]
//! #[deliverable(name = "publish", alias = "pub")]
//! struct Publish;
//!
//! #[derive(Injectable, Describe)]
//! #[deliverable(name = "unknown")]
//! struct Unknown;
//!
//! impl Deliverable for Publish {
//!     fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
//!         DeliverableResponse::Continue
//!     }
//! }
//!
//! impl Deliverable for Unknown {
//!     fn run(&mut self, _command: &str, _args: &[String]) -> DeliverableResponse {
//!         DeliverableResponse::FinishedWithError
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let catalog = Catalog::new().with::<Publish>().with::<Unknown>();
//! let container = Container::bootstrap(&catalog, &[])?;
//!
//! let mut command = container.resolve_command_by_name("pub")?;
//! assert_eq!(command.run("pub", &[]), DeliverableResponse::Continue);
//!
//! let mut fallback = container.resolve_command_by_name("deploy")?;
//! assert_eq!(fallback.run("deploy", &[]), DeliverableResponse::FinishedWithError);
//! # Ok(())
//! # }
//! ```

pub use chauffeur_derive::*;
pub use chauffeur_registry::*;
pub use chauffeur_support::*;

/// Registry types plus the derives, under the same names as their traits.
pub mod prelude {
    pub use chauffeur_derive::{Describe, Injectable};
    pub use chauffeur_registry::prelude::{
        Arguments, BuildDependencies, Catalog, CatalogEntry, Constructor, Container,
        ContainerBuilder, ContainerSettings, Deliverable, DeliverableDescriptor,
        DeliverableResponse, Describe, Injectable, Instance, RegistrationBuilder, RegistrationKey,
        RegistryError, Result, TypeKey,
    };
}
