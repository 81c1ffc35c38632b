//! Build plugins: batches of registrations contributed by a deployment.
//!
//! The registry knows nothing about the services a host needs. A host
//! packages them in one or more [`BuildDependencies`] implementations
//! and runs each once while populating the container.
//!
//! # Examples
//! ```rust
//! use chauffeur_registry::prelude::*;
//!
//! struct ClockPlugin;
//!
//! impl BuildDependencies for ClockPlugin {
//!     fn build(&self, builder: &mut ContainerBuilder) -> Result<()> {
//!         builder.register_instance(1_700_000_000u64)?;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut builder = Container::builder().require_sentinel(false);
//! builder.register_from(&ClockPlugin)?;
//! let container = builder.build()?;
//! assert_eq!(container.resolve::<u64>()?, Some(1_700_000_000));
//! # Ok(())
//! # }
//! ```

use crate::container::ContainerBuilder;
use crate::error::Result;

/// A module that registers related services into a container.
///
/// Called once during initialization. Registrations may fail fast with
/// [`RegistryError`](crate::error::RegistryError); wrap foreign errors
/// with [`RegistryError::plugin`](crate::error::RegistryError::plugin).
pub trait BuildDependencies {
    /// Register services into the builder.
    fn build(&self, builder: &mut ContainerBuilder) -> Result<()>;

    /// Human-readable name for logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::error::RegistryError;

    struct Output(Vec<String>);

    struct OutputPlugin;

    impl BuildDependencies for OutputPlugin {
        fn build(&self, builder: &mut ContainerBuilder) -> Result<()> {
            builder.register_factory(|| Output(Vec::new()))?;
            builder.register_instance(String::from("chauffeur"))?;
            Ok(())
        }
    }

    struct FailingPlugin;

    impl BuildDependencies for FailingPlugin {
        fn build(&self, _builder: &mut ContainerBuilder) -> Result<()> {
            Err(RegistryError::plugin(self.name(), "host not booted"))
        }
    }

    #[test]
    fn plugin_registers_services() {
        let mut builder = Container::builder().require_sentinel(false);
        builder.register_from(&OutputPlugin).unwrap();

        assert_eq!(builder.store().record_count(), 2);
        let output: Output = builder.resolve().unwrap().unwrap();
        assert!(output.0.is_empty());
    }

    #[test]
    fn plugin_twice_is_a_duplicate() {
        let mut builder = Container::builder().require_sentinel(false);
        builder.register_from(&OutputPlugin).unwrap();
        let again = builder.register_from(&OutputPlugin);
        assert!(matches!(again, Err(RegistryError::DuplicateRegistration(_))));
    }

    #[test]
    fn plugin_failure_propagates() {
        let mut builder = Container::builder();
        match builder.register_from(&FailingPlugin) {
            Err(RegistryError::PluginFailed { plugin, .. }) => {
                assert!(plugin.contains("FailingPlugin"));
            }
            other => panic!("Expected PluginFailed, got: {other:?}"),
        }
    }

    #[test]
    fn plugin_has_name() {
        assert!(OutputPlugin.name().contains("OutputPlugin"));
    }
}
