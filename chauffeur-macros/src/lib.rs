//! Procedural macros for Chauffeur.
//!
//! - `#[derive(Injectable)]` - a constructor table built from the struct's fields
//! - `#[derive(Describe)]` - deliverable metadata from `#[deliverable(...)]`
//!
//! Generated code refers to the `chauffeur` facade crate.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod describe;
mod injectable;

/// Derives `Injectable` with one constructor covering every field.
///
/// - `Option<T>` fields take a `T` dependency, `None` when unregistered.
/// - Other fields take their own type, `Default::default()` when unregistered.
/// - `#[injectable(skip)]` fields are not parameters; they start as `Default::default()`.
///
/// ```ignore
/// #[derive(Injectable)]
/// struct Publisher {
///     output: Option<Rc<ConsoleOutput>>,
///     #[injectable(skip)]
///     published: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(injectable))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::expand(&input)
        .unwrap_or_else(darling::Error::write_errors)
        .into()
}

/// Derives `Describe` from a `#[deliverable(...)]` attribute.
///
/// Attributes:
/// - `name = "..."` - canonical name (required)
/// - `alias = "..."` - an alternative name; repeat for several
/// - `discover` - submit the type for `Catalog::discover()`
///
/// ```ignore
/// #[derive(Describe, Injectable)]
/// #[deliverable(name = "publish", alias = "pub", discover)]
/// struct Publish;
/// ```
#[proc_macro_derive(Describe, attributes(deliverable))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    describe::expand(&input)
        .unwrap_or_else(darling::Error::write_errors)
        .into()
}
