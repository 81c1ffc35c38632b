//! `#[derive(Describe)]` implementation.

use std::collections::HashSet;

use darling::util::Flag;
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Generics, Ident, LitStr};

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(deliverable))]
struct DeliverableArgs {
    ident: Ident,
    generics: Generics,
    #[darling(default)]
    name: Option<LitStr>,
    #[darling(multiple, rename = "alias")]
    aliases: Vec<LitStr>,
    discover: Flag,
}

pub(crate) fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let args = DeliverableArgs::from_derive_input(input)?;
    let ident = &args.ident;

    if !args.generics.params.is_empty() {
        return Err(
            darling::Error::custom("deliverables cannot be generic").with_span(&args.generics)
        );
    }

    let Some(name) = &args.name else {
        return Err(darling::Error::custom(
            "missing canonical name: add #[deliverable(name = \"...\")]",
        )
        .with_span(ident));
    };
    if name.value().trim().is_empty() {
        return Err(darling::Error::custom("canonical name must not be blank").with_span(name));
    }

    let mut errors = darling::Error::accumulator();
    let mut seen = HashSet::new();
    for alias in &args.aliases {
        let value = alias.value();
        if value.trim().is_empty() {
            errors.push(darling::Error::custom("alias must not be blank").with_span(alias));
        } else if value == name.value() {
            errors.push(
                darling::Error::custom("alias repeats the canonical name").with_span(alias),
            );
        } else if !seen.insert(value) {
            errors.push(darling::Error::custom("alias is listed twice").with_span(alias));
        }
    }
    errors.finish()?;

    let aliases = &args.aliases;
    let describe = quote! {
        impl ::chauffeur::Describe for #ident {
            fn descriptor() -> ::chauffeur::DeliverableDescriptor {
                ::chauffeur::DeliverableDescriptor::named(#name)
                    .with_aliases(&[#(#aliases),*])
            }
        }
    };

    let discover = args.discover.is_present().then(|| {
        quote! {
            ::chauffeur::inventory::submit! {
                ::chauffeur::CatalogEntry::of::<#ident>()
            }
        }
    });

    Ok(quote! {
        #describe
        #discover
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_aliases_are_emitted() {
        let input: DeriveInput = syn::parse_quote! {
            #[deliverable(name = "publish", alias = "pub", alias = "p")]
            struct Publish;
        };
        let tokens = expand(&input).unwrap().to_string();
        assert!(tokens.contains("\"publish\""));
        assert!(tokens.contains("\"pub\" , \"p\""));
        assert!(!tokens.contains("submit"));
    }

    #[test]
    fn missing_name_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            #[deliverable(alias = "pub")]
            struct Publish;
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn repeated_alias_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            #[deliverable(name = "publish", alias = "pub", alias = "pub")]
            struct Publish;
        };
        let err = expand(&input).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.to_string().contains("alias is listed twice"));
    }

    #[test]
    fn alias_equal_to_name_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            #[deliverable(name = "publish", alias = "publish")]
            struct Publish;
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn discover_submits_an_entry() {
        let input: DeriveInput = syn::parse_quote! {
            #[deliverable(name = "status", discover)]
            struct Status;
        };
        let tokens = expand(&input).unwrap().to_string();
        assert!(tokens.contains("submit"));
    }
}
