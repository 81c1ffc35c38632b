//! `#[derive(Injectable)]` implementation.

use darling::ast::{Data, Style};
use darling::util::{Flag, Ignored};
use darling::{FromDeriveInput, FromField};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, GenericArgument, Generics, Ident, PathArguments, Type};

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_any))]
struct InjectableInput {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, InjectableField>,
}

#[derive(Debug, FromField)]
#[darling(attributes(injectable))]
struct InjectableField {
    ident: Option<Ident>,
    ty: Type,
    skip: Flag,
}

/// How one field is filled in.
enum Slot<'a> {
    /// `Option<T>`: parameter `T`, kept as `Option`.
    Optional(&'a Type),
    /// Any other type: parameter of that type, default when absent.
    Required(&'a Type),
    /// `#[injectable(skip)]`: no parameter.
    Skipped,
}

impl<'a> Slot<'a> {
    fn of(field: &'a InjectableField) -> Self {
        if field.skip.is_present() {
            Slot::Skipped
        } else if let Some(inner) = option_inner(&field.ty) {
            Slot::Optional(inner)
        } else {
            Slot::Required(&field.ty)
        }
    }

    fn param(&self) -> Option<TokenStream> {
        match self {
            Slot::Optional(ty) | Slot::Required(ty) => Some(quote!(.param::<#ty>())),
            Slot::Skipped => None,
        }
    }

    fn value(&self) -> TokenStream {
        match self {
            Slot::Optional(ty) => quote!(__args.next::<#ty>()),
            Slot::Required(ty) => quote!(__args.next_or_default::<#ty>()),
            Slot::Skipped => quote!(::core::default::Default::default()),
        }
    }
}

/// The `T` of an `Option<T>` field type.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

pub(crate) fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let input = InjectableInput::from_derive_input(input)?;
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(
            darling::Error::custom("injectable types cannot be generic").with_span(&input.generics)
        );
    }

    let fields = input
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum").with_span(ident))?;

    let slots: Vec<Slot<'_>> = fields.fields.iter().map(Slot::of).collect();
    let params = slots.iter().filter_map(Slot::param);
    let values: Vec<TokenStream> = slots.iter().map(Slot::value).collect();

    let construct = match fields.style {
        Style::Unit => quote!(#ident),
        Style::Tuple => quote!(#ident(#(#values),*)),
        Style::Struct => {
            let names = fields.fields.iter().filter_map(|field| field.ident.as_ref());
            quote!(#ident { #(#names: #values),* })
        }
    };

    let label = format!("{ident}::derived");

    Ok(quote! {
        impl ::chauffeur::Injectable for #ident {
            fn constructors() -> ::std::vec::Vec<::chauffeur::Constructor<Self>> {
                let constructor = ::chauffeur::Constructor::new(
                    #label,
                    |__args: &mut ::chauffeur::Arguments| #construct,
                )
                #(#params)*;
                ::std::vec![constructor]
            }
        }
    })
}
