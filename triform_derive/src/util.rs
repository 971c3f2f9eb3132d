use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_quote, DeriveInput, GenericParam, Generics, LitStr, Token, WherePredicate};

/// Generics for an `impl<__A: Archive, ...>` block: the archive parameter
/// first, then the input's own parameters.
pub fn archive_generics(input: &DeriveInput) -> Generics {
    let mut params = Punctuated::<GenericParam, Token![,]>::new();
    params.push(parse_quote! { __A: ::triform::Archive });
    for param in input.generics.params.iter() {
        params.push(param.clone());
    }
    Generics {
        lt_token: Some(Default::default()),
        params,
        gt_token: Some(Default::default()),
        where_clause: None,
    }
}

/// The input's where clause extended with `extra` predicates.
pub fn extended_where_clause(
    input: &DeriveInput,
    extra: impl IntoIterator<Item = WherePredicate>,
) -> TokenStream {
    let mut predicates: Punctuated<WherePredicate, Token![,]> = input
        .generics
        .where_clause
        .as_ref()
        .map(|clause| clause.predicates.clone())
        .unwrap_or_default();
    for predicate in extra {
        predicates.push(predicate);
    }
    if predicates.is_empty() {
        TokenStream::new()
    } else {
        quote! { where #predicates }
    }
}

/// `Tag` bounds for every type parameter, needed wherever a composed tag
/// string is built.
pub fn tag_predicates(input: &DeriveInput) -> Vec<WherePredicate> {
    input
        .generics
        .type_params()
        .map(|param| {
            let ident = &param.ident;
            parse_quote! { #ident: ::triform::Tag }
        })
        .collect()
}

/// The `Tag` implementation shared by struct and enum derives.
pub fn tag_impl(input: &DeriveInput, tag_override: Option<&LitStr>) -> TokenStream {
    let name = &input.ident;
    let name_text = name.to_string();
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let where_clause = extended_where_clause(input, tag_predicates(input));

    let type_params: Vec<_> = input
        .generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();

    let body = match (tag_override, type_params.is_empty()) {
        (Some(tag), _) => quote! { ::std::borrow::Cow::Borrowed(#tag) },
        (None, true) => quote! { ::std::borrow::Cow::Borrowed(#name_text) },
        (None, false) => quote! {
            ::std::borrow::Cow::Owned(::std::format!(
                "{}<{}>",
                #name_text,
                [#(<#type_params as ::triform::Tag>::tag()),*].join(", ")
            ))
        },
    };

    quote! {
        impl #impl_generics ::triform::Tag for #name #ty_generics #where_clause {
            fn tag() -> ::std::borrow::Cow<'static, str> {
                #body
            }
        }
    }
}
