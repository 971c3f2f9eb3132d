use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_quote, DataEnum, DeriveInput, Error, Fields, WherePredicate};

use crate::attributes::ContainerAttributes;
use crate::util::{archive_generics, extended_where_clause, tag_impl};

pub fn derive(
    input: &DeriveInput,
    attributes: &ContainerAttributes,
    data: &DataEnum,
) -> Result<TokenStream, Error> {
    if attributes.init {
        return Err(Error::new_spanned(
            &input.ident,
            "`init` applies to reflectable structs only",
        ));
    }
    let fieldless = data
        .variants
        .iter()
        .all(|variant| matches!(variant.fields, Fields::Unit));
    if fieldless && !data.variants.is_empty() {
        Ok(derive_fieldless(input, attributes, data))
    } else {
        derive_sum(input, attributes, data)
    }
}

// An enum with no data archives as a primitive: canonical variant name in
// the textual formats, declaration-order ordinal in the byte stream.
fn derive_fieldless(
    input: &DeriveInput,
    attributes: &ContainerAttributes,
    data: &DataEnum,
) -> TokenStream {
    let name = &input.ident;
    let (_, ty_generics, _) = input.generics.split_for_impl();
    let archive_generics = archive_generics(input);
    let (archive_impl_generics, _, _) = archive_generics.split_for_impl();
    let where_clause = extended_where_clause(input, []);

    let tag_impl = tag_impl(input, attributes.tag.as_ref());

    let count = data.variants.len() as u32;
    let names = data.variants.iter().map(|variant| variant.ident.to_string());
    let save_arms = data.variants.iter().enumerate().map(|(ordinal, variant)| {
        let variant = &variant.ident;
        let ordinal = ordinal as u32;
        quote! { #name::#variant => #ordinal, }
    });
    let load_arms = data.variants.iter().enumerate().map(|(ordinal, variant)| {
        let variant = &variant.ident;
        let ordinal = ordinal as u32;
        quote! { #ordinal => ::std::result::Result::Ok(#name::#variant), }
    });

    quote! {
        #tag_impl

        const _: () = {
            const VARIANT_NAMES: &[&str] = &[#(#names),*];

            impl #archive_impl_generics ::triform::Save<__A> for #name #ty_generics #where_clause {
                fn save(
                    &self,
                    archive: &mut __A,
                    node: ::triform::NodeRef,
                ) -> ::std::result::Result<(), ::triform::Error> {
                    let ordinal = match self {
                        #(#save_arms)*
                    };
                    ::triform::Archive::put_enum(archive, node, ordinal, VARIANT_NAMES[ordinal as usize])
                }
            }

            impl #archive_impl_generics ::triform::Load<__A> for #name #ty_generics #where_clause {
                fn load(
                    archive: &mut __A,
                    node: ::triform::NodeRef,
                ) -> ::std::result::Result<Self, ::triform::Error> {
                    match ::triform::Archive::get_enum(archive, node, VARIANT_NAMES)? {
                        #(#load_arms)*
                        other => ::std::result::Result::Err(::triform::Error::InvalidIndex {
                            index: other,
                            arity: #count,
                        }),
                    }
                }
            }
        };
    }
}

// An enum with data archives as a sum: a one-byte `Index` attribute for the
// active alternative and its payload beneath `Value`.
fn derive_sum(
    input: &DeriveInput,
    attributes: &ContainerAttributes,
    data: &DataEnum,
) -> Result<TokenStream, Error> {
    let name = &input.ident;
    if data.variants.len() > usize::from(u8::MAX) {
        return Err(Error::new_spanned(
            &input.ident,
            "sum types are limited to 255 alternatives",
        ));
    }
    let (_, ty_generics, _) = input.generics.split_for_impl();
    let archive_generics = archive_generics(input);
    let (archive_impl_generics, _, _) = archive_generics.split_for_impl();

    let tag_impl = tag_impl(input, attributes.tag.as_ref());

    let mut save_predicates: Vec<WherePredicate> = Vec::new();
    let mut load_predicates: Vec<WherePredicate> = Vec::new();
    for variant in &data.variants {
        for field in variant.fields.iter() {
            let attributes = crate::attributes::parse_field_attributes(field)?;
            if attributes.flatten || attributes.skip {
                return Err(Error::new_spanned(
                    field,
                    "`flatten` and `skip` apply to struct fields only",
                ));
            }
            if attributes.omit_bounds {
                continue;
            }
            let ty = &field.ty;
            save_predicates.push(parse_quote! { #ty: ::triform::Save<__A> });
            load_predicates.push(parse_quote! { #ty: ::triform::Load<__A> });
        }
    }
    let save_where = extended_where_clause(input, save_predicates);
    let load_where = extended_where_clause(input, load_predicates);

    let arity = data.variants.len() as u32;
    let save_body = if data.variants.is_empty() {
        // An uninhabited sum has no values to save.
        quote! {
            let _ = (archive, node);
            match *self {}
        }
    } else {
        let arms = data.variants.iter().enumerate().map(|(tag, variant)| {
            let ident = &variant.ident;
            let tag = tag as u8;
            match &variant.fields {
                Fields::Unit => quote! {
                    #name::#ident => {
                        ::triform::Archive::put_index(archive, node, ::triform::INDEX_ATTR, #tag)?;
                        let child = ::triform::Archive::member(archive, node, ::triform::VALUE_MEMBER)?;
                        ::triform::Archive::put_unit(archive, child)
                    }
                },
                Fields::Unnamed(fields) if fields.unnamed.len() == 1 => quote! {
                    #name::#ident(value) => {
                        ::triform::Archive::put_index(archive, node, ::triform::INDEX_ATTR, #tag)?;
                        let child = ::triform::Archive::member(archive, node, ::triform::VALUE_MEMBER)?;
                        ::triform::Save::save(value, archive, child)
                    }
                },
                Fields::Unnamed(fields) => {
                    let bindings: Vec<_> = (0..fields.unnamed.len())
                        .map(|index| format_ident!("__field_{}", index))
                        .collect();
                    let len = fields.unnamed.len();
                    let saves = bindings.iter().enumerate().map(|(index, binding)| {
                        quote! {
                            let element = ::triform::Archive::element(archive, child, #index)?;
                            ::triform::Save::save(#binding, archive, element)?;
                        }
                    });
                    quote! {
                        #name::#ident(#(#bindings),*) => {
                            ::triform::Archive::put_index(archive, node, ::triform::INDEX_ATTR, #tag)?;
                            let child = ::triform::Archive::member(archive, node, ::triform::VALUE_MEMBER)?;
                            ::triform::Archive::set_size(archive, child, #len)?;
                            #(#saves)*
                            ::std::result::Result::Ok(())
                        }
                    }
                }
                Fields::Named(fields) => {
                    // Prefixed bindings so member names cannot shadow the
                    // traversal locals.
                    let idents: Vec<_> = fields
                        .named
                        .iter()
                        .map(|field| field.ident.clone().expect("named field"))
                        .collect();
                    let bindings: Vec<_> = idents
                        .iter()
                        .map(|ident| format_ident!("__field_{}", ident))
                        .collect();
                    let saves = idents.iter().zip(&bindings).map(|(ident, binding)| {
                        let name = ident.to_string();
                        quote! {
                            let member = ::triform::Archive::member(archive, child, #name)?;
                            ::triform::Save::save(#binding, archive, member)?;
                        }
                    });
                    quote! {
                        #name::#ident { #(#idents: #bindings),* } => {
                            ::triform::Archive::put_index(archive, node, ::triform::INDEX_ATTR, #tag)?;
                            let child = ::triform::Archive::member(archive, node, ::triform::VALUE_MEMBER)?;
                            #(#saves)*
                            ::std::result::Result::Ok(())
                        }
                    }
                }
            }
        });
        quote! {
            match self {
                #(#arms)*
            }
        }
    };

    let load_body = if data.variants.is_empty() {
        quote! {
            let _ = (archive, node);
            ::std::result::Result::Err(::triform::Error::InvalidVariant)
        }
    } else {
        let arms = data.variants.iter().enumerate().map(|(tag, variant)| {
            let ident = &variant.ident;
            let tag = tag as u8;
            match &variant.fields {
                Fields::Unit => quote! {
                    #tag => {
                        ::triform::Archive::get_unit(archive, child)?;
                        ::std::result::Result::Ok(#name::#ident)
                    }
                },
                Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                    let ty = &fields.unnamed[0].ty;
                    quote! {
                        #tag => ::std::result::Result::Ok(#name::#ident(
                            <#ty as ::triform::Load<__A>>::load(archive, child)?,
                        )),
                    }
                }
                Fields::Unnamed(fields) => {
                    let len = fields.unnamed.len();
                    let loads = fields.unnamed.iter().enumerate().map(|(index, field)| {
                        let ty = &field.ty;
                        quote! {
                            {
                                let element = ::triform::Archive::element(archive, child, #index)?;
                                <#ty as ::triform::Load<__A>>::load(archive, element)?
                            }
                        }
                    });
                    quote! {
                        #tag => {
                            let found = ::triform::Archive::size(archive, child)?;
                            if found != #len {
                                return ::std::result::Result::Err(::triform::Error::SizeMismatch {
                                    expected: #len,
                                    found,
                                });
                            }
                            ::std::result::Result::Ok(#name::#ident(#(#loads),*))
                        }
                    }
                }
                Fields::Named(fields) => {
                    let loads = fields.named.iter().map(|field| {
                        let ident = field.ident.clone().expect("named field");
                        let binding = format_ident!("__field_{}", ident);
                        let name = ident.to_string();
                        let ty = &field.ty;
                        quote! {
                            let #binding = {
                                let member = ::triform::Archive::member(archive, child, #name)?;
                                <#ty as ::triform::Load<__A>>::load(archive, member)?
                            };
                        }
                    });
                    let constructs = fields.named.iter().map(|field| {
                        let ident = field.ident.clone().expect("named field");
                        let binding = format_ident!("__field_{}", ident);
                        quote! { #ident: #binding }
                    });
                    quote! {
                        #tag => {
                            #(#loads)*
                            ::std::result::Result::Ok(#name::#ident { #(#constructs),* })
                        }
                    }
                }
            }
        });
        quote! {
            let index = ::triform::Archive::get_index(archive, node, ::triform::INDEX_ATTR)?;
            let child = ::triform::Archive::member(archive, node, ::triform::VALUE_MEMBER)?;
            match index {
                #(#arms)*
                other => ::std::result::Result::Err(::triform::Error::InvalidIndex {
                    index: other as u32,
                    arity: #arity,
                }),
            }
        }
    };

    Ok(quote! {
        #tag_impl

        impl #archive_impl_generics ::triform::Save<__A> for #name #ty_generics #save_where {
            fn save(
                &self,
                archive: &mut __A,
                node: ::triform::NodeRef,
            ) -> ::std::result::Result<(), ::triform::Error> {
                #save_body
            }
        }

        impl #archive_impl_generics ::triform::Load<__A> for #name #ty_generics #load_where {
            fn load(
                archive: &mut __A,
                node: ::triform::NodeRef,
            ) -> ::std::result::Result<Self, ::triform::Error> {
                #load_body
            }
        }
    })
}
