use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_quote, Data, DeriveInput, Error, Fields, Ident, Index, Member, Type};

use crate::attributes::{parse_container_attributes, parse_field_attributes};
use crate::util::{archive_generics, extended_where_clause, tag_impl, tag_predicates};
use crate::variant;

pub fn derive(input: DeriveInput) -> Result<TokenStream, Error> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        // Loaded values own their data; a borrowing aggregate has nothing
        // to borrow from.
        return Err(Error::new_spanned(
            lifetime,
            "`Reflect` cannot be derived for types with lifetime parameters",
        ));
    }
    let attributes = parse_container_attributes(&input)?;
    match &input.data {
        Data::Struct(data) => {
            let members = collect_members(&data.fields)?;
            Ok(derive_struct(&input, &attributes, &members))
        }
        Data::Enum(data) => variant::derive(&input, &attributes, data),
        Data::Union(_) => Err(Error::new_spanned(
            &input.ident,
            "`Reflect` cannot be derived for unions",
        )),
    }
}

enum MemberKind {
    Plain,
    Flatten,
    Skip,
}

struct MemberInfo {
    // How the field is reached on `self` (`ident` or numeric index).
    member: Member,
    // Local binding used while loading.
    binding: Ident,
    name: String,
    ty: Type,
    kind: MemberKind,
    // Self-referential members opt out of the generated where clause to
    // keep trait resolution from chasing its own tail.
    omit_bounds: bool,
}

fn collect_members(fields: &Fields) -> Result<Vec<MemberInfo>, Error> {
    let mut members = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let attributes = parse_field_attributes(field)?;
        let kind = if attributes.flatten {
            MemberKind::Flatten
        } else if attributes.skip {
            MemberKind::Skip
        } else {
            MemberKind::Plain
        };
        let (member, binding, name) = match &field.ident {
            Some(ident) => (
                Member::Named(ident.clone()),
                format_ident!("__member_{}", ident),
                ident.to_string(),
            ),
            // Unnamed members need a tag-safe name; bare digits are not
            // valid element names in the tagged tree.
            None => (
                Member::Unnamed(Index::from(index)),
                format_ident!("__member_{}", index),
                format!("Field{index}"),
            ),
        };
        members.push(MemberInfo {
            member,
            binding,
            name,
            ty: field.ty.clone(),
            kind,
            omit_bounds: attributes.omit_bounds,
        });
    }
    Ok(members)
}

fn derive_struct(
    input: &DeriveInput,
    attributes: &crate::attributes::ContainerAttributes,
    members: &[MemberInfo],
) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let archive_generics = archive_generics(input);
    let (archive_impl_generics, _, _) = archive_generics.split_for_impl();

    let tag_impl = tag_impl(input, attributes.tag.as_ref());

    // Reflect: member visitation plus the optional post-load hook.
    let visits = members.iter().filter_map(|member| match member.kind {
        MemberKind::Plain => {
            let name = &member.name;
            Some(quote! { f(#name); })
        }
        MemberKind::Flatten => {
            let ty = &member.ty;
            Some(quote! { <#ty as ::triform::Reflect>::visit_members(f); })
        }
        MemberKind::Skip => None,
    });
    let mut reflect_predicates = tag_predicates(input);
    for member in members {
        if let MemberKind::Flatten = member.kind {
            let ty = &member.ty;
            reflect_predicates.push(parse_quote! { #ty: ::triform::Reflect });
        }
    }
    let reflect_where = extended_where_clause(input, reflect_predicates);
    let initialize = if attributes.init {
        quote! {
            fn initialize(&mut self) -> ::std::result::Result<(), ::triform::Error> {
                // Resolves to the inherent method the deriving type must
                // define.
                self.initialize()
            }
        }
    } else {
        TokenStream::new()
    };

    // ReflectFields: the per-backing member walk.
    let mut fields_predicates = Vec::new();
    for member in members.iter().filter(|member| !member.omit_bounds) {
        let ty = &member.ty;
        fields_predicates.push(match member.kind {
            MemberKind::Plain => {
                parse_quote! { #ty: ::triform::Save<__A> + ::triform::Load<__A> }
            }
            MemberKind::Flatten => parse_quote! { #ty: ::triform::ReflectFields<__A> },
            MemberKind::Skip => parse_quote! { #ty: ::core::default::Default },
        });
    }
    let fields_where = extended_where_clause(input, fields_predicates);

    let saves = members.iter().filter_map(|member| {
        let field = &member.member;
        match member.kind {
            MemberKind::Plain => {
                let name = &member.name;
                Some(quote! {
                    let child = ::triform::Archive::member(archive, node, #name)?;
                    ::triform::Save::save(&self.#field, archive, child)?;
                })
            }
            MemberKind::Flatten => Some(quote! {
                ::triform::ReflectFields::save_fields(&self.#field, archive, node)?;
            }),
            MemberKind::Skip => None,
        }
    });

    let loads = members.iter().map(|member| {
        let binding = &member.binding;
        let ty = &member.ty;
        match member.kind {
            MemberKind::Plain => {
                let name = &member.name;
                quote! {
                    let #binding = {
                        let child = ::triform::Archive::member(archive, node, #name)?;
                        <#ty as ::triform::Load<__A>>::load(archive, child)?
                    };
                }
            }
            MemberKind::Flatten => quote! {
                let #binding = <#ty as ::triform::ReflectFields<__A>>::load_fields(archive, node)?;
            },
            MemberKind::Skip => quote! {
                let #binding = <#ty as ::core::default::Default>::default();
            },
        }
    });
    let construct_fields = members.iter().map(|member| {
        let field = &member.member;
        let binding = &member.binding;
        quote! { #field: #binding }
    });

    let wrapper_where = extended_where_clause(
        input,
        [
            parse_quote! { Self: ::triform::ReflectFields<__A> },
            parse_quote! { Self: ::triform::Reflect },
        ],
    );

    quote! {
        #tag_impl

        impl #impl_generics ::triform::Reflect for #name #ty_generics #reflect_where {
            fn visit_members(f: &mut dyn ::core::ops::FnMut(&'static str)) {
                #(#visits)*
            }

            #initialize
        }

        impl #archive_impl_generics ::triform::ReflectFields<__A> for #name #ty_generics #fields_where {
            fn save_fields(
                &self,
                archive: &mut __A,
                node: ::triform::NodeRef,
            ) -> ::std::result::Result<(), ::triform::Error> {
                #(#saves)*
                ::std::result::Result::Ok(())
            }

            fn load_fields(
                archive: &mut __A,
                node: ::triform::NodeRef,
            ) -> ::std::result::Result<Self, ::triform::Error> {
                #(#loads)*
                ::std::result::Result::Ok(#name {
                    #(#construct_fields,)*
                })
            }
        }

        impl #archive_impl_generics ::triform::Save<__A> for #name #ty_generics #wrapper_where {
            fn save(
                &self,
                archive: &mut __A,
                node: ::triform::NodeRef,
            ) -> ::std::result::Result<(), ::triform::Error> {
                ::triform::Archive::put_class(archive, node, &<Self as ::triform::Tag>::tag())?;
                ::triform::ReflectFields::save_fields(self, archive, node)
            }
        }

        impl #archive_impl_generics ::triform::Load<__A> for #name #ty_generics #wrapper_where {
            fn load(
                archive: &mut __A,
                node: ::triform::NodeRef,
            ) -> ::std::result::Result<Self, ::triform::Error> {
                match ::triform::Archive::get_class(archive, node)? {
                    ::std::option::Option::Some(class) => {
                        if class == ::triform::NULL_CLASS {
                            return ::std::result::Result::Err(::triform::Error::NullPointer);
                        }
                    }
                    ::std::option::Option::None => {
                        ::triform::log::warn!(
                            "missing class attribute while loading `{}`",
                            <Self as ::triform::Tag>::tag()
                        );
                    }
                }
                let mut value =
                    <Self as ::triform::ReflectFields<__A>>::load_fields(archive, node)?;
                ::triform::Reflect::initialize(&mut value)?;
                ::std::result::Result::Ok(value)
            }
        }
    }
}
