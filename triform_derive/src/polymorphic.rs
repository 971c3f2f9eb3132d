use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream, Result as ParseResult};
use syn::{parse2, parse_quote, Attribute, Error, Ident, ItemImpl, ItemTrait, Path, Token, Visibility};

enum Input {
    Trait(ItemTrait),
    Impl(ItemImpl),
}

impl Parse for Input {
    fn parse(input: ParseStream) -> ParseResult<Self> {
        let mut attrs = Attribute::parse_outer(input)?;

        let ahead = input.fork();
        ahead.parse::<Visibility>()?;
        ahead.parse::<Option<Token![unsafe]>>()?;

        if ahead.peek(Token![trait]) {
            let mut item: ItemTrait = input.parse()?;
            attrs.extend(item.attrs);
            item.attrs = attrs;
            Ok(Input::Trait(item))
        } else if ahead.peek(Token![impl]) {
            let mut item: ItemImpl = input.parse()?;
            if item.trait_.is_none() {
                return Err(Error::new_spanned(
                    &item.self_ty,
                    "expected `impl Trait for Type`",
                ));
            }
            attrs.extend(item.attrs);
            item.attrs = attrs;
            Ok(Input::Impl(item))
        } else {
            Err(input.error("expected a trait definition or an impl block"))
        }
    }
}

pub fn expand(attr: TokenStream, item: TokenStream) -> Result<TokenStream, Error> {
    if !attr.is_empty() {
        return Err(Error::new_spanned(attr, "`polymorphic` takes no arguments"));
    }
    match parse2::<Input>(item)? {
        Input::Trait(item) => expand_trait(item),
        Input::Impl(item) => expand_impl(item),
    }
}

fn registration_ident(trait_ident: &Ident) -> Ident {
    format_ident!("{}Registration", trait_ident)
}

// The three backings with their erased-save methods and registration
// fields; the generated impls are stamped out once per row.
struct Format {
    archive: TokenStream,
    save_method: Ident,
    registry_method: Ident,
    callback_field: Ident,
}

fn formats() -> Vec<Format> {
    vec![
        Format {
            archive: quote! { ::triform::JsonArchive },
            save_method: format_ident!("save_tree"),
            registry_method: format_ident!("tree_registry"),
            callback_field: format_ident!("tree"),
        },
        Format {
            archive: quote! { ::triform::XmlArchive },
            save_method: format_ident!("save_tagged"),
            registry_method: format_ident!("tagged_registry"),
            callback_field: format_ident!("tagged"),
        },
        Format {
            archive: quote! { ::triform::BinaryArchive },
            save_method: format_ident!("save_stream"),
            registry_method: format_ident!("stream_registry"),
            callback_field: format_ident!("stream"),
        },
    ]
}

fn expand_trait(mut item: ItemTrait) -> Result<TokenStream, Error> {
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "`polymorphic` traits cannot be generic",
        ));
    }

    // Every implementor must be able to save itself from behind the object.
    if item.colon_token.is_none() {
        item.colon_token = Some(Default::default());
    }
    item.supertraits.push(parse_quote! { ::triform::poly::SaveErased });

    let vis = item.vis.clone();
    let trait_ident = item.ident.clone();
    let registration = registration_ident(&trait_ident);

    let registry_methods = formats().into_iter().map(|format| {
        let Format {
            archive,
            registry_method,
            callback_field,
            ..
        } = format;
        quote! {
            #[doc(hidden)]
            pub fn #registry_method(
            ) -> &'static ::triform::poly::PolyRegistry<#archive, dyn #trait_ident> {
                ::triform::lazy_static::lazy_static! {
                    static ref REGISTRY: ::triform::poly::PolyRegistry<
                        #archive,
                        dyn #trait_ident,
                    > = {
                        let mut entries = ::std::vec::Vec::new();
                        for entry in ::triform::inventory::iter::<#registration> {
                            entries.push(((entry.0.tag)(), entry.0.#callback_field));
                        }
                        ::triform::poly::PolyRegistry::collect(entries)
                    };
                }
                &REGISTRY
            }
        }
    });

    let handle_impls = formats().into_iter().map(|format| {
        let Format {
            archive,
            save_method,
            registry_method,
            ..
        } = format;
        quote! {
            impl ::triform::Save<#archive> for ::std::boxed::Box<dyn #trait_ident> {
                fn save(
                    &self,
                    archive: &mut #archive,
                    node: ::triform::NodeRef,
                ) -> ::std::result::Result<(), ::triform::Error> {
                    ::triform::Archive::put_class(archive, node, &::triform::poly::SaveErased::erased_tag(&**self))?;
                    ::triform::poly::SaveErased::#save_method(&**self, archive, node)
                }
            }

            impl ::triform::Save<#archive> for ::std::sync::Arc<dyn #trait_ident> {
                fn save(
                    &self,
                    archive: &mut #archive,
                    node: ::triform::NodeRef,
                ) -> ::std::result::Result<(), ::triform::Error> {
                    ::triform::Archive::put_class(archive, node, &::triform::poly::SaveErased::erased_tag(&**self))?;
                    ::triform::poly::SaveErased::#save_method(&**self, archive, node)
                }
            }

            impl ::triform::Load<#archive> for ::std::boxed::Box<dyn #trait_ident> {
                fn load(
                    archive: &mut #archive,
                    node: ::triform::NodeRef,
                ) -> ::std::result::Result<Self, ::triform::Error> {
                    let class = ::triform::poly::erased_class(archive, node)?;
                    #registration::#registry_method().load(&class, archive, node)
                }
            }

            impl ::triform::Load<#archive> for ::std::sync::Arc<dyn #trait_ident> {
                fn load(
                    archive: &mut #archive,
                    node: ::triform::NodeRef,
                ) -> ::std::result::Result<Self, ::triform::Error> {
                    <::std::boxed::Box<dyn #trait_ident> as ::triform::Load<#archive>>::load(
                        archive, node,
                    )
                    .map(::std::sync::Arc::from)
                }
            }
        }
    });

    Ok(quote! {
        #item

        #[doc(hidden)]
        #vis struct #registration(pub ::triform::poly::Registration<dyn #trait_ident>);

        ::triform::inventory::collect!(#registration);

        impl #registration {
            #(#registry_methods)*
        }

        #(#handle_impls)*
    })
}

fn expand_impl(item: ItemImpl) -> Result<TokenStream, Error> {
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "`polymorphic` can only register non-generic impls",
        ));
    }
    let Some((_, trait_path, _)) = &item.trait_ else {
        return Err(Error::new_spanned(&item, "expected `impl Trait for Type`"));
    };
    let trait_path = trait_path.clone();
    let self_ty = item.self_ty.clone();

    // The registration type lives next to the trait; reach it by swapping
    // the trait path's last segment.
    let mut registration_path: Path = trait_path.clone();
    {
        let last = registration_path
            .segments
            .last_mut()
            .ok_or_else(|| Error::new_spanned(&trait_path, "empty trait path"))?;
        last.ident = registration_ident(&last.ident);
    }

    let callbacks = formats().into_iter().map(|format| {
        let Format {
            archive,
            callback_field,
            ..
        } = format;
        quote! {
            #callback_field: |archive: &mut #archive, node: ::triform::NodeRef| {
                ::std::result::Result::map(
                    <#self_ty as ::triform::Load<#archive>>::load(archive, node),
                    |value| ::std::boxed::Box::new(value) as ::std::boxed::Box<dyn #trait_path>,
                )
            },
        }
    });

    Ok(quote! {
        #item

        ::triform::inventory::submit! {
            #registration_path(::triform::poly::Registration {
                tag: <#self_ty as ::triform::Tag>::tag,
                #(#callbacks)*
            })
        }
    })
}
