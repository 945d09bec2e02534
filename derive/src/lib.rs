//! Derive support for `knotwire`.
//!
//! Provides [`#[derive(Codable)]`](macro@Codable), which turns a struct
//! with named fields into a serializable composite type: it implements
//! the `Described` and `Codable` traits, wires dependency registration,
//! and submits the type for startup auto-registration.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitInt, LitStr, parse_macro_input};

/// Derives the serialization metadata and field access for a composite
/// type.
///
/// Supported on non-generic structs with named fields. Every field type
/// must implement `knotwire::Wire`.
///
/// # Type attributes
///
/// - `#[codable(name = "...")]`: wire/type name (defaults to the
///   struct's identifier).
/// - `#[codable(include_nulls)]`: emit null-valued fields instead of
///   suppressing them.
/// - `#[codable(default)]`: register a `Default`-based constructor so
///   the type can be decoded; without it, decoding the type fails with
///   an instantiation error.
///
/// # Field attributes
///
/// - `#[codable(rename = "...")]`: external (wire) name.
/// - `#[codable(order = N)]`: emission order (ascending, default 0;
///   ties keep declaration sequence).
/// - `#[codable(required)]`: decoding fails if the field is absent.
/// - `#[codable(skip)]`: excluded from both encoding and decoding.
///
/// # Examples
///
/// ```rust, ignore
/// use knotwire::derive::Codable;
///
/// #[derive(Codable, Default)]
/// #[codable(default)]
/// struct Reading {
///     #[codable(rename = "sensor_id", required)]
///     sensor: String,
///     #[codable(order = 1)]
///     value: f64,
///     #[codable(skip)]
///     dirty: bool,
/// }
/// ```
#[proc_macro_derive(Codable, attributes(codable))]
pub fn derive_codable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct TypeAttrs {
    name: Option<String>,
    include_nulls: bool,
    default: bool,
}

struct FieldAttrs {
    rename: Option<String>,
    order: i32,
    required: bool,
    skip: bool,
}

fn parse_type_attrs(attrs: &[syn::Attribute]) -> syn::Result<TypeAttrs> {
    let mut out = TypeAttrs {
        name: None,
        include_nulls: false,
        default: false,
    };
    for attr in attrs {
        if !attr.path().is_ident("codable") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                out.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("include_nulls") {
                out.include_nulls = true;
                Ok(())
            } else if meta.path.is_ident("default") {
                out.default = true;
                Ok(())
            } else {
                Err(meta.error("unsupported `codable` type attribute"))
            }
        })?;
    }
    Ok(out)
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs {
        rename: None,
        order: 0,
        required: false,
        skip: false,
    };
    for attr in attrs {
        if !attr.path().is_ident("codable") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                out.rename = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("order") {
                let lit: LitInt = meta.value()?.parse()?;
                out.order = lit.base10_parse::<i32>()?;
                Ok(())
            } else if meta.path.is_ident("required") {
                out.required = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported `codable` field attribute"))
            }
        })?;
    }
    Ok(out)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "`#[derive(Codable)]` does not support generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "`#[derive(Codable)]` requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "`#[derive(Codable)]` only supports structs",
            ));
        }
    };

    let type_attrs = parse_type_attrs(&input.attrs)?;
    let type_name = type_attrs.name.unwrap_or_else(|| ident.to_string());

    let mut descriptor_entries = Vec::new();
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();
    let mut dependency_calls = Vec::new();

    for field in fields {
        // Named fields always carry an identifier.
        let field_ident = field.ident.as_ref().unwrap();
        let field_name = field_ident.to_string();
        let field_ty = &field.ty;
        let attrs = parse_field_attrs(&field.attrs)?;
        let wire_name = attrs.rename.unwrap_or_else(|| field_name.clone());

        let mut entry = quote! {
            knotwire::info::FieldDescriptor::new::<#field_ty>(#field_name, #wire_name)
        };
        if attrs.order != 0 {
            let order = attrs.order;
            entry = quote! { #entry.with_order(#order) };
        }
        if attrs.required {
            entry = quote! { #entry.with_required() };
        }
        if attrs.skip {
            entry = quote! { #entry.with_excluded() };
        }
        descriptor_entries.push(entry);

        get_arms.push(quote! {
            #field_name => ::core::option::Option::Some(
                knotwire::Wire::to_value(&self.#field_ident)
            ),
        });
        set_arms.push(quote! {
            #field_name => {
                self.#field_ident = knotwire::Wire::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        });
        dependency_calls.push(quote! {
            <#field_ty as knotwire::Wire>::register_dependencies(_registry);
        });
    }

    // A field-less struct would otherwise leave `value` unused.
    let silence_value = if fields.is_empty() {
        quote! { let _ = &value; }
    } else {
        quote! {}
    };

    let include_nulls = if type_attrs.include_nulls {
        quote! { .with_include_nulls() }
    } else {
        quote! {}
    };
    let construct = if type_attrs.default {
        quote! {
            .with_construct(|| knotwire::Handle::new(
                <#ident as ::core::default::Default>::default()
            ))
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl knotwire::Described for #ident {
            fn type_descriptor() -> &'static knotwire::info::TypeDescriptor {
                static CELL: knotwire::info::DescriptorCell =
                    knotwire::info::DescriptorCell::new();
                CELL.get_or_init(|| {
                    knotwire::info::TypeDescriptor::new::<#ident>(
                        #type_name,
                        ::std::vec![ #(#descriptor_entries),* ],
                    )
                    #include_nulls
                    #construct
                })
            }

            fn register_dependencies(_registry: &mut knotwire::TypeRegistry) {
                #(#dependency_calls)*
            }
        }

        impl knotwire::Codable for #ident {
            fn type_name(&self) -> &'static str {
                <#ident as knotwire::Described>::type_descriptor().name()
            }

            fn ty_id(&self) -> ::core::any::TypeId {
                ::core::any::TypeId::of::<#ident>()
            }

            fn descriptor(&self) -> &'static knotwire::info::TypeDescriptor {
                <#ident as knotwire::Described>::type_descriptor()
            }

            fn get_field(
                &self,
                name: &str,
            ) -> ::core::option::Option<knotwire::Value> {
                match name {
                    #(#get_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: knotwire::Value,
            ) -> ::core::result::Result<(), knotwire::ValueError> {
                #silence_value
                match name {
                    #(#set_arms)*
                    _ => ::core::result::Result::Err(knotwire::ValueError::NoSuchField {
                        name: ::std::borrow::ToOwned::to_owned(name),
                    }),
                }
            }
        }

        knotwire::__macro_exports::inventory::submit! {
            knotwire::registry::RegisteredType::new(|registry| {
                registry.register::<#ident>();
            })
        }
    })
}
