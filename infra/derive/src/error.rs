use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, GenericArgument, Ident, PathArguments, Type,
    Variant,
};

const CONTEXT_FIELD: &str = "context";
const INTERNAL_VARIANT: &str = "Internal";

struct ErrorVariant<'a> {
    ident: &'a Ident,
    cfg: Vec<&'a Attribute>,
    source: Option<&'a Field>,
    field_count: usize,
    contextual: bool,
}

impl<'a> ErrorVariant<'a> {
    fn parse(variant: &'a Variant) -> syn::Result<Self> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "fleet_error variants must use named fields",
            ));
        };

        let mut contextual = false;
        let mut source = None;
        for field in &fields.named {
            let Some(name) = field.ident.as_ref() else { continue };
            if name == CONTEXT_FIELD {
                if !is_context_type(&field.ty) {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "`context` must be `Option<Cow<'static, str>>`",
                    ));
                }
                contextual = true;
            } else if name == "source" || has_attr(field, "source") || has_attr(field, "from") {
                source = Some(field);
            }
        }

        if source.is_some() && !contextual {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "variants wrapping a source need a `context: Option<Cow<'static, str>>` field",
            ));
        }

        Ok(Self {
            ident: &variant.ident,
            cfg: variant.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).collect(),
            source,
            field_count: fields.named.len(),
            contextual,
        })
    }

    fn is_internal(&self) -> bool {
        self.ident == INTERNAL_VARIANT
    }

    /// `From<Source>` is only derivable when nothing but `source` and `context` must be filled.
    fn wraps_source_only(&self) -> bool {
        self.source.is_some() && self.field_count == 2
    }
}

pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "fleet_error can only be applied to enums"));
    };

    let variants =
        data.variants.iter().map(ErrorVariant::parse).collect::<syn::Result<Vec<_>>>()?;

    let name = &input.ident;
    let ext = format_ident!("{name}Ext");

    let derives = missing_derives(&input.attrs);
    let with_context = expand_with_context(name, &variants);
    let conversions = variants
        .iter()
        .filter(|v| !v.is_internal() && v.wraps_source_only())
        .map(|v| expand_source_conversion(name, &ext, v));
    let internal = variants
        .iter()
        .find(|v| v.is_internal() && v.contextual && v.field_count == 2)
        .map(|v| expand_internal_conversion(name, v));

    Ok(quote! {
        #derives
        #input

        #with_context

        pub trait #ext<T> {
            /// Attaches a human-readable context to the error branch.
            fn context(
                self,
                context: impl Into<::std::borrow::Cow<'static, str>>,
            ) -> ::std::result::Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for ::std::result::Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|err| err.with_context(context))
            }
        }

        #(#conversions)*
        #internal

        #[allow(dead_code, clippy::ref_option)]
        fn format_context(
            context: &::std::option::Option<::std::borrow::Cow<'static, str>>,
        ) -> ::std::borrow::Cow<'static, str> {
            context.as_ref().map_or(::std::borrow::Cow::Borrowed(""), |c| {
                ::std::borrow::Cow::Owned(format!(" ({c})"))
            })
        }
    })
}

fn expand_with_context(name: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let arms = variants.iter().filter(|v| v.contextual).map(|v| {
        let ident = v.ident;
        let cfg = &v.cfg;
        quote! { #(#cfg)* Self::#ident { context: slot, .. } => *slot = Some(context), }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            /// Returns the error with its context replaced.
            #[must_use]
            pub fn with_context(mut self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                let context = context.into();
                #[allow(unreachable_patterns)]
                match &mut self {
                    #(#arms)*
                    _ => {}
                }
                self
            }
        }
    }
}

fn expand_source_conversion(name: &Ident, ext: &Ident, v: &ErrorVariant<'_>) -> TokenStream {
    let Some(field) = v.source else {
        return TokenStream::new();
    };
    let Some(field_name) = field.ident.as_ref() else {
        return TokenStream::new();
    };
    let ty = &field.ty;
    let ident = v.ident;
    let cfg = &v.cfg;

    quote! {
        #(#cfg)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(source: #ty) -> Self {
                Self::#ident { #field_name: source, context: None }
            }
        }

        #(#cfg)*
        #[automatically_derived]
        impl<T> #ext<T> for ::std::result::Result<T, #ty> {
            #[inline]
            fn context(
                self,
                context: impl Into<::std::borrow::Cow<'static, str>>,
            ) -> ::std::result::Result<T, #name> {
                self.map_err(|source| #name::from(source).with_context(context))
            }
        }
    }
}

fn expand_internal_conversion(name: &Ident, v: &ErrorVariant<'_>) -> TokenStream {
    let cfg = &v.cfg;

    quote! {
        #(#cfg)*
        #[automatically_derived]
        impl From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal { message: ::std::borrow::Cow::Borrowed(message), context: None }
            }
        }

        #(#cfg)*
        #[automatically_derived]
        impl From<String> for #name {
            #[inline]
            fn from(message: String) -> Self {
                Self::Internal { message: ::std::borrow::Cow::Owned(message), context: None }
            }
        }
    }
}

fn missing_derives(attrs: &[Attribute]) -> TokenStream {
    let mut has_debug = false;
    let mut has_error = false;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                has_debug |= last.ident == "Debug";
                has_error |= last.ident == "Error";
            }
            Ok(())
        });
    }

    let mut derives = Vec::new();
    if !has_debug {
        derives.push(quote! { Debug });
    }
    if !has_error {
        derives.push(quote! { ::thiserror::Error });
    }

    if derives.is_empty() { TokenStream::new() } else { quote! { #[derive(#(#derives),*)] } }
}

fn has_attr(field: &Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Matches `Option<Cow<'static, str>>`, with or without path prefixes.
fn is_context_type(ty: &Type) -> bool {
    let Some(inner) = single_generic(ty, "Option") else {
        return false;
    };
    let Type::Path(cow) = inner else {
        return false;
    };
    let Some(segment) = cow.path.segments.last() else {
        return false;
    };
    if segment.ident != "Cow" {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };

    let mut args = args.args.iter();
    let lifetime_ok =
        matches!(args.next(), Some(GenericArgument::Lifetime(lt)) if lt.ident == "static");
    let str_ok = matches!(
        args.next(),
        Some(GenericArgument::Type(Type::Path(p)))
            if p.path.segments.last().is_some_and(|s| s.ident == "str")
    );

    lifetime_ok && str_ok
}

fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
