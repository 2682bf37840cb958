#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros shared by the workspace crates.
//!
//! Every crate declares its error enum with [`macro@fleet_error`] so that
//! failures carry an optional human-readable context and can be raised with
//! `?` from upstream error types.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns an enum into a context-carrying error type.
///
/// # Injected Behaviors
///
/// * **Derives**: `Debug` and `thiserror::Error` unless the enum already derives them.
/// * **Context**: a companion `<Name>Ext` trait adds `.context(...)` to
///   `Result<T, Name>` and to `Result<T, Source>` for every wrapped source type.
///   `Name::with_context` does the same for a bare error value.
/// * **Conversions**: `From<Source>` for variants whose only fields are `source`
///   (or a `#[source]`/`#[from]` field) and `context`.
/// * **Internal fallback**: `From<&'static str>` and `From<String>` when an
///   `Internal { message, context }` variant exists.
/// * **Formatting**: a module-level `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with **named-field** variants.
/// 2. A `context` field must be typed `Option<Cow<'static, str>>`.
/// 3. Variants wrapping a source error must also carry `context`.
///
/// The helper is emitted at module scope, so keep one error enum per module.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[gdfleet_derive::fleet_error]
/// pub enum StoreError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal failure{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read() -> Result<String, StoreError> {
///     std::fs::read_to_string("state.json").context("Reading state")
/// }
/// ```
#[proc_macro_attribute]
pub fn fleet_error(args: TokenStream, item: TokenStream) -> TokenStream {
    if !args.is_empty() {
        let span = proc_macro2::TokenStream::from(args);
        return syn::Error::new_spanned(span, "fleet_error takes no arguments")
            .into_compile_error()
            .into();
    }

    let input = parse_macro_input!(item as DeriveInput);
    error::expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}
