use std::borrow::Cow;

/// Validation failures for domain values.
#[gdfleet_derive::fleet_error]
#[derive(Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid account id '{value}'{}: expected 12 digits", format_context(.context))]
    InvalidAccountId { value: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Empty {kind} identifier{}", format_context(.context))]
    EmptyIdentifier { kind: &'static str, context: Option<Cow<'static, str>> },

    #[error("Unknown feature '{value}'{}", format_context(.context))]
    UnknownFeature { value: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
