use serde::Serialize;
use std::borrow::Cow;
use strum_macros::Display;

/// Coarse classification of a provider failure, kept in run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderErrorKind {
    Throttled,
    AccessDenied,
    NotFound,
    InvalidRequest,
    Transport,
    Rejected,
    MalformedResponse,
    Other,
}

/// A failed call to the management API.
#[gdfleet_derive::fleet_error]
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request throttled{}: {message}", format_context(.context))]
    Throttled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Access denied{}: {message}", format_context(.context))]
    AccessDenied { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Resource not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid request{}: {message}", format_context(.context))]
    InvalidRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Transport failure{}: {message}", format_context(.context))]
    Transport { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The call succeeded but the provider refused to process the account.
    #[error("Account rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The call succeeded but returned values that do not parse.
    #[error("Malformed response{}: {message}", format_context(.context))]
    MalformedResponse { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Provider error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ProviderError {
    /// Builds an error of the given kind.
    pub fn new(kind: ProviderErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        let message = message.into();
        match kind {
            ProviderErrorKind::Throttled => Self::Throttled { message, context: None },
            ProviderErrorKind::AccessDenied => Self::AccessDenied { message, context: None },
            ProviderErrorKind::NotFound => Self::NotFound { message, context: None },
            ProviderErrorKind::InvalidRequest => Self::InvalidRequest { message, context: None },
            ProviderErrorKind::Transport => Self::Transport { message, context: None },
            ProviderErrorKind::Rejected => Self::Rejected { message, context: None },
            ProviderErrorKind::MalformedResponse => {
                Self::MalformedResponse { message, context: None }
            },
            ProviderErrorKind::Other => Self::Internal { message, context: None },
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Throttled { .. } => ProviderErrorKind::Throttled,
            Self::AccessDenied { .. } => ProviderErrorKind::AccessDenied,
            Self::NotFound { .. } => ProviderErrorKind::NotFound,
            Self::InvalidRequest { .. } => ProviderErrorKind::InvalidRequest,
            Self::Transport { .. } => ProviderErrorKind::Transport,
            Self::Rejected { .. } => ProviderErrorKind::Rejected,
            Self::MalformedResponse { .. } => ProviderErrorKind::MalformedResponse,
            Self::Internal { .. } => ProviderErrorKind::Other,
        }
    }
}
