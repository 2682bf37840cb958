mod provider;

pub use self::provider::{ProviderError, ProviderErrorExt, ProviderErrorKind};

use std::borrow::Cow;

/// Failures that stop a whole run.
///
/// Failures of individual units never surface here; they are recorded in the
/// [`RunReport`](crate::report::RunReport) instead.
#[gdfleet_derive::fleet_error]
pub enum EnablementError {
    #[error("Provider call failed{}: {source}", format_context(.context))]
    Provider { source: ProviderError, context: Option<Cow<'static, str>> },

    #[error("Region worker failed{}: {source}", format_context(.context))]
    Worker { source: tokio::task::JoinError, context: Option<Cow<'static, str>> },

    #[error("Enablement error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
