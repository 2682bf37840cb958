use aws_sdk_guardduty::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use gdfleet_enablement::{ProviderError, ProviderErrorKind};
use std::fmt::Debug;

/// Converts an SDK failure into a classified [`ProviderError`].
///
/// Shared by every service client; the SDK error type is the same across them.
pub(crate) fn classify<E, R>(err: &SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    let kind = match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => ProviderErrorKind::Transport,
        SdkError::ConstructionFailure(_) => ProviderErrorKind::InvalidRequest,
        _ => kind_for_code(err.code()),
    };
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        _ => DisplayErrorContext(err).to_string(),
    };

    ProviderError::new(kind, message)
}

/// Maps a service error code onto a [`ProviderErrorKind`].
pub(crate) fn kind_for_code(code: Option<&str>) -> ProviderErrorKind {
    match code {
        Some(
            "ThrottlingException"
            | "Throttling"
            | "TooManyRequestsException"
            | "RequestLimitExceeded",
        ) => ProviderErrorKind::Throttled,
        Some(
            "AccessDeniedException"
            | "AccessDenied"
            | "UnauthorizedOperation"
            | "UnrecognizedClientException"
            | "InvalidClientTokenId"
            | "ExpiredToken"
            | "ExpiredTokenException"
            | "AuthFailure",
        ) => ProviderErrorKind::AccessDenied,
        Some("ResourceNotFoundException" | "NotFoundException") => ProviderErrorKind::NotFound,
        Some(
            "BadRequestException"
            | "ValidationException"
            | "InvalidParameterValue"
            | "InvalidParameterException",
        ) => ProviderErrorKind::InvalidRequest,
        _ => ProviderErrorKind::Other,
    }
}
