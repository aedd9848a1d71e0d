use std::fmt::Display;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::value_objects::iam::{CredentialsPayload, SignedIn};

/// Authentication-specific failure subtypes a provider can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    CredentialsSignin,
    AccessDenied,
    Configuration,
    CallbackRouteError,
}

impl Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            AuthErrorKind::CredentialsSignin => "CredentialsSignin",
            AuthErrorKind::AccessDenied => "AccessDenied",
            AuthErrorKind::Configuration => "Configuration",
            AuthErrorKind::CallbackRouteError => "CallbackRouteError",
        };
        f.write_str(kind)
    }
}

#[derive(Debug, Error)]
pub enum SignInError {
    #[error("authentication failed: {0}")]
    Auth(AuthErrorKind),
    /// Anything that is not an authentication decision, e.g. infrastructure failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider {
    async fn sign_in(
        &self,
        strategy: &str,
        payload: CredentialsPayload,
    ) -> Result<SignedIn, SignInError>;
}
