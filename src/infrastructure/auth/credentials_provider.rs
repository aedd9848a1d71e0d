use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::{
    application::{
        interfaces::identity_provider::{AuthErrorKind, IdentityProvider, SignInError},
        usecases::authentication::CREDENTIALS_STRATEGY,
    },
    domain::{
        repositories::users::UserRepository,
        value_objects::iam::{AuthenticatedUser, CredentialsPayload, SignedIn},
    },
    infrastructure::auth::{passwords, session::SessionKeys},
};

const MIN_PASSWORD_LENGTH: usize = 6;

/// E-mail and password sign-in against the `users` table.
pub struct CredentialsProvider<U>
where
    U: UserRepository + Send + Sync,
{
    user_repository: Arc<U>,
    session_keys: Arc<SessionKeys>,
}

impl<U> CredentialsProvider<U>
where
    U: UserRepository + Send + Sync,
{
    pub fn new(user_repository: Arc<U>, session_keys: Arc<SessionKeys>) -> Self {
        Self {
            user_repository,
            session_keys,
        }
    }
}

#[async_trait]
impl<U> IdentityProvider for CredentialsProvider<U>
where
    U: UserRepository + Send + Sync,
{
    async fn sign_in(
        &self,
        strategy: &str,
        payload: CredentialsPayload,
    ) -> Result<SignedIn, SignInError> {
        if strategy != CREDENTIALS_STRATEGY {
            warn!(strategy, "credentials_provider: unsupported strategy");
            return Err(SignInError::Auth(AuthErrorKind::Configuration));
        }

        let Some((email, password)) = parse_credentials(&payload) else {
            debug!("credentials_provider: payload failed validation");
            return Err(SignInError::Auth(AuthErrorKind::CredentialsSignin));
        };

        let user = self
            .user_repository
            .find_by_email(email)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "credentials_provider: failed to load user");
                SignInError::Auth(AuthErrorKind::CallbackRouteError)
            })?
            .ok_or_else(|| {
                debug!("credentials_provider: no user for email");
                SignInError::Auth(AuthErrorKind::CredentialsSignin)
            })?;

        if !passwords::verify_password(password, &user.password)? {
            debug!(user_id = %user.id, "credentials_provider: password mismatch");
            return Err(SignInError::Auth(AuthErrorKind::CredentialsSignin));
        }

        let user = AuthenticatedUser {
            id: user.id,
            name: user.name,
            email: user.email,
        };
        let session_token = self.session_keys.issue(&user)?;

        Ok(SignedIn {
            user,
            session_token,
        })
    }
}

fn parse_credentials(payload: &CredentialsPayload) -> Option<(&str, &str)> {
    let email = payload.email.as_deref()?.trim();
    let password = payload.password.as_deref()?;

    let (local, domain) = email.split_once('@')?;
    let looks_like_address = !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');

    (looks_like_address && password.chars().count() >= MIN_PASSWORD_LENGTH)
        .then_some((email, password))
}
