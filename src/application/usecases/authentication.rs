use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::{
    application::interfaces::identity_provider::{AuthErrorKind, IdentityProvider, SignInError},
    domain::value_objects::iam::{CredentialsPayload, SignedIn},
};

pub const CREDENTIALS_STRATEGY: &str = "credentials";
pub const SIGNED_IN_REDIRECT: &str = "/dashboard";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong.";

#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticateOutcome {
    SignedIn {
        redirect_to: String,
        session: SignedIn,
    },
    /// The sign-in was refused; the message is shown on the login form as-is.
    Rejected(String),
}

pub struct AuthenticationUseCase<P>
where
    P: IdentityProvider + Send + Sync,
{
    identity_provider: Arc<P>,
}

impl<P> AuthenticationUseCase<P>
where
    P: IdentityProvider + Send + Sync,
{
    pub fn new(identity_provider: Arc<P>) -> Self {
        Self { identity_provider }
    }

    /// Signs in with the credentials strategy. Only authentication errors become a
    /// message; any other provider failure is returned untouched. `prev_state` is the
    /// message the login form last showed, kept for the logs only.
    pub async fn authenticate(
        &self,
        prev_state: Option<&str>,
        payload: CredentialsPayload,
    ) -> Result<AuthenticateOutcome> {
        debug!(
            retry = prev_state.is_some(),
            "authentication: sign-in requested"
        );

        match self
            .identity_provider
            .sign_in(CREDENTIALS_STRATEGY, payload)
            .await
        {
            Ok(session) => {
                info!(user_id = %session.user.id, "authentication: signed in");
                Ok(AuthenticateOutcome::SignedIn {
                    redirect_to: SIGNED_IN_REDIRECT.to_string(),
                    session,
                })
            }
            Err(SignInError::Auth(AuthErrorKind::CredentialsSignin)) => {
                warn!("authentication: credentials rejected");
                Ok(AuthenticateOutcome::Rejected(INVALID_CREDENTIALS.to_string()))
            }
            Err(SignInError::Auth(kind)) => {
                warn!(error_type = %kind, "authentication: provider refused sign-in");
                Ok(AuthenticateOutcome::Rejected(SOMETHING_WENT_WRONG.to_string()))
            }
            Err(SignInError::Other(err)) => {
                error!(error = ?err, "authentication: provider failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::interfaces::identity_provider::MockIdentityProvider,
        domain::value_objects::iam::AuthenticatedUser,
    };
    use anyhow::anyhow;
    use uuid::Uuid;

    fn payload() -> CredentialsPayload {
        CredentialsPayload {
            email: Some("user@nextmail.com".to_string()),
            password: Some("123456".to_string()),
        }
    }

    fn usecase_failing_with(
        make_error: impl Fn() -> SignInError + Send + 'static,
    ) -> AuthenticationUseCase<MockIdentityProvider> {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_sign_in()
            .times(1)
            .returning(move |_, _| Err(make_error()));
        AuthenticationUseCase::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn successful_sign_in_redirects_to_the_dashboard() {
        let user = AuthenticatedUser {
            id: Uuid::new_v4(),
            name: "User".to_string(),
            email: "user@nextmail.com".to_string(),
        };
        let session = SignedIn {
            user: user.clone(),
            session_token: "token".to_string(),
        };

        let mut provider = MockIdentityProvider::new();
        provider
            .expect_sign_in()
            .withf(|strategy, payload| {
                strategy.to_string() == CREDENTIALS_STRATEGY
                    && payload.email.as_deref() == Some("user@nextmail.com")
            })
            .times(1)
            .returning(move |_, _| Ok(session.clone()));

        let outcome = AuthenticationUseCase::new(Arc::new(provider))
            .authenticate(None, payload())
            .await
            .unwrap();

        let AuthenticateOutcome::SignedIn {
            redirect_to,
            session,
        } = outcome
        else {
            panic!("expected a signed-in outcome");
        };
        assert_eq!(redirect_to, SIGNED_IN_REDIRECT);
        assert_eq!(session.user, user);
    }

    #[tokio::test]
    async fn bad_credentials_map_to_invalid_credentials() {
        let outcome = usecase_failing_with(|| SignInError::Auth(AuthErrorKind::CredentialsSignin))
            .authenticate(Some(INVALID_CREDENTIALS), payload())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AuthenticateOutcome::Rejected("Invalid credentials.".to_string())
        );
    }

    #[tokio::test]
    async fn other_auth_subtypes_map_to_something_went_wrong() {
        for kind in [
            AuthErrorKind::AccessDenied,
            AuthErrorKind::Configuration,
            AuthErrorKind::CallbackRouteError,
        ] {
            let outcome = usecase_failing_with(move || SignInError::Auth(kind))
                .authenticate(None, payload())
                .await
                .unwrap();

            assert_eq!(
                outcome,
                AuthenticateOutcome::Rejected("Something went wrong.".to_string()),
                "kind {kind}"
            );
        }
    }

    #[tokio::test]
    async fn non_auth_errors_are_propagated_unchanged() {
        let result = usecase_failing_with(|| SignInError::Other(anyhow!("pool timed out")))
            .authenticate(None, payload())
            .await;

        assert_eq!(result.unwrap_err().to_string(), "pool timed out");
    }
}
