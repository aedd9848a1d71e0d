use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sign-in form payload. Both fields stay optional so a half-filled form still reaches
/// the provider, which decides how to reject it.
#[derive(Clone, Default, Deserialize, PartialEq)]
pub struct CredentialsPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialsPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsPayload")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A verified sign-in: who it was and the token that carries their session.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub user: AuthenticatedUser,
    pub session_token: String,
}
