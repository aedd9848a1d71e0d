use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use cookie::{Cookie, SameSite};
use serde::Serialize;

use crate::{
    application::{
        interfaces::identity_provider::IdentityProvider,
        usecases::authentication::{AuthenticateOutcome, AuthenticationUseCase},
    },
    domain::value_objects::iam::CredentialsPayload,
    infrastructure::{
        auth::{
            credentials_provider::CredentialsProvider,
            session::{SESSION_COOKIE, SessionKeys},
        },
        axum_http::{error_responses::AppError, session_guard::LOGIN_PATH},
        postgres::{postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
    },
};

#[derive(Debug, Clone, Copy)]
pub struct SessionCookiePolicy {
    pub secure: bool,
    pub max_age_seconds: i64,
}

pub struct AuthState<P>
where
    P: IdentityProvider + Send + Sync,
{
    authentication_usecase: AuthenticationUseCase<P>,
    cookie_policy: SessionCookiePolicy,
}

#[derive(Debug, Serialize)]
struct SignInRejected {
    message: String,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    session_keys: Arc<SessionKeys>,
    secure_cookies: bool,
) -> Router {
    let cookie_policy = SessionCookiePolicy {
        secure: secure_cookies,
        max_age_seconds: session_keys.ttl_seconds(),
    };
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let credentials_provider = CredentialsProvider::new(Arc::new(user_repository), session_keys);

    router(
        AuthenticationUseCase::new(Arc::new(credentials_provider)),
        cookie_policy,
    )
}

pub fn router<P>(
    authentication_usecase: AuthenticationUseCase<P>,
    cookie_policy: SessionCookiePolicy,
) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(Arc::new(AuthState {
            authentication_usecase,
            cookie_policy,
        }))
}

pub async fn login<P>(
    State(state): State<Arc<AuthState<P>>>,
    jar: CookieJar,
    Form(payload): Form<CredentialsPayload>,
) -> Result<Response, AppError>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let outcome = state
        .authentication_usecase
        .authenticate(None, payload)
        .await?;

    match outcome {
        AuthenticateOutcome::SignedIn {
            redirect_to,
            session,
        } => {
            let cookie = Cookie::build((SESSION_COOKIE, session.session_token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.cookie_policy.secure)
                .max_age(cookie::time::Duration::seconds(
                    state.cookie_policy.max_age_seconds,
                ));

            Ok((jar.add(cookie), Redirect::to(&redirect_to)).into_response())
        }
        AuthenticateOutcome::Rejected(message) => {
            Ok((StatusCode::UNAUTHORIZED, Json(SignInRejected { message })).into_response())
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to(LOGIN_PATH),
    )
}
