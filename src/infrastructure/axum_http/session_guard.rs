use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::infrastructure::auth::session::{SESSION_COOKIE, SessionKeys, SessionUser};

pub const LOGIN_PATH: &str = "/login";

/// Lets a request through only with a valid session cookie, attaching the
/// [`SessionUser`] to its extensions. Everyone else is sent to the login page.
pub async fn require_session(
    State(session_keys): State<Arc<SessionKeys>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        debug!(path = %request.uri().path(), "session: no session cookie");
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let session_user = session_keys
        .verify(cookie.value())
        .and_then(SessionUser::try_from);

    match session_user {
        Ok(session_user) => {
            debug!(user_id = %session_user.user_id, "session: accepted");
            request.extensions_mut().insert(session_user);
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, path = %request.uri().path(), "session: rejected");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}
