use axum::{
    extract::{FromRequestParts, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::extractors::MaybeUser;
use crate::state::AppState;

/// Middleware that rejects writes from non-admins while maintenance mode is on.
/// Reads always pass through.
pub async fn maintenance_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_read(req.method()) || !state.content.maintenance_mode().await? {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();
    let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts, &state).await?;
    if !user.is_some_and(|u| u.is_admin) {
        return Err(AppError::ServiceUnavailable);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

fn is_read(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_safe_methods_are_reads() {
        assert!(is_read(&Method::GET));
        assert!(is_read(&Method::HEAD));
        assert!(is_read(&Method::OPTIONS));
        assert!(!is_read(&Method::POST));
        assert!(!is_read(&Method::PATCH));
        assert!(!is_read(&Method::DELETE));
    }
}
