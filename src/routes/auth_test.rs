use super::*;
use crate::state::test_helpers::test_app_state;

#[test]
fn email_auth_errors_map_to_statuses() {
    assert_eq!(email_auth_error_to_status(&EmailAuthError::InvalidEmail), StatusCode::BAD_REQUEST);
    assert_eq!(email_auth_error_to_status(&EmailAuthError::InvalidCode), StatusCode::BAD_REQUEST);
    assert_eq!(email_auth_error_to_status(&EmailAuthError::VerificationFailed), StatusCode::UNAUTHORIZED);
    assert_eq!(email_auth_error_to_status(&EmailAuthError::NotConfigured), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        email_auth_error_to_status(&EmailAuthError::EmailDelivery("bounced".into())),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        email_auth_error_to_status(&EmailAuthError::Db(sqlx::Error::PoolTimedOut)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn session_cookie_is_http_only_and_scoped() {
    let cookie = session_cookie("tok".into(), true, Duration::days(1));
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
}

#[test]
fn clearing_cookie_expires_immediately() {
    let cookie = session_cookie(String::new(), false, Duration::ZERO);
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.value(), "");
}

#[tokio::test]
async fn request_code_without_mailer_is_unavailable() {
    let (state, _) = test_app_state();
    let result = request_email_code(State(state), Json(RequestCodeBody { email: "owner@example.com".into() })).await;
    assert_eq!(result.unwrap_err(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn me_returns_extracted_user() {
    let user = session::SessionUser { id: uuid::Uuid::new_v4(), email: "owner@example.com".into(), name: "owner".into() };
    let Json(returned) = me(AuthUser { user: user.clone(), token: "t".into() }).await;
    assert_eq!(returned.id, user.id);
}
