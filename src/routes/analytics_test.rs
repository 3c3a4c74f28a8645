use uuid::Uuid;

use super::*;
use crate::services::session::SessionUser;
use crate::state::test_helpers::test_app_state;

#[test]
fn range_defaults_to_thirty_days() {
    assert_eq!(parse_range(None), Ok(AnalyticsRange::Month));
    assert_eq!(parse_range(Some(" ")), Ok(AnalyticsRange::Month));
}

#[test]
fn range_accepts_listed_windows_only() {
    assert_eq!(parse_range(Some("7")), Ok(AnalyticsRange::Week));
    assert_eq!(parse_range(Some("90")), Ok(AnalyticsRange::Quarter));
    assert_eq!(parse_range(Some("365")), Ok(AnalyticsRange::Year));
    assert_eq!(parse_range(Some("10")), Err(StatusCode::BAD_REQUEST));
    assert_eq!(parse_range(Some("week")), Err(StatusCode::BAD_REQUEST));
}

#[test]
fn database_errors_are_500() {
    assert_eq!(
        analytics_error_to_status(&AnalyticsError::Database(sqlx::Error::PoolTimedOut)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn bad_range_is_rejected_before_querying() {
    let (state, _) = test_app_state();
    let auth = AuthUser {
        user: SessionUser { id: Uuid::new_v4(), email: "owner@example.com".into(), name: "owner".into() },
        token: "test-token".into(),
    };
    let query = AnalyticsQuery { days: Some("14".into()) };
    let err = owner_analytics(State(state), auth, Query(query)).await.unwrap_err();
    assert_eq!(err, StatusCode::BAD_REQUEST);
}
