use super::*;

#[test]
fn lead_error_to_status_maps_validation_to_400() {
    for err in [
        LeadError::MissingName,
        LeadError::InvalidEmail,
        LeadError::MissingContact,
        LeadError::TooLong("message"),
        LeadError::EmptyNote,
    ] {
        assert_eq!(lead_error_to_status(&err), StatusCode::BAD_REQUEST, "{err}");
    }
}

#[test]
fn lead_error_to_status_maps_not_found() {
    assert_eq!(lead_error_to_status(&LeadError::NotFound(Uuid::new_v4())), StatusCode::NOT_FOUND);
}

#[test]
fn lead_error_to_status_maps_database_to_500() {
    assert_eq!(
        lead_error_to_status(&LeadError::Database(sqlx::Error::PoolTimedOut)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn status_filter_accepts_known_values() {
    assert_eq!(parse_status_filter(Some("qualified")), Ok(Some(LeadStatus::Qualified)));
    assert_eq!(parse_status_filter(Some(" lost ")), Ok(Some(LeadStatus::Lost)));
}

#[test]
fn status_filter_blank_or_all_means_unfiltered() {
    assert_eq!(parse_status_filter(None), Ok(None));
    assert_eq!(parse_status_filter(Some("")), Ok(None));
    assert_eq!(parse_status_filter(Some("all")), Ok(None));
}

#[test]
fn status_filter_rejects_unknown() {
    assert_eq!(parse_status_filter(Some("won")), Err(StatusCode::BAD_REQUEST));
}
