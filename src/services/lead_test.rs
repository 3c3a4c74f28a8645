use super::*;

fn form(name: &str, email: &str, phone: &str) -> LeadForm {
    LeadForm {
        name: Some(name.into()),
        email: Some(email.into()),
        phone: Some(phone.into()),
        service: None,
        message: None,
    }
}

#[test]
fn status_round_trips() {
    for status in [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Converted,
        LeadStatus::Lost,
    ] {
        assert_eq!(LeadStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(LeadStatus::parse("won"), None);
}

#[test]
fn status_serde_is_lowercase() {
    let status: LeadStatus = serde_json::from_str("\"qualified\"").unwrap();
    assert_eq!(status, LeadStatus::Qualified);
    assert_eq!(serde_json::to_string(&LeadStatus::Lost).unwrap(), "\"lost\"");
}

#[test]
fn valid_lead_is_trimmed_and_normalized() {
    let mut raw = form("  Jane Doe ", " Jane@Example.com", "");
    raw.message = Some("  Leaky faucet  ".into());
    let lead = validate(raw).unwrap();
    assert_eq!(lead.name, "Jane Doe");
    assert_eq!(lead.email.as_deref(), Some("jane@example.com"));
    assert_eq!(lead.phone, None);
    assert_eq!(lead.message.as_deref(), Some("Leaky faucet"));
}

#[test]
fn phone_alone_is_enough() {
    let lead = validate(form("Jane", "", "(555) 123-4567")).unwrap();
    assert_eq!(lead.phone.as_deref(), Some("(555) 123-4567"));
    assert_eq!(lead.email, None);
}

#[test]
fn name_is_required() {
    assert!(matches!(validate(form("  ", "jane@example.com", "")), Err(LeadError::MissingName)));
    let no_name = LeadForm { email: Some("jane@example.com".into()), ..LeadForm::default() };
    assert!(matches!(validate(no_name), Err(LeadError::MissingName)));
}

#[test]
fn bad_email_is_rejected_even_with_phone() {
    assert!(matches!(validate(form("Jane", "jane-at-example", "5551234567")), Err(LeadError::InvalidEmail)));
}

#[test]
fn contact_method_is_required() {
    assert!(matches!(validate(form("Jane", "", "")), Err(LeadError::MissingContact)));
    assert!(matches!(validate(form("Jane", "", "call me")), Err(LeadError::MissingContact)));
}

#[test]
fn placeholder_service_is_dropped() {
    let mut raw = form("Jane", "jane@example.com", "");
    raw.service = Some("Select Service".into());
    assert_eq!(validate(raw).unwrap().service, None);
}

#[test]
fn overlong_message_is_rejected() {
    let mut raw = form("Jane", "jane@example.com", "");
    raw.message = Some("x".repeat(MAX_MESSAGE_LEN + 1));
    assert!(matches!(validate(raw), Err(LeadError::TooLong("message"))));
}

#[test]
fn phone_plausibility() {
    assert!(is_plausible_phone("+1 (555) 123-4567"));
    assert!(!is_plausible_phone("12345"));
    assert!(!is_plausible_phone("555-CALL-NOW"));
}
