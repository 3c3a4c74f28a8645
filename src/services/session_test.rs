use super::*;

#[test]
fn bytes_to_hex_pads_each_byte() {
    assert_eq!(bytes_to_hex(&[0x00, 0x0a, 0xff]), "000aff");
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_is_unique() {
    assert_ne!(generate_token(), generate_token());
}

#[test]
fn session_user_serializes_public_fields() {
    let user = SessionUser { id: Uuid::nil(), email: "a@b.co".into(), name: "a".into() };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["email"], "a@b.co");
    assert_eq!(json["name"], "a");
}
