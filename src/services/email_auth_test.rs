use super::*;

#[test]
fn normalize_email_accepts_basic_address() {
    assert_eq!(normalize_email("  Owner@Example.com "), Some("owner@example.com".to_owned()));
}

#[test]
fn normalize_email_rejects_invalid_values() {
    assert_eq!(normalize_email(""), None);
    assert_eq!(normalize_email("owner"), None);
    assert_eq!(normalize_email("@example.com"), None);
    assert_eq!(normalize_email("owner@"), None);
    assert_eq!(normalize_email("a@b@c.com"), None);
    assert_eq!(normalize_email("owner@localhost"), None);
    assert_eq!(normalize_email("own er@example.com"), None);
}

#[test]
fn normalize_code_uppercases() {
    let code = generate_access_code();
    assert_eq!(normalize_code(&code), Some(code.clone()));
    assert_eq!(normalize_code(" abc234 "), Some("ABC234".to_owned()));
}

#[test]
fn normalize_code_rejects_bad_shapes() {
    assert_eq!(normalize_code("abc23"), None);
    assert_eq!(normalize_code("abc2345"), None);
    assert_eq!(normalize_code("ABC1I0"), None);
    assert_eq!(normalize_code("ABC23!"), None);
}

#[test]
fn generate_access_code_shape() {
    let code = generate_access_code();
    assert_eq!(code.len(), CODE_LEN);
    assert!(code.bytes().all(|c| CODE_ALPHABET.contains(&c)));
}

#[test]
fn hash_access_code_is_stable_hex() {
    let a = hash_access_code("ABC234");
    assert_eq!(a, hash_access_code("ABC234"));
    assert_ne!(a, hash_access_code("ABC235"));
    assert_eq!(a.len(), 64);
}

#[test]
fn name_from_email_uses_local_part() {
    assert_eq!(name_from_email("jane@example.com"), "jane");
}

#[test]
fn render_template_injects_email_and_code() {
    let html = render_access_code_template("owner@example.com", "ABC234");
    assert!(html.contains("owner@example.com"));
    assert!(html.contains("ABC234"));
    assert!(!html.contains("{{EMAIL}}"));
    assert!(!html.contains("{{CODE}}"));
}

#[test]
fn render_template_escapes_email() {
    let html = render_access_code_template("<b>@example.com", "ABC234");
    assert!(html.contains("&lt;b&gt;@example.com"));
}
