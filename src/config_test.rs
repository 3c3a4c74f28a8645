use super::*;

// =============================================================================
// env_parse / env_bool — unique env var names avoid races with parallel tests.
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: u16 = env_parse("__TEST_LK_EP_MISSING_5521__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__TEST_LK_EP_VALID__", " 99 ") };
    let val: u64 = env_parse("__TEST_LK_EP_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__TEST_LK_EP_VALID__") };
}

#[test]
fn env_parse_invalid_returns_default() {
    unsafe { std::env::set_var("__TEST_LK_EP_INVALID__", "lots") };
    let val: u32 = env_parse("__TEST_LK_EP_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__TEST_LK_EP_INVALID__") };
}

#[test]
fn env_bool_variants() {
    for (i, (raw, expected)) in [("1", true), ("YES", true), (" on ", true), ("0", false), ("Off", false)]
        .iter()
        .enumerate()
    {
        let key = format!("__TEST_LK_EB_{i}__");
        unsafe { std::env::set_var(&key, raw) };
        assert_eq!(env_bool(&key), Some(*expected), "for {raw:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_garbage_is_none() {
    let key = "__TEST_LK_EB_GARBAGE__";
    unsafe { std::env::set_var(key, "perhaps") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool("__TEST_LK_EB_UNSET_8812__"), None);
}

#[test]
fn env_string_treats_blank_as_unset() {
    let key = "__TEST_LK_ES_BLANK__";
    unsafe { std::env::set_var(key, "   ") };
    assert_eq!(env_string(key), None);
    unsafe { std::env::remove_var(key) };
}
