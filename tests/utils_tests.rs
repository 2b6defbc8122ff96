use std::collections::HashSet;

use shortstash::utils::{generate_csrf_token, generate_random_code, sanitize_code};

#[test]
fn test_generate_random_code_length() {
    assert_eq!(generate_random_code(6).len(), 6);
    assert_eq!(generate_random_code(10).len(), 10);
    assert_eq!(generate_random_code(1).len(), 1);
    assert_eq!(generate_random_code(0).len(), 0);
}

#[test]
fn test_generate_random_code_characters() {
    let code = generate_random_code(100);
    let valid_chars: HashSet<char> =
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
            .chars()
            .collect();

    for ch in code.chars() {
        assert!(valid_chars.contains(&ch), "Invalid character: {}", ch);
    }
}

#[test]
fn test_generate_random_code_uniqueness() {
    let mut codes = HashSet::new();

    for _ in 0..1000 {
        codes.insert(generate_random_code(8));
    }

    assert!(
        codes.len() > 990,
        "Generated codes lack sufficient randomness"
    );
}

#[test]
fn test_csrf_token_shape() {
    let token = generate_csrf_token();
    // 32 random bytes, hex encoded
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_csrf_token_uniqueness() {
    let mut tokens = HashSet::new();
    for _ in 0..100 {
        tokens.insert(generate_csrf_token());
    }
    assert_eq!(tokens.len(), 100);
}

#[test]
fn test_sanitize_code_passthrough() {
    assert_eq!(sanitize_code("abc123"), "abc123");
    assert_eq!(sanitize_code("XyZ009"), "XyZ009");
}

#[test]
fn test_sanitize_code_strips_specials() {
    assert_eq!(sanitize_code("../etc/passwd"), "etcpasswd");
    assert_eq!(sanitize_code("a-b_c.d"), "abcd");
    assert_eq!(sanitize_code("abc%2F123"), "abc2F123");
    assert_eq!(sanitize_code("..\\..\\"), "");
    assert_eq!(sanitize_code(""), "");
}
