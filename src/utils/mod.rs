pub mod url_validator;

pub use url_validator::{UrlValidationError, validate_url};

/// Length of generated short codes.
pub const CODE_LENGTH: usize = 6;

/// Collision retries before code generation is considered exhausted.
pub const MAX_CODE_ATTEMPTS: u32 = 100;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random alphanumeric short code.
///
/// `ThreadRng` is a CSPRNG; codes double as unguessable bearer tokens for
/// shared-store entries, not just display shortening.
pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| CODE_ALPHABET[rand::random_range(0..CODE_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// Generate a 256-bit CSRF token, hex encoded.
pub fn generate_csrf_token() -> String {
    use rand::Rng;

    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Strip everything but ASCII alphanumerics from a path segment.
///
/// Lookup keys and record file names are built from the result, so this is
/// the single choke point against path traversal.
pub fn sanitize_code(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
