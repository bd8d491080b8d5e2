use subtle::ConstantTimeEq;

/// Constant-time string comparison for the gateway's shared secret
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a caller-supplied secret against the configured access key.
///
/// An absent secret never matches, even if the access key were empty.
pub fn secret_matches(provided: Option<&str>, access_key: &str) -> bool {
    match provided {
        Some(secret) if !access_key.is_empty() => constant_time_compare(secret, access_key),
        _ => false,
    }
}
