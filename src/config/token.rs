//! Shared-token generation

/// Generate a random token for the `X-Trailquest-Token` header.
///
/// The token is hex-encoded and safe to embed in `config.toml`.
pub fn generate_auth_token() -> String {
    let mut bytes = [0u8; 32];
    if getrandom::getrandom(&mut bytes).is_ok() {
        return hex_encode(&bytes);
    }

    // Best-effort fallback when the OS RNG is unavailable
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let pid = std::process::id() as u128;
    hex_encode(&(nanos ^ pid.rotate_left(17)).to_le_bytes())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let a = generate_auth_token();
        let b = generate_auth_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
