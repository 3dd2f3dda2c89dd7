//! Bearer token generation for the tool-exposure server (§4.4).

use rand::RngCore;

/// Generates a 32-byte token, hex-encoded.
#[must_use]
pub fn generate() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_64_hex_chars() {
        let token = generate();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generates_distinct_tokens() {
        assert_ne!(generate(), generate());
    }
}
