use num_bigint::BigUint;
use serde::Deserialize;
use thiserror::Error;

/// Ciphertext width expected by the login form.
pub const CIPHERTEXT_HEX_WIDTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyExchangeError {
    #[error("public key response is not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("public key {field} is not a hexadecimal number")]
    InvalidHex { field: &'static str },
    #[error("public key modulus is zero")]
    ZeroModulus,
}

/// The `{ "modulus": "...", "exponent": "..." }` document served by the key endpoint.
#[derive(Debug, Clone, Deserialize)]
struct PublicKeyDocument {
    modulus: String,
    exponent: String,
}

/// Server-published RSA key, used without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    exponent: BigUint,
    modulus: BigUint,
}

impl PublicKey {
    pub fn from_hex(exponent: &str, modulus: &str) -> Result<Self, KeyExchangeError> {
        let exponent = parse_hex(exponent).ok_or(KeyExchangeError::InvalidHex { field: "exponent" })?;
        let modulus = parse_hex(modulus).ok_or(KeyExchangeError::InvalidHex { field: "modulus" })?;
        if modulus.bits() == 0 {
            return Err(KeyExchangeError::ZeroModulus);
        }
        Ok(Self { exponent, modulus })
    }

    pub fn from_json(body: &str) -> Result<Self, KeyExchangeError> {
        let document: PublicKeyDocument = serde_json::from_str(body)
            .map_err(|err| KeyExchangeError::MalformedResponse(err.to_string()))?;
        Self::from_hex(&document.exponent, &document.modulus)
    }

    /// Textbook `m^e mod n` over the secret's bytes, as lowercase hex padded to 128 digits.
    pub fn encrypt_hex(&self, secret: &str) -> String {
        let message = BigUint::from_bytes_be(secret.as_bytes());
        let cipher = message.modpow(&self.exponent, &self.modulus);
        format!("{:0>width$}", cipher.to_str_radix(16), width = CIPHERTEXT_HEX_WIDTH)
    }
}

fn parse_hex(raw: &str) -> Option<BigUint> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
}

#[cfg(test)]
mod tests {
    use super::{KeyExchangeError, PublicKey, CIPHERTEXT_HEX_WIDTH};

    #[test]
    fn textbook_rsa_example_matches_hand_computation() {
        // n = 61 * 53 = 3233, e = 17, m = 'A' = 65 -> c = 2790 = 0xae6
        let key = PublicKey::from_hex("11", "ca1").expect("valid key");
        let cipher = key.encrypt_hex("A");
        assert_eq!(cipher.len(), CIPHERTEXT_HEX_WIDTH);
        assert!(cipher.ends_with("ae6"));
        assert!(cipher[..CIPHERTEXT_HEX_WIDTH - 3].chars().all(|c| c == '0'));
    }

    #[test]
    fn encrypts_abc_with_standard_exponent() {
        // "abc" = 0x616263; 0x616263^0x10001 mod 0x1000003 = 0x913227
        let key = PublicKey::from_hex("10001", "1000003").expect("valid key");
        let expected = format!("{:0>128}", "913227");
        assert_eq!(key.encrypt_hex("abc"), expected);
    }

    #[test]
    fn encrypts_against_a_wider_modulus() {
        let key = PublicKey::from_hex(
            "10001",
            "c5a1d8f3b2e7a9c1d4f6b8e0a2c4d6e8f1a3b5c7d9e1f3a5b7c9d1e3f5a7b9c1",
        )
        .expect("valid key");
        assert_eq!(
            key.encrypt_hex("abc"),
            "00000000000000000000000000000000000000000000000000000000000000009c02ef8891707fe2719f9ecdbc30863e082455212832a821f4f6a11ce47d21f4"
        );
    }

    #[test]
    fn parses_key_document_and_rejects_bad_input() {
        let key = PublicKey::from_json(r#"{"modulus":"ca1","exponent":"11"}"#).expect("parses");
        assert!(key.encrypt_hex("A").ends_with("ae6"));

        assert!(matches!(
            PublicKey::from_json("<html>maintenance</html>"),
            Err(KeyExchangeError::MalformedResponse(_))
        ));
        assert!(matches!(
            PublicKey::from_json(r#"{"modulus":"ca1"}"#),
            Err(KeyExchangeError::MalformedResponse(_))
        ));
        assert_eq!(
            PublicKey::from_hex("11", "zz"),
            Err(KeyExchangeError::InvalidHex { field: "modulus" })
        );
        assert_eq!(PublicKey::from_hex("11", "000"), Err(KeyExchangeError::ZeroModulus));
    }

    #[test]
    fn empty_secret_encrypts_to_zero() {
        let key = PublicKey::from_hex("10001", "ca1").expect("valid key");
        assert_eq!(key.encrypt_hex(""), "0".repeat(CIPHERTEXT_HEX_WIDTH));
    }
}
