//! Secret sealing for values stored in the config file.
//!
//! Secrets are AES-256-GCM encrypted and stored as Base64 of
//! `[nonce (12 bytes)][ciphertext]`.

use crate::error::Error;
use aes_gcm::{
    Aes256Gcm,
    aead::{Aead, AeadCore, KeyInit, Nonce, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Key for secrets at rest. Obfuscation only; anyone with the binary can read it.
const MASTER_KEY: &[u8; 32] = b"StatusBoardChecksAllSecretKey26!";

const NONCE_LEN: usize = 12;

fn invalid(message: String) -> Error {
    Error::Invalid { message }
}

/// Encrypt a secret for storage
pub fn encrypt(plain_text: &str) -> Result<String> {
    let cipher = Aes256Gcm::new(MASTER_KEY.into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plain_text.as_bytes())
        .map_err(|e| invalid(format!("Encryption failed: {e}")))?;

    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(sealed))
}

/// Decrypt a secret produced by [`encrypt`]
pub fn decrypt(cipher_text: &str) -> Result<String> {
    let data = BASE64
        .decode(cipher_text)
        .map_err(|e| invalid(format!("Base64 decode failed: {e}")))?;

    if data.len() < NONCE_LEN {
        return Err(invalid("Ciphertext too short".to_string()));
    }

    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(MASTER_KEY.into());
    let plain = cipher
        .decrypt(Nonce::<Aes256Gcm>::from_slice(nonce), ciphertext)
        .map_err(|e| invalid(format!("Decryption failed: {e}")))?;

    String::from_utf8(plain).map_err(|e| invalid(format!("UTF-8 decode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let sealed = encrypt("redis-password").expect("encrypt");
        assert_ne!(sealed, "redis-password");
        assert_eq!(decrypt(&sealed).expect("decrypt"), "redis-password");
    }

    #[test]
    fn test_decrypt_rejects_plain_text() {
        assert!(decrypt("not_valid_base64!!!").is_err());
        assert!(decrypt("AQIDBA==").is_err());
    }
}
