//! Per-page AES-256-GCM encryption, keyed on page position.
//!
//! Each page body is encrypted independently with a nonce derived from its
//! logical position, so pages never need to be re-encrypted in page order
//! and two pages never reuse a nonce under the same key. The checksum is
//! computed over the plaintext and stored unencrypted in the header (see
//! `Page::seal_checksum`), so a wrong key surfaces as a GCM tag failure,
//! not a silently-wrong checksum.

use aes_gcm::aead::{AeadMutInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use common::{DbError, DbResult};
use hkdf::Hkdf;
use sha2::Sha256;

const NONCE_LEN: usize = 12;

fn derive_key(passphrase: &[u8]) -> Key<Aes256Gcm> {
    let hk = Hkdf::<Sha256>::new(None, passphrase);
    let mut okm = [0u8; 32];
    hk.expand(b"pagefile-page-key-v1", &mut okm)
        .expect("32-byte okm is a valid HKDF-SHA256 length");
    Key::<Aes256Gcm>::from(okm)
}

fn nonce_for(position: u64) -> Nonce {
    let mut bytes = [0u8; NONCE_LEN];
    bytes[..8].copy_from_slice(&position.to_le_bytes());
    Nonce::from(bytes)
}

/// Encrypt `plaintext` in place and return the detached AEAD tag.
pub fn encrypt_page(key: &[u8], position: u64, plaintext: &mut [u8]) -> DbResult<Vec<u8>> {
    let key = derive_key(key);
    let mut cipher = Aes256Gcm::new(&key);
    let nonce = nonce_for(position);
    let tag: Tag = cipher
        .encrypt_in_place_detached(&nonce, b"", plaintext)
        .map_err(|e| DbError::Storage(format!("page encryption failed: {e}")))?;
    Ok(tag.to_vec())
}

/// Decrypt `ciphertext` in place using the detached `tag`. Returns
/// `ChecksumMismatch` if the tag does not verify, which is what a wrong key
/// looks like.
pub fn decrypt_page(key: &[u8], position: u64, ciphertext: &mut [u8], tag: &[u8]) -> DbResult<()> {
    let key = derive_key(key);
    let mut cipher = Aes256Gcm::new(&key);
    let nonce = nonce_for(position);
    let tag = Tag::from_slice(tag);
    cipher
        .decrypt_in_place_detached(&nonce, b"", ciphertext, tag)
        .map_err(|_| DbError::ChecksumMismatch(format!("page {position}: wrong encryption key")))
}
