//! AES encryption types:
//! [RFC 3962](https://www.rfc-editor.org/rfc/rfc3962) (HMAC-SHA1-96) and
//! [RFC 8009](https://www.rfc-editor.org/rfc/rfc8009) (HMAC-SHA2).

mod aes128_cts_hmac_sha1_96;
mod aes128_cts_hmac_sha256_128;
mod aes256_cts_hmac_sha1_96;
mod aes256_cts_hmac_sha384_192;
mod decrypt;
mod encrypt;
mod key_derivation;

use crate::crypto::common::HashAlgorithm;

pub const AES_BLOCK_SIZE: usize = 16;
/// HMAC-SHA1-96 output size
pub const AES_MAC_SIZE: usize = 12;

pub const AES128_KEY_SIZE: usize = 128 / 8;
pub const AES256_KEY_SIZE: usize = 256 / 8;

/// https://www.rfc-editor.org/rfc/rfc3962.html#section-4
/// 00 00 10 00 (decimal 4,096, indicating 4,096 iterations)
pub const AES_SHA1_DEFAULT_PARAMS: &str = "00001000";
/// https://www.rfc-editor.org/rfc/rfc8009.html#section-4
/// 00 00 80 00 (decimal 32,768)
pub const AES_SHA2_DEFAULT_PARAMS: &str = "00008000";

pub use aes128_cts_hmac_sha1_96::Aes128CtsHmacSha196;
pub use aes128_cts_hmac_sha256_128::Aes128CtsHmacSha256128;
pub use aes256_cts_hmac_sha1_96::Aes256CtsHmacSha196;
pub use aes256_cts_hmac_sha384_192::Aes256CtsHmacSha384192;
pub use decrypt::{decrypt_aes, decrypt_aes_cts};
pub use encrypt::{encrypt_aes, encrypt_aes_cts};
pub use key_derivation::kdf_hmac_sha2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AesSize {
    Aes256,
    Aes128,
}

impl AesSize {
    pub fn key_length(&self) -> usize {
        match self {
            AesSize::Aes256 => AES256_KEY_SIZE,
            AesSize::Aes128 => AES128_KEY_SIZE,
        }
    }

    pub fn seed_bit_len(&self) -> usize {
        self.key_length() * 8
    }

    /// RFC 8009 pairs AES128 with SHA-256 and AES256 with SHA-384.
    pub fn sha2_hash(&self) -> HashAlgorithm {
        match self {
            AesSize::Aes256 => HashAlgorithm::Sha384,
            AesSize::Aes128 => HashAlgorithm::Sha256,
        }
    }

    /// Truncated HMAC length of the RFC 8009 encryption types.
    pub fn sha2_mac_size(&self) -> usize {
        match self {
            AesSize::Aes256 => 192 / 8,
            AesSize::Aes128 => 128 / 8,
        }
    }

    /// Enctype name mixed into the RFC 8009 string-to-key salt.
    pub fn sha2_enctype_name(&self) -> &'static [u8] {
        match self {
            AesSize::Aes256 => b"aes256-cts-hmac-sha384-192",
            AesSize::Aes128 => b"aes128-cts-hmac-sha256-128",
        }
    }
}

fn swap_two_last_blocks(data: &mut [u8]) {
    let len = data.len();
    let (head, last) = data.split_at_mut(len - AES_BLOCK_SIZE);
    let head_len = head.len();

    head[head_len - AES_BLOCK_SIZE..].swap_with_slice(last);
}
