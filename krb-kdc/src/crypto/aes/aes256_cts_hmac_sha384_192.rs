use crate::crypto::common::{usage_kc, HashAlgorithm};
use crate::crypto::{ChecksumSuite, Cipher, CipherSuite, EncryptionTypeDescriptor, KerberosCryptoResult};

use super::decrypt::{decrypt_aes, decrypt_message_sha2};
use super::encrypt::{encrypt_aes, encrypt_message_sha2};
use super::key_derivation::{derive_key_from_password_sha2, kdf_hmac_sha2, random_to_key};
use super::{AesSize, AES_BLOCK_SIZE, AES_SHA2_DEFAULT_PARAMS, AES256_KEY_SIZE};

const AES_SIZE: AesSize = AesSize::Aes256;

const DESCRIPTOR: EncryptionTypeDescriptor = EncryptionTypeDescriptor {
    key_size: AES256_KEY_SIZE,
    seed_size: AES256_KEY_SIZE,
    block_size: AES_BLOCK_SIZE,
    confounder_size: AES_BLOCK_SIZE,
    mac_size: 192 / 8,
    hash: HashAlgorithm::Sha384,
    checksum: ChecksumSuite::HmacSha384192Aes256,
    default_string_to_key_params: AES_SHA2_DEFAULT_PARAMS,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aes256CtsHmacSha384192;

impl Cipher for Aes256CtsHmacSha384192 {
    fn descriptor(&self) -> &'static EncryptionTypeDescriptor {
        &DESCRIPTOR
    }

    fn cipher_type(&self) -> CipherSuite {
        CipherSuite::Aes256CtsHmacSha384192
    }

    fn random_to_key(&self, seed: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        random_to_key(seed, AES_SIZE)
    }

    /// `KDF-HMAC-SHA2(key, usage, 256)`
    fn derive_random(&self, key: &[u8], usage: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        kdf_hmac_sha2(key, usage, AES_SIZE.seed_bit_len(), AES_SIZE.sha2_hash())
    }

    fn string_to_key(&self, password: &[u8], salt: &[u8], params: &str) -> KerberosCryptoResult<Vec<u8>> {
        derive_key_from_password_sha2(password, salt, params, AES_SIZE)
    }

    fn encrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        encrypt_aes(key, data, AES_SIZE)
    }

    fn decrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        decrypt_aes(key, data, AES_SIZE)
    }

    fn encrypt_message_with_confounder(
        &self,
        key: &[u8],
        key_usage: i32,
        payload: &[u8],
        confounder: &[u8],
    ) -> KerberosCryptoResult<Vec<u8>> {
        encrypt_message_sha2(key, key_usage, payload, confounder, AES_SIZE)
    }

    fn decrypt_message(&self, key: &[u8], key_usage: i32, cipher_data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        decrypt_message_sha2(key, key_usage, cipher_data, AES_SIZE)
    }

    fn checksum(&self, key: &[u8], key_usage: i32, payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        let mac_size = AES_SIZE.sha2_mac_size();
        let kc = kdf_hmac_sha2(key, &usage_kc(key_usage), mac_size * 8, AES_SIZE.sha2_hash())?;

        let mut checksum = AES_SIZE.sha2_hash().hmac(&kc, payload)?;
        checksum.truncate(mac_size);

        Ok(checksum)
    }
}
