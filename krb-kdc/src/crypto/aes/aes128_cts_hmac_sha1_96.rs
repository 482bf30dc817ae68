use crate::crypto::common::{hmac_sha1, usage_kc, HashAlgorithm};
use crate::crypto::{ChecksumSuite, Cipher, CipherSuite, EncryptionTypeDescriptor, KerberosCryptoResult};

use super::decrypt::{decrypt_aes, decrypt_message};
use super::encrypt::{encrypt_aes, encrypt_message};
use super::key_derivation::{derive_key, derive_key_from_password, derive_random, random_to_key};
use super::{AesSize, AES_BLOCK_SIZE, AES_MAC_SIZE, AES_SHA1_DEFAULT_PARAMS, AES128_KEY_SIZE};

const DESCRIPTOR: EncryptionTypeDescriptor = EncryptionTypeDescriptor {
    key_size: AES128_KEY_SIZE,
    seed_size: AES128_KEY_SIZE,
    block_size: AES_BLOCK_SIZE,
    confounder_size: AES_BLOCK_SIZE,
    mac_size: AES_MAC_SIZE,
    hash: HashAlgorithm::Sha1,
    checksum: ChecksumSuite::HmacSha196Aes128,
    default_string_to_key_params: AES_SHA1_DEFAULT_PARAMS,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aes128CtsHmacSha196;

impl Cipher for Aes128CtsHmacSha196 {
    fn descriptor(&self) -> &'static EncryptionTypeDescriptor {
        &DESCRIPTOR
    }

    fn cipher_type(&self) -> CipherSuite {
        CipherSuite::Aes128CtsHmacSha196
    }

    fn random_to_key(&self, seed: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        random_to_key(seed, AesSize::Aes128)
    }

    fn derive_random(&self, key: &[u8], usage: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        derive_random(key, usage, AesSize::Aes128)
    }

    fn string_to_key(&self, password: &[u8], salt: &[u8], params: &str) -> KerberosCryptoResult<Vec<u8>> {
        derive_key_from_password(password, salt, params, AesSize::Aes128)
    }

    fn encrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        encrypt_aes(key, data, AesSize::Aes128)
    }

    fn decrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        decrypt_aes(key, data, AesSize::Aes128)
    }

    fn encrypt_message_with_confounder(
        &self,
        key: &[u8],
        key_usage: i32,
        payload: &[u8],
        confounder: &[u8],
    ) -> KerberosCryptoResult<Vec<u8>> {
        encrypt_message(key, key_usage, payload, confounder, AesSize::Aes128)
    }

    fn decrypt_message(&self, key: &[u8], key_usage: i32, cipher_data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        decrypt_message(key, key_usage, cipher_data, AesSize::Aes128)
    }

    fn checksum(&self, key: &[u8], key_usage: i32, payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        let kc = derive_key(key, &usage_kc(key_usage), AesSize::Aes128)?;

        hmac_sha1(&kc, payload, AES_MAC_SIZE)
    }
}
