use crate::crypto::common::{usage_kc, HashAlgorithm};
use crate::crypto::{ChecksumSuite, Cipher, CipherSuite, EncryptionTypeDescriptor, KerberosCryptoResult};

use super::decrypt::{decrypt_aes, decrypt_message_sha2};
use super::encrypt::{encrypt_aes, encrypt_message_sha2};
use super::key_derivation::{derive_key_from_password_sha2, kdf_hmac_sha2, random_to_key};
use super::{AesSize, AES_BLOCK_SIZE, AES_SHA2_DEFAULT_PARAMS, AES128_KEY_SIZE};

const AES_SIZE: AesSize = AesSize::Aes128;

const DESCRIPTOR: EncryptionTypeDescriptor = EncryptionTypeDescriptor {
    key_size: AES128_KEY_SIZE,
    seed_size: AES128_KEY_SIZE,
    block_size: AES_BLOCK_SIZE,
    confounder_size: AES_BLOCK_SIZE,
    mac_size: 128 / 8,
    hash: HashAlgorithm::Sha256,
    checksum: ChecksumSuite::HmacSha256128Aes128,
    default_string_to_key_params: AES_SHA2_DEFAULT_PARAMS,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aes128CtsHmacSha256128;

impl Cipher for Aes128CtsHmacSha256128 {
    fn descriptor(&self) -> &'static EncryptionTypeDescriptor {
        &DESCRIPTOR
    }

    fn cipher_type(&self) -> CipherSuite {
        CipherSuite::Aes128CtsHmacSha256128
    }

    fn random_to_key(&self, seed: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        random_to_key(seed, AES_SIZE)
    }

    /// `KDF-HMAC-SHA2(key, usage, 128)`
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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::crypto::Cipher;

    use super::Aes128CtsHmacSha256128;

    const BASE_KEY: &str = "3705d96080c17728a0e800eab6e0d23c";

    // https://www.rfc-editor.org/rfc/rfc8009#appendix-A
    #[test]
    fn checksum() {
        let key = hex::decode(BASE_KEY).unwrap();
        let payload: Vec<u8> = (0..21).collect();

        let checksum = Aes128CtsHmacSha256128.checksum(&key, 2, &payload).unwrap();

        assert_eq!(hex::encode(checksum), "d78367186643d67b411cba9139fc1dee");
    }

    #[test]
    fn derive_key_is_kdf() {
        let key = hex::decode(BASE_KEY).unwrap();

        assert_eq!(
            hex::encode(Aes128CtsHmacSha256128.derive_key(&key, &[0, 0, 0, 2, 0xaa]).unwrap()),
            "9b197dd1e8c5609d6e67c3e37c62c72e"
        );
    }

    #[test]
    fn string_to_key_with_explicit_params() {
        let mut salt = hex::decode("10df9dd783e5bc8acea1730e74355f61").unwrap();
        salt.extend_from_slice(b"ATHENA.MIT.EDUraeburn");

        let key = Aes128CtsHmacSha256128
            .generate_key_from_password(b"password", &salt)
            .unwrap();

        assert_eq!(hex::encode(&key), "089bca48b105ea6ea77ca5d2f39dc5e7");
        assert_eq!(
            Aes128CtsHmacSha256128
                .string_to_key(b"password", &salt, "00008000")
                .unwrap(),
            key
        );
    }
}
