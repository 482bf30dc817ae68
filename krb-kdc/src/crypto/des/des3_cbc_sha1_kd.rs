use crate::crypto::common::{hmac_sha1, usage_kc, HashAlgorithm};
use crate::crypto::{
    ChecksumSuite, Cipher, CipherSuite, EncryptionTypeDescriptor, KerberosCryptoError, KerberosCryptoResult,
};

use super::decrypt::{decrypt_des, decrypt_message};
use super::encrypt::{encrypt_des, encrypt_message};
use super::key_derivation::{derive_key, derive_key_from_password, derive_random, random_to_key};
use super::{DES3_BLOCK_SIZE, DES3_KEY_SIZE, DES3_MAC_SIZE, DES3_SEED_LEN};

const DESCRIPTOR: EncryptionTypeDescriptor = EncryptionTypeDescriptor {
    key_size: DES3_KEY_SIZE,
    seed_size: DES3_SEED_LEN,
    block_size: DES3_BLOCK_SIZE,
    confounder_size: DES3_BLOCK_SIZE,
    mac_size: DES3_MAC_SIZE,
    hash: HashAlgorithm::Sha1,
    checksum: ChecksumSuite::HmacSha1Des3Kd,
    default_string_to_key_params: "",
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Des3CbcSha1Kd;

impl Cipher for Des3CbcSha1Kd {
    fn descriptor(&self) -> &'static EncryptionTypeDescriptor {
        &DESCRIPTOR
    }

    fn cipher_type(&self) -> CipherSuite {
        CipherSuite::Des3CbcSha1Kd
    }

    fn random_to_key(&self, seed: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        random_to_key(seed)
    }

    fn derive_random(&self, key: &[u8], usage: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        derive_random(key, usage)
    }

    fn string_to_key(&self, password: &[u8], salt: &[u8], params: &str) -> KerberosCryptoResult<Vec<u8>> {
        // des3 string-to-key takes no parameters
        if !params.is_empty() {
            return Err(KerberosCryptoError::StringToKeyParams(format!(
                "{} accepts no parameters, got {:?}",
                CipherSuite::Des3CbcSha1Kd,
                params
            )));
        }

        derive_key_from_password(password, salt)
    }

    fn encrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        encrypt_des(key, data)
    }

    fn decrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        decrypt_des(key, data)
    }

    fn encrypt_message_with_confounder(
        &self,
        key: &[u8],
        key_usage: i32,
        payload: &[u8],
        confounder: &[u8],
    ) -> KerberosCryptoResult<Vec<u8>> {
        encrypt_message(key, key_usage, payload, confounder)
    }

    fn decrypt_message(&self, key: &[u8], key_usage: i32, cipher_data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        decrypt_message(key, key_usage, cipher_data)
    }

    fn checksum(&self, key: &[u8], key_usage: i32, payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        let kc = derive_key(key, &usage_kc(key_usage))?;

        hmac_sha1(&kc, payload, DES3_MAC_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use crate::crypto::{Cipher, KerberosCryptoError};

    use super::Des3CbcSha1Kd;

    #[test]
    fn string_to_key_rejects_params() {
        let cipher = Des3CbcSha1Kd;

        assert_eq!(
            hex::encode(cipher.generate_key_from_password(b"password", b"ATHENA.MIT.EDUraeburn").unwrap()),
            "850bb51358548cd05e86768c313e3bfef7511937dcf72c3e"
        );
        assert!(matches!(
            cipher.string_to_key(b"password", b"ATHENA.MIT.EDUraeburn", "00001000"),
            Err(KerberosCryptoError::StringToKeyParams(_))
        ));
    }

    #[test]
    fn checksum() {
        let key = hex::decode("850bb51358548cd05e86768c313e3bfef7511937dcf72c3e").unwrap();

        let checksum = Des3CbcSha1Kd.checksum(&key, 3, b"kerberos is fun!!").unwrap();

        assert_eq!(hex::encode(checksum), "ecacd493051ca116e5192eba432cc515c55a5dfb");
    }

    #[test]
    fn encrypt_decrypt() {
        let key = Des3CbcSha1Kd.generate_key_from_password(b"test", b"EXAMPLEp1").unwrap();
        let plaintext = b"des3_cbc_sha1_kd";

        let cipher_data = Des3CbcSha1Kd.encrypt_message(&key, 5, plaintext).unwrap();
        assert_eq!(cipher_data.len(), 8 + 16 + 20);

        assert_eq!(Des3CbcSha1Kd.decrypt_message(&key, 5, &cipher_data).unwrap(), plaintext);
    }
}
