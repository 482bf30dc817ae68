//! [RFC 3961](https://www.rfc-editor.org/rfc/rfc3961) encryption and checksum framework.
//!
//! Every supported encryption type is a [CipherSuite] variant keyed by its IANA number. All variants share
//! the [Cipher] contract; [CipherSuite] itself implements it by matching on the variant, so callers never
//! need a trait object.

pub mod aes;
pub mod common;
pub mod des;
pub mod nfold;

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::constants::{cksum_types, etypes};

pub use aes::{Aes128CtsHmacSha196, Aes128CtsHmacSha256128, Aes256CtsHmacSha196, Aes256CtsHmacSha384192};
pub use common::HashAlgorithm;
pub use des::Des3CbcSha1Kd;

/// https://www.rfc-editor.org/rfc/rfc3962.html#section-4
/// the 8-octet ASCII string "kerberos"
pub const KERBEROS: &[u8; 8] = b"kerberos";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KerberosCryptoError {
    #[error("Invalid key length: {0}. Expected: {1}")]
    KeyLength(usize, usize),
    #[error("Invalid seed length: {0}. Expected: {1}")]
    SeedLength(usize, usize),
    #[error("Invalid cipher length: {0}. Expected at least: {1}")]
    CipherLength(usize, usize),
    #[error("Invalid confounder length: {0}. Expected: {1}")]
    ConfounderLength(usize, usize),
    #[error("Data length {0} is not a multiple of the block size {1}")]
    BlockLength(usize, usize),
    #[error("Invalid string-to-key parameters: {0}")]
    StringToKeyParams(String),
    #[error("Unsupported encryption type: {0}")]
    AlgorithmIdentifier(i32),
    #[error("Unsupported checksum type: {0}")]
    ChecksumIdentifier(i32),
    #[error("Bad integrity: calculated hmac is different than provided")]
    IntegrityCheck,
    #[error("Invalid hmac key")]
    HmacKey,
    #[error("Unpadding error: {0}")]
    CipherUnpad(String),
}

pub type KerberosCryptoResult<T> = Result<T, KerberosCryptoError>;

/// Static parameters of an encryption type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionTypeDescriptor {
    /// Protocol key length in bytes
    pub key_size: usize,
    /// Length in bytes of the input accepted by `random-to-key`
    pub seed_size: usize,
    /// Cipher block size in bytes
    pub block_size: usize,
    pub confounder_size: usize,
    /// Length in bytes of the integrity tag appended to ciphertexts and of checksums
    pub mac_size: usize,
    pub hash: HashAlgorithm,
    pub checksum: ChecksumSuite,
    pub default_string_to_key_params: &'static str,
}

/// Capability contract shared by every encryption type.
///
/// Key usages are passed as the raw RFC 4120 usage numbers for the message level operations and as well-known
/// constants (such as [KERBEROS]) for the key derivation primitives.
pub trait Cipher {
    fn descriptor(&self) -> &'static EncryptionTypeDescriptor;

    fn cipher_type(&self) -> CipherSuite;

    fn key_size(&self) -> usize {
        self.descriptor().key_size
    }

    fn seed_bit_len(&self) -> usize {
        self.descriptor().seed_size * 8
    }

    fn block_size(&self) -> usize {
        self.descriptor().block_size
    }

    fn confounder_byte_size(&self) -> usize {
        self.descriptor().confounder_size
    }

    fn checksum_type(&self) -> ChecksumSuite {
        self.descriptor().checksum
    }

    fn default_string_to_key_params(&self) -> &'static str {
        self.descriptor().default_string_to_key_params
    }

    fn random_to_key(&self, seed: &[u8]) -> KerberosCryptoResult<Vec<u8>>;

    fn derive_random(&self, key: &[u8], usage: &[u8]) -> KerberosCryptoResult<Vec<u8>>;

    fn derive_key(&self, key: &[u8], usage: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        self.random_to_key(&self.derive_random(key, usage)?)
    }

    fn string_to_key(&self, password: &[u8], salt: &[u8], params: &str) -> KerberosCryptoResult<Vec<u8>>;

    fn generate_key_from_password(&self, password: &[u8], salt: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        self.string_to_key(password, salt, self.default_string_to_key_params())
    }

    /// Raw block encryption with an all-zero initial cipher state.
    fn encrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>>;

    fn decrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>>;

    fn encrypt_message_with_confounder(
        &self,
        key: &[u8],
        key_usage: i32,
        payload: &[u8],
        confounder: &[u8],
    ) -> KerberosCryptoResult<Vec<u8>>;

    fn encrypt_message(&self, key: &[u8], key_usage: i32, payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        let mut confounder = vec![0; self.confounder_byte_size()];
        OsRng.fill_bytes(&mut confounder);

        self.encrypt_message_with_confounder(key, key_usage, payload, &confounder)
    }

    fn decrypt_message(&self, key: &[u8], key_usage: i32, cipher_data: &[u8]) -> KerberosCryptoResult<Vec<u8>>;

    fn checksum(&self, key: &[u8], key_usage: i32, payload: &[u8]) -> KerberosCryptoResult<Vec<u8>>;

    fn verify_checksum(
        &self,
        key: &[u8],
        key_usage: i32,
        payload: &[u8],
        checksum: &[u8],
    ) -> KerberosCryptoResult<()> {
        let calculated = self.checksum(key, key_usage, payload)?;

        if bool::from(calculated.ct_eq(checksum)) {
            Ok(())
        } else {
            Err(KerberosCryptoError::IntegrityCheck)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum CipherSuite {
    Des3CbcSha1Kd,
    Aes128CtsHmacSha196,
    Aes256CtsHmacSha196,
    Aes128CtsHmacSha256128,
    Aes256CtsHmacSha384192,
}

macro_rules! dispatch {
    ($suite:expr, $cipher:ident => $call:expr) => {
        match $suite {
            CipherSuite::Des3CbcSha1Kd => {
                let $cipher = Des3CbcSha1Kd;
                $call
            }
            CipherSuite::Aes128CtsHmacSha196 => {
                let $cipher = Aes128CtsHmacSha196;
                $call
            }
            CipherSuite::Aes256CtsHmacSha196 => {
                let $cipher = Aes256CtsHmacSha196;
                $call
            }
            CipherSuite::Aes128CtsHmacSha256128 => {
                let $cipher = Aes128CtsHmacSha256128;
                $call
            }
            CipherSuite::Aes256CtsHmacSha384192 => {
                let $cipher = Aes256CtsHmacSha384192;
                $call
            }
        }
    };
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 5] = [
        CipherSuite::Des3CbcSha1Kd,
        CipherSuite::Aes128CtsHmacSha196,
        CipherSuite::Aes256CtsHmacSha196,
        CipherSuite::Aes128CtsHmacSha256128,
        CipherSuite::Aes256CtsHmacSha384192,
    ];

    /// IANA encryption type number
    pub fn etype(self) -> i32 {
        match self {
            CipherSuite::Des3CbcSha1Kd => etypes::DES3_CBC_SHA1_KD,
            CipherSuite::Aes128CtsHmacSha196 => etypes::AES128_CTS_HMAC_SHA1_96,
            CipherSuite::Aes256CtsHmacSha196 => etypes::AES256_CTS_HMAC_SHA1_96,
            CipherSuite::Aes128CtsHmacSha256128 => etypes::AES128_CTS_HMAC_SHA256_128,
            CipherSuite::Aes256CtsHmacSha384192 => etypes::AES256_CTS_HMAC_SHA384_192,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::Des3CbcSha1Kd => "des3-cbc-sha1-kd",
            CipherSuite::Aes128CtsHmacSha196 => "aes128-cts-hmac-sha1-96",
            CipherSuite::Aes256CtsHmacSha196 => "aes256-cts-hmac-sha1-96",
            CipherSuite::Aes128CtsHmacSha256128 => "aes128-cts-hmac-sha256-128",
            CipherSuite::Aes256CtsHmacSha384192 => "aes256-cts-hmac-sha384-192",
        }
    }
}

impl Cipher for CipherSuite {
    fn descriptor(&self) -> &'static EncryptionTypeDescriptor {
        dispatch!(self, cipher => cipher.descriptor())
    }

    fn cipher_type(&self) -> CipherSuite {
        *self
    }

    fn random_to_key(&self, seed: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.random_to_key(seed))
    }

    fn derive_random(&self, key: &[u8], usage: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.derive_random(key, usage))
    }

    fn derive_key(&self, key: &[u8], usage: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.derive_key(key, usage))
    }

    fn string_to_key(&self, password: &[u8], salt: &[u8], params: &str) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.string_to_key(password, salt, params))
    }

    fn encrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.encrypt_data(key, data))
    }

    fn decrypt_data(&self, key: &[u8], data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.decrypt_data(key, data))
    }

    fn encrypt_message_with_confounder(
        &self,
        key: &[u8],
        key_usage: i32,
        payload: &[u8],
        confounder: &[u8],
    ) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.encrypt_message_with_confounder(key, key_usage, payload, confounder))
    }

    fn decrypt_message(&self, key: &[u8], key_usage: i32, cipher_data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.decrypt_message(key, key_usage, cipher_data))
    }

    fn checksum(&self, key: &[u8], key_usage: i32, payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        dispatch!(self, cipher => cipher.checksum(key, key_usage, payload))
    }
}

impl TryFrom<i32> for CipherSuite {
    type Error = KerberosCryptoError;

    fn try_from(etype: i32) -> Result<Self, Self::Error> {
        CipherSuite::ALL
            .into_iter()
            .find(|suite| suite.etype() == etype)
            .ok_or(KerberosCryptoError::AlgorithmIdentifier(etype))
    }
}

impl From<CipherSuite> for i32 {
    fn from(suite: CipherSuite) -> Self {
        suite.etype()
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumSuite {
    HmacSha1Des3Kd,
    HmacSha196Aes128,
    HmacSha196Aes256,
    HmacSha256128Aes128,
    HmacSha384192Aes256,
}

impl ChecksumSuite {
    pub const ALL: [ChecksumSuite; 5] = [
        ChecksumSuite::HmacSha1Des3Kd,
        ChecksumSuite::HmacSha196Aes128,
        ChecksumSuite::HmacSha196Aes256,
        ChecksumSuite::HmacSha256128Aes128,
        ChecksumSuite::HmacSha384192Aes256,
    ];

    pub fn cksumtype(self) -> i32 {
        match self {
            ChecksumSuite::HmacSha1Des3Kd => cksum_types::HMAC_SHA1_DES3_KD,
            ChecksumSuite::HmacSha196Aes128 => cksum_types::HMAC_SHA1_96_AES128,
            ChecksumSuite::HmacSha196Aes256 => cksum_types::HMAC_SHA1_96_AES256,
            ChecksumSuite::HmacSha256128Aes128 => cksum_types::HMAC_SHA256_128_AES128,
            ChecksumSuite::HmacSha384192Aes256 => cksum_types::HMAC_SHA384_192_AES256,
        }
    }

    /// Keyed checksums are computed with the encryption type that owns them.
    pub fn cipher(self) -> CipherSuite {
        match self {
            ChecksumSuite::HmacSha1Des3Kd => CipherSuite::Des3CbcSha1Kd,
            ChecksumSuite::HmacSha196Aes128 => CipherSuite::Aes128CtsHmacSha196,
            ChecksumSuite::HmacSha196Aes256 => CipherSuite::Aes256CtsHmacSha196,
            ChecksumSuite::HmacSha256128Aes128 => CipherSuite::Aes128CtsHmacSha256128,
            ChecksumSuite::HmacSha384192Aes256 => CipherSuite::Aes256CtsHmacSha384192,
        }
    }
}

impl TryFrom<i32> for ChecksumSuite {
    type Error = KerberosCryptoError;

    fn try_from(cksumtype: i32) -> Result<Self, Self::Error> {
        ChecksumSuite::ALL
            .into_iter()
            .find(|suite| suite.cksumtype() == cksumtype)
            .ok_or(KerberosCryptoError::ChecksumIdentifier(cksumtype))
    }
}

/// A protocol key bound to the encryption type it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct ProtocolKey {
    cipher: CipherSuite,
    key: Vec<u8>,
}

impl ProtocolKey {
    pub fn new(cipher: CipherSuite, key: Vec<u8>) -> KerberosCryptoResult<Self> {
        if key.len() != cipher.key_size() {
            return Err(KerberosCryptoError::KeyLength(key.len(), cipher.key_size()));
        }

        Ok(Self { cipher, key })
    }

    pub fn from_password(cipher: CipherSuite, password: &[u8], salt: &[u8]) -> KerberosCryptoResult<Self> {
        let key = cipher.generate_key_from_password(password, salt)?;

        Ok(Self { cipher, key })
    }

    pub fn cipher(&self) -> CipherSuite {
        self.cipher
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn encrypt(&self, key_usage: i32, payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        self.cipher.encrypt_message(&self.key, key_usage, payload)
    }

    pub fn decrypt(&self, key_usage: i32, cipher_data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        self.cipher.decrypt_message(&self.key, key_usage, cipher_data)
    }
}

// key bytes stay out of logs
impl fmt::Debug for ProtocolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolKey")
            .field("cipher", &self.cipher)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {

    use rstest::rstest;

    use super::{Cipher, ChecksumSuite, CipherSuite, KerberosCryptoError, ProtocolKey};

    #[test]
    fn cipher_suite_from_iana_number() {
        assert_eq!(CipherSuite::try_from(16), Ok(CipherSuite::Des3CbcSha1Kd));
        assert_eq!(CipherSuite::try_from(17), Ok(CipherSuite::Aes128CtsHmacSha196));
        assert_eq!(CipherSuite::try_from(18), Ok(CipherSuite::Aes256CtsHmacSha196));
        assert_eq!(CipherSuite::try_from(19), Ok(CipherSuite::Aes128CtsHmacSha256128));
        assert_eq!(CipherSuite::try_from(20), Ok(CipherSuite::Aes256CtsHmacSha384192));
        assert_eq!(CipherSuite::try_from(23), Err(KerberosCryptoError::AlgorithmIdentifier(23)));
    }

    #[test]
    fn checksum_suite_belongs_to_its_cipher() {
        for suite in CipherSuite::ALL {
            let checksum = suite.checksum_type();
            assert_eq!(checksum.cipher(), suite);
            assert_eq!(ChecksumSuite::try_from(checksum.cksumtype()), Ok(checksum));
        }
    }

    #[rstest]
    #[case(CipherSuite::Des3CbcSha1Kd)]
    #[case(CipherSuite::Aes128CtsHmacSha196)]
    #[case(CipherSuite::Aes256CtsHmacSha196)]
    #[case(CipherSuite::Aes128CtsHmacSha256128)]
    #[case(CipherSuite::Aes256CtsHmacSha384192)]
    fn usages_derive_distinct_keys(#[case] suite: CipherSuite) {
        let key = suite.generate_key_from_password(b"password", b"EXAMPLE.COMuser").unwrap();

        let first = suite.derive_key(&key, &[0, 0, 0, 1, 0xaa]).unwrap();
        let second = suite.derive_key(&key, &[0, 0, 0, 2, 0xaa]).unwrap();

        assert_eq!(first.len(), suite.key_size());
        assert_ne!(first, second);
        assert_ne!(suite.derive_key(&first, &[0, 0, 0, 1, 0xaa]).unwrap(), second);
    }

    #[rstest]
    #[case(CipherSuite::Des3CbcSha1Kd)]
    #[case(CipherSuite::Aes128CtsHmacSha196)]
    #[case(CipherSuite::Aes256CtsHmacSha196)]
    #[case(CipherSuite::Aes128CtsHmacSha256128)]
    #[case(CipherSuite::Aes256CtsHmacSha384192)]
    fn random_to_key_only_accepts_seed_length(#[case] suite: CipherSuite) {
        let seed_len = suite.seed_bit_len() / 8;

        assert_eq!(suite.random_to_key(&vec![0x42; seed_len]).unwrap().len(), suite.key_size());
        assert_eq!(
            suite.random_to_key(&vec![0x42; seed_len + 1]),
            Err(KerberosCryptoError::SeedLength(seed_len + 1, seed_len))
        );
        assert_eq!(
            suite.random_to_key(&[0x42]),
            Err(KerberosCryptoError::SeedLength(1, seed_len))
        );
    }

    #[rstest]
    #[case(CipherSuite::Des3CbcSha1Kd)]
    #[case(CipherSuite::Aes128CtsHmacSha196)]
    #[case(CipherSuite::Aes256CtsHmacSha196)]
    #[case(CipherSuite::Aes128CtsHmacSha256128)]
    #[case(CipherSuite::Aes256CtsHmacSha384192)]
    fn message_encryption_roundtrip(#[case] suite: CipherSuite) {
        let key = ProtocolKey::from_password(suite, b"password", b"EXAMPLE.COMuser").unwrap();

        for len in [0, 1, 15, 16, 17, 31, 32, 33, 100] {
            let payload = vec![0x5a; len];
            let cipher_data = key.encrypt(3, &payload).unwrap();

            assert_eq!(key.decrypt(3, &cipher_data).unwrap()[..len], payload[..]);
            assert!(key.decrypt(4, &cipher_data).is_err());
        }
    }

    #[rstest]
    #[case(CipherSuite::Des3CbcSha1Kd)]
    #[case(CipherSuite::Aes128CtsHmacSha196)]
    #[case(CipherSuite::Aes256CtsHmacSha384192)]
    fn tampered_cipher_data_is_rejected(#[case] suite: CipherSuite) {
        let key = ProtocolKey::from_password(suite, b"password", b"EXAMPLE.COMuser").unwrap();
        let mut cipher_data = key.encrypt(3, b"some ticket part").unwrap();
        cipher_data[2] ^= 0x01;

        assert_eq!(key.decrypt(3, &cipher_data), Err(KerberosCryptoError::IntegrityCheck));
    }

    #[test]
    fn checksum_verification() {
        for suite in CipherSuite::ALL {
            let key = suite.generate_key_from_password(b"password", b"EXAMPLE.COMuser").unwrap();
            let checksum = suite.checksum(&key, 6, b"req-body").unwrap();

            assert_eq!(checksum.len(), suite.descriptor().mac_size);
            suite.verify_checksum(&key, 6, b"req-body", &checksum).unwrap();
            assert_eq!(
                suite.verify_checksum(&key, 7, b"req-body", &checksum),
                Err(KerberosCryptoError::IntegrityCheck)
            );
        }
    }

    #[rstest]
    #[case(CipherSuite::Des3CbcSha1Kd)]
    #[case(CipherSuite::Aes128CtsHmacSha196)]
    #[case(CipherSuite::Aes256CtsHmacSha384192)]
    fn altered_or_truncated_checksum_is_rejected(#[case] suite: CipherSuite) {
        let key = suite.generate_key_from_password(b"password", b"EXAMPLE.COMuser").unwrap();
        let checksum = suite.checksum(&key, 6, b"req-body").unwrap();

        let mut altered = checksum.clone();
        *altered.last_mut().unwrap() ^= 0x80;

        for bad in [&altered[..], &checksum[..checksum.len() - 1], &[][..]] {
            assert_eq!(
                suite.verify_checksum(&key, 6, b"req-body", bad),
                Err(KerberosCryptoError::IntegrityCheck)
            );
        }
    }

    #[rstest]
    #[case(CipherSuite::Des3CbcSha1Kd)]
    #[case(CipherSuite::Aes256CtsHmacSha196)]
    #[case(CipherSuite::Aes128CtsHmacSha256128)]
    fn altered_message_mac_is_rejected(#[case] suite: CipherSuite) {
        let key = ProtocolKey::from_password(suite, b"password", b"EXAMPLE.COMuser").unwrap();
        let mut cipher_data = key.encrypt(3, b"some ticket part").unwrap();
        *cipher_data.last_mut().unwrap() ^= 0x01;

        assert_eq!(key.decrypt(3, &cipher_data), Err(KerberosCryptoError::IntegrityCheck));
    }

    #[test]
    fn protocol_key_checks_length() {
        assert_eq!(
            ProtocolKey::new(CipherSuite::Aes256CtsHmacSha196, vec![0; 16]),
            Err(KerberosCryptoError::KeyLength(16, 32))
        );
    }
}
