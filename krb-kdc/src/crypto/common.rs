use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384};

use super::nfold::n_fold;
use super::{KerberosCryptoError, KerberosCryptoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
}

impl HashAlgorithm {
    pub fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
        }
    }

    pub fn hmac(self, key: &[u8], payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
        match self {
            HashAlgorithm::Sha1 => hmac::<Hmac<Sha1>>(key, payload),
            HashAlgorithm::Sha256 => hmac::<Hmac<Sha256>>(key, payload),
            HashAlgorithm::Sha384 => hmac::<Hmac<Sha384>>(key, payload),
        }
    }

    pub fn pbkdf2(self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        match self {
            HashAlgorithm::Sha1 => pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iterations, out),
            HashAlgorithm::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out),
            HashAlgorithm::Sha384 => pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, iterations, out),
        }
    }
}

fn hmac<M: Mac + hmac::digest::KeyInit>(key: &[u8], payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    let mut hmacker = <M as Mac>::new_from_slice(key).map_err(|_| KerberosCryptoError::HmacKey)?;

    hmacker.update(payload);

    Ok(hmacker.finalize().into_bytes().to_vec())
}

pub fn hmac_sha1(key: &[u8], payload: &[u8], mac_size: usize) -> KerberosCryptoResult<Vec<u8>> {
    let mut hmac = HashAlgorithm::Sha1.hmac(key, payload)?;
    hmac.truncate(mac_size);

    Ok(hmac)
}

fn usage_constant(key_usage: i32, suffix: u8) -> [u8; 5] {
    let mut constant = [0; 5];
    constant[0..4].copy_from_slice(&key_usage.to_be_bytes());
    constant[4] = suffix;

    constant
}

/// Usage constant for the encryption key
pub fn usage_ke(key_usage: i32) -> [u8; 5] {
    usage_constant(key_usage, 0xaa)
}

/// Usage constant for the integrity key
pub fn usage_ki(key_usage: i32) -> [u8; 5] {
    usage_constant(key_usage, 0x55)
}

/// Usage constant for the checksum key
pub fn usage_kc(key_usage: i32) -> [u8; 5] {
    usage_constant(key_usage, 0x99)
}

/// [DR(Key, Constant)](https://www.rfc-editor.org/rfc/rfc3961#section-5.1)
///
/// `encrypt` is the raw block cipher of the encryption type (zero initial state). The well-known constant is
/// n-folded to one block and encrypted repeatedly until `seed_len` bytes are produced.
pub fn derive_random<F>(well_known: &[u8], block_size: usize, seed_len: usize, mut encrypt: F) -> KerberosCryptoResult<Vec<u8>>
where
    F: FnMut(&[u8]) -> KerberosCryptoResult<Vec<u8>>,
{
    let mut block = n_fold(well_known, block_size);

    let mut out = Vec::with_capacity(seed_len + block_size);
    while out.len() < seed_len {
        block = encrypt(&block)?;
        out.extend_from_slice(&block);
    }
    out.truncate(seed_len);

    Ok(out)
}

/// Parses the 4-byte big-endian iteration count carried as 8 hex digits.
pub fn parse_iteration_count(params: &str) -> KerberosCryptoResult<u32> {
    if params.len() != 8 {
        return Err(KerberosCryptoError::StringToKeyParams(format!(
            "expected 8 hex digits, got {:?}",
            params
        )));
    }

    u32::from_str_radix(params, 16)
        .map_err(|err| KerberosCryptoError::StringToKeyParams(format!("{:?}: {}", params, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_constants() {
        assert_eq!(usage_ke(2), [0, 0, 0, 2, 0xaa]);
        assert_eq!(usage_ki(2), [0, 0, 0, 2, 0x55]);
        assert_eq!(usage_kc(0x0102), [0, 0, 1, 2, 0x99]);
    }

    #[test]
    fn iteration_count_params() {
        assert_eq!(parse_iteration_count("00001000").unwrap(), 4096);
        assert_eq!(parse_iteration_count("00008000").unwrap(), 32768);
        assert!(parse_iteration_count("1000").is_err());
        assert!(parse_iteration_count("0000100g").is_err());
        assert!(parse_iteration_count("").is_err());
    }

    #[test]
    fn truncated_hmac_sha1() {
        // RFC 2202 test case 2
        let mac = hmac_sha1(b"Jefe", b"what do ya want for nothing?", 12).unwrap();

        assert_eq!(hex::encode(mac), "effcdf6ae5eb2fa2d27416d5");
    }
}
