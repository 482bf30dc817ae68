use crate::crypto::common::{self, parse_iteration_count, HashAlgorithm};
use crate::crypto::{KerberosCryptoError, KerberosCryptoResult, KERBEROS};

use super::{encrypt_aes, AesSize, AES_BLOCK_SIZE};

pub fn random_to_key(seed: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    // as given
    if seed.len() != aes_size.key_length() {
        return Err(KerberosCryptoError::SeedLength(seed.len(), aes_size.key_length()));
    }

    Ok(seed.to_vec())
}

pub fn derive_random(key: &[u8], well_known: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != aes_size.key_length() {
        return Err(KerberosCryptoError::KeyLength(key.len(), aes_size.key_length()));
    }

    common::derive_random(well_known, AES_BLOCK_SIZE, aes_size.seed_bit_len() / 8, |block| {
        encrypt_aes(key, block, aes_size)
    })
}

pub fn derive_key(key: &[u8], well_known: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    random_to_key(&derive_random(key, well_known, aes_size)?, aes_size)
}

fn iteration_count(params: &str) -> KerberosCryptoResult<u32> {
    match parse_iteration_count(params)? {
        0 => Err(KerberosCryptoError::StringToKeyParams(
            "iteration count must be positive".into(),
        )),
        iterations => Ok(iterations),
    }
}

/// RFC 3962 string-to-key: `DK(PBKDF2-HMAC-SHA1(password, salt, iterations), "kerberos")`
pub fn derive_key_from_password<P: AsRef<[u8]>, S: AsRef<[u8]>>(
    password: P,
    salt: S,
    params: &str,
    aes_size: AesSize,
) -> KerberosCryptoResult<Vec<u8>> {
    let iterations = iteration_count(params)?;

    let mut tmp = vec![0; aes_size.key_length()];
    HashAlgorithm::Sha1.pbkdf2(password.as_ref(), salt.as_ref(), iterations, &mut tmp);

    let temp_key = random_to_key(&tmp, aes_size)?;

    derive_key(&temp_key, KERBEROS, aes_size)
}

/// [KDF-HMAC-SHA2](https://www.rfc-editor.org/rfc/rfc8009#section-3)
///
/// `HMAC(key, 00000001 | label | 00 | k)` truncated to the leftmost `k` bits. One counter round is enough for every
/// output this crate asks for.
pub fn kdf_hmac_sha2(key: &[u8], label: &[u8], k: usize, hash: HashAlgorithm) -> KerberosCryptoResult<Vec<u8>> {
    let mut input = Vec::with_capacity(4 + label.len() + 1 + 4);
    input.extend_from_slice(&1_u32.to_be_bytes());
    input.extend_from_slice(label);
    input.push(0);
    input.extend_from_slice(&(k as u32).to_be_bytes());

    let mut out = hash.hmac(key, &input)?;
    out.truncate(k / 8);

    Ok(out)
}

/// RFC 8009 string-to-key: the salt is prefixed with the enctype name and the PBKDF2 output goes through
/// KDF-HMAC-SHA2 with the "kerberos" label.
pub fn derive_key_from_password_sha2<P: AsRef<[u8]>, S: AsRef<[u8]>>(
    password: P,
    salt: S,
    params: &str,
    aes_size: AesSize,
) -> KerberosCryptoResult<Vec<u8>> {
    let iterations = iteration_count(params)?;

    let enctype_name = aes_size.sha2_enctype_name();
    let mut salt_p = Vec::with_capacity(enctype_name.len() + 1 + salt.as_ref().len());
    salt_p.extend_from_slice(enctype_name);
    salt_p.push(0);
    salt_p.extend_from_slice(salt.as_ref());

    let mut tkey = vec![0; aes_size.key_length()];
    aes_size
        .sha2_hash()
        .pbkdf2(password.as_ref(), &salt_p, iterations, &mut tkey);

    kdf_hmac_sha2(&tkey, KERBEROS, aes_size.seed_bit_len(), aes_size.sha2_hash())
}
