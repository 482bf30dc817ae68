use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use des::TdesEde3;

use crate::crypto::common::{hmac_sha1, usage_ke, usage_ki};
use crate::crypto::{KerberosCryptoError, KerberosCryptoResult};

use super::key_derivation::derive_key;
use super::{DES3_BLOCK_SIZE, DES3_KEY_SIZE, DES3_MAC_SIZE};

type DesCbcCipher = cbc::Encryptor<TdesEde3>;

/// Raw triple-DES CBC encryption. `payload` must be block aligned.
pub fn encrypt_des(key: &[u8], payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != DES3_KEY_SIZE {
        return Err(KerberosCryptoError::KeyLength(key.len(), DES3_KEY_SIZE));
    }

    if payload.len() % DES3_BLOCK_SIZE != 0 {
        return Err(KerberosCryptoError::BlockLength(payload.len(), DES3_BLOCK_SIZE));
    }

    // RFC 3961: initial cipher state      All bits zero
    let iv = [0_u8; DES3_BLOCK_SIZE];

    let ct = DesCbcCipher::new_from_slices(key, &iv)
        .map_err(|_| KerberosCryptoError::KeyLength(key.len(), DES3_KEY_SIZE))?;

    Ok(ct.encrypt_padded_vec_mut::<NoPadding>(payload))
}

/// `E(Ke, conf | plaintext | pad) | HMAC-SHA1(Ki, conf | plaintext | pad)`
pub fn encrypt_message(
    key: &[u8],
    key_usage: i32,
    payload: &[u8],
    confounder: &[u8],
) -> KerberosCryptoResult<Vec<u8>> {
    if confounder.len() != DES3_BLOCK_SIZE {
        return Err(KerberosCryptoError::ConfounderLength(confounder.len(), DES3_BLOCK_SIZE));
    }

    let mut data_to_encrypt = Vec::with_capacity(DES3_BLOCK_SIZE + payload.len() + DES3_BLOCK_SIZE);
    data_to_encrypt.extend_from_slice(confounder);
    data_to_encrypt.extend_from_slice(payload);

    let pad_length = (DES3_BLOCK_SIZE - data_to_encrypt.len() % DES3_BLOCK_SIZE) % DES3_BLOCK_SIZE;
    data_to_encrypt.resize(data_to_encrypt.len() + pad_length, 0);

    let ke = derive_key(key, &usage_ke(key_usage))?;
    let mut encrypted = encrypt_des(&ke, &data_to_encrypt)?;

    let ki = derive_key(key, &usage_ki(key_usage))?;
    let checksum = hmac_sha1(&ki, &data_to_encrypt, DES3_MAC_SIZE)?;

    encrypted.extend_from_slice(&checksum);

    Ok(encrypted)
}
