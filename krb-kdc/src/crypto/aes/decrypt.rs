use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use subtle::ConstantTimeEq;

use crate::crypto::common::{hmac_sha1, usage_ke, usage_ki};
use crate::crypto::{KerberosCryptoError, KerberosCryptoResult};

use super::encrypt::sha2_integrity;
use super::key_derivation::{derive_key, kdf_hmac_sha2};
use super::{swap_two_last_blocks, AesSize, AES_BLOCK_SIZE, AES_MAC_SIZE};

type Aes128CbcDecryptor = cbc::Decryptor<Aes128>;
type Aes256CbcDecryptor = cbc::Decryptor<Aes256>;

pub fn decrypt_aes(key: &[u8], cipher_data: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != aes_size.key_length() {
        return Err(KerberosCryptoError::KeyLength(key.len(), aes_size.key_length()));
    }

    if cipher_data.len() % AES_BLOCK_SIZE != 0 {
        return Err(KerberosCryptoError::BlockLength(cipher_data.len(), AES_BLOCK_SIZE));
    }

    let iv = [0_u8; AES_BLOCK_SIZE];
    let key_length_error = |_| KerberosCryptoError::KeyLength(key.len(), aes_size.key_length());

    let plaintext = match aes_size {
        AesSize::Aes128 => Aes128CbcDecryptor::new_from_slices(key, &iv)
            .map_err(key_length_error)?
            .decrypt_padded_vec_mut::<NoPadding>(cipher_data),
        AesSize::Aes256 => Aes256CbcDecryptor::new_from_slices(key, &iv)
            .map_err(key_length_error)?
            .decrypt_padded_vec_mut::<NoPadding>(cipher_data),
    };

    plaintext.map_err(|err| KerberosCryptoError::CipherUnpad(format!("{:?}", err)))
}

pub fn decrypt_aes_cts(key: &[u8], cipher_data: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    if cipher_data.len() < AES_BLOCK_SIZE {
        return Err(KerberosCryptoError::CipherLength(cipher_data.len(), AES_BLOCK_SIZE));
    }

    if cipher_data.len() == AES_BLOCK_SIZE {
        return decrypt_aes(key, cipher_data, aes_size);
    }

    let tail_length = cipher_data.len() % AES_BLOCK_SIZE;
    let mut cipher_data = cipher_data.to_vec();

    if tail_length != 0 {
        // Decrypting the last full block (with IV = 0) yields the stolen bytes of the previous ciphertext block.
        let start = cipher_data.len() - AES_BLOCK_SIZE - tail_length;
        let dn = decrypt_aes(key, &cipher_data[start..start + AES_BLOCK_SIZE], aes_size)?;

        cipher_data.extend_from_slice(&dn[tail_length..]);
    }

    swap_two_last_blocks(&mut cipher_data);

    let mut plaintext = decrypt_aes(key, &cipher_data, aes_size)?;
    plaintext.truncate(plaintext.len() - (AES_BLOCK_SIZE - tail_length) % AES_BLOCK_SIZE);

    Ok(plaintext)
}

pub fn decrypt_message(
    key: &[u8],
    key_usage: i32,
    cipher_data: &[u8],
    aes_size: AesSize,
) -> KerberosCryptoResult<Vec<u8>> {
    if cipher_data.len() < AES_BLOCK_SIZE + AES_MAC_SIZE {
        return Err(KerberosCryptoError::CipherLength(
            cipher_data.len(),
            AES_BLOCK_SIZE + AES_MAC_SIZE,
        ));
    }

    let (cipher_data, checksum) = cipher_data.split_at(cipher_data.len() - AES_MAC_SIZE);

    let ke = derive_key(key, &usage_ke(key_usage), aes_size)?;
    let plaintext = decrypt_aes_cts(&ke, cipher_data, aes_size)?;

    let ki = derive_key(key, &usage_ki(key_usage), aes_size)?;
    let calculated_checksum = hmac_sha1(&ki, &plaintext, AES_MAC_SIZE)?;

    if !bool::from(calculated_checksum.ct_eq(checksum)) {
        return Err(KerberosCryptoError::IntegrityCheck);
    }

    // [0..AES_BLOCK_SIZE] = the first block is a random confounder bytes
    Ok(plaintext[AES_BLOCK_SIZE..].to_vec())
}

pub fn decrypt_message_sha2(
    key: &[u8],
    key_usage: i32,
    cipher_data: &[u8],
    aes_size: AesSize,
) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != aes_size.key_length() {
        return Err(KerberosCryptoError::KeyLength(key.len(), aes_size.key_length()));
    }

    let mac_size = aes_size.sha2_mac_size();
    if cipher_data.len() < AES_BLOCK_SIZE + mac_size {
        return Err(KerberosCryptoError::CipherLength(cipher_data.len(), AES_BLOCK_SIZE + mac_size));
    }

    let (cipher_data, checksum) = cipher_data.split_at(cipher_data.len() - mac_size);

    // the MAC covers the ciphertext so it is checked before decrypting anything
    let ki = kdf_hmac_sha2(key, &usage_ki(key_usage), mac_size * 8, aes_size.sha2_hash())?;
    if !bool::from(sha2_integrity(&ki, cipher_data, aes_size)?.ct_eq(checksum)) {
        return Err(KerberosCryptoError::IntegrityCheck);
    }

    let ke = kdf_hmac_sha2(key, &usage_ke(key_usage), aes_size.seed_bit_len(), aes_size.sha2_hash())?;
    let plaintext = decrypt_aes_cts(&ke, cipher_data, aes_size)?;

    Ok(plaintext[AES_BLOCK_SIZE..].to_vec())
}
