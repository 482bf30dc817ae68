use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use des::TdesEde3;
use subtle::ConstantTimeEq;

use crate::crypto::common::{hmac_sha1, usage_ke, usage_ki};
use crate::crypto::{KerberosCryptoError, KerberosCryptoResult};

use super::key_derivation::derive_key;
use super::{DES3_BLOCK_SIZE, DES3_KEY_SIZE, DES3_MAC_SIZE};

type DesCbcCipher = cbc::Decryptor<TdesEde3>;

pub fn decrypt_des(key: &[u8], payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != DES3_KEY_SIZE {
        return Err(KerberosCryptoError::KeyLength(key.len(), DES3_KEY_SIZE));
    }

    if payload.len() % DES3_BLOCK_SIZE != 0 {
        return Err(KerberosCryptoError::BlockLength(payload.len(), DES3_BLOCK_SIZE));
    }

    let iv = [0_u8; DES3_BLOCK_SIZE];

    let ct = DesCbcCipher::new_from_slices(key, &iv)
        .map_err(|_| KerberosCryptoError::KeyLength(key.len(), DES3_KEY_SIZE))?;

    ct.decrypt_padded_vec_mut::<NoPadding>(payload)
        .map_err(|err| KerberosCryptoError::CipherUnpad(format!("{:?}", err)))
}

/// Returns the plaintext with the trailing zero padding still attached: the encryption layer does not record
/// the original length.
pub fn decrypt_message(key: &[u8], key_usage: i32, cipher_data: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    if cipher_data.len() < DES3_BLOCK_SIZE + DES3_MAC_SIZE {
        return Err(KerberosCryptoError::CipherLength(
            cipher_data.len(),
            DES3_BLOCK_SIZE + DES3_MAC_SIZE,
        ));
    }

    let (cipher_data, checksum) = cipher_data.split_at(cipher_data.len() - DES3_MAC_SIZE);

    let ke = derive_key(key, &usage_ke(key_usage))?;
    let plaintext = decrypt_des(&ke, cipher_data)?;

    let ki = derive_key(key, &usage_ki(key_usage))?;
    let calculated_checksum = hmac_sha1(&ki, &plaintext, DES3_MAC_SIZE)?;

    if !bool::from(calculated_checksum.ct_eq(checksum)) {
        return Err(KerberosCryptoError::IntegrityCheck);
    }

    // [0..DES3_BLOCK_SIZE] = the first block is a random confounder bytes
    Ok(plaintext[DES3_BLOCK_SIZE..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::decrypt_message;
    use crate::crypto::KerberosCryptoError;

    const KEY: &str = "850bb51358548cd05e86768c313e3bfef7511937dcf72c3e";
    const CIPHER_DATA: &str =
        "768eb896e048bb973e8fc83e3498a0a91f27fd07a027309b7d3ff8fef5ac8136ae474fde00c330f6b75b0c2af9cbec98b6248013";

    #[test]
    fn keeps_block_padding() {
        let key = hex::decode(KEY).unwrap();
        let cipher_data = hex::decode(CIPHER_DATA).unwrap();

        let plaintext = decrypt_message(&key, 3, &cipher_data).unwrap();

        assert_eq!(&plaintext[..17], b"kerberos is fun!!");
        assert_eq!(&plaintext[17..], &[0; 7]);
    }

    #[test]
    fn wrong_usage_fails_integrity() {
        let key = hex::decode(KEY).unwrap();
        let cipher_data = hex::decode(CIPHER_DATA).unwrap();

        assert_eq!(
            decrypt_message(&key, 4, &cipher_data),
            Err(KerberosCryptoError::IntegrityCheck)
        );
    }

    #[test]
    fn too_short() {
        let key = hex::decode(KEY).unwrap();

        assert_eq!(
            decrypt_message(&key, 3, &[0; 27]),
            Err(KerberosCryptoError::CipherLength(27, 28))
        );
        // unaligned ciphertext body
        assert_eq!(
            decrypt_message(&key, 3, &[0; 29]),
            Err(KerberosCryptoError::BlockLength(9, 8))
        );
    }
}
