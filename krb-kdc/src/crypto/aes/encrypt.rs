use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};

use crate::crypto::common::{hmac_sha1, usage_ke, usage_ki};
use crate::crypto::{KerberosCryptoError, KerberosCryptoResult};

use super::key_derivation::{derive_key, kdf_hmac_sha2};
use super::{swap_two_last_blocks, AesSize, AES_BLOCK_SIZE, AES_MAC_SIZE};

type Aes128CbcEncryptor = cbc::Encryptor<Aes128>;
type Aes256CbcEncryptor = cbc::Encryptor<Aes256>;

/// Raw AES-CBC with an all-zero IV. `plaintext` must be block aligned.
pub fn encrypt_aes(key: &[u8], plaintext: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != aes_size.key_length() {
        return Err(KerberosCryptoError::KeyLength(key.len(), aes_size.key_length()));
    }

    if plaintext.len() % AES_BLOCK_SIZE != 0 {
        return Err(KerberosCryptoError::BlockLength(plaintext.len(), AES_BLOCK_SIZE));
    }

    let iv = [0_u8; AES_BLOCK_SIZE];
    let key_length_error = |_| KerberosCryptoError::KeyLength(key.len(), aes_size.key_length());

    Ok(match aes_size {
        AesSize::Aes128 => Aes128CbcEncryptor::new_from_slices(key, &iv)
            .map_err(key_length_error)?
            .encrypt_padded_vec_mut::<NoPadding>(plaintext),
        AesSize::Aes256 => Aes256CbcEncryptor::new_from_slices(key, &iv)
            .map_err(key_length_error)?
            .encrypt_padded_vec_mut::<NoPadding>(plaintext),
    })
}

/// CBC with ciphertext stealing: the last two blocks are swapped and the output keeps the payload length.
pub fn encrypt_aes_cts(key: &[u8], payload: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    if payload.len() < AES_BLOCK_SIZE {
        return Err(KerberosCryptoError::CipherLength(payload.len(), AES_BLOCK_SIZE));
    }

    let pad_length = (AES_BLOCK_SIZE - (payload.len() % AES_BLOCK_SIZE)) % AES_BLOCK_SIZE;

    let mut padded_payload = payload.to_vec();
    padded_payload.resize(payload.len() + pad_length, 0);

    let mut ciphertext = encrypt_aes(key, &padded_payload, aes_size)?;

    if ciphertext.len() == AES_BLOCK_SIZE {
        return Ok(ciphertext);
    }

    swap_two_last_blocks(&mut ciphertext);
    ciphertext.truncate(payload.len());

    Ok(ciphertext)
}

fn with_confounder(confounder: &[u8], payload: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    if confounder.len() != AES_BLOCK_SIZE {
        return Err(KerberosCryptoError::ConfounderLength(confounder.len(), AES_BLOCK_SIZE));
    }

    let mut data = Vec::with_capacity(confounder.len() + payload.len());
    data.extend_from_slice(confounder);
    data.extend_from_slice(payload);

    Ok(data)
}

/// [RFC 3962](https://www.rfc-editor.org/rfc/rfc3962#section-6):
/// `CTS(Ke, conf | plaintext) | HMAC-SHA1-96(Ki, conf | plaintext)`
pub fn encrypt_message(
    key: &[u8],
    key_usage: i32,
    payload: &[u8],
    confounder: &[u8],
    aes_size: AesSize,
) -> KerberosCryptoResult<Vec<u8>> {
    let data_to_encrypt = with_confounder(confounder, payload)?;

    let ke = derive_key(key, &usage_ke(key_usage), aes_size)?;
    let mut encrypted = encrypt_aes_cts(&ke, &data_to_encrypt, aes_size)?;

    let ki = derive_key(key, &usage_ki(key_usage), aes_size)?;
    let checksum = hmac_sha1(&ki, &data_to_encrypt, AES_MAC_SIZE)?;

    encrypted.extend_from_slice(&checksum);

    Ok(encrypted)
}

/// [RFC 8009](https://www.rfc-editor.org/rfc/rfc8009#section-5):
/// `C = CTS(Ke, conf | plaintext)`, then `C | HMAC(Ki, IV | C)` truncated to the mac size
pub fn encrypt_message_sha2(
    key: &[u8],
    key_usage: i32,
    payload: &[u8],
    confounder: &[u8],
    aes_size: AesSize,
) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != aes_size.key_length() {
        return Err(KerberosCryptoError::KeyLength(key.len(), aes_size.key_length()));
    }

    let data_to_encrypt = with_confounder(confounder, payload)?;

    let ke = kdf_hmac_sha2(key, &usage_ke(key_usage), aes_size.seed_bit_len(), aes_size.sha2_hash())?;
    let mut encrypted = encrypt_aes_cts(&ke, &data_to_encrypt, aes_size)?;

    let ki = kdf_hmac_sha2(key, &usage_ki(key_usage), aes_size.sha2_mac_size() * 8, aes_size.sha2_hash())?;
    let checksum = sha2_integrity(&ki, &encrypted, aes_size)?;

    encrypted.extend_from_slice(&checksum);

    Ok(encrypted)
}

pub(super) fn sha2_integrity(ki: &[u8], cipher_data: &[u8], aes_size: AesSize) -> KerberosCryptoResult<Vec<u8>> {
    // the cipher state is all zeros for a fresh message
    let mut mac_input = vec![0; AES_BLOCK_SIZE];
    mac_input.extend_from_slice(cipher_data);

    let mut mac = aes_size.sha2_hash().hmac(ki, &mac_input)?;
    mac.truncate(aes_size.sha2_mac_size());

    Ok(mac)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{encrypt_aes, encrypt_aes_cts, encrypt_message, encrypt_message_sha2};
    use crate::crypto::aes::AesSize;
    use crate::crypto::KerberosCryptoError;

    // https://www.rfc-editor.org/rfc/rfc3962#appendix-B
    const CTS_KEY: &str = "636869636b656e207465726979616b69";
    const CTS_INPUT: &[u8] = b"I would like the General Gau's Chicken, please, and wonton soup.";

    #[test]
    fn rfc3962_cts_vectors() {
        let key = hex::decode(CTS_KEY).unwrap();

        let cases: [(usize, &str); 6] = [
            (17, "c6353568f2bf8cb4d8a580362da7ff7f97"),
            (31, "fc00783e0efdb2c1d445d4c8eff7ed2297687268d6ecccc0c07b25e25ecfe5"),
            (32, "39312523a78662d5be7fcbcc98ebf5a897687268d6ecccc0c07b25e25ecfe584"),
            (
                47,
                "97687268d6ecccc0c07b25e25ecfe584b3fffd940c16a18c1b5549d2f838029e39312523a78662d5be7fcbcc98ebf5",
            ),
            (
                48,
                "97687268d6ecccc0c07b25e25ecfe5849dad8bbb96c4cdc03bc103e1a194bbd839312523a78662d5be7fcbcc98ebf5a8",
            ),
            (
                64,
                "97687268d6ecccc0c07b25e25ecfe58439312523a78662d5be7fcbcc98ebf5a84807efe836ee89a526730dbc2f7bc8409dad8bbb96c4cdc03bc103e1a194bbd8",
            ),
        ];

        for (len, expected) in cases {
            assert_eq!(
                hex::encode(encrypt_aes_cts(&key, &CTS_INPUT[..len], AesSize::Aes128).unwrap()),
                expected
            );
        }
    }

    #[test]
    fn cts_rejects_short_input() {
        let key = hex::decode(CTS_KEY).unwrap();

        assert_eq!(
            encrypt_aes_cts(&key, b"short", AesSize::Aes128),
            Err(KerberosCryptoError::CipherLength(5, 16))
        );
    }

    #[test]
    fn raw_cbc_checks_key_size() {
        assert_eq!(
            encrypt_aes(&[0; 16], &[0; 16], AesSize::Aes256),
            Err(KerberosCryptoError::KeyLength(16, 32))
        );
    }

    #[test]
    fn aes128_sha1_message() {
        let key = hex::decode("fca822951813fb252154c883f5ee1cf4").unwrap();
        let confounder: Vec<u8> = (0..16).collect();

        let cipher_data = encrypt_message(&key, 3, b"kerberos is fun!!", &confounder, AesSize::Aes128).unwrap();

        assert_eq!(
            hex::encode(cipher_data),
            "079234d835036fb0c234256c114e0b0db6771f6de61392d5ee6f4fb59f7de41b3b9ed3593e111dd5331177af67"
        );
    }

    #[test]
    fn aes256_sha1_message() {
        let key = hex::decode("01b897121d933ab44b47eb5494db15e50eb74530dbdae9b634d65020ff5d88c1").unwrap();
        let confounder: Vec<u8> = (0..16).collect();

        let cipher_data = encrypt_message(&key, 3, b"kerberos is fun!!", &confounder, AesSize::Aes256).unwrap();

        assert_eq!(
            hex::encode(cipher_data),
            "4566c87687e7073651ef1a53e08d1032cddae980b1d133caf57c577d9e23286998bd82cb10578a7ed44b309568"
        );
    }

    // https://www.rfc-editor.org/rfc/rfc8009#appendix-A
    #[test]
    fn rfc8009_aes128_encryption() {
        let key = hex::decode("3705d96080c17728a0e800eab6e0d23c").unwrap();

        let empty = encrypt_message_sha2(
            &key,
            2,
            &[],
            &hex::decode("7e5895eaf2672435bad817f545a37148").unwrap(),
            AesSize::Aes128,
        )
        .unwrap();
        assert_eq!(
            hex::encode(empty),
            "ef85fb890bb8472f4dab20394dca781dad877eda39d50c870c0d5a0a8e48c718"
        );

        let plaintext: Vec<u8> = (0..21).collect();
        let cipher_data = encrypt_message_sha2(
            &key,
            2,
            &plaintext,
            &hex::decode("a7a4e29a4728ce10664fb64e49ad3fac").unwrap(),
            AesSize::Aes128,
        )
        .unwrap();
        assert_eq!(
            hex::encode(cipher_data),
            "720f73b18d9859cd6ccb4346115cd336c70f58edc0c4437c5573544c31c813bce1e6d072c186b39a413c2f92ca9b8334a287ffcbfc"
        );
    }

    #[test]
    fn rfc8009_aes256_encryption() {
        let key = hex::decode("6d404d37faf79f9df0d33568d320669800eb4836472ea8a026d16b7182460c52").unwrap();

        let empty = encrypt_message_sha2(
            &key,
            2,
            &[],
            &hex::decode("f764e9fa15c276478b2c7d0c4e5f58e4").unwrap(),
            AesSize::Aes256,
        )
        .unwrap();

        assert_eq!(
            hex::encode(empty),
            "41f53fa5bfe7026d91faf9be959195a058707273a96a40f0a01960621ac612748b9bbfbe7eb4ce3c"
        );
    }
}
