use crate::crypto::common;
use crate::crypto::nfold::n_fold;
use crate::crypto::{KerberosCryptoError, KerberosCryptoResult, KERBEROS};

use super::encrypt::encrypt_des;
use super::{DES3_BLOCK_SIZE, DES3_KEY_SIZE, DES3_SEED_LEN};

const WEAK_KEYS: [[u8; 8]; 4] = [
    [0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01],
    [0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE],
    [0xE0, 0xE0, 0xE0, 0xE0, 0xF1, 0xF1, 0xF1, 0xF1],
    [0x1F, 0x1F, 0x1F, 0x1F, 0x0E, 0x0E, 0x0E, 0x0E],
];

const SEMI_WEAK_KEYS: [[u8; 8]; 12] = [
    [0x01, 0x1F, 0x01, 0x1F, 0x01, 0x0E, 0x01, 0x0E],
    [0x1F, 0x01, 0x1F, 0x01, 0x0E, 0x01, 0x0E, 0x01],
    [0x01, 0xE0, 0x01, 0xE0, 0x01, 0xF1, 0x01, 0xF1],
    [0xE0, 0x01, 0xE0, 0x01, 0xF1, 0x01, 0xF1, 0x01],
    [0x01, 0xFE, 0x01, 0xFE, 0x01, 0xFE, 0x01, 0xFE],
    [0xFE, 0x01, 0xFE, 0x01, 0xFE, 0x01, 0xFE, 0x01],
    [0x1F, 0xE0, 0x1F, 0xE0, 0x0E, 0xF1, 0x0E, 0xF1],
    [0xE0, 0x1F, 0xE0, 0x1F, 0xF1, 0x0E, 0xF1, 0x0E],
    [0x1F, 0xFE, 0x1F, 0xFE, 0x0E, 0xFE, 0x0E, 0xFE],
    [0xFE, 0x1F, 0xFE, 0x1F, 0xFE, 0x0E, 0xFE, 0x0E],
    [0xE0, 0xFE, 0xE0, 0xFE, 0xF1, 0xFE, 0xF1, 0xFE],
    [0xFE, 0xE0, 0xFE, 0xE0, 0xFE, 0xF1, 0xFE, 0xF1],
];

pub fn derive_random(key: &[u8], well_known: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    if key.len() != DES3_KEY_SIZE {
        return Err(KerberosCryptoError::KeyLength(key.len(), DES3_KEY_SIZE));
    }

    common::derive_random(well_known, DES3_BLOCK_SIZE, DES3_SEED_LEN, |block| {
        encrypt_des(key, block)
    })
}

pub fn derive_key(key: &[u8], well_known: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    random_to_key(&derive_random(key, well_known)?)
}

fn fix_weak_key(key: &mut [u8; 8]) {
    if weak(key) {
        key[7] ^= 0xF0;
    }
}

fn weak(key: &[u8; 8]) -> bool {
    WEAK_KEYS.contains(key) || SEMI_WEAK_KEYS.contains(key)
}

/// Sets the lowest bit so that the byte has odd parity.
fn with_odd_parity(b: u8) -> u8 {
    if (b & 0xFE).count_ones() % 2 == 0 {
        b | 1
    } else {
        b & !1
    }
}

/// Spreads 56 random bits over 8 bytes: the low bit of each input byte moves into the eighth byte and every
/// byte gets an odd parity bit.
fn stretch_56_bits(bits: &[u8]) -> [u8; 8] {
    let mut key = [0; 8];
    let mut last = 0_u8;

    for (i, b) in bits.iter().enumerate() {
        key[i] = with_odd_parity(*b);
        if b & 0x01 != 0 {
            last |= 1 << (i + 1);
        }
    }

    key[7] = with_odd_parity(last);
    fix_weak_key(&mut key);

    key
}

pub fn random_to_key(seed: &[u8]) -> KerberosCryptoResult<Vec<u8>> {
    if seed.len() != DES3_SEED_LEN {
        return Err(KerberosCryptoError::SeedLength(seed.len(), DES3_SEED_LEN));
    }

    Ok(seed.chunks_exact(7).flat_map(stretch_56_bits).collect())
}

pub fn derive_key_from_password<P: AsRef<[u8]>, S: AsRef<[u8]>>(password: P, salt: S) -> KerberosCryptoResult<Vec<u8>> {
    let mut secret = password.as_ref().to_vec();
    secret.extend_from_slice(salt.as_ref());

    let temp_key = random_to_key(&n_fold(&secret, DES3_SEED_LEN))?;

    derive_key(&temp_key, KERBEROS)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{derive_key, derive_key_from_password, derive_random, random_to_key, stretch_56_bits};

    #[test]
    fn random_to_key_sets_parity() {
        let seed = hex::decode("c03ce348b91b17c03ce348b91b17c03ce348b91b17").unwrap();

        assert_eq!(
            hex::encode(random_to_key(&seed).unwrap()),
            "c13de349b91a16e9c13de349b91a16e9c13de349b91a16e9"
        );
    }

    #[test]
    fn weak_keys_are_corrected() {
        // stretches to 01 01 01 01 01 01 01 01
        assert_eq!(stretch_56_bits(&[0; 7]), [0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0xF1]);
        assert_eq!(stretch_56_bits(&[0xFF; 7]), [0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0x0E]);
    }

    // https://www.rfc-editor.org/rfc/rfc3961#appendix-A.3
    #[rstest]
    #[case(
        "dce06b1f64c857a11c3db57c51899b2cc1791008ce973b92",
        "0000000155",
        "935079d14490a75c3093c4a6e8c3b049c71e6ee705",
        "925179d04591a79b5d3192c4a7e9c289b049c71f6ee604cd"
    )]
    #[case(
        "5e13d31c70ef765746578531cb51c15bf11ca82c97cee9f2",
        "00000001aa",
        "9f58e5a047d894101c469845d67ae3c5249ed812f2",
        "9e58e5a146d9942a101c469845d67a20e3c4259ed913f207"
    )]
    #[case(
        "98e6fd8a04a4b6859b75a176540b9752bad3ecd610a252bc",
        "0000000155",
        "12fff90c773f956d13fc2ca0d0840349dbd39908eb",
        "13fef80d763e94ec6d13fd2ca1d085070249dad39808eabf"
    )]
    fn rfc3961_dr_and_dk(#[case] key: &str, #[case] usage: &str, #[case] dr: &str, #[case] dk: &str) {
        let key = hex::decode(key).unwrap();
        let usage = hex::decode(usage).unwrap();

        assert_eq!(hex::encode(derive_random(&key, &usage).unwrap()), dr);
        assert_eq!(hex::encode(derive_key(&key, &usage).unwrap()), dk);
    }

    // https://www.rfc-editor.org/rfc/rfc3961#appendix-A.4
    #[rstest]
    #[case("password", "ATHENA.MIT.EDUraeburn", "850bb51358548cd05e86768c313e3bfef7511937dcf72c3e")]
    #[case("potatoe", "WHITEHOUSE.GOVdanny", "dfcd233dd0a43204ea6dc437fb15e061b02979c1f74f377a")]
    #[case("penny", "EXAMPLE.COMbuckaroo", "6d2fcdf2d6fbbc3ddcadb5da5710a23489b0d3b69d5d9d4a")]
    fn rfc3961_string_to_key(#[case] password: &str, #[case] salt: &str, #[case] expected: &str) {
        assert_eq!(hex::encode(derive_key_from_password(password, salt).unwrap()), expected);
    }
}
