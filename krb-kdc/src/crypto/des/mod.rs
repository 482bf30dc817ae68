mod decrypt;
mod des3_cbc_sha1_kd;
mod encrypt;
mod key_derivation;

pub const DES3_BLOCK_SIZE: usize = 8;
pub const DES3_KEY_SIZE: usize = 24;
/// random-to-key input: 168 bits
pub const DES3_SEED_LEN: usize = 21;
pub const DES3_MAC_SIZE: usize = 20;

pub use decrypt::{decrypt_des, decrypt_message};
pub use des3_cbc_sha1_kd::Des3CbcSha1Kd;
pub use encrypt::{encrypt_des, encrypt_message};
pub use key_derivation::{derive_key, derive_key_from_password, derive_random, random_to_key};
