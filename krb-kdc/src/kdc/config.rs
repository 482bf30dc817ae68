use serde::{Deserialize, Serialize};
use time::Duration;

use crate::constants::etypes::{
    AES128_CTS_HMAC_SHA1_96, AES128_CTS_HMAC_SHA256_128, AES256_CTS_HMAC_SHA1_96, AES256_CTS_HMAC_SHA384_192,
};
use crate::crypto::CipherSuite;

fn default_realm() -> String {
    String::from("EXAMPLE.ORG")
}

fn default_supported_enctypes() -> Vec<i32> {
    vec![
        AES256_CTS_HMAC_SHA1_96,
        AES128_CTS_HMAC_SHA1_96,
        AES256_CTS_HMAC_SHA384_192,
        AES128_CTS_HMAC_SHA256_128,
    ]
}

const fn default_require_preauth() -> bool {
    true
}

const fn default_max_clock_skew_secs() -> u32 {
    300
}

#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct KdcConfig {
    /// Realm served by this KDC, also used for the server name of error replies.
    #[serde(default = "default_realm")]
    pub realm: String,
    /// Encryption types the KDC is willing to use, most preferred first.
    #[serde(default = "default_supported_enctypes")]
    pub supported_enctypes: Vec<i32>,
    #[serde(default = "default_require_preauth")]
    pub require_preauth: bool,
    #[serde(default = "default_max_clock_skew_secs")]
    pub max_clock_skew_secs: u32,
}

impl Default for KdcConfig {
    fn default() -> Self {
        Self {
            realm: default_realm(),
            supported_enctypes: default_supported_enctypes(),
            require_preauth: default_require_preauth(),
            max_clock_skew_secs: default_max_clock_skew_secs(),
        }
    }
}

impl KdcConfig {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            ..Default::default()
        }
    }

    pub fn max_clock_skew(&self) -> Duration {
        Duration::seconds(i64::from(self.max_clock_skew_secs))
    }

    pub fn supports(&self, cipher: CipherSuite) -> bool {
        self.supported_enctypes.contains(&cipher.etype())
    }
}
