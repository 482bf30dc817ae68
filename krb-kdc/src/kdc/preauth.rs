//! Pre-authentication handlers, keyed by padata-type.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use time::{Duration, OffsetDateTime};

use crate::constants::error_codes::{KDC_ERR_ETYPE_NOSUPP, KDC_ERR_PREAUTH_FAILED, KRB_AP_ERR_SKEW};
use crate::constants::key_usages::AS_REQ_TIMESTAMP;
use crate::constants::pa_types::PA_ENC_TIMESTAMP;
use crate::data_types::{time_from_kerberos, EncryptedData, PaData, PaEncTsEnc};
use crate::messages::from_der;

use super::{ClientKey, KdcError};

pub struct PreAuthContext<'a> {
    /// Every key the backend holds for the client.
    pub client_keys: &'a [ClientKey],
    pub now: OffsetDateTime,
    pub max_clock_skew: Duration,
}

pub trait PreAuthHandler: Send + Sync {
    fn padata_type(&self) -> i32;

    /// Entry advertised in the METHOD-DATA of a KDC_ERR_PREAUTH_REQUIRED reply.
    fn hint(&self) -> PaData {
        PaData::new(self.padata_type(), Vec::new())
    }

    fn verify(&self, context: &PreAuthContext<'_>, padata: &PaData) -> Result<(), KdcError>;
}

pub type PreAuthHandlerConstructor = fn() -> Box<dyn PreAuthHandler>;

/// Read-only padata-type to handler table, built once and shared by every request.
#[derive(Clone)]
pub struct PreAuthRegistry {
    handlers: BTreeMap<i32, PreAuthHandlerConstructor>,
}

impl PreAuthRegistry {
    pub fn builder() -> PreAuthRegistryBuilder {
        PreAuthRegistryBuilder {
            handlers: BTreeMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::builder().build()
    }

    pub fn handler(&self, padata_type: i32) -> Option<Box<dyn PreAuthHandler>> {
        self.handlers.get(&padata_type).map(|constructor| constructor())
    }

    pub fn padata_types(&self) -> impl Iterator<Item = i32> + '_ {
        self.handlers.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for PreAuthRegistry {
    fn default() -> Self {
        Self::builder()
            .register(PA_ENC_TIMESTAMP, || Box::new(PaEncTimestampHandler))
            .build()
    }
}

impl fmt::Debug for PreAuthRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

pub struct PreAuthRegistryBuilder {
    handlers: BTreeMap<i32, PreAuthHandlerConstructor>,
}

impl PreAuthRegistryBuilder {
    /// Registers `constructor` for `padata_type`, replacing any previous registration.
    pub fn register(mut self, padata_type: i32, constructor: PreAuthHandlerConstructor) -> Self {
        self.handlers.insert(padata_type, constructor);
        self
    }

    pub fn build(self) -> PreAuthRegistry {
        PreAuthRegistry {
            handlers: self.handlers,
        }
    }
}

/// [PA-ENC-TIMESTAMP](https://www.rfc-editor.org/rfc/rfc4120#section-5.2.7.2): the client proves knowledge of its
/// key by encrypting the current time with key usage 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaEncTimestampHandler;

impl PreAuthHandler for PaEncTimestampHandler {
    fn padata_type(&self) -> i32 {
        PA_ENC_TIMESTAMP
    }

    fn verify(&self, context: &PreAuthContext<'_>, padata: &PaData) -> Result<(), KdcError> {
        let enc_data: EncryptedData = from_der(&padata.padata_data.0 .0)
            .map_err(|err| KdcError::protocol(KDC_ERR_PREAUTH_FAILED, format!("malformed PA-ENC-TIMESTAMP: {}", err)))?;

        let cipher = enc_data.cipher_suite()?;
        let client_key = context
            .client_keys
            .iter()
            .find(|client_key| client_key.key.cipher() == cipher)
            .ok_or_else(|| KdcError::protocol(KDC_ERR_ETYPE_NOSUPP, format!("no client key for {}", cipher)))?;

        let plaintext = client_key
            .key
            .decrypt(AS_REQ_TIMESTAMP, &enc_data.cipher.0 .0)
            .map_err(|err| KdcError::protocol(KDC_ERR_PREAUTH_FAILED, format!("PA-ENC-TIMESTAMP: {}", err)))?;

        // DES3 plaintexts keep their block padding, so trailing bytes are tolerated here
        let timestamp: PaEncTsEnc = picky_asn1_der::from_bytes(&plaintext)
            .map_err(|err| KdcError::protocol(KDC_ERR_PREAUTH_FAILED, format!("malformed PA-ENC-TS-ENC: {}", err)))?;

        let client_time = time_from_kerberos(&timestamp.patimestamp.0)
            .ok_or_else(|| KdcError::protocol(KDC_ERR_PREAUTH_FAILED, "invalid patimestamp"))?;

        let skew = (context.now - client_time).abs();
        if skew > context.max_clock_skew {
            return Err(KdcError::protocol(
                KRB_AP_ERR_SKEW,
                format!("client clock is off by {} seconds", skew.whole_seconds()),
            ));
        }

        debug!("PA-ENC-TIMESTAMP verified with {}", cipher);

        Ok(())
    }
}
