//! KDC message dispatcher.
//!
//! [Kdc::process_message] takes a length-prefixed request and always answers with a length-prefixed PDU: the
//! handler reply on success, a KRB-ERROR otherwise.

mod backend;
pub mod config;
mod handlers;
pub mod preauth;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::{debug, error, warn};
use thiserror::Error;
use time::OffsetDateTime;

use crate::constants::error_codes::{
    KDC_ERR_BAD_PVNO, KDC_ERR_ETYPE_NOSUPP, KDC_ERR_SUMTYPE_NOSUPP, KRB_AP_ERR_BAD_INTEGRITY, KRB_AP_ERR_MSG_TYPE,
    KRB_ERR_GENERIC,
};
use crate::constants::types::{AS_REQ_MSG_TYPE, KRBTGT_SERVICE_NAME, NT_SRV_INST, TGS_REQ_MSG_TYPE};
use crate::crypto::KerberosCryptoError;
use crate::data_types::{kerberos_string, PrincipalName, KERBEROS_LENGTH_PREFIX_SIZE};
use crate::kdc_proxy::KdcProxyMessage;
use crate::messages::{decode_kdc_req, to_der, KdcCodecError, KrbError, KrbErrorInner};

pub use backend::{AsExchange, ClientKey, KdcBackend, TgsExchange};
pub use config::KdcConfig;
pub use handlers::{AsReqHandler, HandlerContext, MessageHandler, TgsReqHandler};
pub use preauth::{PaEncTimestampHandler, PreAuthContext, PreAuthHandler, PreAuthRegistry, PreAuthRegistryBuilder};

#[derive(Error, Debug)]
pub enum KdcError {
    #[error("parsing error: {0}")]
    Parsing(#[from] KdcCodecError),
    #[error("protocol error {code}: {message}")]
    Protocol {
        code: i32,
        message: String,
        e_data: Option<Vec<u8>>,
    },
    #[error("crypto error: {0}")]
    Crypto(#[from] KerberosCryptoError),
}

impl KdcError {
    pub fn protocol(code: i32, message: impl Into<String>) -> Self {
        KdcError::Protocol {
            code,
            message: message.into(),
            e_data: None,
        }
    }

    /// Code sent back in the KRB-ERROR reply.
    pub fn error_code(&self) -> i32 {
        match self {
            KdcError::Parsing(KdcCodecError::BadPvno(_)) => KDC_ERR_BAD_PVNO,
            KdcError::Parsing(KdcCodecError::MsgType { .. } | KdcCodecError::UnknownApplicationTag(_)) => {
                KRB_AP_ERR_MSG_TYPE
            }
            KdcError::Parsing(KdcCodecError::UnsupportedEtype(err)) | KdcError::Crypto(err) => crypto_error_code(err),
            KdcError::Parsing(_) => KRB_ERR_GENERIC,
            KdcError::Protocol { code, .. } => *code,
        }
    }

    pub fn e_data(&self) -> Option<&[u8]> {
        match self {
            KdcError::Protocol { e_data, .. } => e_data.as_deref(),
            _ => None,
        }
    }
}

fn crypto_error_code(err: &KerberosCryptoError) -> i32 {
    match err {
        KerberosCryptoError::AlgorithmIdentifier(_) => KDC_ERR_ETYPE_NOSUPP,
        KerberosCryptoError::ChecksumIdentifier(_) => KDC_ERR_SUMTYPE_NOSUPP,
        KerberosCryptoError::IntegrityCheck => KRB_AP_ERR_BAD_INTEGRITY,
        _ => KRB_ERR_GENERIC,
    }
}

/// Strips the 4-byte big-endian length prefix, which must announce exactly the remaining byte count.
pub fn unwrap_envelope(message: &[u8]) -> Result<&[u8], KdcCodecError> {
    if message.len() < KERBEROS_LENGTH_PREFIX_SIZE {
        return Err(KdcCodecError::EnvelopeTooShort(message.len()));
    }

    let (prefix, pdu) = message.split_at(KERBEROS_LENGTH_PREFIX_SIZE);
    let declared = BigEndian::read_u32(prefix) as usize;

    if declared != pdu.len() {
        return Err(KdcCodecError::EnvelopeLength {
            declared,
            actual: pdu.len(),
        });
    }

    Ok(pdu)
}

pub fn wrap_envelope(pdu: &[u8]) -> Result<Vec<u8>, KdcCodecError> {
    let length = u32::try_from(pdu.len()).map_err(|_| KdcCodecError::Schema("message is too large"))?;

    let mut message = Vec::with_capacity(KERBEROS_LENGTH_PREFIX_SIZE + pdu.len());
    message
        .write_u32::<BigEndian>(length)
        .map_err(|_| KdcCodecError::Schema("message is too large"))?;
    message.extend_from_slice(pdu);

    Ok(message)
}

pub struct Kdc {
    config: KdcConfig,
    backend: Arc<dyn KdcBackend>,
    pre_auth: PreAuthRegistry,
    handlers: HashMap<u8, Box<dyn MessageHandler>>,
}

impl Kdc {
    /// KDC with the default pre-authentication handlers.
    pub fn new(config: KdcConfig, backend: Arc<dyn KdcBackend>) -> Self {
        Self::with_pre_auth(config, backend, PreAuthRegistry::default())
    }

    pub fn with_pre_auth(config: KdcConfig, backend: Arc<dyn KdcBackend>, pre_auth: PreAuthRegistry) -> Self {
        let mut handlers: HashMap<u8, Box<dyn MessageHandler>> = HashMap::new();
        handlers.insert(AS_REQ_MSG_TYPE, Box::new(AsReqHandler));
        handlers.insert(TGS_REQ_MSG_TYPE, Box::new(TgsReqHandler));

        Self {
            config,
            backend,
            pre_auth,
            handlers,
        }
    }

    pub fn config(&self) -> &KdcConfig {
        &self.config
    }

    pub fn pre_auth(&self) -> &PreAuthRegistry {
        &self.pre_auth
    }

    /// Length-prefixed reply, or the error that a KRB-ERROR would describe.
    pub fn process_message_checked(&self, message: &[u8]) -> Result<Vec<u8>, KdcError> {
        let pdu = unwrap_envelope(message)?;

        let msg_type = decode_kdc_req(pdu)?.msg_type();
        let handler = self.handlers.get(&msg_type).ok_or_else(|| {
            KdcError::protocol(
                KRB_AP_ERR_MSG_TYPE,
                format!("no handler for message type {}", msg_type),
            )
        })?;
        debug!("dispatching message type {}", msg_type);

        let context = HandlerContext {
            config: &self.config,
            backend: self.backend.as_ref(),
            pre_auth: &self.pre_auth,
            now: OffsetDateTime::now_utc(),
        };
        let reply = handler.process_message(&context, pdu)?;

        Ok(wrap_envelope(&reply)?)
    }

    /// Never fails: rejected requests are answered with a KRB-ERROR.
    pub fn process_message(&self, message: &[u8]) -> Vec<u8> {
        match self.process_message_checked(message) {
            Ok(reply) => reply,
            Err(err) => {
                warn!("rejecting KDC request: {}", err);
                self.error_reply(&err)
            }
        }
    }

    /// Unwraps a KDC-PROXY-MESSAGE, dispatches the inner message and wraps the reply the same way.
    pub fn process_proxy_message(&self, message: &[u8]) -> Result<Vec<u8>, KdcError> {
        let request = KdcProxyMessage::decode(message)?;

        let reply = self.process_message(request.kerb_message());

        Ok(KdcProxyMessage::from_raw_kerb_message(reply).encode()?)
    }

    fn krb_error(&self, err: &KdcError) -> Result<KrbError, KdcCodecError> {
        let realm = kerberos_string(&self.config.realm)?;
        let sname = PrincipalName::new(NT_SRV_INST, &[KRBTGT_SERVICE_NAME, self.config.realm.as_str()])?;

        let message = match err {
            KdcError::Protocol { message, .. } => message.clone(),
            other => other.to_string(),
        };

        Ok(KrbError::from(KrbErrorInner::new(
            err.error_code(),
            realm,
            sname,
            OffsetDateTime::now_utc(),
            Some(message.as_str()),
            err.e_data().map(|e_data| e_data.to_vec()),
        )?))
    }

    fn error_reply(&self, err: &KdcError) -> Vec<u8> {
        let reply = self
            .krb_error(err)
            .and_then(|krb_error| to_der(&krb_error))
            .and_then(|pdu| wrap_envelope(&pdu));

        match reply {
            Ok(reply) => reply,
            Err(encoding_error) => {
                // only reachable with a realm that cannot be encoded
                error!("failed to encode KRB-ERROR: {}", encoding_error);
                Vec::new()
            }
        }
    }
}

impl fmt::Debug for Kdc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kdc")
            .field("config", &self.config)
            .field("pre_auth", &self.pre_auth)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&[0, 0, 0, 2, 0x30, 0x00], Some(&[0x30, 0x00][..]))]
    #[case(&[0, 0, 0, 0], Some(&[][..]))]
    #[case(&[0, 0, 0, 3, 0x30, 0x00], None)]
    #[case(&[0, 0, 0, 1, 0x30, 0x00], None)]
    #[case(&[0, 0, 0], None)]
    fn envelope(#[case] message: &[u8], #[case] expected: Option<&[u8]>) {
        assert_eq!(unwrap_envelope(message).ok(), expected);
    }

    #[test]
    fn envelope_roundtrip() {
        let message = wrap_envelope(&[0x6a, 0x01, 0x00]).unwrap();

        assert_eq!(message, vec![0, 0, 0, 3, 0x6a, 0x01, 0x00]);
        assert_eq!(unwrap_envelope(&message).unwrap(), &[0x6a, 0x01, 0x00]);
    }

    #[test]
    fn error_codes() {
        assert_eq!(KdcError::from(KdcCodecError::BadPvno(4)).error_code(), KDC_ERR_BAD_PVNO);
        assert_eq!(
            KdcError::from(KdcCodecError::UnknownApplicationTag(11)).error_code(),
            KRB_AP_ERR_MSG_TYPE
        );
        assert_eq!(KdcError::from(KdcCodecError::TrailingBytes(1)).error_code(), KRB_ERR_GENERIC);
        assert_eq!(
            KdcError::from(KdcCodecError::from(KerberosCryptoError::AlgorithmIdentifier(23))).error_code(),
            KDC_ERR_ETYPE_NOSUPP
        );
        assert_eq!(
            KdcError::from(KerberosCryptoError::IntegrityCheck).error_code(),
            KRB_AP_ERR_BAD_INTEGRITY
        );
        assert_eq!(KdcError::protocol(68, "wrong realm").error_code(), 68);
    }
}
