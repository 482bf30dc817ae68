use picky_asn1::wrapper::{
    ExplicitContextTag0, ExplicitContextTag1, ExplicitContextTag2, IntegerAsn1, OctetStringAsn1, Optional,
};
use serde::{Deserialize, Serialize};

use crate::data_types::KerberosStringAsn1;
use crate::kdc::wrap_envelope;
use crate::messages::{from_der, to_der, KdcCodecError};

/// [2.2.2 KDC_PROXY_MESSAGE](https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-kkdcp/5778aff5-b182-4b97-a970-29c7f911eb4c)
/// ```not_rust
/// KDC-PROXY-MESSAGE ::= SEQUENCE {
///     kerb-message           [0] OCTET STRING,
///     target-domain          [1] KERB-REALM OPTIONAL,
///     dclocator-hint         [2] INTEGER OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdcProxyMessage {
    pub kerb_message: ExplicitContextTag0<OctetStringAsn1>,
    #[serde(default)]
    pub target_domain: Optional<Option<ExplicitContextTag1<KerberosStringAsn1>>>,
    #[serde(default)]
    pub dclocator_hint: Optional<Option<ExplicitContextTag2<IntegerAsn1>>>,
}

impl KdcProxyMessage {
    /// Wraps a bare DER PDU, prepending the kerberos length prefix.
    pub fn from_raw<R: AsRef<[u8]>>(raw_req: R) -> Result<Self, KdcCodecError> {
        Ok(Self::from_raw_kerb_message(wrap_envelope(raw_req.as_ref())?))
    }

    /// Wraps a message that already carries its length prefix.
    pub fn from_raw_kerb_message(kerb_message: Vec<u8>) -> Self {
        Self {
            kerb_message: ExplicitContextTag0::from(OctetStringAsn1::from(kerb_message)),
            target_domain: Optional::from(None),
            dclocator_hint: Optional::from(None),
        }
    }

    pub fn with_target_domain(mut self, target_domain: KerberosStringAsn1) -> Self {
        self.target_domain = Optional::from(Some(ExplicitContextTag1::from(target_domain)));
        self
    }

    /// The length-prefixed kerberos message.
    pub fn kerb_message(&self) -> &[u8] {
        &self.kerb_message.0 .0
    }

    pub fn decode(data: &[u8]) -> Result<Self, KdcCodecError> {
        from_der(data)
    }

    pub fn encode(&self) -> Result<Vec<u8>, KdcCodecError> {
        to_der(self)
    }
}
