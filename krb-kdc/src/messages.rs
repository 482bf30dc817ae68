//! [RFC 4120](https://www.rfc-editor.org/rfc/rfc4120#section-5.4) KDC messages.
//!
//! Requests are decoded through an explicit application tag table: the outer tag selects the decoder and
//! anything outside of the table is rejected.

use picky_asn1::wrapper::{
    Asn1SequenceOf, ExplicitContextTag0, ExplicitContextTag1, ExplicitContextTag10, ExplicitContextTag11,
    ExplicitContextTag12, ExplicitContextTag2, ExplicitContextTag3, ExplicitContextTag4, ExplicitContextTag5,
    ExplicitContextTag6, ExplicitContextTag7, ExplicitContextTag8, ExplicitContextTag9, IntegerAsn1,
    OctetStringAsn1, Optional,
};
use picky_asn1_der::application_tag::ApplicationTag;
use picky_asn1_der::Asn1DerError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::constants::types::{
    AP_REQ_MSG_TYPE, AS_REQ_MSG_TYPE, KERBEROS_VERSION, KRB_ERROR_MSG_TYPE, TGS_REQ_MSG_TYPE,
};
use crate::crypto::KerberosCryptoError;
use crate::data_types::{
    integer_from_i32, integer_from_u32, integer_to_i32, integer_to_i64, integer_to_u32, kerberos_string,
    kerberos_time, EncryptedData, EncryptionKey, HostAddresses, KerberosFlags, KerberosStringAsn1, KerberosTime,
    LastReq, MethodData, Microseconds, PaData, PrincipalName, Realm, Ticket,
};

#[derive(Error, Debug)]
pub enum KdcCodecError {
    #[error("message is shorter than its length prefix: {0} bytes")]
    EnvelopeTooShort(usize),
    #[error("length prefix announces {declared} bytes but {actual} follow")]
    EnvelopeLength { declared: usize, actual: usize },
    #[error("DER error: {0}")]
    Asn1(#[from] Asn1DerError),
    #[error("malformed DER header")]
    Header,
    #[error("{0} trailing bytes after the message")]
    TrailingBytes(usize),
    #[error("unknown outer tag: {0:#04x}")]
    UnknownApplicationTag(u8),
    #[error("invalid field: {0}")]
    Schema(&'static str),
    #[error("unsupported protocol version: {0}")]
    BadPvno(i64),
    #[error("message type {actual} does not match the application tag {expected}")]
    MsgType { expected: u8, actual: i64 },
    #[error(transparent)]
    UnsupportedEtype(#[from] KerberosCryptoError),
}

/// Total length of the DER TLV that starts `data`.
fn der_tlv_len(data: &[u8]) -> Result<usize, KdcCodecError> {
    let first_length_byte = *data.get(1).ok_or(KdcCodecError::Header)?;

    if first_length_byte & 0x80 == 0 {
        return Ok(2 + usize::from(first_length_byte));
    }

    let length_bytes_count = usize::from(first_length_byte & 0x7f);
    // indefinite lengths are not DER
    if length_bytes_count == 0 || length_bytes_count > std::mem::size_of::<u32>() {
        return Err(KdcCodecError::Header);
    }

    let length_bytes = data.get(2..2 + length_bytes_count).ok_or(KdcCodecError::Header)?;
    let content_len = length_bytes
        .iter()
        .fold(0_usize, |acc, byte| (acc << 8) | usize::from(*byte));

    Ok(2 + length_bytes_count + content_len)
}

/// Decodes exactly one DER value, rejecting anything that follows it.
pub fn from_der<T: DeserializeOwned>(data: &[u8]) -> Result<T, KdcCodecError> {
    let tlv_len = der_tlv_len(data)?;

    if data.len() > tlv_len {
        return Err(KdcCodecError::TrailingBytes(data.len() - tlv_len));
    }

    Ok(picky_asn1_der::from_bytes(data)?)
}

pub fn to_der<T: Serialize>(value: &T) -> Result<Vec<u8>, KdcCodecError> {
    Ok(picky_asn1_der::to_vec(value)?)
}

/// ```not_rust
/// KDC-REQ-BODY    ::= SEQUENCE {
///         kdc-options             [0] KDCOptions,
///         cname                   [1] PrincipalName OPTIONAL
///                                     -- Used only in AS-REQ --,
///         realm                   [2] Realm
///                                     -- Server's realm
///                                     -- Also client's in AS-REQ --,
///         sname                   [3] PrincipalName OPTIONAL,
///         from                    [4] KerberosTime OPTIONAL,
///         till                    [5] KerberosTime OPTIONAL,
///         rtime                   [6] KerberosTime OPTIONAL,
///         nonce                   [7] UInt32,
///         etype                   [8] SEQUENCE OF Int32 -- EncryptionType
///                                     -- in preference order --,
///         addresses               [9] HostAddresses OPTIONAL,
///         enc-authorization-data  [10] EncryptedData OPTIONAL
///                                     -- AuthorizationData --,
///         additional-tickets      [11] SEQUENCE OF Ticket OPTIONAL
///                                        -- NOTE: not empty
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdcReqBody {
    pub kdc_options: ExplicitContextTag0<KerberosFlags>,
    #[serde(default)]
    pub cname: Optional<Option<ExplicitContextTag1<PrincipalName>>>,
    pub realm: ExplicitContextTag2<Realm>,
    #[serde(default)]
    pub sname: Optional<Option<ExplicitContextTag3<PrincipalName>>>,
    #[serde(default)]
    pub from: Optional<Option<ExplicitContextTag4<KerberosTime>>>,
    #[serde(default)]
    pub till: Optional<Option<ExplicitContextTag5<KerberosTime>>>,
    #[serde(default)]
    pub rtime: Optional<Option<ExplicitContextTag6<KerberosTime>>>,
    pub nonce: ExplicitContextTag7<IntegerAsn1>,
    pub etype: ExplicitContextTag8<Asn1SequenceOf<IntegerAsn1>>,
    #[serde(default)]
    pub addresses: Optional<Option<ExplicitContextTag9<HostAddresses>>>,
    #[serde(default)]
    pub enc_authorization_data: Optional<Option<ExplicitContextTag10<EncryptedData>>>,
    #[serde(default)]
    pub additional_tickets: Optional<Option<ExplicitContextTag11<Asn1SequenceOf<Ticket>>>>,
}

impl KdcReqBody {
    /// Requested encryption types in the client's preference order. Values outside of `Int32` are skipped.
    pub fn etypes(&self) -> Vec<i32> {
        self.etype.0 .0.iter().filter_map(integer_to_i32).collect()
    }

    pub fn nonce(&self) -> Option<u32> {
        integer_to_u32(&self.nonce.0)
    }
}

/// ```not_rust
/// KDC-REQ         ::= SEQUENCE {
///         -- NOTE: first tag is [1], not [0]
///         pvno            [1] INTEGER (5) ,
///         msg-type        [2] INTEGER (10 -- AS -- | 12 -- TGS --),
///         padata          [3] SEQUENCE OF PA-DATA OPTIONAL
///                             -- NOTE: not empty --,
///         req-body        [4] KDC-REQ-BODY
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdcReq {
    pub pvno: ExplicitContextTag1<IntegerAsn1>,
    pub msg_type: ExplicitContextTag2<IntegerAsn1>,
    #[serde(default)]
    pub padata: Optional<Option<ExplicitContextTag3<MethodData>>>,
    pub req_body: ExplicitContextTag4<KdcReqBody>,
}

impl KdcReq {
    pub fn new(msg_type: u8, padata: Vec<PaData>, req_body: KdcReqBody) -> Self {
        Self {
            pvno: ExplicitContextTag1::from(IntegerAsn1::from(vec![KERBEROS_VERSION])),
            msg_type: ExplicitContextTag2::from(IntegerAsn1::from(vec![msg_type])),
            padata: Optional::from(if padata.is_empty() {
                None
            } else {
                Some(ExplicitContextTag3::from(Asn1SequenceOf::from(padata)))
            }),
            req_body: ExplicitContextTag4::from(req_body),
        }
    }

    pub fn padata(&self) -> &[PaData] {
        self.padata
            .0
            .as_ref()
            .map(|padata| padata.0 .0.as_slice())
            .unwrap_or_default()
    }

    pub fn find_padata(&self, padata_type: i32) -> Option<&PaData> {
        self.padata()
            .iter()
            .find(|padata| padata.padata_type() == Some(padata_type))
    }

    fn validate(&self, expected_msg_type: u8) -> Result<(), KdcCodecError> {
        let pvno = integer_to_i64(&self.pvno.0).ok_or(KdcCodecError::Schema("pvno out of range"))?;
        if pvno != i64::from(KERBEROS_VERSION) {
            return Err(KdcCodecError::BadPvno(pvno));
        }

        let msg_type = integer_to_i64(&self.msg_type.0).ok_or(KdcCodecError::Schema("msg-type out of range"))?;
        if msg_type != i64::from(expected_msg_type) {
            return Err(KdcCodecError::MsgType {
                expected: expected_msg_type,
                actual: msg_type,
            });
        }

        if self.req_body.0.nonce().is_none() {
            return Err(KdcCodecError::Schema("nonce is not an UInt32"));
        }

        if self.padata.0.as_ref().map(|padata| padata.0 .0.is_empty()).unwrap_or(false) {
            return Err(KdcCodecError::Schema("padata is present but empty"));
        }

        let body = &self.req_body.0;
        if let Some(cname) = body.cname.0.as_ref() {
            check_principal_name(&cname.0)?;
        }
        if let Some(sname) = body.sname.0.as_ref() {
            check_principal_name(&sname.0)?;
        }
        if let Some(tickets) = body.additional_tickets.0.as_ref() {
            for ticket in tickets.0 .0.iter() {
                check_principal_name(&ticket.0.sname.0)?;
            }
        }

        Ok(())
    }
}

/// A principal name always carries at least one component.
fn check_principal_name(name: &PrincipalName) -> Result<(), KdcCodecError> {
    if name.name_string.0 .0.is_empty() {
        return Err(KdcCodecError::Schema("principal name has no components"));
    }

    Ok(())
}

/// AS-REQ          ::= [APPLICATION 10] KDC-REQ
pub type AsReq = ApplicationTag<KdcReq, 10>;

/// TGS-REQ         ::= [APPLICATION 12] KDC-REQ
pub type TgsReq = ApplicationTag<KdcReq, 12>;

/// ```not_rust
/// KDC-REP         ::= SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (11 -- AS -- | 13 -- TGS --),
///         padata          [2] SEQUENCE OF PA-DATA OPTIONAL
///                                 -- NOTE: not empty --,
///         crealm          [3] Realm,
///         cname           [4] PrincipalName,
///         ticket          [5] Ticket,
///         enc-part        [6] EncryptedData
///                                 -- EncASRepPart or EncTGSRepPart,
///                                 -- as appropriate
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdcRep {
    pub pvno: ExplicitContextTag0<IntegerAsn1>,
    pub msg_type: ExplicitContextTag1<IntegerAsn1>,
    #[serde(default)]
    pub padata: Optional<Option<ExplicitContextTag2<MethodData>>>,
    pub crealm: ExplicitContextTag3<Realm>,
    pub cname: ExplicitContextTag4<PrincipalName>,
    pub ticket: ExplicitContextTag5<Ticket>,
    pub enc_part: ExplicitContextTag6<EncryptedData>,
}

/// AS-REP          ::= [APPLICATION 11] KDC-REP
pub type AsRep = ApplicationTag<KdcRep, 11>;

/// TGS-REP         ::= [APPLICATION 13] KDC-REP
pub type TgsRep = ApplicationTag<KdcRep, 13>;

/// ```not_rust
/// EncKDCRepPart   ::= SEQUENCE {
///         key             [0] EncryptionKey,
///         last-req        [1] LastReq,
///         nonce           [2] UInt32,
///         key-expiration  [3] KerberosTime OPTIONAL,
///         flags           [4] TicketFlags,
///         authtime        [5] KerberosTime,
///         starttime       [6] KerberosTime OPTIONAL,
///         endtime         [7] KerberosTime,
///         renew-till      [8] KerberosTime OPTIONAL,
///         srealm          [9] Realm,
///         sname           [10] PrincipalName,
///         caddr           [11] HostAddresses OPTIONAL,
///         encrypted-pa-data [12] METHOD-DATA OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncKdcRepPart {
    pub key: ExplicitContextTag0<EncryptionKey>,
    pub last_req: ExplicitContextTag1<LastReq>,
    pub nonce: ExplicitContextTag2<IntegerAsn1>,
    #[serde(default)]
    pub key_expiration: Optional<Option<ExplicitContextTag3<KerberosTime>>>,
    pub flags: ExplicitContextTag4<KerberosFlags>,
    pub auth_time: ExplicitContextTag5<KerberosTime>,
    #[serde(default)]
    pub start_time: Optional<Option<ExplicitContextTag6<KerberosTime>>>,
    pub end_time: ExplicitContextTag7<KerberosTime>,
    #[serde(default)]
    pub renew_till: Optional<Option<ExplicitContextTag8<KerberosTime>>>,
    pub srealm: ExplicitContextTag9<Realm>,
    pub sname: ExplicitContextTag10<PrincipalName>,
    #[serde(default)]
    pub caddr: Optional<Option<ExplicitContextTag11<HostAddresses>>>,
    #[serde(default)]
    pub encrypted_pa_data: Optional<Option<ExplicitContextTag12<MethodData>>>,
}

/// EncASRepPart    ::= [APPLICATION 25] EncKDCRepPart
pub type EncAsRepPart = ApplicationTag<EncKdcRepPart, 25>;

/// EncTGSRepPart   ::= [APPLICATION 26] EncKDCRepPart
pub type EncTgsRepPart = ApplicationTag<EncKdcRepPart, 26>;

/// ```not_rust
/// AP-REQ          ::= [APPLICATION 14] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (14),
///         ap-options      [2] APOptions,
///         ticket          [3] Ticket,
///         authenticator   [4] EncryptedData -- Authenticator
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApReqInner {
    pub pvno: ExplicitContextTag0<IntegerAsn1>,
    pub msg_type: ExplicitContextTag1<IntegerAsn1>,
    pub ap_options: ExplicitContextTag2<KerberosFlags>,
    pub ticket: ExplicitContextTag3<Ticket>,
    pub authenticator: ExplicitContextTag4<EncryptedData>,
}

pub type ApReq = ApplicationTag<ApReqInner, 14>;

/// Decodes the AP-REQ carried by a PA-TGS-REQ entry.
pub fn decode_ap_req(data: &[u8]) -> Result<ApReq, KdcCodecError> {
    let ap_req: ApReq = from_der(data)?;

    let pvno = integer_to_i64(&ap_req.0.pvno.0).ok_or(KdcCodecError::Schema("pvno out of range"))?;
    if pvno != i64::from(KERBEROS_VERSION) {
        return Err(KdcCodecError::BadPvno(pvno));
    }

    let msg_type = integer_to_i64(&ap_req.0.msg_type.0).ok_or(KdcCodecError::Schema("msg-type out of range"))?;
    if msg_type != i64::from(AP_REQ_MSG_TYPE) {
        return Err(KdcCodecError::MsgType {
            expected: AP_REQ_MSG_TYPE,
            actual: msg_type,
        });
    }

    check_principal_name(&ap_req.0.ticket.0 .0.sname.0)?;

    Ok(ap_req)
}

/// ```not_rust
/// KRB-ERROR       ::= [APPLICATION 30] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (30),
///         ctime           [2] KerberosTime OPTIONAL,
///         cusec           [3] Microseconds OPTIONAL,
///         stime           [4] KerberosTime,
///         susec           [5] Microseconds,
///         error-code      [6] Int32,
///         crealm          [7] Realm OPTIONAL,
///         cname           [8] PrincipalName OPTIONAL,
///         realm           [9] Realm -- service realm --,
///         sname           [10] PrincipalName -- service name --,
///         e-text          [11] KerberosString OPTIONAL,
///         e-data          [12] OCTET STRING OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KrbErrorInner {
    pub pvno: ExplicitContextTag0<IntegerAsn1>,
    pub msg_type: ExplicitContextTag1<IntegerAsn1>,
    #[serde(default)]
    pub ctime: Optional<Option<ExplicitContextTag2<KerberosTime>>>,
    #[serde(default)]
    pub cusec: Optional<Option<ExplicitContextTag3<Microseconds>>>,
    pub stime: ExplicitContextTag4<KerberosTime>,
    pub susec: ExplicitContextTag5<Microseconds>,
    pub error_code: ExplicitContextTag6<IntegerAsn1>,
    #[serde(default)]
    pub crealm: Optional<Option<ExplicitContextTag7<Realm>>>,
    #[serde(default)]
    pub cname: Optional<Option<ExplicitContextTag8<PrincipalName>>>,
    pub realm: ExplicitContextTag9<Realm>,
    pub sname: ExplicitContextTag10<PrincipalName>,
    #[serde(default)]
    pub e_text: Optional<Option<ExplicitContextTag11<KerberosStringAsn1>>>,
    #[serde(default)]
    pub e_data: Optional<Option<ExplicitContextTag12<OctetStringAsn1>>>,
}

pub type KrbError = ApplicationTag<KrbErrorInner, 30>;

impl KrbErrorInner {
    /// Server side error. Client fields are left out, `e_text` is dropped when it is not IA5.
    pub fn new(
        error_code: i32,
        realm: Realm,
        sname: PrincipalName,
        server_time: OffsetDateTime,
        e_text: Option<&str>,
        e_data: Option<Vec<u8>>,
    ) -> Result<Self, KdcCodecError> {
        // Microseconds    ::= INTEGER (0..999999)
        let microseconds = server_time.microsecond().min(999_999);

        Ok(Self {
            pvno: ExplicitContextTag0::from(IntegerAsn1::from(vec![KERBEROS_VERSION])),
            msg_type: ExplicitContextTag1::from(IntegerAsn1::from(vec![KRB_ERROR_MSG_TYPE])),
            ctime: Optional::from(None),
            cusec: Optional::from(None),
            stime: ExplicitContextTag4::from(kerberos_time(server_time)?),
            susec: ExplicitContextTag5::from(integer_from_u32(microseconds)),
            error_code: ExplicitContextTag6::from(integer_from_i32(error_code)),
            crealm: Optional::from(None),
            cname: Optional::from(None),
            realm: ExplicitContextTag9::from(realm),
            sname: ExplicitContextTag10::from(sname),
            e_text: Optional::from(
                e_text
                    .and_then(|text| kerberos_string(text).ok())
                    .map(ExplicitContextTag11::from),
            ),
            e_data: Optional::from(e_data.map(|data| ExplicitContextTag12::from(OctetStringAsn1::from(data)))),
        })
    }

    pub fn error_code(&self) -> Option<i32> {
        integer_to_i32(&self.error_code.0)
    }

    /// `e-data` interpreted as METHOD-DATA, as sent along with KDC_ERR_PREAUTH_REQUIRED.
    pub fn method_data(&self) -> Option<Result<MethodData, KdcCodecError>> {
        self.e_data.0.as_ref().map(|e_data| from_der(&e_data.0 .0))
    }
}

/// A decoded KDC request, tagged by its message type.
#[derive(Debug, Clone, PartialEq)]
pub enum KdcRequest {
    As(AsReq),
    Tgs(TgsReq),
}

impl KdcRequest {
    pub fn msg_type(&self) -> u8 {
        match self {
            KdcRequest::As(_) => AS_REQ_MSG_TYPE,
            KdcRequest::Tgs(_) => TGS_REQ_MSG_TYPE,
        }
    }

    pub fn kdc_req(&self) -> &KdcReq {
        match self {
            KdcRequest::As(as_req) => &as_req.0,
            KdcRequest::Tgs(tgs_req) => &tgs_req.0,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, KdcCodecError> {
        match self {
            KdcRequest::As(as_req) => to_der(as_req),
            KdcRequest::Tgs(tgs_req) => to_der(tgs_req),
        }
    }
}

type RequestDecoder = fn(&[u8]) -> Result<KdcRequest, KdcCodecError>;

/// Application tag of the outer PDU to its decoder.
const KDC_REQ_DECODERS: &[(u8, RequestDecoder)] = &[
    (AS_REQ_MSG_TYPE, decode_as_req),
    (TGS_REQ_MSG_TYPE, decode_tgs_req),
];

fn decode_as_req(data: &[u8]) -> Result<KdcRequest, KdcCodecError> {
    let as_req: AsReq = from_der(data)?;
    as_req.0.validate(AS_REQ_MSG_TYPE)?;

    Ok(KdcRequest::As(as_req))
}

fn decode_tgs_req(data: &[u8]) -> Result<KdcRequest, KdcCodecError> {
    let tgs_req: TgsReq = from_der(data)?;
    tgs_req.0.validate(TGS_REQ_MSG_TYPE)?;

    Ok(KdcRequest::Tgs(tgs_req))
}

/// Application tag number of a DER value, if its identifier octet is a constructed application tag.
pub fn application_tag(data: &[u8]) -> Option<u8> {
    let identifier = *data.first()?;

    // class APPLICATION, constructed, low tag number form
    if identifier & 0xe0 == 0x60 && identifier & 0x1f != 0x1f {
        Some(identifier & 0x1f)
    } else {
        None
    }
}

/// Decodes an AS-REQ or TGS-REQ. Other tags, schema violations and trailing bytes fail.
pub fn decode_kdc_req(data: &[u8]) -> Result<KdcRequest, KdcCodecError> {
    let identifier = data.first().copied().ok_or(KdcCodecError::Header)?;
    let tag = application_tag(data).ok_or(KdcCodecError::UnknownApplicationTag(identifier))?;

    let decoder = KDC_REQ_DECODERS
        .iter()
        .find(|(decoder_tag, _)| *decoder_tag == tag)
        .map(|(_, decoder)| decoder)
        .ok_or(KdcCodecError::UnknownApplicationTag(tag))?;

    decoder(data)
}
