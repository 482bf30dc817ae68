//! Shared [RFC 4120](https://www.rfc-editor.org/rfc/rfc4120#section-5.2) types.

use picky_asn1::bit_string::BitString;
use picky_asn1::date::GeneralizedTime;
use picky_asn1::restricted_string::IA5String;
use picky_asn1::wrapper::{
    Asn1SequenceOf, BitStringAsn1, ExplicitContextTag0, ExplicitContextTag1, ExplicitContextTag10,
    ExplicitContextTag2, ExplicitContextTag3, ExplicitContextTag4, ExplicitContextTag5, ExplicitContextTag6,
    ExplicitContextTag7, ExplicitContextTag8, ExplicitContextTag9, GeneralStringAsn1, GeneralizedTimeAsn1,
    IntegerAsn1, OctetStringAsn1, Optional,
};
use picky_asn1_der::application_tag::ApplicationTag;
use serde::{Deserialize, Serialize};
use time::{Month, OffsetDateTime};

use crate::crypto::CipherSuite;
use crate::messages::KdcCodecError;

/// KerberosString   ::= GeneralString (IA5String)
pub type KerberosStringAsn1 = GeneralStringAsn1;

/// Realm           ::= KerberosString
pub type Realm = KerberosStringAsn1;

/// KerberosTime    ::= GeneralizedTime -- with no fractional seconds
pub type KerberosTime = GeneralizedTimeAsn1;

/// Microseconds    ::= INTEGER (0..999999)
pub type Microseconds = IntegerAsn1;

/// KerberosFlags   ::= BIT STRING (SIZE (32..MAX))
pub type KerberosFlags = BitStringAsn1;

/// [2.2.2 KDC-PROXY-MESSAGE Kerberos Length](https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-kkdcp/5778aff5-b182-4b97-a970-29c7f911eb4c)
/// length prefix of the kerberos message on the wire
pub const KERBEROS_LENGTH_PREFIX_SIZE: usize = 4;

/// ```not_rust
/// PrincipalName   ::= SEQUENCE {
///         name-type       [0] Int32,
///         name-string     [1] SEQUENCE OF KerberosString
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalName {
    pub name_type: ExplicitContextTag0<IntegerAsn1>,
    pub name_string: ExplicitContextTag1<Asn1SequenceOf<KerberosStringAsn1>>,
}

impl PrincipalName {
    pub fn new<S: AsRef<str>>(name_type: u32, components: &[S]) -> Result<Self, KdcCodecError> {
        if components.is_empty() {
            return Err(KdcCodecError::Schema("principal name has no components"));
        }

        let name_string = components
            .iter()
            .map(|component| kerberos_string(component.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name_type: ExplicitContextTag0::from(integer_from_u32(name_type)),
            name_string: ExplicitContextTag1::from(Asn1SequenceOf::from(name_string)),
        })
    }

    pub fn name_type(&self) -> Option<u32> {
        integer_to_u32(&self.name_type.0)
    }

    pub fn components(&self) -> Vec<String> {
        self.name_string.0 .0.iter().map(string_value).collect()
    }

    /// Components joined with `/`, without the realm.
    pub fn to_unparsed_name(&self) -> String {
        self.components().join("/")
    }
}

/// ```not_rust
/// EncryptedData   ::= SEQUENCE {
///         etype   [0] Int32 -- EncryptionType --,
///         kvno    [1] UInt32 OPTIONAL,
///         cipher  [2] OCTET STRING -- ciphertext
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub etype: ExplicitContextTag0<IntegerAsn1>,
    #[serde(default)]
    pub kvno: Optional<Option<ExplicitContextTag1<IntegerAsn1>>>,
    pub cipher: ExplicitContextTag2<OctetStringAsn1>,
}

impl EncryptedData {
    pub fn new(etype: CipherSuite, kvno: Option<u32>, cipher: Vec<u8>) -> Self {
        Self {
            etype: ExplicitContextTag0::from(integer_from_i32(etype.etype())),
            kvno: Optional::from(kvno.map(|kvno| ExplicitContextTag1::from(integer_from_u32(kvno)))),
            cipher: ExplicitContextTag2::from(OctetStringAsn1::from(cipher)),
        }
    }

    /// Resolves the encryption type, failing on numbers outside the supported set.
    pub fn cipher_suite(&self) -> Result<CipherSuite, KdcCodecError> {
        let etype = integer_to_i32(&self.etype.0).ok_or(KdcCodecError::Schema("etype out of range"))?;

        Ok(CipherSuite::try_from(etype)?)
    }
}

/// ```not_rust
/// EncryptionKey   ::= SEQUENCE {
///         keytype         [0] Int32 -- actually encryption type --,
///         keyvalue        [1] OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionKey {
    pub key_type: ExplicitContextTag0<IntegerAsn1>,
    pub key_value: ExplicitContextTag1<OctetStringAsn1>,
}

/// ```not_rust
/// Ticket          ::= [APPLICATION 1] SEQUENCE {
///         tkt-vno         [0] INTEGER (5),
///         realm           [1] Realm,
///         sname           [2] PrincipalName,
///         enc-part        [3] EncryptedData -- EncTicketPart
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketInner {
    pub tkt_vno: ExplicitContextTag0<IntegerAsn1>,
    pub realm: ExplicitContextTag1<Realm>,
    pub sname: ExplicitContextTag2<PrincipalName>,
    pub enc_part: ExplicitContextTag3<EncryptedData>,
}

pub type Ticket = ApplicationTag<TicketInner, 1>;

/// ```not_rust
/// PA-DATA         ::= SEQUENCE {
///         -- NOTE: first tag is [1], not [0]
///         padata-type     [1] Int32,
///         padata-value    [2] OCTET STRING -- might be encoded AP-REQ
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaData {
    pub padata_type: ExplicitContextTag1<IntegerAsn1>,
    pub padata_data: ExplicitContextTag2<OctetStringAsn1>,
}

impl PaData {
    pub fn new(padata_type: i32, padata_data: Vec<u8>) -> Self {
        Self {
            padata_type: ExplicitContextTag1::from(integer_from_i32(padata_type)),
            padata_data: ExplicitContextTag2::from(OctetStringAsn1::from(padata_data)),
        }
    }

    pub fn padata_type(&self) -> Option<i32> {
        integer_to_i32(&self.padata_type.0)
    }
}

/// METHOD-DATA     ::= SEQUENCE OF PA-DATA
pub type MethodData = Asn1SequenceOf<PaData>;

/// ```not_rust
/// HostAddress     ::= SEQUENCE  {
///         addr-type       [0] Int32,
///         address         [1] OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostAddress {
    pub addr_type: ExplicitContextTag0<IntegerAsn1>,
    pub address: ExplicitContextTag1<OctetStringAsn1>,
}

/// HostAddresses   ::= SEQUENCE OF HostAddress
pub type HostAddresses = Asn1SequenceOf<HostAddress>;

/// ```not_rust
/// AuthorizationData       ::= SEQUENCE OF SEQUENCE {
///         ad-type         [0] Int32,
///         ad-data         [1] OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationDataInner {
    pub ad_type: ExplicitContextTag0<IntegerAsn1>,
    pub ad_data: ExplicitContextTag1<OctetStringAsn1>,
}

pub type AuthorizationData = Asn1SequenceOf<AuthorizationDataInner>;

/// ```not_rust
/// PA-ENC-TS-ENC           ::= SEQUENCE {
///         patimestamp     [0] KerberosTime -- client's time --,
///         pausec          [1] Microseconds OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaEncTsEnc {
    pub patimestamp: ExplicitContextTag0<KerberosTime>,
    #[serde(default)]
    pub pausec: Optional<Option<ExplicitContextTag1<Microseconds>>>,
}

/// ```not_rust
/// ETYPE-INFO2-ENTRY       ::= SEQUENCE {
///         etype           [0] Int32,
///         salt            [1] KerberosString OPTIONAL,
///         s2kparams       [2] OCTET STRING OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtypeInfo2Entry {
    pub etype: ExplicitContextTag0<IntegerAsn1>,
    #[serde(default)]
    pub salt: Optional<Option<ExplicitContextTag1<KerberosStringAsn1>>>,
    #[serde(default)]
    pub s2kparams: Optional<Option<ExplicitContextTag2<OctetStringAsn1>>>,
}

/// ETYPE-INFO2              ::= SEQUENCE SIZE (1..MAX) OF ETYPE-INFO2-ENTRY
pub type EtypeInfo2 = Asn1SequenceOf<EtypeInfo2Entry>;

/// ```not_rust
/// LastReq         ::=     SEQUENCE OF SEQUENCE {
///         lr-type         [0] Int32,
///         lr-value        [1] KerberosTime
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastReqInner {
    pub lr_type: ExplicitContextTag0<IntegerAsn1>,
    pub lr_value: ExplicitContextTag1<KerberosTime>,
}

pub type LastReq = Asn1SequenceOf<LastReqInner>;

/// ```not_rust
/// TransitedEncoding       ::= SEQUENCE {
///         tr-type         [0] Int32 -- must be registered --,
///         contents        [1] OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitedEncoding {
    pub tr_type: ExplicitContextTag0<IntegerAsn1>,
    pub contents: ExplicitContextTag1<OctetStringAsn1>,
}

/// ```not_rust
/// EncTicketPart   ::= [APPLICATION 3] SEQUENCE {
///         flags                   [0] TicketFlags,
///         key                     [1] EncryptionKey,
///         crealm                  [2] Realm,
///         cname                   [3] PrincipalName,
///         transited               [4] TransitedEncoding,
///         authtime                [5] KerberosTime,
///         starttime               [6] KerberosTime OPTIONAL,
///         endtime                 [7] KerberosTime,
///         renew-till              [8] KerberosTime OPTIONAL,
///         caddr                   [9] HostAddresses OPTIONAL,
///         authorization-data      [10] AuthorizationData OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncTicketPartInner {
    pub flags: ExplicitContextTag0<KerberosFlags>,
    pub key: ExplicitContextTag1<EncryptionKey>,
    pub crealm: ExplicitContextTag2<Realm>,
    pub cname: ExplicitContextTag3<PrincipalName>,
    pub transited: ExplicitContextTag4<TransitedEncoding>,
    pub auth_time: ExplicitContextTag5<KerberosTime>,
    #[serde(default)]
    pub starttime: Optional<Option<ExplicitContextTag6<KerberosTime>>>,
    pub endtime: ExplicitContextTag7<KerberosTime>,
    #[serde(default)]
    pub renew_till: Optional<Option<ExplicitContextTag8<KerberosTime>>>,
    #[serde(default)]
    pub caddr: Optional<Option<ExplicitContextTag9<HostAddresses>>>,
    #[serde(default)]
    pub authorization_data: Optional<Option<ExplicitContextTag10<AuthorizationData>>>,
}

pub type EncTicketPart = ApplicationTag<EncTicketPartInner, 3>;

/// ```not_rust
/// Checksum        ::= SEQUENCE {
///         cksumtype       [0] Int32,
///         checksum        [1] OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checksum {
    pub checksum_type: ExplicitContextTag0<IntegerAsn1>,
    pub checksum: ExplicitContextTag1<OctetStringAsn1>,
}

/// ```not_rust
/// Authenticator   ::= [APPLICATION 2] SEQUENCE  {
///         authenticator-vno       [0] INTEGER (5),
///         crealm                  [1] Realm,
///         cname                   [2] PrincipalName,
///         cksum                   [3] Checksum OPTIONAL,
///         cusec                   [4] Microseconds,
///         ctime                   [5] KerberosTime,
///         subkey                  [6] EncryptionKey OPTIONAL,
///         seq-number              [7] UInt32 OPTIONAL,
///         authorization-data      [8] AuthorizationData OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatorInner {
    pub authenticator_vno: ExplicitContextTag0<IntegerAsn1>,
    pub crealm: ExplicitContextTag1<Realm>,
    pub cname: ExplicitContextTag2<PrincipalName>,
    #[serde(default)]
    pub cksum: Optional<Option<ExplicitContextTag3<Checksum>>>,
    pub cusec: ExplicitContextTag4<Microseconds>,
    pub ctime: ExplicitContextTag5<KerberosTime>,
    #[serde(default)]
    pub subkey: Optional<Option<ExplicitContextTag6<EncryptionKey>>>,
    #[serde(default)]
    pub seq_number: Optional<Option<ExplicitContextTag7<IntegerAsn1>>>,
    #[serde(default)]
    pub authorization_data: Optional<Option<ExplicitContextTag8<AuthorizationData>>>,
}

pub type Authenticator = ApplicationTag<AuthenticatorInner, 2>;

pub fn kerberos_string(value: &str) -> Result<KerberosStringAsn1, KdcCodecError> {
    let ia5 = IA5String::from_string(value.to_owned())
        .map_err(|_| KdcCodecError::Schema("string is not IA5"))?;

    Ok(KerberosStringAsn1::from(ia5))
}

pub fn string_value(value: &KerberosStringAsn1) -> String {
    String::from_utf8_lossy(value.0.as_bytes()).into_owned()
}

/// Minimal two's-complement DER content octets for a non-negative value.
pub fn integer_from_u32(value: u32) -> IntegerAsn1 {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);

    let mut content = Vec::with_capacity(5);
    if bytes[first] & 0x80 != 0 {
        content.push(0);
    }
    content.extend_from_slice(&bytes[first..]);

    IntegerAsn1::from(content)
}

pub fn integer_from_i32(value: i32) -> IntegerAsn1 {
    if value >= 0 {
        return integer_from_u32(value as u32);
    }

    let bytes = value.to_be_bytes();
    // a leading 0xFF is redundant while the next byte still carries the sign
    let mut first = 0;
    while first < bytes.len() - 1 && bytes[first] == 0xFF && bytes[first + 1] & 0x80 != 0 {
        first += 1;
    }

    IntegerAsn1::from(bytes[first..].to_vec())
}

pub fn integer_to_i64(value: &IntegerAsn1) -> Option<i64> {
    let bytes = &value.0;
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }

    let init: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };

    Some(bytes.iter().fold(init, |acc, b| (acc << 8) | i64::from(*b)))
}

pub fn integer_to_u32(value: &IntegerAsn1) -> Option<u32> {
    integer_to_i64(value).and_then(|value| u32::try_from(value).ok())
}

pub fn integer_to_i32(value: &IntegerAsn1) -> Option<i32> {
    integer_to_i64(value).and_then(|value| i32::try_from(value).ok())
}

/// Truncates to whole seconds, KerberosTime carries no fraction.
pub fn kerberos_time(time: OffsetDateTime) -> Result<KerberosTime, KdcCodecError> {
    let time = time.to_offset(time::UtcOffset::UTC);
    let year = u16::try_from(time.year()).map_err(|_| KdcCodecError::Schema("year out of range"))?;

    let date = GeneralizedTime::new(
        year,
        u8::from(time.month()),
        time.day(),
        time.hour(),
        time.minute(),
        time.second(),
    )
    .ok_or(KdcCodecError::Schema("invalid date"))?;

    Ok(KerberosTime::from(date))
}

pub fn time_from_kerberos(time: &KerberosTime) -> Option<OffsetDateTime> {
    let date = &time.0;

    let month = Month::try_from(date.month()).ok()?;
    let date_time = time::Date::from_calendar_date(i32::from(date.year()), month, date.day())
        .ok()?
        .with_hms(date.hour(), date.minute(), date.second())
        .ok()?;

    Some(date_time.assume_utc())
}

/// Builds a 32-bit KerberosFlags value. Bit 0 is the most significant bit of the first octet.
pub fn kerberos_flags(bits: &[usize]) -> KerberosFlags {
    let mut bytes = vec![0_u8; 4];
    for bit in bits.iter().filter(|bit| **bit < 32) {
        bytes[bit / 8] |= 0x80 >> (bit % 8);
    }

    KerberosFlags::from(BitString::with_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use time::macros::datetime;

    use super::*;
    use crate::constants::kdc_options::{FORWARDABLE, RENEWABLE_OK};
    use crate::constants::types::NT_PRINCIPAL;

    #[rstest]
    #[case(0, vec![0x00])]
    #[case(5, vec![0x05])]
    #[case(127, vec![0x7f])]
    #[case(128, vec![0x00, 0x80])]
    #[case(0x1234, vec![0x12, 0x34])]
    #[case(u32::MAX, vec![0x00, 0xff, 0xff, 0xff, 0xff])]
    fn unsigned_integers(#[case] value: u32, #[case] content: Vec<u8>) {
        let integer = integer_from_u32(value);

        assert_eq!(integer.0, content);
        assert_eq!(integer_to_u32(&integer), Some(value));
    }

    #[rstest]
    #[case(-1, vec![0xff])]
    #[case(-128, vec![0x80])]
    #[case(-129, vec![0xff, 0x7f])]
    #[case(-135, vec![0xff, 0x79])]
    #[case(18, vec![0x12])]
    fn signed_integers(#[case] value: i32, #[case] content: Vec<u8>) {
        let integer = integer_from_i32(value);

        assert_eq!(integer.0, content);
        assert_eq!(integer_to_i32(&integer), Some(value));
    }

    #[test]
    fn integer_range_checks() {
        assert_eq!(integer_to_u32(&IntegerAsn1::from(vec![0xff])), None);
        assert_eq!(integer_to_u32(&IntegerAsn1::from(vec![0x01, 0x00, 0x00, 0x00, 0x00])), None);
        assert_eq!(integer_to_i64(&IntegerAsn1::from(Vec::new())), None);
    }

    #[test]
    fn principal_name_encoding() {
        let name = PrincipalName::new(NT_PRINCIPAL, &["user"]).unwrap();

        assert_eq!(
            picky_asn1_der::to_vec(&name).unwrap(),
            vec![
                0x30, 0x11, 0xa0, 0x03, 0x02, 0x01, 0x01, 0xa1, 0x0a, 0x30, 0x08, 0x1b, 0x04, b'u', b's', b'e', b'r',
            ]
        );
        assert_eq!(name.components(), vec!["user".to_owned()]);
        assert_eq!(name.name_type(), Some(NT_PRINCIPAL));
    }

    #[test]
    fn principal_name_requires_component() {
        let empty: [&str; 0] = [];

        assert!(PrincipalName::new(NT_PRINCIPAL, &empty).is_err());
    }

    #[test]
    fn encrypted_data_omits_absent_kvno() {
        let data = EncryptedData::new(CipherSuite::Aes256CtsHmacSha196, None, vec![1, 2, 3]);

        assert_eq!(
            picky_asn1_der::to_vec(&data).unwrap(),
            vec![0x30, 0x0c, 0xa0, 0x03, 0x02, 0x01, 0x12, 0xa2, 0x05, 0x04, 0x03, 0x01, 0x02, 0x03]
        );

        let decoded: EncryptedData = picky_asn1_der::from_bytes(&picky_asn1_der::to_vec(&data).unwrap()).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(decoded.cipher_suite().unwrap(), CipherSuite::Aes256CtsHmacSha196);
    }

    #[test]
    fn unknown_etype_is_rejected() {
        let mut data = EncryptedData::new(CipherSuite::Aes128CtsHmacSha196, Some(2), vec![0]);
        data.etype = ExplicitContextTag0::from(integer_from_i32(23));

        assert!(data.cipher_suite().is_err());
    }

    #[test]
    fn time_conversion() {
        let time = datetime!(2023-05-22 8:30:45.250 UTC);

        let kerberos = kerberos_time(time).unwrap();

        assert_eq!(
            picky_asn1_der::to_vec(&kerberos).unwrap()[2..],
            b"20230522083045Z"[..]
        );
        assert_eq!(time_from_kerberos(&kerberos), Some(datetime!(2023-05-22 8:30:45 UTC)));
    }

    #[test]
    fn flags() {
        let flags = kerberos_flags(&[FORWARDABLE, RENEWABLE_OK]);

        assert_eq!(flags.0.payload_view(), &[0x40, 0x00, 0x00, 0x10]);
        assert_eq!(kerberos_flags(&[0, 40]).0.payload_view(), &[0x80, 0x00, 0x00, 0x00]);
    }
}
