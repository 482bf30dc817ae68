//! MIT keytab file format, version 0x0502.
//!
//! ```not_rust
//! keytab {
//!     uint16_t file_format_version;    /* 0x0502 */
//!     keytab_entry entries[*];
//! };
//!
//! keytab_entry {
//!     int32_t size;                    /* negative for a hole */
//!     uint16_t num_components;
//!     counted_octet_string realm;
//!     counted_octet_string components[num_components];
//!     uint32_t name_type;
//!     uint32_t timestamp;
//!     uint8_t vno8;
//!     keyblock key;                    /* uint16_t type, counted_octet_string contents */
//!     uint32_t vno;                    /* optional */
//! };
//! ```
//! Integers are big-endian and counted octet strings carry a 16-bit length.

use std::io::{self, Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;
use time::OffsetDateTime;

use crate::crypto::{CipherSuite, KerberosCryptoError, ProtocolKey};
use crate::data_types::PrincipalName;

pub const KEYTAB_FORMAT_VERSION: u16 = 0x0502;

#[derive(Error, Debug)]
pub enum KeytabError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unsupported keytab format version: {0:#06x}")]
    UnsupportedVersion(u16),
    #[error("{0} does not fit in its length field")]
    TooLong(&'static str),
    #[error("timestamp is outside of the 32-bit unix time range")]
    Timestamp,
    #[error("malformed keytab entry: {0}")]
    Malformed(&'static str),
    #[error(transparent)]
    Crypto(#[from] KerberosCryptoError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeytabPrincipal {
    pub realm: String,
    pub name_type: u32,
    pub components: Vec<String>,
}

impl KeytabPrincipal {
    pub fn new(realm: impl Into<String>, name: &PrincipalName) -> Result<Self, KeytabError> {
        Ok(Self {
            realm: realm.into(),
            name_type: name.name_type().ok_or(KeytabError::Malformed("name type"))?,
            components: name.components(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeytabEntry {
    pub principal: KeytabPrincipal,
    pub timestamp: OffsetDateTime,
    /// Raw encryption type number, kept as is so unknown types survive a decode/encode cycle.
    pub key_type: u16,
    pub key: Vec<u8>,
    pub kvno: u32,
}

impl KeytabEntry {
    pub fn new(principal: KeytabPrincipal, timestamp: OffsetDateTime, key: &ProtocolKey, kvno: u32) -> Self {
        Self {
            principal,
            timestamp,
            // IANA encryption type numbers handled here are all below 0x8000
            key_type: key.cipher().etype() as u16,
            key: key.as_bytes().to_vec(),
            kvno,
        }
    }

    pub fn protocol_key(&self) -> Result<ProtocolKey, KeytabError> {
        let cipher = CipherSuite::try_from(i32::from(self.key_type))?;

        Ok(ProtocolKey::new(cipher, self.key.clone())?)
    }

    fn encode_body(&self) -> Result<Vec<u8>, KeytabError> {
        let mut body = Vec::new();

        let components_count =
            u16::try_from(self.principal.components.len()).map_err(|_| KeytabError::TooLong("component count"))?;
        body.write_u16::<BigEndian>(components_count)?;

        write_counted(&mut body, self.principal.realm.as_bytes(), "realm")?;
        for component in &self.principal.components {
            write_counted(&mut body, component.as_bytes(), "component")?;
        }

        body.write_u32::<BigEndian>(self.principal.name_type)?;

        let timestamp = u32::try_from(self.timestamp.unix_timestamp()).map_err(|_| KeytabError::Timestamp)?;
        body.write_u32::<BigEndian>(timestamp)?;

        // low 8 bits here, the full value in the trailing field
        body.write_u8(self.kvno as u8)?;

        body.write_u16::<BigEndian>(self.key_type)?;
        write_counted(&mut body, &self.key, "key")?;

        body.write_u32::<BigEndian>(self.kvno)?;

        Ok(body)
    }

    fn decode_body(body: &[u8]) -> Result<Self, KeytabError> {
        let mut reader = Cursor::new(body);

        let components_count = reader.read_u16::<BigEndian>()?;
        let realm = read_string(&mut reader)?;
        let components = (0..components_count)
            .map(|_| read_string(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        let name_type = reader.read_u32::<BigEndian>()?;
        let timestamp = OffsetDateTime::from_unix_timestamp(i64::from(reader.read_u32::<BigEndian>()?))
            .map_err(|_| KeytabError::Timestamp)?;
        let kvno8 = reader.read_u8()?;

        let key_type = reader.read_u16::<BigEndian>()?;
        let key = read_counted(&mut reader)?;

        let remaining = body.len() - reader.position() as usize;
        let kvno = if remaining >= 4 {
            match reader.read_u32::<BigEndian>()? {
                0 => u32::from(kvno8),
                kvno => kvno,
            }
        } else {
            u32::from(kvno8)
        };

        Ok(Self {
            principal: KeytabPrincipal {
                realm,
                name_type,
                components,
            },
            timestamp,
            key_type,
            key,
            kvno,
        })
    }
}

fn write_counted(mut to: impl Write, data: &[u8], field: &'static str) -> Result<(), KeytabError> {
    let length = u16::try_from(data.len()).map_err(|_| KeytabError::TooLong(field))?;

    to.write_u16::<BigEndian>(length)?;
    to.write_all(data)?;

    Ok(())
}

fn read_counted(mut from: impl Read) -> Result<Vec<u8>, KeytabError> {
    let length = from.read_u16::<BigEndian>()?;

    let mut data = vec![0; usize::from(length)];
    from.read_exact(&mut data)?;

    Ok(data)
}

fn read_string(from: impl Read) -> Result<String, KeytabError> {
    String::from_utf8(read_counted(from)?).map_err(|_| KeytabError::Malformed("string is not UTF-8"))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keytab {
    pub entries: Vec<KeytabEntry>,
}

impl Keytab {
    pub fn new(entries: Vec<KeytabEntry>) -> Self {
        Self { entries }
    }

    pub fn encode(&self, mut to: impl Write) -> Result<(), KeytabError> {
        to.write_u16::<BigEndian>(KEYTAB_FORMAT_VERSION)?;

        for entry in &self.entries {
            let body = entry.encode_body()?;
            let size = i32::try_from(body.len()).map_err(|_| KeytabError::TooLong("entry"))?;

            to.write_i32::<BigEndian>(size)?;
            to.write_all(&body)?;
        }

        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, KeytabError> {
        let mut data = Vec::new();
        self.encode(&mut data)?;

        Ok(data)
    }

    /// Reads a whole keytab. Holes left by deleted entries are skipped.
    pub fn decode(mut from: impl Read) -> Result<Self, KeytabError> {
        let version = from.read_u16::<BigEndian>()?;
        if version != KEYTAB_FORMAT_VERSION {
            return Err(KeytabError::UnsupportedVersion(version));
        }

        let mut entries = Vec::new();
        loop {
            let size = match from.read_i32::<BigEndian>() {
                Ok(size) => size,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(err) => return Err(err.into()),
            };

            if size == 0 {
                break;
            }

            // size comes from the file, never allocate more than the reader yields
            let len = u64::from(size.unsigned_abs());
            let mut body = Vec::new();
            from.by_ref().take(len).read_to_end(&mut body)?;
            if body.len() as u64 != len {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }

            if size > 0 {
                entries.push(KeytabEntry::decode_body(&body)?);
            }
        }

        Ok(Self { entries })
    }
}
