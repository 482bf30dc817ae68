//! Kerberos key distribution center core
//!
//! - [crypto]: RFC 3961 simplified profile, DES3 (RFC 3961), AES-SHA1 (RFC 3962) and AES-SHA2 (RFC 8009)
//! - [messages] and [data_types]: RFC 4120 DER codec
//! - [kdc]: length-prefixed message dispatch with pluggable pre-authentication
//! - [keytab]: MIT keytab format 0x0502

pub mod constants;
pub mod crypto;
pub mod data_types;
pub mod kdc;
pub mod kdc_proxy;
pub mod keytab;
pub mod messages;

pub use kdc::{Kdc, KdcBackend, KdcConfig, KdcError};
