use crate::crypto::ProtocolKey;
use crate::data_types::PrincipalName;
use crate::messages::{ApReq, AsRep, AsReq, TgsRep, TgsReq};

use super::KdcError;

/// Long-term key of a client principal together with the string-to-key inputs advertised in ETYPE-INFO2.
#[derive(Debug, Clone)]
pub struct ClientKey {
    pub key: ProtocolKey,
    pub salt: String,
    /// `None` means the encryption type default.
    pub s2kparams: Option<String>,
    pub kvno: Option<u32>,
}

/// AS exchange that passed etype negotiation and pre-authentication.
#[derive(Debug)]
pub struct AsExchange<'a> {
    pub as_req: &'a AsReq,
    /// Key of the negotiated encryption type, the reply enc-part must be encrypted with it.
    pub client_key: &'a ClientKey,
    pub pre_authenticated: bool,
}

#[derive(Debug)]
pub struct TgsExchange<'a> {
    pub tgs_req: &'a TgsReq,
    /// AP-REQ carried in PA-TGS-REQ, its ticket is the one presented by the client.
    pub ap_req: &'a ApReq,
}

/// Principal database and ticket issuance policy.
///
/// Errors returned here are forwarded to the client as KRB-ERROR replies, use [KdcError::protocol] to pick the
/// error code.
pub trait KdcBackend: Send + Sync {
    /// Keys of `cname`, an empty list when the principal is unknown.
    fn client_keys(&self, realm: &str, cname: &PrincipalName) -> Result<Vec<ClientKey>, KdcError>;

    fn as_exchange(&self, exchange: AsExchange<'_>) -> Result<AsRep, KdcError>;

    fn tgs_exchange(&self, exchange: TgsExchange<'_>) -> Result<TgsRep, KdcError>;
}
