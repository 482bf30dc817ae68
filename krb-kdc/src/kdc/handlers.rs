use log::debug;
use picky_asn1::wrapper::{
    Asn1SequenceOf, ExplicitContextTag0, ExplicitContextTag1, ExplicitContextTag2, OctetStringAsn1, Optional,
};
use time::OffsetDateTime;

use crate::constants::error_codes::{
    KDC_ERR_C_PRINCIPAL_UNKNOWN, KDC_ERR_ETYPE_NOSUPP, KDC_ERR_PADATA_TYPE_NOSUPP, KDC_ERR_PREAUTH_REQUIRED,
    KDC_ERR_S_PRINCIPAL_UNKNOWN, KDC_ERR_WRONG_REALM, KRB_AP_ERR_MSG_TYPE,
};
use crate::constants::pa_types::{PA_ETYPE_INFO2, PA_TGS_REQ};
use crate::crypto::common::parse_iteration_count;
use crate::crypto::CipherSuite;
use crate::data_types::{integer_from_i32, kerberos_string, string_value, EtypeInfo2Entry, PaData};
use crate::messages::{decode_ap_req, decode_kdc_req, to_der, KdcReq, KdcReqBody, KdcRequest};

use super::preauth::{PreAuthContext, PreAuthRegistry};
use super::{AsExchange, ClientKey, KdcBackend, KdcConfig, KdcError, TgsExchange};

/// Everything a handler may consult while answering one request.
pub struct HandlerContext<'a> {
    pub config: &'a KdcConfig,
    pub backend: &'a dyn KdcBackend,
    pub pre_auth: &'a PreAuthRegistry,
    pub now: OffsetDateTime,
}

/// Answers one message type. `message` is the DER PDU without its length prefix, the reply is a DER PDU as well.
pub trait MessageHandler: Send + Sync {
    fn process_message(&self, context: &HandlerContext<'_>, message: &[u8]) -> Result<Vec<u8>, KdcError>;
}

fn check_realm(context: &HandlerContext<'_>, body: &KdcReqBody) -> Result<String, KdcError> {
    let realm = string_value(&body.realm.0);

    if realm != context.config.realm {
        return Err(KdcError::protocol(
            KDC_ERR_WRONG_REALM,
            format!("realm {} is not served here", realm),
        ));
    }

    Ok(realm)
}

fn unexpected_message(expected: &str, request: &KdcRequest) -> KdcError {
    KdcError::protocol(
        KRB_AP_ERR_MSG_TYPE,
        format!("expected {}, got message type {}", expected, request.msg_type()),
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AsReqHandler;

impl AsReqHandler {
    /// Client keys whose encryption type is enabled in the configuration. Nothing else may be used for
    /// pre-authentication or for the reply.
    fn enabled_keys(config: &KdcConfig, client_keys: Vec<ClientKey>) -> Vec<ClientKey> {
        client_keys
            .into_iter()
            .filter(|client_key| config.supports(client_key.key.cipher()))
            .collect()
    }

    /// First requested etype the client has an enabled key for.
    fn negotiate_etype<'k>(requested: &[i32], client_keys: &'k [ClientKey]) -> Result<&'k ClientKey, KdcError> {
        requested
            .iter()
            .filter_map(|etype| CipherSuite::try_from(*etype).ok())
            .find_map(|cipher| client_keys.iter().find(|client_key| client_key.key.cipher() == cipher))
            .ok_or_else(|| KdcError::protocol(KDC_ERR_ETYPE_NOSUPP, "no common encryption type"))
    }

    /// Runs every registered handler whose padata-type is present. Unknown padata is ignored.
    fn pre_authenticate(
        context: &HandlerContext<'_>,
        kdc_req: &KdcReq,
        client_keys: &[ClientKey],
    ) -> Result<bool, KdcError> {
        let pre_auth_context = PreAuthContext {
            client_keys,
            now: context.now,
            max_clock_skew: context.config.max_clock_skew(),
        };

        let mut pre_authenticated = false;
        for padata in kdc_req.padata() {
            let padata_type = match padata.padata_type() {
                Some(padata_type) => padata_type,
                None => continue,
            };

            match context.pre_auth.handler(padata_type) {
                Some(handler) => {
                    handler.verify(&pre_auth_context, padata)?;
                    pre_authenticated = true;
                }
                None => debug!("ignoring padata type {}", padata_type),
            }
        }

        Ok(pre_authenticated)
    }

    fn etype_info2_entry(client_key: &ClientKey) -> Result<EtypeInfo2Entry, KdcError> {
        let s2kparams = client_key
            .s2kparams
            .as_deref()
            .map(parse_iteration_count)
            .transpose()?
            .map(|iterations| ExplicitContextTag2::from(OctetStringAsn1::from(iterations.to_be_bytes().to_vec())));

        Ok(EtypeInfo2Entry {
            etype: ExplicitContextTag0::from(integer_from_i32(client_key.key.cipher().etype())),
            salt: Optional::from(Some(ExplicitContextTag1::from(kerberos_string(&client_key.salt)?))),
            s2kparams: Optional::from(s2kparams),
        })
    }

    /// KDC_ERR_PREAUTH_REQUIRED carrying the salts of the usable client keys and the accepted padata types.
    fn pre_auth_required(
        context: &HandlerContext<'_>,
        requested: &[i32],
        client_keys: &[ClientKey],
    ) -> Result<KdcError, KdcError> {
        let mut etype_info2 = Vec::new();
        for cipher in requested.iter().filter_map(|etype| CipherSuite::try_from(*etype).ok()) {
            if let Some(client_key) = client_keys.iter().find(|client_key| client_key.key.cipher() == cipher) {
                etype_info2.push(Self::etype_info2_entry(client_key)?);
            }
        }

        let mut method_data = vec![PaData::new(
            PA_ETYPE_INFO2,
            to_der(&Asn1SequenceOf::from(etype_info2))?,
        )];
        method_data.extend(
            context
                .pre_auth
                .padata_types()
                .filter_map(|padata_type| context.pre_auth.handler(padata_type))
                .map(|handler| handler.hint()),
        );

        Ok(KdcError::Protocol {
            code: KDC_ERR_PREAUTH_REQUIRED,
            message: "pre-authentication required".to_owned(),
            e_data: Some(to_der(&Asn1SequenceOf::from(method_data))?),
        })
    }
}

impl MessageHandler for AsReqHandler {
    fn process_message(&self, context: &HandlerContext<'_>, message: &[u8]) -> Result<Vec<u8>, KdcError> {
        let as_req = match decode_kdc_req(message)? {
            KdcRequest::As(as_req) => as_req,
            other => return Err(unexpected_message("AS-REQ", &other)),
        };
        let body = &as_req.0.req_body.0;

        let realm = check_realm(context, body)?;
        let cname = body
            .cname
            .0
            .as_ref()
            .map(|cname| &cname.0)
            .ok_or_else(|| KdcError::protocol(KDC_ERR_C_PRINCIPAL_UNKNOWN, "AS-REQ without cname"))?;

        let client_keys = context.backend.client_keys(&realm, cname)?;
        if client_keys.is_empty() {
            return Err(KdcError::protocol(
                KDC_ERR_C_PRINCIPAL_UNKNOWN,
                format!("unknown client {}@{}", cname.to_unparsed_name(), realm),
            ));
        }

        let client_keys = Self::enabled_keys(context.config, client_keys);
        let requested = body.etypes();
        let client_key = Self::negotiate_etype(&requested, &client_keys)?;
        debug!(
            "AS-REQ for {}@{} negotiated {}",
            cname.to_unparsed_name(),
            realm,
            client_key.key.cipher()
        );

        let pre_authenticated = Self::pre_authenticate(context, &as_req.0, &client_keys)?;
        if !pre_authenticated && context.config.require_preauth && !context.pre_auth.is_empty() {
            return Err(Self::pre_auth_required(context, &requested, &client_keys)?);
        }

        let as_rep = context.backend.as_exchange(AsExchange {
            as_req: &as_req,
            client_key,
            pre_authenticated,
        })?;

        Ok(to_der(&as_rep)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TgsReqHandler;

impl MessageHandler for TgsReqHandler {
    fn process_message(&self, context: &HandlerContext<'_>, message: &[u8]) -> Result<Vec<u8>, KdcError> {
        let tgs_req = match decode_kdc_req(message)? {
            KdcRequest::Tgs(tgs_req) => tgs_req,
            other => return Err(unexpected_message("TGS-REQ", &other)),
        };
        let body = &tgs_req.0.req_body.0;

        check_realm(context, body)?;

        if body.sname.0.is_none() {
            return Err(KdcError::protocol(KDC_ERR_S_PRINCIPAL_UNKNOWN, "TGS-REQ without sname"));
        }

        let padata = tgs_req
            .0
            .find_padata(PA_TGS_REQ)
            .ok_or_else(|| KdcError::protocol(KDC_ERR_PADATA_TYPE_NOSUPP, "TGS-REQ without PA-TGS-REQ"))?;
        let ap_req = decode_ap_req(&padata.padata_data.0 .0)?;

        let tgs_rep = context.backend.tgs_exchange(TgsExchange {
            tgs_req: &tgs_req,
            ap_req: &ap_req,
        })?;

        Ok(to_der(&tgs_rep)?)
    }
}
