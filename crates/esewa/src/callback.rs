//! Gateway callback verification.
//!
//! After payment eSewa redirects the buyer back with `?data=<base64 JSON>`.
//! The JSON carries `signed_field_names` and `signature`; nothing in it is
//! trusted until the signature has been recomputed over the declared
//! fields, in the declared order, and matched.
//!
//! ```text
//! decode base64 ─► parse JSON ─► control fields ─► rebuild message ─► sign ─► compare
//!   invalid_data    invalid_data  missing_signature   invalid_data              invalid_signature
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::GatewayConfig;
use crate::error::ConfigError;
use crate::failure::CallbackFailure;
use crate::message::SignedFields;
use crate::signer::Signer;
use crate::status::TransactionStatus;

const SIGNED_FIELD_NAMES: &str = "signed_field_names";
const SIGNATURE: &str = "signature";

/// Decoded callback JSON
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    /// Comma-separated names of the signed fields, in signing order
    #[serde(default)]
    pub signed_field_names: Option<String>,
    /// Base64 HMAC-SHA256 computed by the gateway
    #[serde(default)]
    pub signature: Option<String>,
    /// Every other field
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CallbackPayload {
    /// Decode a base64 JSON envelope
    ///
    /// # Errors
    /// [`CallbackFailure::InvalidData`] when either step fails.
    pub fn decode(envelope: &str) -> Result<Self, CallbackFailure> {
        let bytes = thriftly_crypto::decode_base64_lenient(envelope)
            .map_err(|e| CallbackFailure::InvalidData(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| CallbackFailure::InvalidData(e.to_string()))
    }

    /// Render a declared field as it was signed.
    ///
    /// Strings are used verbatim, numbers and booleans as their JSON text.
    /// Absent, null or structured values cannot have been signed.
    fn signed_value(&self, name: &str) -> Result<String, CallbackFailure> {
        let value = match name {
            SIGNED_FIELD_NAMES => self.signed_field_names.clone().map(Value::String),
            SIGNATURE => self.signature.clone().map(Value::String),
            _ => self.fields.get(name).cloned(),
        };
        match value {
            Some(Value::String(s)) => Ok(s),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(_) => Err(CallbackFailure::InvalidData(format!(
                "signed field '{name}' is not a scalar"
            ))),
            None => Err(CallbackFailure::InvalidData(format!(
                "signed field '{name}' is missing"
            ))),
        }
    }

    /// String or numeric field as text, signed or not.
    ///
    /// Unsigned values are unauthenticated; use
    /// [`VerifiedCallback::signed`] for anything that drives fulfilment.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A callback whose signature checked out.
///
/// Authentic only means the gateway produced it; it still has to be
/// reconciled against the recorded order before fulfilment.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    payload: CallbackPayload,
    signed: SignedFields,
}

impl VerifiedCallback {
    /// Fields covered by the signature, in signing order
    #[must_use]
    pub fn signed_fields(&self) -> &SignedFields {
        &self.signed
    }

    /// Full decoded payload
    #[must_use]
    pub fn payload(&self) -> &CallbackPayload {
        &self.payload
    }

    /// A field value, only if it was covered by the signature
    #[must_use]
    pub fn signed(&self, name: &str) -> Option<&str> {
        self.signed.get(name)
    }

    /// `transaction_uuid`, if signed
    #[must_use]
    pub fn transaction_uuid(&self) -> Option<&str> {
        self.signed("transaction_uuid")
    }

    /// `total_amount` as sent, if signed
    #[must_use]
    pub fn total_amount(&self) -> Option<&str> {
        self.signed("total_amount")
    }

    /// `transaction_code` (gateway reference), if signed
    #[must_use]
    pub fn transaction_code(&self) -> Option<&str> {
        self.signed("transaction_code")
    }

    /// `product_code`, if signed
    #[must_use]
    pub fn product_code(&self) -> Option<&str> {
        self.signed("product_code")
    }

    /// `status`, if signed
    #[must_use]
    pub fn status(&self) -> Option<TransactionStatus> {
        self.signed("status").map(TransactionStatus::parse)
    }
}

/// Verifies callback envelopes for one merchant secret
#[derive(Debug)]
pub struct CallbackVerifier {
    signer: Signer,
}

impl CallbackVerifier {
    /// Create a verifier around a signer
    #[must_use]
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    /// Create from gateway configuration
    ///
    /// # Errors
    /// [`ConfigError::MissingSecret`] for an empty secret.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Signer::from_config(config)?))
    }

    /// Verify a base64 JSON envelope
    ///
    /// # Errors
    /// The [`CallbackFailure`] for the first step that rejects.
    pub fn verify(&self, envelope: &str) -> Result<VerifiedCallback, CallbackFailure> {
        let result = CallbackPayload::decode(envelope).and_then(|p| self.verify_payload(p));
        record_outcome(&result);
        result
    }

    /// Verify an already decoded payload
    ///
    /// # Errors
    /// [`CallbackFailure::MissingSignature`], [`CallbackFailure::InvalidData`],
    /// [`CallbackFailure::InvalidSignature`] or
    /// [`CallbackFailure::VerificationFailed`].
    pub fn verify_payload(
        &self,
        payload: CallbackPayload,
    ) -> Result<VerifiedCallback, CallbackFailure> {
        let (names, received) = match (&payload.signed_field_names, &payload.signature) {
            (Some(names), Some(sig)) if !names.trim().is_empty() && !sig.is_empty() => {
                (names.clone(), sig.clone())
            }
            _ => return Err(CallbackFailure::MissingSignature),
        };

        let mut signed = SignedFields::new();
        for name in names.split(',').map(str::trim) {
            if name.is_empty() {
                return Err(CallbackFailure::InvalidData(
                    "empty name in signed_field_names".to_string(),
                ));
            }
            signed.push(name, payload.signed_value(name)?);
        }

        let expected = self
            .signer
            .sign_fields(&signed)
            .map_err(|e| CallbackFailure::VerificationFailed(e.to_string()))?;

        if !expected.matches(&received) {
            return Err(CallbackFailure::InvalidSignature);
        }

        Ok(VerifiedCallback { payload, signed })
    }
}

fn record_outcome(result: &Result<VerifiedCallback, CallbackFailure>) {
    match result {
        Ok(callback) => {
            metrics::counter!("esewa_callbacks_total", "outcome" => "accepted").increment(1);
            tracing::info!(
                transaction_uuid = callback.transaction_uuid().unwrap_or_default(),
                transaction_code = callback.transaction_code().unwrap_or_default(),
                "eSewa callback verified"
            );
        }
        Err(failure) => {
            metrics::counter!("esewa_callbacks_total", "outcome" => failure.code()).increment(1);
            if failure.is_fraud_signal() {
                tracing::warn!(code = failure.code(), fraud_signal = true, "eSewa callback rejected");
            } else {
                tracing::info!(code = failure.code(), error = %failure, "eSewa callback rejected");
            }
        }
    }
}

/// Which return URL the gateway sent the buyer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackRoute {
    /// `success_url`
    Success,
    /// `failure_url`: cancelled or failed at the gateway
    Failure,
}

/// Entry point for return-URL requests
#[derive(Debug)]
pub struct CallbackHandler {
    verifier: CallbackVerifier,
}

impl CallbackHandler {
    /// Create a handler
    #[must_use]
    pub fn new(verifier: CallbackVerifier) -> Self {
        Self { verifier }
    }

    /// Handle a return request given its raw query string.
    ///
    /// # Errors
    /// [`CallbackFailure::UserCancelled`] on the failure route,
    /// [`CallbackFailure::MissingData`] without a `data` parameter, otherwise
    /// whatever [`CallbackVerifier::verify`] reports.
    pub fn handle(&self, route: CallbackRoute, query: &str) -> Result<VerifiedCallback, CallbackFailure> {
        if route == CallbackRoute::Failure {
            metrics::counter!("esewa_callbacks_total", "outcome" => "user_cancelled").increment(1);
            tracing::info!("eSewa payment cancelled by user");
            return Err(CallbackFailure::UserCancelled);
        }

        match data_param(query) {
            Some(data) => self.verifier.verify(&data),
            None => {
                metrics::counter!("esewa_callbacks_total", "outcome" => "missing_data").increment(1);
                Err(CallbackFailure::MissingData)
            }
        }
    }
}

/// Extract the `data` parameter.
///
/// Form decoding turns an unescaped `+` into a space; base64 never contains
/// spaces, so they are turned back.
fn data_param(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "data")
        .map(|(_, v)| v.replace(' ', "+"))
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::sign_message;
    use proptest::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;

    const SECRET: &str = "testsecret";

    fn verifier() -> CallbackVerifier {
        CallbackVerifier::new(Signer::new(SecretString::new(SECRET.to_string())).unwrap())
    }

    fn encode(value: &Value) -> String {
        thriftly_crypto::encode_base64(value.to_string().as_bytes())
    }

    /// A callback shaped like the gateway's, signed with `SECRET`
    fn signed_callback(total_amount: &str) -> Value {
        let names = "transaction_code,status,total_amount,transaction_uuid,product_code,signed_field_names";
        let message = format!(
            "transaction_code=000AWEO,status=COMPLETE,total_amount={total_amount},\
             transaction_uuid=250610-162413,product_code=EPAYTEST,signed_field_names={names}"
        );
        json!({
            "transaction_code": "000AWEO",
            "status": "COMPLETE",
            "total_amount": total_amount,
            "transaction_uuid": "250610-162413",
            "product_code": "EPAYTEST",
            "signed_field_names": names,
            "signature": sign_message(SECRET, &message).unwrap().to_string(),
        })
    }

    #[test]
    fn test_accepts_gateway_shaped_callback() {
        let callback = verifier().verify(&encode(&signed_callback("1000.0"))).unwrap();
        assert_eq!(callback.transaction_uuid(), Some("250610-162413"));
        assert_eq!(callback.transaction_code(), Some("000AWEO"));
        assert_eq!(callback.status(), Some(TransactionStatus::Complete));
        assert_eq!(callback.signed_fields().len(), 6);
    }

    #[test]
    fn test_scenario_accept_then_reject_changed_amount() {
        let message = "total_amount=100.00,transaction_uuid=txn_123,product_code=EPAYTEST";
        let sig = sign_message(SECRET, message).unwrap();
        assert_eq!(sig.as_str(), "mJwuBkWqHLbgo/foVh9PaHRtQCAHkjzE8SRJsBcYykM=");

        let mut body = json!({
            "total_amount": "100.00",
            "transaction_uuid": "txn_123",
            "product_code": "EPAYTEST",
            "signed_field_names": "total_amount,transaction_uuid,product_code",
            "signature": sig.to_string(),
        });
        assert!(verifier().verify(&encode(&body)).is_ok());

        body["total_amount"] = json!("100.01");
        assert_eq!(
            verifier().verify(&encode(&body)).unwrap_err(),
            CallbackFailure::InvalidSignature
        );
    }

    #[test]
    fn test_unsigned_fields_stay_out_of_signed_view() {
        let mut body = signed_callback("1000.0");
        body["buyer_note"] = json!("leave at door");
        body["ref_id"] = json!(42);
        let callback = verifier().verify(&encode(&body)).unwrap();

        assert_eq!(
            callback.payload().get("buyer_note").as_deref(),
            Some("leave at door")
        );
        assert_eq!(callback.payload().get("ref_id").as_deref(), Some("42"));
        assert_eq!(callback.payload().get("absent"), None);
        assert_eq!(callback.signed("buyer_note"), None);
        assert_eq!(callback.signed("status"), Some("COMPLETE"));
    }

    #[test]
    fn test_declared_order_is_authoritative() {
        let message = "product_code=EPAYTEST,total_amount=100.00";
        let body = json!({
            "total_amount": "100.00",
            "product_code": "EPAYTEST",
            "signed_field_names": "product_code, total_amount",
            "signature": sign_message(SECRET, message).unwrap().to_string(),
        });
        let callback = verifier().verify(&encode(&body)).unwrap();
        assert_eq!(callback.signed_fields().message(), message);
    }

    #[test]
    fn test_swapped_declared_order_rejects() {
        let body = json!({
            "a": "1",
            "b": "2",
            "signed_field_names": "b,a",
            "signature": sign_message(SECRET, "a=1,b=2").unwrap().to_string(),
        });
        assert_eq!(
            verifier().verify(&encode(&body)).unwrap_err(),
            CallbackFailure::InvalidSignature
        );
    }

    #[test]
    fn test_numeric_values_use_json_text() {
        let body = json!({
            "total_amount": 100.5,
            "signed_field_names": "total_amount",
            "signature": sign_message(SECRET, "total_amount=100.5").unwrap().to_string(),
        });
        assert!(verifier().verify(&encode(&body)).is_ok());
    }

    #[test]
    fn test_missing_signature() {
        let mut body = signed_callback("100.0");
        body.as_object_mut().unwrap().remove("signature");
        assert_eq!(
            verifier().verify(&encode(&body)).unwrap_err(),
            CallbackFailure::MissingSignature
        );
    }

    #[test]
    fn test_missing_signed_field_names() {
        let mut body = signed_callback("100.0");
        body.as_object_mut().unwrap().remove("signed_field_names");
        assert_eq!(
            verifier().verify(&encode(&body)).unwrap_err(),
            CallbackFailure::MissingSignature
        );
    }

    #[test]
    fn test_null_control_field_is_missing() {
        let mut body = signed_callback("100.0");
        body["signature"] = Value::Null;
        assert_eq!(
            verifier().verify(&encode(&body)).unwrap_err(),
            CallbackFailure::MissingSignature
        );
    }

    #[test]
    fn test_declared_field_absent_is_invalid_data() {
        let mut body = signed_callback("100.0");
        body.as_object_mut().unwrap().remove("status");
        assert!(matches!(
            verifier().verify(&encode(&body)).unwrap_err(),
            CallbackFailure::InvalidData(_)
        ));
    }

    #[test]
    fn test_malformed_envelopes() {
        let envelopes = [
            "%%%not-base64%%%".to_string(),
            thriftly_crypto::encode_base64(b"not json"),
            thriftly_crypto::encode_base64(b"[1,2,3]"),
        ];
        for envelope in &envelopes {
            assert_eq!(verifier().verify(envelope).unwrap_err().code(), "invalid_data");
        }
    }

    #[test]
    fn test_tampered_signature_rejects() {
        let mut body = signed_callback("100.0");
        body["signature"] = json!("AAAA");
        assert_eq!(
            verifier().verify(&encode(&body)).unwrap_err(),
            CallbackFailure::InvalidSignature
        );
    }

    #[test]
    fn test_wrong_secret_rejects() {
        let other = CallbackVerifier::new(Signer::new(SecretString::new("other".into())).unwrap());
        assert_eq!(
            other.verify(&encode(&signed_callback("100.0"))).unwrap_err(),
            CallbackFailure::InvalidSignature
        );
    }

    #[test]
    fn test_handler_routes() {
        let handler = CallbackHandler::new(verifier());
        let envelope = encode(&signed_callback("100.0"));

        assert_eq!(
            handler.handle(CallbackRoute::Failure, &format!("data={envelope}")).unwrap_err(),
            CallbackFailure::UserCancelled
        );
        assert_eq!(
            handler.handle(CallbackRoute::Success, "").unwrap_err(),
            CallbackFailure::MissingData
        );
        assert_eq!(
            handler.handle(CallbackRoute::Success, "?data=").unwrap_err(),
            CallbackFailure::MissingData
        );
        assert!(handler
            .handle(CallbackRoute::Success, &format!("?data={envelope}"))
            .is_ok());
    }

    #[test]
    fn test_data_param_restores_plus() {
        assert_eq!(data_param("data=ab+cd%3D").as_deref(), Some("ab+cd="));
        assert_eq!(data_param("?x=1&data=abc").as_deref(), Some("abc"));
        assert_eq!(data_param("x=1"), None);
    }

    proptest! {
        #[test]
        fn prop_round_trip_accepts(
            values in proptest::collection::vec("[A-Za-z0-9._-]{0,12}", 1..6)
        ) {
            let mut body = Map::new();
            let mut fields = SignedFields::new();
            for (i, v) in values.iter().enumerate() {
                let name = format!("f{i}");
                body.insert(name.clone(), json!(v));
                fields.push(name, v.clone());
            }
            body.insert("signed_field_names".into(), json!(fields.field_names()));
            body.insert(
                "signature".into(),
                json!(sign_message(SECRET, &fields.message()).unwrap().to_string()),
            );
            prop_assert!(verifier().verify(&encode(&Value::Object(body))).is_ok());
        }

        #[test]
        fn prop_single_character_tamper_rejects(
            value in "[A-Za-z0-9]{1,12}",
            index in any::<proptest::sample::Index>(),
            replacement in "[A-Za-z0-9]",
        ) {
            let sig = sign_message(SECRET, &format!("v={value}")).unwrap().to_string();
            let mut chars: Vec<char> = value.chars().collect();
            let i = index.index(chars.len());
            let new_char = replacement.chars().next().unwrap();
            prop_assume!(chars[i] != new_char);
            chars[i] = new_char;
            let tampered: String = chars.into_iter().collect();

            let body = json!({"v": tampered, "signed_field_names": "v", "signature": sig});
            prop_assert_eq!(
                verifier().verify(&encode(&body)).unwrap_err(),
                CallbackFailure::InvalidSignature
            );
        }

        #[test]
        fn prop_signature_tamper_rejects(
            index in any::<proptest::sample::Index>(),
            replacement in "[A-Za-z0-9+/]",
        ) {
            let sig = sign_message(SECRET, "v=1").unwrap().to_string();
            let mut chars: Vec<char> = sig.chars().collect();
            let i = index.index(chars.len());
            let new_char = replacement.chars().next().unwrap();
            prop_assume!(chars[i] != new_char);
            chars[i] = new_char;
            let tampered: String = chars.into_iter().collect();

            let body = json!({"v": "1", "signed_field_names": "v", "signature": tampered});
            prop_assert_eq!(
                verifier().verify(&encode(&body)).unwrap_err(),
                CallbackFailure::InvalidSignature
            );
        }
    }
}
