//! Outbound payment initiation
//!
//! Produces the signed ePay v2 form a buyer's browser posts to eSewa. The
//! caller must persist [`PaymentForm::transaction_uuid`] and
//! [`PaymentForm::total_amount`] before redirecting, so the callback can be
//! reconciled later.

use serde::Serialize;

use crate::amount::Amount;
use crate::config::GatewayConfig;
use crate::error::{ConfigError, EsewaResult};
use crate::message::SignedFields;
use crate::signer::{Signature, Signer};
use crate::transaction::TransactionUuid;

/// What the buyer is paying for
#[derive(Debug, Clone, Default)]
pub struct PaymentRequest {
    /// Item amount before tax and charges
    pub amount: Amount,
    /// Tax amount
    pub tax_amount: Amount,
    /// Service charge
    pub product_service_charge: Amount,
    /// Delivery charge
    pub product_delivery_charge: Amount,
    /// Unsigned extra fields (buyer name, email, shipping info)
    pub extra_fields: Vec<(String, String)>,
}

impl PaymentRequest {
    /// Request for `amount` with no tax or charges
    #[must_use]
    pub fn new(amount: Amount) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }

    /// Builder-style method to set tax
    #[must_use]
    pub fn with_tax(mut self, tax: Amount) -> Self {
        self.tax_amount = tax;
        self
    }

    /// Builder-style method to set the service charge
    #[must_use]
    pub fn with_service_charge(mut self, charge: Amount) -> Self {
        self.product_service_charge = charge;
        self
    }

    /// Builder-style method to set the delivery charge
    #[must_use]
    pub fn with_delivery_charge(mut self, charge: Amount) -> Self {
        self.product_delivery_charge = charge;
        self
    }

    /// Builder-style method to add an unsigned display field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.push((name.into(), value.into()));
        self
    }

    /// Sum of amount, tax and charges
    ///
    /// # Errors
    /// Overflow.
    pub fn total(&self) -> EsewaResult<Amount> {
        self.amount
            .checked_add(self.tax_amount)?
            .checked_add(self.product_service_charge)?
            .checked_add(self.product_delivery_charge)
    }
}

/// A signed form ready to post to the gateway
#[derive(Debug, Clone, Serialize)]
pub struct PaymentForm {
    /// Form action URL
    pub action: String,
    /// Fields in posting order
    pub fields: Vec<(String, String)>,
    /// Id to persist with the order
    pub transaction_uuid: TransactionUuid,
    /// Amount to persist with the order
    #[serde(serialize_with = "serialize_display")]
    pub total_amount: Amount,
    /// Signature over the three signed fields
    pub signature: Signature,
}

fn serialize_display<S: serde::Serializer>(amount: &Amount, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(amount)
}

impl PaymentForm {
    /// Value of a form field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render a self-submitting HTML form
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<body onload=\"document.forms[0].submit()\">\n");
        html.push_str(&format!(
            "<form method=\"POST\" action=\"{}\">\n",
            escape_html(&self.action)
        ));
        for (name, value) in &self.fields {
            html.push_str(&format!(
                "  <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                escape_html(name),
                escape_html(value)
            ));
        }
        html.push_str("  <noscript><button type=\"submit\">Continue to eSewa</button></noscript>\n");
        html.push_str("</form>\n</body>\n</html>\n");
        html
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Builds signed payment forms for one merchant
#[derive(Debug)]
pub struct PaymentInitiator {
    signer: Signer,
    product_code: String,
    form_url: String,
    success_url: String,
    failure_url: String,
}

impl PaymentInitiator {
    /// Create from validated configuration
    ///
    /// # Errors
    /// Any [`GatewayConfig::validate`] failure.
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            signer: Signer::from_config(config)?,
            product_code: config.product_code.clone(),
            form_url: config.form_url.clone(),
            success_url: config.success_url.clone(),
            failure_url: config.failure_url.clone(),
        })
    }

    /// Start a payment attempt with a fresh transaction id
    ///
    /// # Errors
    /// Amount overflow.
    pub fn initiate(&self, request: &PaymentRequest) -> EsewaResult<PaymentForm> {
        self.initiate_with_uuid(request, TransactionUuid::generate())
    }

    fn initiate_with_uuid(
        &self,
        request: &PaymentRequest,
        transaction_uuid: TransactionUuid,
    ) -> EsewaResult<PaymentForm> {
        let total_amount = request.total()?;
        let signed = SignedFields::outbound(total_amount, &transaction_uuid, &self.product_code);
        let signature = self.signer.sign_fields(&signed)?;

        let mut fields: Vec<(String, String)> = vec![
            ("amount".into(), request.amount.to_string()),
            ("tax_amount".into(), request.tax_amount.to_string()),
            ("total_amount".into(), total_amount.to_string()),
            ("transaction_uuid".into(), transaction_uuid.to_string()),
            ("product_code".into(), self.product_code.clone()),
            (
                "product_service_charge".into(),
                request.product_service_charge.to_string(),
            ),
            (
                "product_delivery_charge".into(),
                request.product_delivery_charge.to_string(),
            ),
            ("success_url".into(), self.success_url.clone()),
            ("failure_url".into(), self.failure_url.clone()),
            ("signed_field_names".into(), signed.field_names()),
            ("signature".into(), signature.to_string()),
        ];
        fields.extend(request.extra_fields.iter().cloned());

        metrics::counter!("esewa_payments_initiated_total").increment(1);
        tracing::debug!(
            transaction_uuid = %transaction_uuid,
            total_amount = %total_amount,
            product_code = %self.product_code,
            "eSewa payment initiated"
        );

        Ok(PaymentForm {
            action: self.form_url.clone(),
            fields,
            transaction_uuid,
            total_amount,
            signature,
        })
    }
}
