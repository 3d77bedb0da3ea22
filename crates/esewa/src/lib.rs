//! eSewa ePay v2 signing and callback verification for Thriftly
//!
//! - **Initiation**: sign `total_amount,transaction_uuid,product_code` and
//!   build the form the buyer posts to eSewa
//! - **Verification**: authenticate the base64 JSON the gateway returns,
//!   over the fields it declares signed, in the order it declares
//! - **Reconciliation**: match an authentic callback to the recorded order
//!
//! # Example
//!
//! ```rust
//! use thriftly_esewa::{Amount, CallbackVerifier, GatewayConfig, PaymentInitiator, PaymentRequest};
//!
//! let config = GatewayConfig::sandbox();
//! let initiator = PaymentInitiator::new(&config).unwrap();
//! let form = initiator
//!     .initiate(&PaymentRequest::new(Amount::from_paisa(15000)))
//!     .unwrap();
//! assert_eq!(form.field("total_amount"), Some("150.00"));
//!
//! // Persist form.transaction_uuid and form.total_amount, then redirect.
//! let verifier = CallbackVerifier::from_config(&config).unwrap();
//! assert_eq!(verifier.verify("not base64!").unwrap_err().code(), "invalid_data");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod amount;
pub mod callback;
pub mod config;
pub mod error;
pub mod failure;
pub mod initiator;
pub mod message;
pub mod reconcile;
pub mod signer;
pub mod status;
pub mod transaction;

pub use amount::Amount;
pub use callback::{CallbackHandler, CallbackPayload, CallbackRoute, CallbackVerifier, VerifiedCallback};
pub use config::{Environment, GatewayConfig};
pub use error::{ConfigError, EsewaError, EsewaResult};
pub use failure::CallbackFailure;
pub use initiator::{PaymentForm, PaymentInitiator, PaymentRequest};
pub use message::{SignedFields, OUTBOUND_SIGNED_FIELDS};
pub use reconcile::{ExpectedOrder, ReconcileError};
pub use signer::{sign_message, Signature, Signer};
pub use status::{StatusQuery, StatusResponse, TransactionStatus};
pub use transaction::TransactionUuid;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Amount, CallbackFailure, CallbackHandler, CallbackRoute, CallbackVerifier, ExpectedOrder,
        GatewayConfig, PaymentForm, PaymentInitiator, PaymentRequest, SignedFields, Signer,
        TransactionUuid,
    };
}
