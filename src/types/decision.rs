//! Decision values returned to the card processor
//!
//! `AuthorizationDecision` doubles as the response body: absent fields are
//! omitted on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Approve,
    Decline,
}

/// Reason code attached to a decision
///
/// Business-rule declines are successful decisions, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    /// Request status was not the pending marker
    #[serde(rename = "invalid transaction")]
    InvalidRequest,
    #[serde(rename = "account-not-found")]
    AccountNotFound,
    #[serde(rename = "account-inactive")]
    AccountInactive,
    #[serde(rename = "insufficient-funds")]
    InsufficientFunds,
    #[serde(rename = "spending-control")]
    SpendingControl,
    /// Closure/update referenced no known record, or an illegal transition
    #[serde(rename = "invalid-transaction")]
    InvalidTransaction,
    #[serde(rename = "duplicate-transaction")]
    DuplicateTransaction,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "success")]
    Success,
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::InvalidRequest => "invalid transaction",
            ResponseCode::AccountNotFound => "account-not-found",
            ResponseCode::AccountInactive => "account-inactive",
            ResponseCode::InsufficientFunds => "insufficient-funds",
            ResponseCode::SpendingControl => "spending-control",
            ResponseCode::InvalidTransaction => "invalid-transaction",
            ResponseCode::DuplicateTransaction => "duplicate-transaction",
            ResponseCode::Error => "error",
            ResponseCode::Success => "success",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub authorization_id: String,
}

/// Decision emitted for one webhook delivery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ResponseCode>,
    /// Populated only on approvals that performed a balance lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_balance: Option<i64>,
    /// Populated only on approvals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    /// Populated only on rejected deliveries (bad signature, malformed body)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthorizationDecision {
    pub fn approve() -> Self {
        Self {
            action: Some(Action::Approve),
            ..Self::default()
        }
    }

    pub fn decline(code: ResponseCode) -> Self {
        Self {
            action: Some(Action::Decline),
            code: Some(code),
            ..Self::default()
        }
    }

    /// Decline without a reason code
    pub fn decline_silent() -> Self {
        Self {
            action: Some(Action::Decline),
            ..Self::default()
        }
    }

    /// Approval acknowledging a delivery already seen
    pub fn duplicate() -> Self {
        Self {
            action: Some(Action::Approve),
            code: Some(ResponseCode::DuplicateTransaction),
            ..Self::default()
        }
    }

    /// `{"code": "success"}` acknowledgement
    pub fn accepted() -> Self {
        Self {
            code: Some(ResponseCode::Success),
            ..Self::default()
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: ResponseCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_balance(mut self, available: i64, card_holder_name: impl Into<String>) -> Self {
        self.card_balance = Some(available);
        self.card_holder_name = Some(card_holder_name.into());
        self
    }

    pub fn with_metadata(mut self, authorization_id: impl Into<String>) -> Self {
        self.metadata = Some(ResponseMetadata {
            authorization_id: authorization_id.into(),
        });
        self
    }

    pub fn is_approved(&self) -> bool {
        self.action == Some(Action::Approve)
    }

    pub fn is_declined(&self) -> bool {
        self.action == Some(Action::Decline)
    }
}
