//! Webhook envelope decoding and routing
//!
//! A delivery is processed in three stages:
//!
//! 1. the signature is verified over the raw bytes
//! 2. the outer envelope `{event, data, metadata}` is decoded, leaving `data`
//!    as raw JSON
//! 3. `data` is decoded into the payload type selected by `event`, and the
//!    typed event is routed to the matching engine entry point
//!
//! Routing itself holds no state. `WebhookProcessor::respond` turns every
//! outcome, including failures, into the status and body sent back to the
//! processor.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::{debug, warn};

use super::engine::{AuthorizationEngine, EngineContext};
use super::signature::SignatureVerifier;
use crate::config::EngineConfig;
use crate::types::error::Result;
use crate::types::{AuthError, AuthorizationDecision, EnvelopeMetadata, EventKind, TypedEvent};

/// Outer structure of every delivery
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "event")]
    pub kind: String,
    #[serde(rename = "data")]
    pub payload: Box<RawValue>,
    #[serde(default)]
    pub metadata: EnvelopeMetadata,
}

/// Decode the outer envelope, leaving the payload undecoded
///
/// Fails with `MalformedPayload` when the body is not an envelope or names
/// no event kind.
pub fn decode_envelope(raw_body: &[u8]) -> Result<Envelope> {
    let envelope: Envelope = serde_json::from_slice(raw_body)?;
    if envelope.kind.trim().is_empty() {
        return Err(AuthError::malformed("event kind is empty"));
    }
    Ok(envelope)
}

/// Decode a payload into the event type named by `kind`
pub fn decode_payload(kind: &str, payload: &RawValue) -> Result<TypedEvent> {
    let kind: EventKind = kind
        .parse()
        .map_err(|unknown: String| AuthError::unknown_event_kind(&unknown))?;

    let raw = payload.get();
    let event = match kind {
        EventKind::TransactionCreated => {
            TypedEvent::TransactionCreated(serde_json::from_str(raw)?)
        }
        EventKind::AuthorizationRequest => {
            TypedEvent::AuthorizationRequest(serde_json::from_str(raw)?)
        }
        EventKind::AuthorizationClosed => {
            TypedEvent::AuthorizationClosed(serde_json::from_str(raw)?)
        }
        EventKind::AuthorizationUpdate => {
            TypedEvent::AuthorizationUpdate(serde_json::from_str(raw)?)
        }
    };
    Ok(event)
}

/// Status and body returned for one delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookReply {
    pub status: u16,
    pub body: AuthorizationDecision,
}

impl WebhookReply {
    /// Map a delivery outcome to its reply, logging failures
    pub fn from_outcome(outcome: Result<AuthorizationDecision>) -> Self {
        match outcome {
            Ok(body) => Self { status: 200, body },
            Err(e) => {
                match &e {
                    AuthError::UnknownEventKind { kind } => {
                        debug!(%kind, "Ignoring unknown event kind")
                    }
                    e if e.is_infrastructure() => warn!(error = %e, "Delivery failed, declining"),
                    e => warn!(error = %e, "Delivery rejected"),
                }
                Self {
                    status: e.status_class().http_status(),
                    body: e.fallback_response(),
                }
            }
        }
    }
}

/// Verifies, decodes and decides webhook deliveries
#[derive(Clone)]
pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    engine: AuthorizationEngine,
}

impl WebhookProcessor {
    pub fn new(config: &EngineConfig, context: EngineContext) -> Self {
        Self {
            verifier: SignatureVerifier::new(config.signing_key()),
            engine: AuthorizationEngine::new(context, config),
        }
    }

    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    /// Decide one delivery
    ///
    /// Nothing is decoded until the signature has been verified.
    pub async fn process(&self, raw_body: &[u8], signature: &str) -> Result<AuthorizationDecision> {
        let event = self.verify_and_decode(raw_body, signature)?;
        self.dispatch(event).await
    }

    /// Verify the signature, then decode the envelope and its payload
    pub fn verify_and_decode(&self, raw_body: &[u8], signature: &str) -> Result<TypedEvent> {
        if !self.verifier.verify(raw_body, signature) {
            warn!("Invalid webhook signature");
            return Err(AuthError::SignatureInvalid);
        }

        let envelope = decode_envelope(raw_body)?;
        decode_payload(&envelope.kind, &envelope.payload)
    }

    /// Route a decoded event to its engine entry point
    pub async fn dispatch(&self, event: TypedEvent) -> Result<AuthorizationDecision> {
        let authorization_id = event.authorization_id().to_string();
        debug!(kind = %event.kind(), %authorization_id, "Dispatching event");

        match event {
            TypedEvent::TransactionCreated(event) => {
                self.engine.handle_transaction_created(event).await
            }
            TypedEvent::AuthorizationRequest(event) => self
                .engine
                .handle_authorization_request(event)
                .await
                .map(|decision| decision.with_metadata(authorization_id)),
            TypedEvent::AuthorizationClosed(event) => self
                .engine
                .handle_authorization_closed(event)
                .await
                .map(|decision| decision.with_metadata(authorization_id)),
            TypedEvent::AuthorizationUpdate(event) => self
                .engine
                .handle_authorization_update(event)
                .await
                .map(|decision| decision.with_metadata(authorization_id)),
        }
    }

    /// Process a delivery and map the outcome to the reply sent back
    pub async fn respond(&self, raw_body: &[u8], signature: &str) -> WebhookReply {
        WebhookReply::from_outcome(self.process(raw_body, signature).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::directory::{InMemoryDirectory, StaticBalanceOracle};
    use crate::core::ledger::InMemoryLedger;
    use crate::core::signature::sign;
    use crate::core::traits::Ledger;
    use crate::types::{
        AccountBalance, CardState, CardStatus, ControlSet, Customer, ResponseCode,
        TransactionStatus,
    };
    use rstest::rstest;
    use std::sync::Arc;

    const KEY: &str = "whsec_test_key";

    fn processor() -> (WebhookProcessor, Arc<InMemoryLedger>) {
        let directory = InMemoryDirectory::new();
        directory.upsert_card(CardState {
            card_id: "card_1".to_string(),
            funding_account_id: "acc_1".to_string(),
            status: CardStatus::Active,
            controls: ControlSet::default(),
        });
        directory.upsert_customer(Customer {
            customer_id: "cus_1".to_string(),
            account_id: "acc_1".to_string(),
            name: "Ada Obi".to_string(),
            email: String::new(),
        });
        let oracle = StaticBalanceOracle::new();
        oracle.set_balance(
            "acc_1",
            AccountBalance {
                available: 10_000,
                currency: "NGN".to_string(),
            },
        );
        let ledger = Arc::new(InMemoryLedger::new());
        let config = EngineConfig::with_signing_key(KEY).unwrap();
        let processor = WebhookProcessor::new(
            &config,
            EngineContext::new(ledger.clone(), Arc::new(directory), Arc::new(oracle)),
        );
        (processor, ledger)
    }

    fn envelope(kind: &str, data: &str) -> String {
        format!(
            r#"{{"event":"{kind}","data":{data},"metadata":{{"sentAt":"2026-03-01T12:00:00Z","event":"{kind}"}}}}"#
        )
    }

    const REQUEST: &str = r#"{"id":"auth_1","card":"card_1","type":"capture","status":"pending","amount":5000,"fees":100,"currency":"NGN","channel":"pos"}"#;
    const CAPTURE: &str = r#"{"id":"auth_1","card":"card_1","customer":"cus_1","type":"capture","amount":5000,"fees":100,"currency":"NGN","channel":"pos"}"#;

    #[test]
    fn test_decode_envelope_keeps_payload_raw() {
        let body = envelope("card.authorization.request", REQUEST);
        let decoded = decode_envelope(body.as_bytes()).unwrap();
        assert_eq!(decoded.kind, "card.authorization.request");
        assert_eq!(decoded.payload.get(), REQUEST);
        assert_eq!(decoded.metadata.event, "card.authorization.request");
        assert!(decoded.metadata.sent_at.is_some());
    }

    #[rstest]
    #[case::not_json("not json")]
    #[case::missing_data(r#"{"event":"card.authorization.request"}"#)]
    #[case::missing_event(r#"{"data":{}}"#)]
    #[case::empty_event(r#"{"event":"","data":{}}"#)]
    #[case::array("[1,2,3]")]
    fn test_decode_envelope_malformed(#[case] body: &str) {
        let error = decode_envelope(body.as_bytes()).unwrap_err();
        assert!(matches!(error, AuthError::MalformedPayload { .. }));
    }

    #[test]
    fn test_decode_payload_unknown_kind() {
        let payload = RawValue::from_string("{}".to_string()).unwrap();
        let error = decode_payload("card.created", &payload).unwrap_err();
        assert_eq!(error, AuthError::unknown_event_kind("card.created"));
    }

    #[rstest]
    #[case::non_numeric_amount(r#"{"id":"a","card":"c","type":"capture","status":"pending","amount":"5000"}"#)]
    #[case::unknown_type(r#"{"id":"a","card":"c","type":"refund","status":"pending","amount":5000}"#)]
    #[case::missing_id(r#"{"card":"c","type":"capture","status":"pending","amount":5000}"#)]
    fn test_decode_payload_malformed(#[case] data: &str) {
        let payload = RawValue::from_string(data.to_string()).unwrap();
        let error = decode_payload("card.authorization.request", &payload).unwrap_err();
        assert!(matches!(error, AuthError::MalformedPayload { .. }));
    }

    #[test]
    fn test_decode_payload_routes_by_kind() {
        let payload = RawValue::from_string(CAPTURE.to_string()).unwrap();
        let event = decode_payload("card.transaction.created", &payload).unwrap();
        assert_eq!(event.kind(), EventKind::TransactionCreated);
        assert_eq!(event.authorization_id(), "auth_1");
    }

    #[tokio::test]
    async fn test_signed_request_approved_with_metadata() {
        let (processor, _) = processor();
        let body = envelope("card.authorization.request", REQUEST);
        let signature = sign(body.as_bytes(), KEY.as_bytes());

        let reply = processor.respond(body.as_bytes(), &signature).await;

        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body,
            AuthorizationDecision::approve()
                .with_balance(10_000, "Ada Obi")
                .with_metadata("auth_1")
        );
    }

    #[tokio::test]
    async fn test_tampered_body_rejected_before_decoding() {
        let (processor, ledger) = processor();
        let body = envelope("card.transaction.created", CAPTURE);
        let signature = sign(body.as_bytes(), KEY.as_bytes());
        let tampered = body.replace("5000", "9000");

        let reply = processor.respond(tampered.as_bytes(), &signature).await;

        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, AuthorizationDecision::rejected("Invalid Signature"));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_signature_checked_before_malformed_body() {
        let (processor, _) = processor();
        let error = processor.process(b"not json", "00").await.unwrap_err();
        assert_eq!(error, AuthError::SignatureInvalid);
    }

    #[tokio::test]
    async fn test_signed_malformed_body_is_client_error() {
        let (processor, _) = processor();
        let body = envelope("card.authorization.request", r#"{"id":"auth_1","amount":"x"}"#);
        let signature = sign(body.as_bytes(), KEY.as_bytes());

        let reply = processor.respond(body.as_bytes(), &signature).await;
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, AuthorizationDecision::rejected("Invalid Request"));
    }

    #[tokio::test]
    async fn test_unknown_kind_acknowledged() {
        let (processor, ledger) = processor();
        let body = envelope("card.created", r#"{"id":"card_9"}"#);
        let signature = sign(body.as_bytes(), KEY.as_bytes());

        let reply = processor.respond(body.as_bytes(), &signature).await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, AuthorizationDecision::accepted());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_capture_then_reversal_through_processor() {
        let (processor, ledger) = processor();
        let capture = envelope("card.transaction.created", CAPTURE);
        let reply = processor
            .respond(capture.as_bytes(), &sign(capture.as_bytes(), KEY.as_bytes()))
            .await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body.code, Some(ResponseCode::Success));
        assert_eq!(reply.body.metadata, None);

        let update = envelope(
            "card.authorization.update",
            r#"{"id":"auth_1","card":"card_1","status":"reversed"}"#,
        );
        let reply = processor
            .respond(update.as_bytes(), &sign(update.as_bytes(), KEY.as_bytes()))
            .await;
        assert_eq!(reply.body, AuthorizationDecision::approve().with_metadata("auth_1"));

        let record = ledger.find_by_id("auth_1").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::Reversed);
    }

    #[tokio::test]
    async fn test_negative_closure_amount_is_client_error() {
        let (processor, _) = processor();
        let body = envelope(
            "card.authorization.closed",
            r#"{"id":"auth_1","card":"card_1","status":"approved","amount":-1,"fees":0}"#,
        );
        let reply = processor
            .respond(body.as_bytes(), &sign(body.as_bytes(), KEY.as_bytes()))
            .await;
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, AuthorizationDecision::decline(ResponseCode::Error));
    }

    #[tokio::test]
    async fn test_business_decline_is_accepted() {
        let (processor, _) = processor();
        let request = REQUEST.replace("card_1", "card_2");
        let body = envelope("card.authorization.request", &request);
        let reply = processor
            .respond(body.as_bytes(), &sign(body.as_bytes(), KEY.as_bytes()))
            .await;
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body,
            AuthorizationDecision::decline(ResponseCode::AccountNotFound).with_metadata("auth_1")
        );
    }
}
