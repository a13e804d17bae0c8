//! Webhook endpoint scenarios: signature enforcement and reconciliation
//! side effects, driven through the real router.

mod common;

use common::*;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use ledgerdesk_core::audit::AuditLogPort;
use ledgerdesk_core::invoices::{InvoiceStatus, InvoiceStatusPort};
use ledgerdesk_core::payments::{PaymentInitiation, PaymentRepositoryTrait, PaymentStatus};
use ledgerdesk_core::transactions::{TransactionRepositoryTrait, TransactionState};
use ledgerdesk_core::webhooks::compute_signature;
use ledgerdesk_server::build_router;
use rust_decimal_macros::dec;

async fn post_webhook(ctx: &TestContext, body: &str, signature: Option<&str>) -> StatusCode {
    let app = build_router(ctx.state.clone());
    let mut request = Request::builder().method("POST").uri("/webhooks/banking");
    if let Some(signature) = signature {
        request = request.header("x-signature", signature);
    }

    let response = app
        .oneshot(request.body(Body::from(body.to_string())).expect("request"))
        .await
        .expect("response");
    response.status()
}

fn signed(body: &str) -> String {
    compute_signature(WEBHOOK_SECRET, body.as_bytes())
}

/// Connect a tenant and initiate one payment linked to a fresh invoice.
/// Returns (payment id, request id, external id, invoice id).
async fn seed_payment(ctx: &TestContext, tenant: &str) -> (String, String, String, String) {
    connect_tenant(ctx, tenant).await;

    let invoice = ctx
        .invoices()
        .create_invoice(tenant, dec!(99.95), "EUR")
        .await
        .expect("invoice");

    let payment = ctx
        .state
        .payment_service
        .initiate(
            &owner(tenant),
            PaymentInitiation {
                amount: dec!(99.95),
                currency: "EUR".to_string(),
                counterparty_name: "Acme GmbH".to_string(),
                counterparty_iban: "DE89370400440532013000".to_string(),
                description: Some("Invoice settlement".to_string()),
                invoice_id: Some(invoice.id.clone()),
            },
        )
        .await
        .expect("payment");

    let external_id = payment.external_id.clone().expect("external id");
    (payment.id, payment.request_id, external_id, invoice.id)
}

#[tokio::test]
async fn probe_endpoint_acknowledges() {
    let ctx = setup();
    let app = build_router(ctx.state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/webhooks/banking")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_signature_is_rejected_without_any_mutation() {
    let ctx = setup();
    let (payment_id, _, external_id, _) = seed_payment(&ctx, "t1").await;

    let body = format!(
        r#"{{"event":"payment.completed","data":{{"id":"{}"}}}}"#,
        external_id
    );
    let wrong = compute_signature("wrong_secret", body.as_bytes());

    assert_eq!(post_webhook(&ctx, &body, Some(&wrong)).await, StatusCode::UNAUTHORIZED);
    assert_eq!(post_webhook(&ctx, &body, None).await, StatusCode::UNAUTHORIZED);

    // Nothing changed: the payment is still in flight, no audit rows.
    let payment = ctx
        .payments()
        .find_by_external_id(&external_id)
        .expect("find")
        .expect("payment");
    assert_eq!(payment.id, payment_id);
    assert_eq!(payment.status, PaymentStatus::Processing);
    assert!(ctx.audit().list_for_tenant("t1", 10).expect("audit").is_empty());
}

#[tokio::test]
async fn malformed_payload_is_a_bad_request() {
    let ctx = setup();
    let body = "{not json";
    assert_eq!(
        post_webhook(&ctx, body, Some(&signed(body))).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn completed_payment_marks_invoice_paid_and_audits_once() {
    let ctx = setup();
    let (payment_id, _, external_id, invoice_id) = seed_payment(&ctx, "t1").await;

    let body = format!(
        r#"{{"event":"payment.completed","timestamp":"2026-03-01T12:00:00Z","data":{{"id":"{}","completed_at":"2026-03-01T12:00:00Z"}}}}"#,
        external_id
    );
    assert_eq!(post_webhook(&ctx, &body, Some(&signed(&body))).await, StatusCode::OK);

    let payment = ctx
        .payments()
        .find_by_external_id(&external_id)
        .expect("find")
        .expect("payment");
    assert_eq!(payment.id, payment_id);
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.completed_at.as_deref(), Some("2026-03-01T12:00:00Z"));

    let invoice = ctx
        .invoices()
        .find_invoice(&invoice_id)
        .expect("find")
        .expect("invoice");
    assert_eq!(invoice.status, InvoiceStatus::Paid);

    let audit = ctx.audit().list_for_tenant("t1", 10).expect("audit");
    let completions: Vec<_> = audit
        .iter()
        .filter(|e| e.action == "payment.completed")
        .collect();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].entity_id, payment_id);
}

#[tokio::test]
async fn payment_events_resolve_by_the_local_request_id_too() {
    let ctx = setup();
    let (payment_id, request_id, _, _) = seed_payment(&ctx, "t1").await;

    // The provider echoes the request id for this event flavor.
    let body = format!(
        r#"{{"event":"payment.failed","data":{{"id":"{}","reason_code":"insufficient_funds"}}}}"#,
        request_id
    );
    assert_eq!(post_webhook(&ctx, &body, Some(&signed(&body))).await, StatusCode::OK);

    let payment = ctx
        .payments()
        .find_by_request_id(&request_id)
        .expect("find")
        .expect("payment");
    assert_eq!(payment.id, payment_id);
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert_eq!(payment.reason_code.as_deref(), Some("insufficient_funds"));

    let audit = ctx.audit().list_for_tenant("t1", 10).expect("audit");
    assert!(audit.iter().any(|e| e.action == "payment.failed"));
}

#[tokio::test]
async fn conflicting_terminal_event_is_audited_not_applied() {
    let ctx = setup();
    let (payment_id, _, external_id, _) = seed_payment(&ctx, "t1").await;

    let complete = format!(
        r#"{{"event":"payment.completed","data":{{"id":"{}"}}}}"#,
        external_id
    );
    post_webhook(&ctx, &complete, Some(&signed(&complete))).await;

    // Out-of-order duplicate claiming a different terminal outcome.
    let conflicting = format!(
        r#"{{"event":"payment.failed","data":{{"id":"{}","reason_code":"late_failure"}}}}"#,
        external_id
    );
    assert_eq!(
        post_webhook(&ctx, &conflicting, Some(&signed(&conflicting))).await,
        StatusCode::OK
    );

    let payment = ctx
        .payments()
        .find_by_external_id(&external_id)
        .expect("find")
        .expect("payment");
    assert_eq!(payment.status, PaymentStatus::Completed);

    let audit = ctx.audit().list_for_tenant("t1", 10).expect("audit");
    let anomalies: Vec<_> = audit
        .iter()
        .filter(|e| e.action == "payment.state_anomaly")
        .collect();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].entity_id, payment_id);
    assert_eq!(anomalies[0].detail["current"], "completed");
    assert_eq!(anomalies[0].detail["reported"], "failed");
}

#[tokio::test]
async fn transaction_event_updates_the_mirrored_state() {
    let ctx = setup();
    connect_tenant(&ctx, "t1").await;

    ctx.provider
        .set_accounts(vec![provider_account("acc_1", "Current account")]);
    let mut pending = provider_transaction("tx_1", "acc_1");
    pending.state = TransactionState::Pending;
    ctx.provider.set_transactions(vec![pending]);
    ctx.state
        .sync_service
        .run_sync("t1", ledgerdesk_core::sync::SyncType::Manual)
        .await
        .expect("sync");

    let body = r#"{"event":"transaction.updated","data":{"id":"tx_1","status":"booked"}}"#;
    assert_eq!(post_webhook(&ctx, body, Some(&signed(body))).await, StatusCode::OK);

    let transaction = ctx
        .transactions()
        .find_by_external_id("tx_1")
        .expect("find")
        .expect("transaction");
    assert_eq!(transaction.state, TransactionState::Booked);
}

#[tokio::test]
async fn unmatched_and_unhandled_events_are_still_acknowledged() {
    let ctx = setup();

    let unmatched = r#"{"event":"transaction.updated","data":{"id":"tx_ghost","status":"booked"}}"#;
    assert_eq!(
        post_webhook(&ctx, unmatched, Some(&signed(unmatched))).await,
        StatusCode::OK
    );

    let unhandled = r#"{"event":"mandate.created","data":{"id":"mnd_1"}}"#;
    assert_eq!(
        post_webhook(&ctx, unhandled, Some(&signed(unhandled))).await,
        StatusCode::OK
    );
}
