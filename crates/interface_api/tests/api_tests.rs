//! HTTP API tests
//!
//! Exercises the router end to end against in-memory ports and the
//! recording gateway.

use std::str::FromStr;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::{SchoolId, UserId};
use domain_payments::{AccountStore, PaymentStatus, PaymentStore, TransactionStatus, WebhookVerifier};
use interface_api::auth::{create_token, Principal};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState, Ports};
use test_utils::*;

const JWT_SECRET: &str = "test-jwt-secret";
const PAYSTACK_SECRET: &str = "sk_test_webhook_secret";

struct Harness {
    server: TestServer,
    mocks: MockPorts,
}

async fn harness() -> Harness {
    let mocks = MockPorts::seeded().await;
    let config = ApiConfig {
        jwt_secret: JWT_SECRET.to_string(),
        paystack_secret_key: PAYSTACK_SECRET.to_string(),
        ..ApiConfig::default()
    };
    let ports = Ports {
        directory: mocks.directory.clone(),
        payments: mocks.payments.clone(),
        accounts: mocks.accounts.clone(),
        gateway: mocks.gateway.clone(),
    };
    let server = TestServer::new(create_router(AppState::new(config, ports))).unwrap();
    Harness { server, mocks }
}

fn bearer(principal: Principal) -> HeaderValue {
    let token = create_token(&principal, JWT_SECRET, 3600).unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn owner() -> HeaderValue {
    bearer(Principal::SchoolOwner {
        user_id: UserId::new(1),
        school_ids: vec![SCHOOL_ID],
    })
}

fn staff() -> HeaderValue {
    bearer(Principal::SchoolStaff {
        user_id: UserId::new(2),
        school_id: SCHOOL_ID,
    })
}

fn other_owner() -> HeaderValue {
    bearer(Principal::SchoolOwner {
        user_id: UserId::new(3),
        school_ids: vec![OTHER_SCHOOL_ID],
    })
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn school_path(school_id: SchoolId, rest: &str) -> String {
    format!("/api/v1/schools/{}{}", school_id.value(), rest)
}

fn checkout_body() -> Value {
    json!({
        "schoolId": SCHOOL_ID.value(),
        "studentId": STUDENT_ID.value(),
        "feeTypeId": FEE_TYPE_ID.value(),
        "email": PAYER_EMAIL,
    })
}

async fn initialize(h: &Harness) -> Value {
    let response = h.server.post("/api/v1/payments/initialize").json(&checkout_body()).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

// ============================================================================
// Health
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let h = harness().await;
        h.server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_readiness_reports_ports() {
        let h = harness().await;
        let response = h.server.get("/health/ready").await;
        response.assert_status_ok();
    }
}

// ============================================================================
// Checkout
// ============================================================================

mod checkout_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_returns_breakdown_and_checkout() {
        let h = harness().await;

        let body = initialize(&h).await;

        assert_eq!(decimal(&body["feeAmount"]), dec!(5000));
        assert_eq!(decimal(&body["transactionFee"]), dec!(175));
        assert_eq!(decimal(&body["totalAmount"]), dec!(5175));
        assert_eq!(body["currency"], "NGN");
        let reference = body["reference"].as_str().unwrap();
        assert_reference_format(reference, "PAY", STUDENT_ID.value());
        assert!(body["authorizationUrl"].as_str().unwrap().ends_with(reference));

        let sent = h.mocks.gateway.initialize_requests().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount_minor, 517_500);
        assert_eq!(sent[0].subaccount_code.as_deref(), Some(SUBACCOUNT_CODE));
    }

    #[tokio::test]
    async fn test_initialize_without_settlement_account() {
        let h = harness().await;

        let response = h
            .server
            .post("/api/v1/payments/initialize")
            .json(&json!({
                "schoolId": OTHER_SCHOOL_ID.value(),
                "studentId": OTHER_STUDENT_ID.value(),
                "feeTypeId": OTHER_FEE_TYPE_ID.value(),
                "email": PAYER_EMAIL,
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "settlement_unavailable");
        assert!(h.mocks.payments.is_empty().await);
        assert!(h.mocks.gateway.initialize_requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_forwards_payer_email() {
        let h = harness().await;
        let email = fake_email();
        let mut body = checkout_body();
        body["email"] = json!(email);

        let response = h.server.post("/api/v1/payments/initialize").json(&body).await;

        response.assert_status(StatusCode::CREATED);
        let sent = h.mocks.gateway.initialize_requests().await;
        assert_eq!(sent[0].email, email);
    }

    #[tokio::test]
    async fn test_initialize_rejects_bad_email() {
        let h = harness().await;
        let mut body = checkout_body();
        body["email"] = json!("not-an-email");

        let response = h.server.post("/api/v1/payments/initialize").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(h.mocks.payments.is_empty().await);
    }

    #[tokio::test]
    async fn test_initialize_student_of_other_school_not_found() {
        let h = harness().await;
        let mut body = checkout_body();
        body["studentId"] = json!(OTHER_STUDENT_ID.value());

        let response = h.server.post("/api/v1/payments/initialize").json(&body).await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_quote_matches_checkout() {
        let h = harness().await;

        let response = h
            .server
            .get(&format!(
                "/api/v1/schools/{}/fees/{}/quote",
                SCHOOL_ID.value(),
                FEE_TYPE_ID.value()
            ))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["feeTypeName"], "First Term Tuition");
        assert_eq!(decimal(&body["totalPayable"]), dec!(5175));
        assert!(h.mocks.payments.is_empty().await);
    }

    #[tokio::test]
    async fn test_verify_is_public_and_settles() {
        let h = harness().await;
        let checkout = initialize(&h).await;
        let reference = checkout["reference"].as_str().unwrap().to_string();
        h.mocks
            .gateway
            .set_outcome(&reference, TransactionStatus::Success)
            .await;

        let response = h.server.get(&format!("/api/v1/payments/verify/{reference}")).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Payment verified successfully");
        assert_eq!(body["payment"]["status"], "successful");
        assert!(body["payment"]["paidAt"].is_string());

        let again = h.server.get(&format!("/api/v1/payments/verify/{reference}")).await;
        again.assert_status_ok();
        assert_eq!(again.json::<Value>()["message"], "Payment already verified");
        assert_eq!(h.mocks.gateway.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_verify_charged_amount_mismatch_is_conflict() {
        let h = harness().await;
        let checkout = initialize(&h).await;
        let reference = checkout["reference"].as_str().unwrap().to_string();
        h.mocks.gateway.set_charged(&reference, 500_000).await;

        let response = h.server.get(&format!("/api/v1/payments/verify/{reference}")).await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "conflict");
        let stored = h.mocks.payments.find_by_reference(&reference).await.unwrap().unwrap();
        assert_status(&stored, PaymentStatus::Pending);
        assert_payment_consistent(&stored);
    }

    #[tokio::test]
    async fn test_verify_unknown_reference() {
        let h = harness().await;
        let response = h.server.get("/api/v1/payments/verify/PAY-0-0-deadbeef").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

// ============================================================================
// Authorization
// ============================================================================

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token() {
        let h = harness().await;
        let response = h.server.get(&school_path(SCHOOL_ID, "/payments")).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let h = harness().await;
        let response = h
            .server
            .get(&school_path(SCHOOL_ID, "/payments"))
            .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not.a.jwt"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_owner_of_other_school_forbidden() {
        let h = harness().await;
        let response = h
            .server
            .get(&school_path(SCHOOL_ID, "/payments"))
            .add_header(AUTHORIZATION, other_owner())
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_staff_cannot_add_account() {
        let h = harness().await;
        let response = h
            .server
            .post(&school_path(SCHOOL_ID, "/accounts"))
            .add_header(AUTHORIZATION, staff())
            .json(&json!({
                "bankName": "Access Bank",
                "bankCode": "044",
                "accountNumber": "0123456789",
                "accountName": "Greenfield Academy",
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_platform_admin_sees_any_school() {
        let h = harness().await;
        let admin = bearer(Principal::PlatformAdmin {
            user_id: UserId::new(99),
        });
        let response = h
            .server
            .get(&school_path(OTHER_SCHOOL_ID, "/payments/stats"))
            .add_header(AUTHORIZATION, admin)
            .await;
        response.assert_status_ok();
    }
}

// ============================================================================
// School payments
// ============================================================================

mod school_payment_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_and_stats() {
        let h = harness().await;
        initialize(&h).await;
        initialize(&h).await;

        let list = h
            .server
            .get(&school_path(SCHOOL_ID, "/payments"))
            .add_header(AUTHORIZATION, staff())
            .await;
        list.assert_status_ok();
        assert_eq!(list.json::<Vec<Value>>().len(), 2);

        let pending = h
            .server
            .get(&school_path(SCHOOL_ID, "/payments?status=successful"))
            .add_header(AUTHORIZATION, staff())
            .await;
        assert!(pending.json::<Vec<Value>>().is_empty());

        let stats = h
            .server
            .get(&school_path(SCHOOL_ID, "/payments/stats"))
            .add_header(AUTHORIZATION, owner())
            .await;
        stats.assert_status_ok();
        let stats = stats.json::<Value>();
        assert_eq!(stats["totalPayments"], 2);
        assert_eq!(stats["pendingCount"], 2);
    }

    #[tokio::test]
    async fn test_stats_over_seeded_history() {
        let h = harness().await;
        for builder in [
            PaymentBuilder::new(SCHOOL_ID, STUDENT_ID).with_id(1).successful(),
            PaymentBuilder::new(SCHOOL_ID, STUDENT_ID)
                .with_id(2)
                .with_amount(dec!(12000))
                .manual()
                .successful(),
            PaymentBuilder::new(SCHOOL_ID, STUDENT_ID).with_id(3).failed(),
            PaymentBuilder::new(SCHOOL_ID, STUDENT_ID).with_id(4),
        ] {
            h.mocks.payments.insert(builder.build_new()).await.unwrap();
        }

        let stats = h
            .server
            .get(&school_path(SCHOOL_ID, "/payments/stats"))
            .add_header(AUTHORIZATION, owner())
            .await;

        stats.assert_status_ok();
        let stats = stats.json::<Value>();
        assert_eq!(stats["totalPayments"], 4);
        assert_eq!(stats["successfulCount"], 2);
        assert_eq!(stats["failedCount"], 1);
        assert_eq!(stats["pendingCount"], 1);
        assert_eq!(decimal(&stats["totalRevenue"]), dec!(17000));
        assert_eq!(decimal(&stats["totalAmount"]), dec!(27000));
    }

    #[tokio::test]
    async fn test_unknown_status_filter() {
        let h = harness().await;
        let response = h
            .server
            .get(&school_path(SCHOOL_ID, "/payments?status=bogus"))
            .add_header(AUTHORIZATION, staff())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_payment_of_other_school_not_visible() {
        let h = harness().await;
        let checkout = initialize(&h).await;
        let id = checkout["paymentId"].as_i64().unwrap();

        let own = h
            .server
            .get(&school_path(SCHOOL_ID, &format!("/payments/{id}")))
            .add_header(AUTHORIZATION, owner())
            .await;
        own.assert_status_ok();

        let foreign = h
            .server
            .get(&school_path(OTHER_SCHOOL_ID, &format!("/payments/{id}")))
            .add_header(AUTHORIZATION, other_owner())
            .await;
        foreign.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_manual_payment_then_refund() {
        let h = harness().await;

        let created = h
            .server
            .post(&school_path(SCHOOL_ID, "/payments/manual"))
            .add_header(AUTHORIZATION, staff())
            .json(&json!({
                "studentId": STUDENT_ID.value(),
                "feeTypeId": FEE_TYPE_ID.value(),
                "amount": 5000,
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let payment = created.json::<Value>();
        assert_eq!(payment["status"], "successful");
        assert_eq!(payment["paymentMethod"], "manual");
        assert_reference_format(payment["reference"].as_str().unwrap(), "MAN", STUDENT_ID.value());

        let id = payment["id"].as_i64().unwrap();
        let refund_path = school_path(SCHOOL_ID, &format!("/payments/{id}/refund"));

        h.server
            .post(&refund_path)
            .add_header(AUTHORIZATION, staff())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let refunded = h.server.post(&refund_path).add_header(AUTHORIZATION, owner()).await;
        refunded.assert_status_ok();
        let refunded = refunded.json::<Value>();
        assert_eq!(refunded["status"], "refunded");
        assert!(refunded["paidAt"].is_null());
        assert!(refunded["refundedAt"].is_string());

        h.server
            .post(&refund_path)
            .add_header(AUTHORIZATION, owner())
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_manual_payment_reused_reference_is_conflict() {
        let h = harness().await;
        let body = json!({
            "studentId": STUDENT_ID.value(),
            "feeTypeId": FEE_TYPE_ID.value(),
            "amount": 5000,
            "reference": "TELLER-001",
        });
        let path = school_path(SCHOOL_ID, "/payments/manual");

        h.server
            .post(&path)
            .add_header(AUTHORIZATION, staff())
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let again = h.server.post(&path).add_header(AUTHORIZATION, staff()).json(&body).await;

        again.assert_status(StatusCode::CONFLICT);
        let error = again.json::<Value>();
        assert_eq!(error["error"], "conflict");
        assert!(error["message"].as_str().unwrap().contains("TELLER-001"));
    }

    #[tokio::test]
    async fn test_manual_payment_sub_kobo_amount_rejected() {
        let h = harness().await;

        let response = h
            .server
            .post(&school_path(SCHOOL_ID, "/payments/manual"))
            .add_header(AUTHORIZATION, staff())
            .json(&json!({
                "studentId": STUDENT_ID.value(),
                "feeTypeId": FEE_TYPE_ID.value(),
                "amount": "2500.005",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(h.mocks.payments.is_empty().await);
    }

    #[tokio::test]
    async fn test_student_payments() {
        let h = harness().await;
        initialize(&h).await;

        let response = h
            .server
            .get(&school_path(
                SCHOOL_ID,
                &format!("/students/{}/payments", STUDENT_ID.value()),
            ))
            .add_header(AUTHORIZATION, staff())
            .await;

        response.assert_status_ok();
        let payments = response.json::<Vec<Value>>();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0]["studentId"], STUDENT_ID.value());
    }
}

// ============================================================================
// Settlement accounts
// ============================================================================

mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_account_and_set_primary() {
        let h = harness().await;
        let (number, bank, name) = RESOLVABLE_ACCOUNT;

        let created = h
            .server
            .post(&school_path(SCHOOL_ID, "/accounts"))
            .add_header(AUTHORIZATION, owner())
            .json(&json!({
                "bankName": "Access Bank",
                "bankCode": bank,
                "accountNumber": number,
                "accountName": "Greenfield",
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let account = created.json::<Value>();
        assert_eq!(account["accountName"], name);
        assert_eq!(account["isVerified"], true);
        assert_eq!(account["isPrimary"], false);
        let id = account["id"].as_i64().unwrap();

        let promoted = h
            .server
            .patch(&school_path(SCHOOL_ID, &format!("/accounts/{id}/set-primary")))
            .add_header(AUTHORIZATION, owner())
            .await;
        promoted.assert_status_ok();
        assert_eq!(promoted.json::<Value>()["isPrimary"], true);

        let listed = h
            .server
            .get(&school_path(SCHOOL_ID, "/accounts"))
            .add_header(AUTHORIZATION, staff())
            .await;
        listed.assert_status_ok();
        let accounts = listed.json::<Vec<Value>>();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0]["id"].as_i64(), Some(id));
        assert_eq!(
            accounts.iter().filter(|a| a["isPrimary"] == true).count(),
            1
        );

        let stored = h.mocks.accounts.list_for_school(SCHOOL_ID).await.unwrap();
        assert_eq!(assert_single_primary(&stored).id.value(), id);
    }

    #[tokio::test]
    async fn test_unresolvable_account_rejected() {
        let h = harness().await;
        let response = h
            .server
            .post(&school_path(SCHOOL_ID, "/accounts"))
            .add_header(AUTHORIZATION, owner())
            .json(&json!({
                "bankName": "Access Bank",
                "bankCode": "044",
                "accountNumber": "1111111111",
                "accountName": "Greenfield",
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_list_banks_requires_auth() {
        let h = harness().await;
        h.server.get("/api/v1/banks").await.assert_status(StatusCode::UNAUTHORIZED);
        h.server
            .get("/api/v1/banks")
            .add_header(AUTHORIZATION, staff())
            .await
            .assert_status_ok();
    }
}

// ============================================================================
// Webhook
// ============================================================================

mod webhook_tests {
    use super::*;

    fn signature_header() -> HeaderName {
        HeaderName::from_static("x-paystack-signature")
    }

    #[tokio::test]
    async fn test_signed_charge_success_reconciles() {
        let h = harness().await;
        let checkout = initialize(&h).await;
        let reference = checkout["reference"].as_str().unwrap().to_string();
        h.mocks
            .gateway
            .set_outcome(&reference, TransactionStatus::Success)
            .await;

        let payload = json!({ "event": "charge.success", "data": { "reference": reference } })
            .to_string();
        let signature = WebhookVerifier::new(PAYSTACK_SECRET)
            .sign(payload.as_bytes())
            .unwrap();

        let response = h
            .server
            .post("/webhooks/paystack")
            .add_header(signature_header(), HeaderValue::from_str(&signature).unwrap())
            .text(payload)
            .await;

        response.assert_status_ok();
        let stored = h.mocks.payments.all().await;
        assert_status(&stored[0], PaymentStatus::Successful);
        assert_payment_consistent(&stored[0]);
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let h = harness().await;
        let payload = json!({ "event": "charge.success", "data": { "reference": "PAY-1" } })
            .to_string();
        let signature = WebhookVerifier::new("sk_test_someone_else")
            .sign(payload.as_bytes())
            .unwrap();

        let response = h
            .server
            .post("/webhooks/paystack")
            .add_header(signature_header(), HeaderValue::from_str(&signature).unwrap())
            .text(payload)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(h.mocks.gateway.verify_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_reference_acknowledged() {
        let h = harness().await;
        let payload = json!({ "event": "charge.success", "data": { "reference": "PAY-0-0-00000000" } })
            .to_string();
        let signature = WebhookVerifier::new(PAYSTACK_SECRET)
            .sign(payload.as_bytes())
            .unwrap();

        let response = h
            .server
            .post("/webhooks/paystack")
            .add_header(signature_header(), HeaderValue::from_str(&signature).unwrap())
            .text(payload)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["received"], true);
    }
}
