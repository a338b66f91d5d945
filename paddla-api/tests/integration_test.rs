use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use paddla_api::{
    app,
    auth::{seed_admin, INVALID_CREDENTIALS},
    middleware::AdminClaims,
    state::{AppState, AuthConfig},
};
use paddla_booking::{
    BookingAdmin, InMemoryBookingStore, InMemorySessionStore, InMemoryUserStore, ReservationManager,
};
use paddla_core::payment::{PaymentProvider, PaymentReceipt, PaymentStatus, SimulatedPaymentProvider};
use paddla_core::{AdminUserRepository, BookingStore, RepoResult, ReservationId};
use paddla_store::app_config::AdminConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const COOKIE: &str = "paddla_session";

struct DecliningPaymentProvider;

#[async_trait]
impl PaymentProvider for DecliningPaymentProvider {
    async fn charge(&self, reservation_id: ReservationId) -> RepoResult<PaymentReceipt> {
        Ok(PaymentReceipt {
            transaction_id: "declined".to_string(),
            reservation_id,
            status: PaymentStatus::Failed,
            processed_at: Utc::now(),
        })
    }
}

async fn test_app_with(capacity: i64, payments: Arc<dyn PaymentProvider>) -> Router {
    let bookings: Arc<dyn BookingStore> = Arc::new(InMemoryBookingStore::new());
    let users: Arc<dyn AdminUserRepository> = Arc::new(InMemoryUserStore::new());

    seed_admin(
        &users,
        &AdminConfig {
            username: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
        },
    )
    .await
    .unwrap();

    app(AppState {
        reservations: Arc::new(ReservationManager::new(
            bookings.clone(),
            Arc::new(InMemorySessionStore::new()),
            capacity,
        )),
        booking_admin: Arc::new(BookingAdmin::new(bookings)),
        users,
        payments,
        auth: AuthConfig {
            secret: SECRET.to_string(),
            expiration: 3600,
        },
        session_cookie: COOKIE.to_string(),
    })
}

async fn test_app(capacity: i64) -> Router {
    test_app_with(capacity, Arc::new(SimulatedPaymentProvider::new())).await
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn checkout_request(form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/create-checkout-session")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` part of the session cookie set on a response.
fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie should be set")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn admin_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "username": "admin", "password": "hunter2" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["token"].as_str().unwrap().to_string()
}

fn admin_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app(40).await;
    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_then_payment_success_confirms_bookings() {
    let app = test_app(40).await;

    let response = app
        .clone()
        .oneshot(checkout_request(
            "canoeCount=2&canoe1_fname=Anna&canoe1_lname=Berg&canoe2_fname=&canoe2_lname=",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/payment-success");
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("paddla_session="));

    let response = app
        .clone()
        .oneshot(get_request("/payment-success", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["created"], 2);
    assert!(body["transaction_id"].as_str().unwrap().starts_with("sim_"));

    let response = app.clone().oneshot(get_request("/api/bookings", None)).await.unwrap();
    assert_eq!(
        json_body(response).await,
        json!([{ "name": "Anna Berg" }, { "name": "Unnamed person #2" }])
    );

    let response = app.oneshot(get_request("/api/booking-count", None)).await.unwrap();
    assert_eq!(
        json_body(response).await,
        json!({ "count": 2, "capacity": 40, "available": 38 })
    );
}

#[tokio::test]
async fn test_revisiting_payment_success_is_a_noop() {
    let app = test_app(40).await;

    let response = app
        .clone()
        .oneshot(checkout_request("canoeCount=1&canoe1_fname=Anna", None))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let first = app
        .clone()
        .oneshot(get_request("/payment-success", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(json_body(first).await["status"], "confirmed");

    let second = app
        .clone()
        .oneshot(get_request("/payment-success", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json_body(second).await["status"], "noop");

    let response = app.oneshot(get_request("/api/booking-count", None)).await.unwrap();
    assert_eq!(json_body(response).await["count"], 1);
}

#[tokio::test]
async fn test_payment_success_without_session_is_a_noop() {
    let app = test_app(40).await;

    let response = app.oneshot(get_request("/payment-success", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "noop" }));
}

#[tokio::test]
async fn test_invalid_canoe_count_is_rejected() {
    let app = test_app(40).await;

    for form in ["canoeCount=abc", "canoeCount=0", "canoeCount=-3", "canoe1_fname=Anna"] {
        let response = app.clone().oneshot(checkout_request(form, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "form: {}", form);
    }

    let response = app.oneshot(get_request("/api/booking-count", None)).await.unwrap();
    assert_eq!(json_body(response).await["count"], 0);
}

#[tokio::test]
async fn test_overlong_participant_name_is_rejected_at_checkout() {
    let app = test_app(40).await;

    let form = format!("canoeCount=1&canoe1_fname={}", "x".repeat(121));
    let response = app.clone().oneshot(checkout_request(&form, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let form = format!("canoeCount=1&canoe1_fname={}", "x".repeat(120));
    let response = app.clone().oneshot(checkout_request(&form, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(get_request("/payment-success", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["status"], "confirmed");

    let response = app.oneshot(get_request("/api/bookings", None)).await.unwrap();
    assert_eq!(json_body(response).await, json!([{ "name": "x".repeat(120) }]));
}

#[tokio::test]
async fn test_zero_padded_slot_fields_do_not_override_names() {
    let app = test_app(40).await;

    let response = app
        .clone()
        .oneshot(checkout_request(
            "canoeCount=1&canoe1_fname=Anna&canoe01_fname=Mallory&canoe001_lname=Mallory",
            None,
        ))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    app.clone()
        .oneshot(get_request("/payment-success", Some(&cookie)))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/api/bookings", None)).await.unwrap();
    assert_eq!(json_body(response).await, json!([{ "name": "Anna" }]));
}

#[tokio::test]
async fn test_concurrent_payment_success_reloads_confirm_once() {
    let app = test_app(40).await;

    let response = app
        .clone()
        .oneshot(checkout_request("canoeCount=2", None))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let (first, second) = tokio::join!(
        app.clone().oneshot(get_request("/payment-success", Some(&cookie))),
        app.clone().oneshot(get_request("/payment-success", Some(&cookie))),
    );
    let mut statuses = vec![
        json_body(first.unwrap()).await["status"].as_str().unwrap().to_string(),
        json_body(second.unwrap()).await["status"].as_str().unwrap().to_string(),
    ];
    statuses.sort();
    assert_eq!(statuses, vec!["confirmed", "noop"]);

    let response = app.oneshot(get_request("/api/booking-count", None)).await.unwrap();
    assert_eq!(json_body(response).await["count"], 2);
}

#[tokio::test]
async fn test_checkout_over_capacity_reports_what_is_left() {
    let app = test_app(1).await;

    let response = app.oneshot(checkout_request("canoeCount=2", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["available"], 1);
    assert_eq!(body["error"], "Only 1 canoe(s) left");
}

#[tokio::test]
async fn test_capacity_is_rechecked_at_confirmation() {
    let app = test_app(3).await;

    let first = app.clone().oneshot(checkout_request("canoeCount=2", None)).await.unwrap();
    let first_cookie = session_cookie(&first);
    let second = app.clone().oneshot(checkout_request("canoeCount=2", None)).await.unwrap();
    let second_cookie = session_cookie(&second);
    assert_ne!(first_cookie, second_cookie);

    let response = app
        .clone()
        .oneshot(get_request("/payment-success", Some(&first_cookie)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["status"], "confirmed");

    let response = app
        .clone()
        .oneshot(get_request("/payment-success", Some(&second_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["available"], 1);

    let response = app.oneshot(get_request("/api/booking-count", None)).await.unwrap();
    assert_eq!(json_body(response).await["count"], 2);
}

#[tokio::test]
async fn test_declined_payment_keeps_the_reservation_pending() {
    let app = test_app_with(40, Arc::new(DecliningPaymentProvider)).await;

    let response = app
        .clone()
        .oneshot(checkout_request("canoeCount=1", None))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_request("/payment-success", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    let response = app.oneshot(get_request("/api/booking-count", None)).await.unwrap();
    assert_eq!(json_body(response).await["count"], 0);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let app = test_app(40).await;

    for (username, password) in [("admin", "wrong"), ("nobody", "hunter2")] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "username": username, "password": password }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], INVALID_CREDENTIALS);
    }
}

#[tokio::test]
async fn test_admin_routes_require_an_admin_token() {
    let app = test_app(40).await;

    let response = app
        .clone()
        .oneshot(get_request("/admin/bookings", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(admin_request("GET", "/admin/bookings", "not-a-jwt", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let visitor_claims = AdminClaims {
        sub: "visitor".to_string(),
        role: "VISITOR".to_string(),
        exp: (Utc::now().timestamp() + 600) as usize,
    };
    let visitor_token = encode(
        &Header::default(),
        &visitor_claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let response = app
        .oneshot(admin_request("GET", "/admin/bookings", &visitor_token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_booking_crud() {
    let app = test_app(40).await;
    let token = admin_token(&app).await;

    let response = app
        .clone()
        .oneshot(admin_request("POST", "/admin/bookings", &token, Some(json!({ "name": "  Anna Berg " }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["name"], "Anna Berg");
    assert_eq!(created["transaction_id"], "manual");
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(admin_request("POST", "/admin/bookings", &token, Some(json!({ "name": "   " }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(admin_request("PUT", &format!("/admin/bookings/{}", id), &token, Some(json!({ "name": "Anna Lind" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Anna Lind");

    let response = app
        .clone()
        .oneshot(admin_request("GET", &format!("/admin/bookings/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["name"], "Anna Lind");

    let response = app
        .clone()
        .oneshot(admin_request("GET", "/admin/bookings", &token, None))
        .await
        .unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(admin_request("DELETE", &format!("/admin/bookings/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(admin_request("DELETE", &format!("/admin/bookings/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(admin_request("GET", &format!("/admin/bookings/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
