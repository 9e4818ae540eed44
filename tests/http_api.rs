mod common;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use common::*;
use events_rewards_backend::handlers;
use events_rewards_backend::middlewares::AuthMiddleware;
use events_rewards_backend::utils::JwtService;
use serde_json::{Value, json};
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn bearer(user_id: Uuid) -> (&'static str, String) {
    let token = JwtService::new(SECRET, 3600)
        .generate_access_token(user_id, "player@example.com", "device-1")
        .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! init_app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new(SECRET, 3600)))
                .app_data(web::Data::new($h.lucky_draw.clone()))
                .app_data(web::Data::new($h.claims.clone()))
                .service(
                    web::scope("/api/v1")
                        .configure(handlers::health_config)
                        .configure(handlers::lucky_draw_config)
                        .configure(handlers::user_config),
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn test_public_endpoints_need_no_token() {
    let h = harness().await;
    seed_reward(&h.db, RewardSeed::real("Coffee voucher", 0.2)).await;
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/lucky-draw/rewards")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "Coffee voucher");
    // 不暴露权重与库存
    assert!(body["data"][0].get("probability").is_none());
    assert!(body["data"][0].get("total_claimed").is_none());
}

#[actix_web::test]
async fn test_protected_endpoints_reject_missing_or_bad_token() {
    let h = harness().await;
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/spin")
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/user/stats")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let other_signer = JwtService::new("another-secret", 3600)
        .generate_access_token(Uuid::new_v4(), "", "")
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/api/v1/lucky-draw/remaining-spins")
        .insert_header(("Authorization", format!("Bearer {other_signer}")))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_spin_limit_maps_to_429() {
    let h = harness().await;
    seed_reward(&h.db, RewardSeed::no_prize("Try again", 1.0)).await;
    let app = init_app!(h);
    let user = Uuid::new_v4();

    for expected in 1..=3 {
        let req = test::TestRequest::post()
            .uri("/api/v1/lucky-draw/spin")
            .insert_header(bearer(user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["attempts_used"], expected);
        assert!(body["data"].get("claim_code").is_none());
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/spin")
        .insert_header(bearer(user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");

    let req = test::TestRequest::get()
        .uri("/api/v1/lucky-draw/remaining-spins")
        .insert_header(bearer(user))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["remaining_spins"], 0);
    assert_eq!(body["data"]["can_spin_today"], false);
}

#[actix_web::test]
async fn test_empty_pool_maps_to_503() {
    let h = harness().await;
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/spin")
        .insert_header(bearer(Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[actix_web::test]
async fn test_claim_flow_over_http() {
    let h = harness().await;
    seed_reward(&h.db, RewardSeed::real("Coffee voucher", 1.0)).await;
    let app = init_app!(h);
    let user = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/spin")
        .insert_header(bearer(user))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let code = body["data"]["claim_code"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/claim")
        .insert_header(bearer(user))
        .set_json(json!({ "claim_code": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/claim")
        .insert_header(bearer(Uuid::new_v4()))
        .set_json(json!({ "claim_code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/claim")
        .insert_header(bearer(user))
        .set_json(json!({ "claim_code": code }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["reward"]["status"], "claimed");

    let req = test::TestRequest::get()
        .uri("/api/v1/user/rewards?page=1&per_page=10")
        .insert_header(bearer(user))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["claim_code"], code.as_str());

    let req = test::TestRequest::get()
        .uri("/api/v1/user/stats")
        .insert_header(bearer(user))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total_spins"], 1);
    assert_eq!(body["data"]["claimed_rewards"], 1);
}

#[actix_web::test]
async fn test_expired_claim_maps_to_400() {
    let h = harness().await;
    seed_reward(&h.db, RewardSeed::real("Coffee voucher", 1.0)).await;
    let app = init_app!(h);
    let user = Uuid::new_v4();

    let code = h.lucky_draw.spin(user).await.unwrap().claim_code.unwrap();
    h.clock.advance(chrono::Duration::days(8));

    let req = test::TestRequest::post()
        .uri("/api/v1/lucky-draw/claim")
        .insert_header(bearer(user))
        .set_json(json!({ "claim_code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "EXPIRED");
}
