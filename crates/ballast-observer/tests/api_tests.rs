//! Integration tests for the observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Each test builds a fresh zone and reads it back
//! through the HTTP surface.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ballast_core::config::ZoneConfig;
use ballast_core::operator::OperatorState;
use ballast_core::topology::StaticTopology;
use ballast_core::zone::Zone;
use ballast_events::EventBus;
use ballast_observer::router::build_router;
use ballast_observer::state::AppState;
use ballast_types::{
    Item, ItemCategory, ItemFlags, ItemId, Owner, PlayerId, RoomId, ShopKind, WeightClass,
};
use ballast_world::CatalogGenerator;
use serde_json::Value;
use tower::ServiceExt;

fn make_zone() -> Arc<Zone> {
    Arc::new(Zone::new(
        ZoneConfig::default(),
        Arc::new(StaticTopology::new("KonMarie Temple", "Welcome area")),
        Arc::new(CatalogGenerator::new()),
        Arc::new(EventBus::default()),
    ))
}

fn pebble() -> Item {
    Item {
        id: ItemId::new(),
        name: String::from("a smooth pebble"),
        description: String::from("It fits the palm."),
        category: ItemCategory::Talisman,
        weight_class: WeightClass::Regular,
        flags: ItemFlags::default(),
        material: None,
        provenance: None,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Body) {
    let response = build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, response.into_body())
}

#[tokio::test]
async fn test_index_returns_html() {
    let state = Arc::new(AppState::new(make_zone()));
    let (status, body) = get(state, "/").await;
    assert_eq!(status, StatusCode::OK);

    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Zone 25 Capacity"));
    assert!(html.contains("SAFE"));
}

#[tokio::test]
async fn test_status_counts_tracked_items() {
    let zone = make_zone();
    let player = PlayerId::new();
    zone.spawn(pebble(), Owner::Player(player)).await.unwrap();
    zone.spawn(pebble(), Owner::Player(player)).await.unwrap();

    let (status, body) = get(Arc::new(AppState::new(zone)), "/api/status").await;
    assert_eq!(status, StatusCode::OK);

    let json = body_to_json(body).await;
    assert_eq!(json["tracked_items"], 2);
    assert_eq!(json["danger_level"], "safe");
    assert_eq!(json["generation_enabled"], true);
}

#[tokio::test]
async fn test_player_shows_wallet_and_possessions() {
    let zone = make_zone();
    let player = PlayerId::new();
    zone.grant(player, 30).await.unwrap();
    zone.spawn(pebble(), Owner::Player(player)).await.unwrap();

    let uri = format!("/api/players/{player}");
    let (status, body) = get(Arc::new(AppState::new(zone)), &uri).await;
    assert_eq!(status, StatusCode::OK);

    let json = body_to_json(body).await;
    assert_eq!(json["statement"]["wallet"], 30);
    assert_eq!(json["possessions"].as_array().unwrap().len(), 1);
    assert_eq!(json["under_investigation"], false);
}

#[tokio::test]
async fn test_unknown_player_has_a_clean_record() {
    let uri = format!("/api/players/{}", PlayerId::new());
    let (status, body) = get(Arc::new(AppState::new(make_zone())), &uri).await;
    assert_eq!(status, StatusCode::OK);

    let json = body_to_json(body).await;
    assert_eq!(json["statement"]["wallet"], 0);
    assert!(json["possessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_player_bad_uuid() {
    let (status, body) = get(Arc::new(AppState::new(make_zone())), "/api/players/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json = body_to_json(body).await;
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_list_and_browse_shops() {
    let zone = make_zone();
    let shop = zone.add_shop(ShopKind::General, RoomId::new()).await;
    let state = Arc::new(AppState::new(zone));

    let (status, body) = get(Arc::clone(&state), "/api/shops").await;
    assert_eq!(status, StatusCode::OK);
    let json = body_to_json(body).await;
    assert_eq!(json["count"], 1);

    let (status, body) = get(state, &format!("/api/shops/{shop}")).await;
    assert_eq!(status, StatusCode::OK);
    let json = body_to_json(body).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_unknown_shop_not_found() {
    let uri = format!("/api/shops/{}", uuid::Uuid::new_v4());
    let (status, _) = get(Arc::new(AppState::new(make_zone())), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_shelves() {
    let zone = make_zone();
    zone.add_shelf(RoomId::new(), "the window ledge").await;

    let (status, body) = get(Arc::new(AppState::new(zone)), "/api/shelves").await;
    assert_eq!(status, StatusCode::OK);

    let json = body_to_json(body).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["shelves"][0]["name"], "the window ledge");
    assert!(json["shelves"][0]["claimant"].is_null());
}

#[tokio::test]
async fn test_operator_status_requires_runner() {
    let (status, _) = get(Arc::new(AppState::new(make_zone())), "/api/operator/status").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_operator_status_reports_pause() {
    let operator = Arc::new(OperatorState::new());
    operator.pause();
    let state = Arc::new(AppState::with_operator(make_zone(), operator));

    let (status, body) = get(state, "/api/operator/status").await;
    assert_eq!(status, StatusCode::OK);

    let json = body_to_json(body).await;
    assert_eq!(json["paused"], true);
    assert_eq!(json["stop_requested"], false);
    assert_eq!(json["actions_pending"], 0);
}
