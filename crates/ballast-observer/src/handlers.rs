//! REST API endpoint handlers for the observer.
//!
//! All handlers read the live zone through its query methods via the shared
//! [`AppState`]. Nothing here changes zone state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | HTML counter sign |
//! | `GET` | `/api/status` | Capacity, danger level and pool |
//! | `GET` | `/api/players/:id` | Balances, standing, fines and possessions |
//! | `GET` | `/api/shops` | Shop counters |
//! | `GET` | `/api/shops/:id` | Listings with current buy prices |
//! | `GET` | `/api/shelves` | Display shelves and their claimants |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use uuid::Uuid;

use ballast_types::{PlayerId, ShopId};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- HTML counter sign
// ---------------------------------------------------------------------------

/// Serve the counter sign: item count against the limit, danger level and
/// the pool balance.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.zone.status().await;
    let total = status.global_total.round_dp(2);
    let limit = status.item_limit;
    let level = format!("{:?}", status.danger_level).to_uppercase();
    let ambience = format!("{:?}", status.ambience);
    let tracked = status.tracked_items;
    let balance = status.pool.balance;
    let cap = status.pool.cap;
    let generation = if status.generation_enabled {
        "ONLINE"
    } else {
        "SHUT DOWN"
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Zone Capacity</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .level {{ color: #f0883e; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Zone 25 Capacity</h1>
    <p class="subtitle">Mind your weight.</p>

    <p>Danger level: <span class="level">{level}</span> ({ambience})</p>

    <div>
        <div class="metric">
            <div class="label">Weight</div>
            <div class="value">{total} / {limit}</div>
        </div>
        <div class="metric">
            <div class="label">Items</div>
            <div class="value">{tracked}</div>
        </div>
        <div class="metric">
            <div class="label">Feedstock</div>
            <div class="value">{balance} / {cap}</div>
        </div>
        <div class="metric">
            <div class="label">Itemators</div>
            <div class="value">{generation}</div>
        </div>
    </div>

    <ul>
        <li><a href="/api/status">/api/status</a></li>
        <li><a href="/api/shops">/api/shops</a></li>
        <li><a href="/api/shelves">/api/shelves</a></li>
        <li>/api/players/:id</li>
        <li>/ws/events</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return the zone status.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.zone.status().await)
}

// ---------------------------------------------------------------------------
// GET /api/players/:id
// ---------------------------------------------------------------------------

/// Return a player's `score` card together with what they hold.
///
/// Unknown players are not an error: every player starts with an empty
/// record, zero balance and clean standing.
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let player = PlayerId::from(parse_uuid(&id_str)?);
    let card = state.zone.score(player).await;
    let possessions = state.zone.possessions(player).await;

    Ok(Json(serde_json::json!({
        "statement": card.statement,
        "fine_history": card.fine_history,
        "escorts_completed": card.escorts_completed,
        "under_investigation": card.under_investigation,
        "possessions": possessions,
    })))
}

// ---------------------------------------------------------------------------
// Shops and shelves
// ---------------------------------------------------------------------------

/// List shop counters.
pub async fn list_shops(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let shops: Vec<serde_json::Value> = state
        .zone
        .shops()
        .await
        .iter()
        .map(|shop| {
            serde_json::json!({
                "id": shop.id,
                "kind": shop.kind,
                "name": shop.name,
                "room": shop.room,
                "listings": shop.listing_count(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "count": shops.len(),
        "shops": shops,
    }))
}

/// Browse one counter at current prices.
pub async fn get_shop(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let shop = ShopId::from(parse_uuid(&id_str)?);
    let listings = state.zone.browse(shop).await?;

    Ok(Json(serde_json::json!({
        "shop": shop,
        "count": listings.len(),
        "listings": listings,
    })))
}

/// List display shelves with their claimants and contents.
pub async fn list_shelves(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let shelves: Vec<serde_json::Value> = state
        .zone
        .shelves()
        .await
        .iter()
        .map(|shelf| {
            serde_json::json!({
                "id": shelf.id,
                "name": shelf.name,
                "room": shelf.room,
                "claimant": shelf.claimant(),
                "items": shelf.items().collect::<Vec<_>>(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "count": shelves.len(),
        "shelves": shelves,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID from a string, returning an [`ObserverError`] on failure.
fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    s.parse::<Uuid>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
