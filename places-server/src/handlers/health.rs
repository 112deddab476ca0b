use actix_web::{web, HttpResponse, Responder};
use places_common::db::DbAsyncPool;
use serde::Deserialize;
use serde_json::json;

use crate::env;

#[derive(Deserialize)]
pub struct HealthQuery {
    pub key: Option<String>,
}

pub async fn heartbeat() -> impl Responder {
    HttpResponse::Ok()
}

/// Reports database pool statistics. Gated behind a shared key so pool
/// internals aren't exposed publicly.
pub async fn health(
    db_async_pool: web::Data<DbAsyncPool>,
    query: web::Query<HealthQuery>,
) -> impl Responder {
    if !health_key_matches(query.key.as_deref()) {
        return HttpResponse::Unauthorized().finish();
    }

    let pool_state = db_async_pool.state();

    HttpResponse::Ok().json(json!({
        "db_async_pool_state": {
            "connections": pool_state.connections,
            "idle_connections": pool_state.idle_connections
        }
    }))
}

#[inline]
fn health_key_matches(key: Option<&str>) -> bool {
    let Some(key) = key else {
        return false;
    };

    let correct_key = env::CONF.health_endpoint_key.as_bytes();
    let key = key.as_bytes();

    if correct_key.len() != key.len() || key.is_empty() {
        return false;
    }

    // Bitwise comparison to prevent timing attacks
    let mut keys_dont_match = 0u8;

    for (i, correct_key_byte) in correct_key.iter().enumerate() {
        unsafe {
            keys_dont_match |= correct_key_byte ^ key.get_unchecked(i);
        }
    }

    keys_dont_match == 0
}
