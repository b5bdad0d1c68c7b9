//! Monster-record fixtures and mock endpoint helpers

use safe_fetch::{Config, RetryConfig};
use serde::Deserialize;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path prefix the mock API serves monsters under
pub const MONSTER_PATH: &str = "/api/monsters";

/// Subset of a monster record returned by the mock API
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Monster {
    pub index: String,
    pub name: String,
    pub challenge_rating: f32,
    pub hit_points: u32,
}

/// JSON body for a monster
pub fn monster_json(
    index: &str,
    name: &str,
    challenge_rating: f32,
    hit_points: u32,
) -> serde_json::Value {
    serde_json::json!({
        "index": index,
        "name": name,
        "challenge_rating": challenge_rating,
        "hit_points": hit_points,
        "url": format!("{MONSTER_PATH}/{index}"),
    })
}

/// Mount a 200 response for one monster
pub async fn mount_monster(server: &MockServer, index: &str, name: &str, cr: f32, hp: u32) {
    Mock::given(method("GET"))
        .and(path(format!("{MONSTER_PATH}/{index}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(monster_json(index, name, cr, hp)))
        .mount(server)
        .await;
}

/// Mount a bare status response for one monster key
pub async fn mount_status(server: &MockServer, index: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("{MONSTER_PATH}/{index}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Config pointed at the mock server with fast, deterministic retries
pub fn test_config(server: &MockServer, concurrency: usize, max_attempts: u32) -> Config {
    let mut config = Config::default();
    config.fetch.base_url = Some(format!("{}{MONSTER_PATH}", server.uri()));
    config.fetch.concurrency = concurrency;
    config.fetch.request_timeout = Duration::from_secs(5);
    config.retry = RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}
