//! JSON API routing and request handling
//!
//! Handlers work on already-collected request bodies and return a status plus
//! a JSON value, so they can be driven without a socket.

use crate::config::Config;
use crate::locks::GameLocks;
use hyper::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use warroom_core::{ActionKind, GameId, PlayerId};
use warroom_db::Store;

/// A matched API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Games,
    Game(GameId),
    Join(GameId),
    Start(GameId),
    Actions(GameId),
    Resolve(GameId),
    Logs(GameId),
}

impl Route {
    /// Match a request path; `None` for unknown paths
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["health"] => Some(Route::Health),
            ["games"] => Some(Route::Games),
            ["games", id, rest @ ..] => {
                let id = GameId::new(id.parse().ok()?);
                match rest {
                    [] => Some(Route::Game(id)),
                    ["join"] => Some(Route::Join(id)),
                    ["start"] => Some(Route::Start(id)),
                    ["actions"] => Some(Route::Actions(id)),
                    ["resolve"] => Some(Route::Resolve(id)),
                    ["logs"] => Some(Route::Logs(id)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// The only method this route accepts
    pub fn method(&self) -> Method {
        match self {
            Route::Health | Route::Game(_) | Route::Logs(_) => Method::GET,
            _ => Method::POST,
        }
    }
}

/// A request that could not be served
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("No route for {path}"))
    }

    pub fn method_not_allowed(method: &Method, path: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            format!("{method} not allowed on {path}"),
        )
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    /// JSON error body
    pub fn body(&self) -> Value {
        json!({ "error": self.message, "kind": self.kind })
    }
}

impl From<warroom_db::Error> for ApiError {
    fn from(err: warroom_db::Error) -> Self {
        let status = match &err {
            warroom_db::Error::Game(warroom_core::Error::GameNotFound(_)) => StatusCode::NOT_FOUND,
            warroom_db::Error::Game(_) | warroom_db::Error::DuplicateKey(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateGameRequest {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequest {
    player_name: String,
    nation_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    player_id: PlayerId,
    action: ActionKind,
}

/// An empty body reads as `{}`
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

/// Shared server state
///
/// Store operations are blocking native_db transactions; they run on tokio's
/// blocking pool so a slow commit never stalls the request executor.
pub struct App {
    store: Arc<Store>,
    config: Arc<Config>,
    locks: GameLocks,
}

impl App {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            locks: GameLocks::new(),
        }
    }

    /// Serve one request
    pub async fn handle(&self, method: &Method, path: &str, body: &[u8]) -> (StatusCode, Value) {
        match self.dispatch(method, path, body).await {
            Ok(value) => (StatusCode::OK, value),
            Err(err) => {
                if err.status.is_server_error() {
                    tracing::error!(%method, path, kind = err.kind, error = %err, "request failed");
                } else {
                    tracing::warn!(%method, path, kind = err.kind, error = %err, "request rejected");
                }
                (err.status, err.body())
            }
        }
    }

    /// Run a store operation on the blocking pool
    async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Store) -> warroom_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?
            .map_err(ApiError::from)
    }

    async fn dispatch(&self, method: &Method, path: &str, body: &[u8]) -> Result<Value, ApiError> {
        let route = Route::parse(path).ok_or_else(|| ApiError::not_found(path))?;
        if *method != route.method() {
            return Err(ApiError::method_not_allowed(method, path));
        }

        match route {
            Route::Health => Ok(json!({ "ok": true })),
            Route::Games => {
                let request: CreateGameRequest = parse_body(body)?;
                let config = self.config.clone();
                let view = self
                    .with_store(move |store| {
                        let game = store.create_game(
                            request.name.as_deref(),
                            &config.default_nations,
                            &config.starting_stock,
                        )?;
                        store.game(game.id)
                    })
                    .await?;
                to_json(&view)
            }
            Route::Game(id) => to_json(&self.with_store(move |store| store.game(id)).await?),
            Route::Join(id) => {
                let request: JoinRequest = parse_body(body)?;
                let (player, view) = self
                    .with_store(move |store| {
                        let player =
                            store.join_game(id, &request.player_name, &request.nation_name)?;
                        Ok((player, store.game(id)?))
                    })
                    .await?;
                let game = to_json(&view)?;
                Ok(json!({ "game": game, "playerId": player.id }))
            }
            Route::Start(id) => {
                let min_players = self.config.min_players;
                to_json(&self.with_store(move |store| store.start_game(id, min_players)).await?)
            }
            Route::Actions(id) => {
                let request: SubmitRequest = parse_body(body)?;
                let action = self
                    .with_store(move |store| {
                        store.submit_action(id, request.player_id, request.action)
                    })
                    .await?;
                Ok(json!({ "ok": true, "actionId": action.id }))
            }
            Route::Resolve(id) => {
                // Held until the blocking resolution has committed.
                let _guard = self.locks.acquire(id).await;
                let report = self.with_store(move |store| store.resolve_turn(id)).await?;
                let logs = to_json(&report.logs)?;
                let victory = to_json(&report.victory)?;
                Ok(json!({
                    "ok": true,
                    "turn": report.turn,
                    "logs": logs,
                    "victory": victory,
                }))
            }
            Route::Logs(id) => {
                let logs = self.with_store(move |store| store.turn_logs(id)).await?;
                Ok(json!({ "logs": to_json(&logs)? }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(Store::in_memory().unwrap(), Config::default())
    }

    async fn post(app: &App, path: &str, body: Value) -> (StatusCode, Value) {
        app.handle(&Method::POST, path, body.to_string().as_bytes()).await
    }

    async fn get(app: &App, path: &str) -> (StatusCode, Value) {
        app.handle(&Method::GET, path, b"").await
    }

    /// Create a game with Germany and USSR joined; returns (game, germany, ussr)
    async fn joined_game(app: &App) -> (u64, u64, u64) {
        let (status, game) = app.handle(&Method::POST, "/games", b"").await;
        assert_eq!(status, StatusCode::OK);
        let id = game["id"].as_u64().unwrap();

        let mut players = Vec::new();
        for (player, nation) in [("alice", "Germany"), ("bob", "USSR")] {
            let (status, joined) = post(
                app,
                &format!("/games/{id}/join"),
                json!({ "playerName": player, "nationName": nation }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            players.push(joined["playerId"].as_u64().unwrap());
        }
        (id, players[0], players[1])
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/health"), Some(Route::Health));
        assert_eq!(Route::parse("/games"), Some(Route::Games));
        assert_eq!(Route::parse("/games/7"), Some(Route::Game(GameId::new(7))));
        assert_eq!(Route::parse("/games/7/resolve/"), Some(Route::Resolve(GameId::new(7))));
        assert_eq!(Route::parse("/games/abc"), None);
        assert_eq!(Route::parse("/games/7/surrender"), None);
        assert_eq!(Route::parse("/"), None);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(&app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_create_game() {
        let app = app();
        let (status, body) = post(&app, "/games", json!({ "name": "Operation Test" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Operation Test");
        assert_eq!(body["status"], "open");
        assert_eq!(body["turn"], 0);
        assert_eq!(body["nations"].as_object().unwrap().len(), 6);
        assert_eq!(body["nations"]["Germany"]["color"], "#444");
        assert_eq!(body["nations"]["USA"]["money"], 50);

        let (_, unnamed) = post(&app, "/games", json!({})).await;
        assert_eq!(unnamed["name"], "WW2 Sim");
    }

    #[tokio::test]
    async fn test_full_turn() {
        let app = app();
        let (id, germany, ussr) = joined_game(&app).await;

        let (status, started) = post(&app, &format!("/games/{id}/start"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["status"], "active");

        let (status, queued) = post(
            &app,
            &format!("/games/{id}/actions"),
            json!({ "playerId": germany, "action": { "type": "build", "amount": 2 } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queued["ok"], true);
        assert!(queued["actionId"].as_u64().is_some());

        post(
            &app,
            &format!("/games/{id}/actions"),
            json!({ "playerId": ussr, "action": { "type": "research", "investment": 1000 } }),
        )
        .await;

        let (status, resolved) = post(&app, &format!("/games/{id}/resolve"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["ok"], true);
        assert_eq!(resolved["turn"], 1);
        assert_eq!(resolved["victory"], Value::Null);
        let logs = resolved["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["entry"]["outcome"], "failed");
        assert_eq!(logs[0]["entry"]["kind"], "insufficient_funds");

        let (status, game) = get(&app, &format!("/games/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(game["turn"], 1);
        assert_eq!(game["nations"]["Germany"]["troops"], 12);

        let (status, history) = get(&app, &format!("/games/{id}/logs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["logs"].as_array().unwrap().len(), 1);
    }

    async fn started_game(app: &App) -> u64 {
        let (id, _, _) = joined_game(app).await;
        let (status, _) = post(app, &format!("/games/{id}/start"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_resolves_of_different_games() {
        let app = Arc::new(app());
        let first = started_game(&app).await;
        let second = started_game(&app).await;

        let resolve = |id: u64| {
            let app = app.clone();
            tokio::spawn(async move {
                post(&app, &format!("/games/{id}/resolve"), json!({})).await
            })
        };
        let (a, b) = tokio::join!(resolve(first), resolve(second));
        for (status, body) in [a.unwrap(), b.unwrap()] {
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["turn"], 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_resolves_of_one_game_are_serialized() {
        let app = Arc::new(app());
        let id = started_game(&app).await;

        let resolve = || {
            let app = app.clone();
            tokio::spawn(async move {
                post(&app, &format!("/games/{id}/resolve"), json!({})).await
            })
        };
        let (a, b) = tokio::join!(resolve(), resolve());
        let mut turns: Vec<u64> = [a.unwrap(), b.unwrap()]
            .iter()
            .map(|(status, body)| {
                assert_eq!(*status, StatusCode::OK);
                body["turn"].as_u64().unwrap()
            })
            .collect();
        turns.sort_unstable();
        assert_eq!(turns, vec![1, 2]);

        let (_, game) = get(&app, &format!("/games/{id}")).await;
        assert_eq!(game["turn"], 2);
    }

    #[tokio::test]
    async fn test_routing_errors() {
        let app = app();
        let (status, body) = get(&app, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, body) = get(&app, "/games").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["kind"], "method_not_allowed");

        let (status, body) = app.handle(&Method::POST, "/games", b"{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_unknown_game() {
        let app = app();
        let (status, body) = get(&app, "/games/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "game_not_found");

        let (status, _) = post(&app, "/games/99/resolve", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(&app, "/games/99/logs").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lifecycle_errors() {
        let app = app();
        let (id, germany, _) = joined_game(&app).await;

        let (status, body) = post(
            &app,
            &format!("/games/{id}/join"),
            json!({ "playerName": "eve", "nationName": "Germany" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "nation_taken");

        let (status, body) = post(
            &app,
            &format!("/games/{id}/actions"),
            json!({ "playerId": germany, "action": { "type": "build" } }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_state");

        let (status, body) = post(&app, &format!("/games/{id}/resolve"), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_state");
    }

    #[tokio::test]
    async fn test_start_needs_players() {
        let app = app();
        let (_, game) = post(&app, "/games", json!({})).await;
        let id = game["id"].as_u64().unwrap();
        let (status, body) = post(&app, &format!("/games/{id}/start"), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "not_enough_players");
    }

    #[tokio::test]
    async fn test_rejects_malformed_action() {
        let app = app();
        let (id, germany, _) = joined_game(&app).await;
        post(&app, &format!("/games/{id}/start"), json!({})).await;

        for action in [
            json!({ "type": "nuke" }),
            json!({ "type": "build", "amount": -3 }),
            json!({ "type": "trade", "buy": { "gold": 1 } }),
        ] {
            let (status, body) = post(
                &app,
                &format!("/games/{id}/actions"),
                json!({ "playerId": germany, "action": action }),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["kind"], "bad_request");
        }
    }
}
