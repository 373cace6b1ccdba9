//! `DocumentStore` backed by the store server's HTTP API.

use api_types::{
    ERROR_EVENT, SNAPSHOT_EVENT,
    documents::{UpdateBody, ValueResponse},
    status::ErrorResponse,
};
use async_trait::async_trait;
use engine::{DocumentStore, EngineError, Patch, ResultEngine, Subscription};
use futures_util::StreamExt;
use reqwest::{StatusCode, Url};
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: Url,
    http: reqwest::Client,
}

fn transport(err: impl std::fmt::Display) -> EngineError {
    EngineError::Transport(err.to_string())
}

impl HttpStore {
    pub fn new(base_url: &str) -> ResultEngine<Self> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|err| EngineError::NotConfigured(format!("invalid server url: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, prefix: &str, path: &str) -> ResultEngine<Url> {
        let path = path.trim_matches('/');
        let relative = if path.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix}/{path}")
        };
        self.base_url
            .join(&relative)
            .map_err(|err| EngineError::InvalidPath(format!("'{path}': {err}")))
    }
}

/// Turns a non-success response into the matching engine error.
async fn error_from_response(res: reqwest::Response) -> EngineError {
    let status = res.status();
    let message = res
        .json::<ErrorResponse>()
        .await
        .map(|err| err.error)
        .unwrap_or_else(|_| "unknown error".to_string());

    match status {
        StatusCode::BAD_REQUEST => EngineError::InvalidPath(message),
        StatusCode::NOT_FOUND => EngineError::KeyNotFound(message),
        StatusCode::CONFLICT => EngineError::ExistingKey(message),
        _ => EngineError::Transport(format!("server answered {status}: {message}")),
    }
}

async fn expect_success(res: reqwest::Response) -> ResultEngine<reqwest::Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(error_from_response(res).await)
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn get(&self, path: &str) -> ResultEngine<Option<Value>> {
        let res = self
            .http
            .get(self.endpoint("db", path)?)
            .send()
            .await
            .map_err(transport)?;
        let body: ValueResponse = expect_success(res)
            .await?
            .json()
            .await
            .map_err(transport)?;
        Ok(body.value.filter(|value| !value.is_null()))
    }

    async fn update(&self, patch: Patch) -> ResultEngine<()> {
        let body = UpdateBody {
            updates: patch.into_inner(),
        };
        let res = self
            .http
            .patch(self.endpoint("db", "")?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        expect_success(res).await?;
        tracing::debug!(paths = body.updates.len(), "update sent");
        Ok(())
    }

    async fn set(&self, path: &str, value: Value) -> ResultEngine<()> {
        let res = self
            .http
            .put(self.endpoint("db", path)?)
            .json(&value)
            .send()
            .await
            .map_err(transport)?;
        expect_success(res).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> ResultEngine<()> {
        let res = self
            .http
            .delete(self.endpoint("db", path)?)
            .send()
            .await
            .map_err(transport)?;
        expect_success(res).await?;
        Ok(())
    }

    fn subscribe(&self, path: &str) -> ResultEngine<Subscription> {
        let source = self
            .http
            .get(self.endpoint("watch", path)?)
            .eventsource()
            .map_err(transport)?;
        Ok(Subscription::new(snapshots(source)))
    }
}

/// Maps server-sent `snapshot` events to store snapshots. The stream ends on
/// the first failure instead of reconnecting.
fn snapshots(
    source: EventSource,
) -> impl futures_util::Stream<Item = ResultEngine<Option<Value>>> + Send + 'static {
    futures_util::stream::unfold(Some(source), |source| async move {
        let mut source = source?;
        loop {
            let failure = match source.next().await? {
                Ok(Event::Open) => continue,
                Ok(Event::Message(msg)) if msg.event == SNAPSHOT_EVENT => {
                    let snapshot = serde_json::from_str::<Value>(&msg.data)
                        .map(|value| (!value.is_null()).then_some(value))
                        .map_err(EngineError::from);
                    return Some((snapshot, Some(source)));
                }
                Ok(Event::Message(msg)) if msg.event == ERROR_EVENT => {
                    EngineError::Transport(format!("watch failed on the server: {}", msg.data))
                }
                Ok(Event::Message(_)) => continue,
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    source.close();
                    return None;
                }
                Err(err) => transport(err),
            };
            source.close();
            tracing::warn!("subscription closed: {failure}");
            return Some((Err(failure), None));
        }
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use engine::{
        CreateGameCmd, Engine, FundRequestCmd, JoinGameCmd, MemoryIdentityStore, MemoryStore,
        Money, SessionEvent,
    };
    use serde_json::json;

    use super::*;

    async fn spawn_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr =
            server::spawn_with_listener(Arc::new(MemoryStore::new()), listener).unwrap();
        format!("http://{addr}")
    }

    async fn next(subscription: &mut Subscription) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(5), subscription.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap()
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let store = HttpStore::new("http://127.0.0.1:8080/ledger").unwrap();
        assert_eq!(
            store.endpoint("db", "/games/ABC123/").unwrap().as_str(),
            "http://127.0.0.1:8080/ledger/db/games/ABC123"
        );
        assert_eq!(
            store.endpoint("db", "").unwrap().as_str(),
            "http://127.0.0.1:8080/ledger/db"
        );
        assert_eq!(
            store.endpoint("watch", "games/ABC123").unwrap().as_str(),
            "http://127.0.0.1:8080/ledger/watch/games/ABC123"
        );
    }

    #[test]
    fn garbage_url_is_not_configured() {
        assert!(matches!(
            HttpStore::new("not a url"),
            Err(EngineError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn crud_against_a_live_server() {
        let store = HttpStore::new(&spawn_server().await).unwrap();

        assert_eq!(store.get("games/ABC123").await.unwrap(), None);
        store
            .set("games/ABC123/players/p1", json!({"name": "Alice"}))
            .await
            .unwrap();
        assert_eq!(
            store.get("games/ABC123/players/p1/name").await.unwrap(),
            Some(json!("Alice"))
        );

        let err = store
            .update(
                Patch::new()
                    .put("games/ABC123/a", json!(1))
                    .put("games/ABC123", json!(null)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPath(_)));

        store.remove("games/ABC123").await.unwrap();
        assert_eq!(store.get("games/ABC123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscription_streams_snapshots() {
        let store = HttpStore::new(&spawn_server().await).unwrap();
        let mut subscription = store.subscribe("games/ABC123").unwrap();

        assert_eq!(next(&mut subscription).await, None);
        store.set("games/ABC123/id", json!("ABC123")).await.unwrap();
        assert_eq!(next(&mut subscription).await, Some(json!({"id": "ABC123"})));
        store.remove("games/ABC123").await.unwrap();
        assert_eq!(next(&mut subscription).await, None);
    }

    #[tokio::test]
    async fn two_devices_settle_a_request_over_http() {
        let url = spawn_server().await;
        let device = || {
            Engine::builder()
                .store(HttpStore::new(&url).unwrap())
                .identity(MemoryIdentityStore::new())
                .build()
                .unwrap()
        };
        let host = device();
        let guest = device();

        let alice = host
            .create_game(CreateGameCmd::new("Alice", Money::from_units(1_000)))
            .await
            .unwrap();
        let bob = guest
            .join_game(JoinGameCmd::new(&alice.game_id, "Bob"))
            .await
            .unwrap();
        let mut watcher = guest.resume().await.unwrap().unwrap();

        let session = host.session(&alice.game_id).await.unwrap();
        let request_id = host
            .create_request(
                &session,
                FundRequestCmd::new(&alice.player_id, &bob.player_id, Money::from_units(200)),
            )
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), guest.refresh(&mut watcher))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, SessionEvent::Updated);
        let snapshot = watcher.snapshot().unwrap().clone();
        assert_eq!(
            snapshot.next_request_for(&bob.player_id).map(|r| r.id.as_str()),
            Some(request_id.as_str())
        );

        guest.accept_request(&snapshot, &request_id).await.unwrap();
        let session = host.session(&alice.game_id).await.unwrap();
        assert!(session.requests.is_empty());
        assert_eq!(
            session.player(&bob.player_id).unwrap().balance,
            Money::from_units(800)
        );
        assert_eq!(
            session.player(&alice.player_id).unwrap().balance,
            Money::from_units(1_200)
        );
    }
}
