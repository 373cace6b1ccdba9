//! Server-sent snapshots of one path.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use engine::Subscription;
use futures_util::{Stream, StreamExt, stream};

use crate::{
    ServerError,
    server::ServerState,
    types::{ERROR_EVENT, SNAPSHOT_EVENT},
};

/// Stream the value at `path`: once right away, then after every change.
///
/// A store failure is reported as one `error` event and ends the stream.
pub async fn watch(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    let subscription = state.store.subscribe(&path)?;
    tracing::debug!(%path, "watch opened");
    Ok(Sse::new(events(subscription)).keep_alive(KeepAlive::default()))
}

fn events(subscription: Subscription) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some(subscription), |subscription| async move {
        let mut subscription = subscription?;
        let event = match subscription.next().await? {
            Ok(snapshot) => {
                let data = serde_json::to_string(&snapshot).unwrap_or_else(|_| "null".to_string());
                return Some((
                    Ok(Event::default().event(SNAPSHOT_EVENT).data(data)),
                    Some(subscription),
                ));
            }
            Err(err) => {
                tracing::warn!("watch stream failed: {err}");
                Event::default().event(ERROR_EVENT).data(err.kind().as_str())
            }
        };
        Some((Ok(event), None))
    })
    .fuse()
}
