use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{game_service::authorize_player, public_service::project, sse_events},
    state::{SharedState, game::GameId},
};

/// Subscribe a player to the status stream of their game.
///
/// The first event is the current status; subscription and snapshot happen under
/// the game's read lock so no update can fall between them.
pub async fn subscribe_game(
    state: &SharedState,
    game_id: &str,
    session_key: &str,
) -> Result<(broadcast::Receiver<ServerEvent>, Option<ServerEvent>), ServiceError> {
    let authorized = authorize_player(state, game_id, session_key, false).await?;
    let game = authorized.game.read().await;

    // Eviction drops games under their write lock before closing their hub.
    state.sessions().game(game.id())?;

    let receiver = state.subscribe_game(game.id());
    let initial = sse_events::status_event(&project(&game));
    Ok((receiver, initial))
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects or the game goes away.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Option<ServerEvent>,
    game_id: GameId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(initial) = initial
            && tx.send(Ok(to_event(initial))).await.is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        // Every status is complete; the next one supersedes what was missed.
                        Err(RecvError::Lagged(_)) => continue,
                    }
                }
            }
        }

        info!(game_id = %game_id, "game SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
