use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

use super::app::AppState;
use super::auth::CurrentUser;

/// Upgrade to a WebSocket carrying the authenticated user's notification
/// pushes as JSON frames. The socket is a transport adapter over the
/// dispatcher contract; missing a frame here loses nothing, the ledger
/// holds the durable record.
pub async fn notification_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: i32) {
    let receiver = state.dispatcher.subscribe(user_id).await;
    let mut pushes = BroadcastStream::new(receiver);
    debug!("user {} connected for realtime notifications", user_id);

    loop {
        tokio::select! {
            push = pushes.next() => match push {
                Some(Ok(push)) => {
                    let Ok(frame) = serde_json::to_string(&push) else {
                        continue;
                    };
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // Lagged receiver: the client fell behind the channel
                // buffer. Skipped pushes remain in the ledger.
                Some(Err(_)) => continue,
                None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(_)) => continue,
                _ => break,
            },
        }
    }

    debug!("user {} realtime channel closed", user_id);
}
