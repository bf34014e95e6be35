use std::sync::Arc;

use dashmap::Entry;
use nanoid::nanoid;
use rocket::{
    State,
    futures::{SinkExt, StreamExt},
    get,
    http::Status,
    post,
    serde::json::Json,
};
use rocket_ws::{Channel, Message, WebSocket};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use minesweeper_common::{
    models::{CreateResponse, GameParams},
    protocol::ClientMessage,
};
use minesweeper_engine::BoardConfig;

use crate::{
    logic::{Game, Games},
    rate_limit::{ClientIp, RateLimiter, check_rate_limit},
};

#[instrument(level = "trace", skip(games, game))]
fn add_game(games: &Games, game: Game) -> String {
    let mut id_length = 5;
    let max_attempts_per_length = 10;
    let game = Arc::new(Mutex::new(game));

    loop {
        for _ in 0..max_attempts_per_length {
            let id = nanoid!(id_length);
            match games.entry(id.clone()) {
                Entry::Occupied(_) => {
                    debug!("Session ID collision, trying another: {}", id);
                    continue;
                }
                Entry::Vacant(entry) => {
                    entry.insert(game);
                    info!("Created new session with ID: {}", id);
                    return id;
                }
            }
        }

        warn!(
            "Exhausted ID attempts at length {}, increasing to {}",
            id_length,
            id_length + 1
        );
        id_length += 1;
    }
}

#[post("/create", data = "<params>")]
#[instrument(level = "trace", skip(games, rate_limiter), fields(client_ip = %client_ip.0, rows = params.rows, cols = params.cols, mines = params.mines))]
pub fn create_game(
    params: Json<GameParams>,
    games: &State<Games>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> Result<Json<CreateResponse>, Status> {
    info!(
        "Session creation request from {}: {}x{} with {} mines",
        client_ip.0, params.rows, params.cols, params.mines
    );

    check_rate_limit(rate_limiter, &client_ip.0)?;

    let config = BoardConfig::try_from(params.into_inner()).map_err(|e| {
        warn!("Rejecting session parameters from {}: {}", client_ip.0, e);
        Status::UnprocessableEntity
    })?;

    let id = add_game(games, Game::new(config));

    info!(
        "Successfully created session {} for client {}",
        id, client_ip.0
    );
    Ok(Json(CreateResponse { id }))
}

#[get("/ws?<id>")]
#[instrument(level = "trace", skip(ws, games), fields(game_id = %id))]
pub fn websocket_handler(
    ws: WebSocket,
    games: &State<Games>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let game = match games.get(&id) {
        None => {
            warn!("WebSocket connection attempt for non-existent session: {}", id);
            return Err(Status::NotFound);
        }
        Some(value) => value.value().clone(),
    };

    // a locked session is busy, so the attach below settles it
    if let Ok(session) = game.try_lock()
        && session.has_active_connection()
    {
        warn!("Session {} already has a player connected", id);
        return Err(Status::Conflict);
    }

    info!("WebSocket connection established for session: {}", id);

    Ok(ws.channel(move |stream| {
        let game_id = id.clone();
        Box::pin(async move {
            let (write, mut read) = stream.split();

            let stream_id = {
                let mut game = game.lock().await;
                let write = write.sink_map_err(|e| e.to_string());
                game.attach(Box::pin(write)).await
            };
            let Some(stream_id) = stream_id else {
                warn!("Dropping extra connection to session {}", game_id);
                return Ok(());
            };

            info!(
                "Client connected to session {} (stream: {})",
                game_id, stream_id
            );

            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("Received message from session {}: {:?}", game_id, message);
                            let mut game = game.lock().await;
                            game.handle(message).await;
                        }
                        Err(e) => {
                            warn!(
                                "Invalid message format in session {}: {} - Error: {}",
                                game_id, text, e
                            );
                        }
                    },
                    Ok(Message::Close(_)) => {
                        info!(
                            "WebSocket connection closed for session {} (stream: {})",
                            game_id, stream_id
                        );
                        break;
                    }
                    Ok(Message::Ping(_) | Message::Pong(_)) => {}
                    Err(e) => {
                        error!(
                            "WebSocket error in session {} (stream: {}): {}",
                            game_id, stream_id, e
                        );
                        break;
                    }
                    Ok(_) => {
                        debug!("Received non-text message in session {}, closing", game_id);
                        break;
                    }
                }
            }

            game.lock().await.detach(&stream_id);

            info!(
                "Client disconnected from session {} (stream: {})",
                game_id, stream_id
            );
            Ok(())
        })
    }))
}
