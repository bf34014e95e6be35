use std::{
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rocket::futures::{Sink, SinkExt};
use rocket_ws::Message;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use minesweeper_common::{
    models,
    protocol::{CellUpdate, ClientMessage, ServerMessage},
};
use minesweeper_engine::{Board, BoardConfig, Changes, Outcome};

pub type Games = Arc<DashMap<String, Arc<Mutex<Game>>>>;

/// Outgoing half of a player's socket, with transport errors flattened to text.
pub type Stream = Pin<Box<dyn Sink<Message, Error = String> + Send>>;

/// One player's session: an engine board plus the socket it reports to.
pub struct Game {
    board: Board,
    connection: Option<(Uuid, Stream)>,
    created_at: Instant,
    last_activity: Instant,
}

async fn send(stream: &mut Stream, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(text) => {
            if let Err(e) = stream.send(Message::Text(text)).await {
                debug!("Failed to deliver message: {}", e);
            }
        }
        Err(e) => warn!("Failed to serialize server message: {}", e),
    }
}

impl Game {
    #[instrument(level = "trace")]
    pub fn new(config: BoardConfig) -> Self {
        info!(
            "Creating new session: {}x{} with {} mines",
            config.rows(),
            config.cols(),
            config.mines()
        );
        let now = Instant::now();
        Self {
            board: Board::new(config),
            connection: None,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn init_message(&self) -> ServerMessage {
        let config = self.board.config();
        ServerMessage::Init {
            rows: config.rows(),
            cols: config.cols(),
            mines: config.mines(),
            remaining: self.board.remaining_mine_estimate(),
            field: self
                .board
                .rows()
                .map(|row| row.iter().map(models::Cell::from).collect())
                .collect(),
        }
    }

    fn update_message(&self, changes: &Changes) -> ServerMessage {
        ServerMessage::Update {
            updates: changes
                .changed
                .iter()
                .filter_map(|&pos| {
                    self.board.cell(pos).map(|cell| CellUpdate {
                        pos,
                        value: cell.into(),
                    })
                })
                .collect(),
            remaining: self.board.remaining_mine_estimate(),
            won: changes.outcome == Some(Outcome::Won),
            lost: changes.outcome == Some(Outcome::Lost),
        }
    }

    /// Runs a client action against the board and returns the reply for the client, if
    /// anything changed.
    #[instrument(level = "trace", skip(self))]
    pub fn apply(&mut self, message: ClientMessage) -> Option<ServerMessage> {
        self.last_activity = Instant::now();

        match message {
            ClientMessage::Reveal { pos } => {
                let changes = self.board.reveal(pos);
                match changes.outcome {
                    Some(Outcome::Won) => info!("Session won"),
                    Some(Outcome::Lost) => info!("Session lost at ({}, {})", pos.row, pos.col),
                    None => {}
                }
                (!changes.is_empty()).then(|| self.update_message(&changes))
            }
            ClientMessage::Flag { pos } => {
                let changes = self.board.toggle_flag(pos);
                (!changes.is_empty()).then(|| self.update_message(&changes))
            }
            ClientMessage::Restart { params } => match BoardConfig::try_from(params) {
                Ok(config) => {
                    self.board.new_game(config);
                    Some(self.init_message())
                }
                Err(e) => {
                    warn!("Ignoring restart with invalid parameters: {}", e);
                    None
                }
            },
        }
    }

    pub async fn handle(&mut self, message: ClientMessage) {
        if let Some(reply) = self.apply(message)
            && let Some((_, stream)) = self.connection.as_mut()
        {
            send(stream, &reply).await;
        }
    }

    /// Attaches the player's socket and sends it the current board. A session serves a
    /// single connection; `None` means another one is already attached.
    #[instrument(level = "trace", skip(self, stream))]
    pub async fn attach(&mut self, mut stream: Stream) -> Option<Uuid> {
        if let Some((existing, _)) = &self.connection {
            warn!("Refusing second connection, {} is attached", existing);
            return None;
        }

        let id = Uuid::new_v4();
        send(&mut stream, &self.init_message()).await;
        self.connection = Some((id, stream));
        self.last_activity = Instant::now();
        info!("Stream {} attached", id);
        Some(id)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, id: &Uuid) {
        if self
            .connection
            .as_ref()
            .is_some_and(|(attached, _)| attached == id)
        {
            self.connection = None;
            info!("Stream {} detached", id);
        } else {
            warn!("Attempted to detach stream that is not attached: {}", id);
        }
        self.last_activity = Instant::now();
    }

    pub fn has_active_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// Idle sessions expire after `inactive_timeout`; every session expires after
    /// `active_timeout`, connected or not.
    pub fn should_cleanup(&self, inactive_timeout: Duration, active_timeout: Duration) -> bool {
        if self.created_at.elapsed() >= active_timeout {
            return true;
        }

        if self.has_active_connection() {
            return false;
        }

        self.last_activity.elapsed() >= inactive_timeout
    }
}
