use std::{env, time::Duration};

use rocket::fairing::AdHoc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::logic::Games;

fn env_secs(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Starts the cleanup loop once the server is up.
pub fn fairing() -> AdHoc {
    AdHoc::on_liftoff("Session Cleanup", |rocket| {
        Box::pin(async move {
            match rocket.state::<Games>() {
                Some(games) => {
                    tokio::spawn(start_cleanup_task(games.clone()));
                }
                None => warn!("No session storage managed, cleanup task not started"),
            }
        })
    })
}

pub async fn start_cleanup_task(games: Games) {
    let cleanup_interval = env_secs("CLEANUP_INTERVAL_SECONDS", 60);
    let inactive_timeout = env_secs("INACTIVE_GAME_TIMEOUT_SECONDS", 600);
    let active_timeout = env_secs("ACTIVE_GAME_TIMEOUT_SECONDS", 86400);

    let mut interval = time::interval(cleanup_interval);

    info!(
        "Started session cleanup task: checking every {}s, inactive timeout: {}s, active timeout: {}s",
        cleanup_interval.as_secs(),
        inactive_timeout.as_secs(),
        active_timeout.as_secs()
    );

    loop {
        interval.tick().await;
        cleanup_games(&games, inactive_timeout, active_timeout);
    }
}

pub fn cleanup_games(games: &Games, inactive_timeout: Duration, active_timeout: Duration) -> usize {
    let mut games_to_remove = Vec::new();

    for entry in games.iter() {
        // a session that is locked is in use right now
        if let Ok(game) = entry.value().try_lock()
            && game.should_cleanup(inactive_timeout, active_timeout)
        {
            games_to_remove.push(entry.key().clone());
        }
    }

    let removed_count = games_to_remove.len();
    for game_id in games_to_remove {
        games.remove(&game_id);
        debug!("Cleaned up session: {}", game_id);
    }

    if removed_count > 0 {
        info!("Cleaned up {} sessions", removed_count);
    }

    removed_count
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dashmap::DashMap;
    use minesweeper_engine::BoardConfig;
    use tokio::sync::Mutex;

    use super::*;
    use crate::logic::Game;

    fn games_with(ids: &[&str]) -> Games {
        let games: Games = Arc::new(DashMap::new());
        for id in ids {
            games.insert(
                id.to_string(),
                Arc::new(Mutex::new(Game::new(BoardConfig::default()))),
            );
        }
        games
    }

    #[test]
    fn keeps_fresh_sessions() {
        let games = games_with(&["abcde", "fghij"]);
        let hour = Duration::from_secs(3600);

        assert_eq!(cleanup_games(&games, hour, hour), 0);
        assert_eq!(games.len(), 2);
    }

    #[test]
    fn removes_idle_sessions() {
        let games = games_with(&["abcde", "fghij"]);

        assert_eq!(
            cleanup_games(&games, Duration::ZERO, Duration::from_secs(3600)),
            2
        );
        assert!(games.is_empty());
    }

    #[tokio::test]
    async fn skips_sessions_in_use() {
        let games = games_with(&["abcde"]);
        let session = games.get("abcde").unwrap().value().clone();
        let _guard = session.lock().await;

        assert_eq!(cleanup_games(&games, Duration::ZERO, Duration::ZERO), 0);
        assert_eq!(games.len(), 1);
    }
}
