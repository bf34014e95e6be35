use std::sync::Arc;

use dashmap::DashMap;
use rocket::{Build, Rocket, routes};

pub mod cleanup;
pub mod cors;
pub mod logic;
pub mod rate_limit;
pub mod routes;

use crate::{
    cors::create_cors,
    logic::Games,
    rate_limit::create_rate_limiter,
    routes::{create_game, websocket_handler},
};

/// Rocket instance with session storage, rate limiter, CORS, session cleanup and routes.
pub fn build() -> Rocket<Build> {
    let games: Games = Arc::new(DashMap::new());

    rocket::build()
        .attach(create_cors())
        .attach(cleanup::fairing())
        .manage(games)
        .manage(create_rate_limiter())
        .mount("/", routes![create_game, websocket_handler])
}
