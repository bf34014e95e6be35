use rocket::{Build, Rocket};
use tracing::info;

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    tracing_subscriber::fmt::init();
    info!("Starting minesweeper session server, endpoints: POST /create, GET /ws");

    minesweeper_server::build()
}
