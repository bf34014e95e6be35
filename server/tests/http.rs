use minesweeper_common::models::CreateResponse;
use minesweeper_server::{build, logic::Games};
use rocket::{
    futures::{SinkExt, channel::mpsc},
    http::{ContentType, Header, Status},
    local::asynchronous::{Client, LocalRequest},
};
use rocket_ws::Message;

async fn client() -> Client {
    Client::tracked(build()).await.expect("valid rocket instance")
}

fn upgrade_request<'c>(client: &'c Client, id: &str) -> LocalRequest<'c> {
    client
        .get(format!("/ws?id={id}"))
        .header(Header::new("Connection", "Upgrade"))
        .header(Header::new("Upgrade", "websocket"))
        .header(Header::new("Sec-WebSocket-Version", "13"))
        .header(Header::new("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ=="))
}

#[rocket::async_test]
async fn create_returns_a_session_id() {
    let client = client().await;

    let response = client
        .post("/create")
        .header(ContentType::JSON)
        .body(r#"{"rows":10,"cols":10,"mines":10}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: CreateResponse = response.into_json().await.expect("create response");
    assert_eq!(body.id.len(), 5);
}

#[rocket::async_test]
async fn create_uses_defaults_for_missing_fields() {
    let client = client().await;

    let response = client
        .post("/create")
        .header(ContentType::JSON)
        .body("{}")
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
}

#[rocket::async_test]
async fn create_rejects_boards_without_a_safe_cell() {
    let client = client().await;

    let response = client
        .post("/create")
        .header(ContentType::JSON)
        .body(r#"{"rows":3,"cols":3,"mines":9}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::UnprocessableEntity);
}

#[rocket::async_test]
async fn create_is_rate_limited_per_client() {
    let client = client().await;

    for _ in 0..10 {
        let response = client
            .post("/create")
            .header(ContentType::JSON)
            .header(Header::new("X-Forwarded-For", "192.0.2.7"))
            .body("{}")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    let response = client
        .post("/create")
        .header(ContentType::JSON)
        .header(Header::new("X-Forwarded-For", "192.0.2.7"))
        .body("{}")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::TooManyRequests);
}

#[rocket::async_test]
async fn websocket_for_unknown_session_is_not_found() {
    let client = client().await;

    let response = upgrade_request(&client, "nope").dispatch().await;

    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn websocket_for_occupied_session_is_conflict() {
    let client = client().await;
    let response = client
        .post("/create")
        .header(ContentType::JSON)
        .body("{}")
        .dispatch()
        .await;
    let CreateResponse { id } = response.into_json().await.expect("create response");

    let games = client.rocket().state::<Games>().expect("session storage");
    let game = games.get(&id).expect("created session").value().clone();
    let (tx, _rx) = mpsc::unbounded::<Message>();
    game.lock()
        .await
        .attach(Box::pin(tx.sink_map_err(|e| e.to_string())))
        .await
        .expect("first player attaches");

    let response = upgrade_request(&client, &id).dispatch().await;

    assert_eq!(response.status(), Status::Conflict);
}

#[rocket::async_test]
async fn create_rejects_oversized_boards() {
    let client = client().await;

    let response = client
        .post("/create")
        .header(ContentType::JSON)
        .body(r#"{"rows":4000,"cols":4000,"mines":0}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::UnprocessableEntity);
}
