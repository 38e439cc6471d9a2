//! Behavioural tests for the chat client using `rstest-bdd`.

use std::cell::RefCell;
use std::thread;
use std::time::{Duration, Instant};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::session::SessionConfig;
use crate::tests::support::{ClientWorld, WAIT_LIMIT};

#[fixture]
fn world() -> RefCell<ClientWorld> {
    RefCell::new(ClientWorld::new())
}

/// Feature files spell CR and LF as escape sequences.
fn unescape(text: &str) -> String {
    text.replace("\\r", "\r").replace("\\n", "\n")
}

fn session_for(channel: &str, user: &str, token: &str) -> SessionConfig {
    SessionConfig::new("h", 6697, user, token, channel)
}

#[given("a scripted chat server")]
fn given_scripted_server(world: &RefCell<ClientWorld>) {
    *world.borrow_mut() = ClientWorld::new();
}

#[given("a chat server refusing connections")]
fn given_refusing_server(world: &RefCell<ClientWorld>) {
    world.borrow().connector.refuse_connections();
}

#[given("a connected client with {count} recording handler")]
fn given_connected_with_handler(world: &RefCell<ClientWorld>, count: usize) {
    connect_with_recorders(world, count);
}

#[given("a connected client with {count} recording handlers")]
fn given_connected_with_handlers(world: &RefCell<ClientWorld>, count: usize) {
    connect_with_recorders(world, count);
}

fn connect_with_recorders(world: &RefCell<ClientWorld>, count: usize) {
    let mut world = world.borrow_mut();
    for _ in 0..count {
        world.add_recorder();
    }
    world.connect(&session_for("#room", "bot", "oauth:abc"));
    assert!(world.last_error.is_none(), "connect failed: {:?}", world.last_error);
    let handshake = world.transport().wait_for_lines(4);
    assert_eq!(handshake.len(), 4, "handshake incomplete: {handshake:?}");
}

#[when("the client connects to \"{channel}\" as \"{user}\" with token \"{token}\"")]
fn when_client_connects(world: &RefCell<ClientWorld>, channel: String, user: String, token: String) {
    world
        .borrow_mut()
        .connect(&session_for(&channel, &user, &token));
}

#[when("the client disconnects")]
fn when_client_disconnects(world: &RefCell<ClientWorld>) {
    world.borrow_mut().disconnect();
}

#[when("the server sends \"{text}\"")]
fn when_server_sends(world: &RefCell<ClientWorld>, text: String) {
    world.borrow().transport().feed(unescape(&text).as_bytes());
}

#[when("the server closes the connection")]
fn when_server_closes(world: &RefCell<ClientWorld>) {
    world.borrow().transport().close_inbound();
}

#[when("handler {index} is unregistered")]
fn when_handler_unregistered(world: &RefCell<ClientWorld>, index: usize) {
    world.borrow_mut().remove_recorder(index - 1);
}

#[then("the server receives \"{line}\" as line {position}")]
fn then_server_receives(world: &RefCell<ClientWorld>, line: String, position: usize) {
    let lines = world.borrow().transport().wait_for_lines(position);

    assert_eq!(
        lines.get(position - 1),
        Some(&line),
        "server lines: {lines:?}"
    );
}

#[then("handler {index} receives exactly \"{line}\"")]
fn then_handler_receives(world: &RefCell<ClientWorld>, index: usize, line: String) {
    let world = world.borrow();

    assert_eq!(world.recorder(index - 1).wait_for(1), vec![line]);
}

#[then("handler {index} receives \"{first}\" then \"{second}\"")]
fn then_handler_receives_two(
    world: &RefCell<ClientWorld>,
    index: usize,
    first: String,
    second: String,
) {
    let world = world.borrow();

    assert_eq!(world.recorder(index - 1).wait_for(2), vec![first, second]);
}

#[then("handler {index} receives nothing")]
fn then_handler_receives_nothing(world: &RefCell<ClientWorld>, index: usize) {
    assert!(world.borrow().recorder(index - 1).lines().is_empty());
}

#[then("the last operation fails with \"{snippet}\"")]
fn then_operation_fails(world: &RefCell<ClientWorld>, snippet: String) {
    let world = world.borrow();
    let error = world
        .last_error
        .as_ref()
        .expect("an operation should have failed");

    assert!(
        error.to_string().contains(&snippet),
        "unexpected error: {error}"
    );
}

#[then("{count} connection has been opened")]
fn then_connections_opened(world: &RefCell<ClientWorld>, count: usize) {
    assert_eq!(world.borrow().connector.connections(), count);
}

#[then("the transport has been shut down")]
fn then_transport_shut_down(world: &RefCell<ClientWorld>) {
    assert!(world.borrow().transport().is_shut_down());
}

#[then("the client reports that it is connected")]
fn then_client_connected(world: &RefCell<ClientWorld>) {
    assert!(world.borrow().client.is_connected());
}

#[then("the client reports that it is disconnected")]
fn then_client_disconnected(world: &RefCell<ClientWorld>) {
    // The receive loop notices a closed stream asynchronously.
    let deadline = Instant::now() + WAIT_LIMIT;
    while world.borrow().client.is_connected() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    assert!(!world.borrow().client.is_connected());
}

#[scenario(path = "tests/features/chat_client.feature")]
fn chat_client_behaviour(#[from(world)] _: RefCell<ClientWorld>) {}
