#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

use traci_core::protocol::constants::*;
use traci_core::protocol::{encode_message, split_commands, write_command, Status, Storage};
use traci_server::config::ServerSection;
use traci_server::transport::{run_session, SessionEnd, TransportError};

fn message(cmd: u8) -> Vec<u8> {
    let mut body = Storage::new();
    write_command(&mut body, cmd, &[]).unwrap();
    encode_message(body.as_slice()).unwrap().to_vec()
}

async fn read_reply(io: &mut DuplexStream) -> Vec<u8> {
    let len = io.read_i32().await.unwrap();
    let mut body = vec![0u8; len as usize - 4];
    io.read_exact(&mut body).await.unwrap();
    body
}

fn first_status(body: Vec<u8>) -> Status {
    let first = split_commands(body.into()).next().unwrap().unwrap();
    Status::parse(&first).unwrap()
}

#[tokio::test]
async fn fragmented_request_is_reassembled_and_close_ends_the_session() {
    let mut engine = common::engine();
    let cfg = ServerSection::default();
    let (mut client, server) = duplex(1024);

    let session = run_session(server, &mut engine, &cfg);
    let controller = async move {
        let msg = message(CMD_GETVERSION);
        for chunk in msg.chunks(3) {
            client.write_all(chunk).await.unwrap();
            tokio::task::yield_now().await;
        }
        let reply = read_reply(&mut client).await;
        assert_eq!(first_status(reply), Status::ok(CMD_GETVERSION));

        client.write_all(&message(CMD_CLOSE)).await.unwrap();
        let reply = read_reply(&mut client).await;
        assert_eq!(first_status(reply), Status::ok(CMD_CLOSE));
        client
    };

    let (end, _client) = tokio::join!(session, controller);
    assert_eq!(end.unwrap(), SessionEnd::Closed);
}

#[tokio::test]
async fn dropped_peer_ends_the_session_quietly() {
    let mut engine = common::engine();
    let cfg = ServerSection::default();
    let (client, server) = duplex(1024);
    drop(client);
    let end = run_session(server, &mut engine, &cfg).await.unwrap();
    assert_eq!(end, SessionEnd::Disconnected);
}

#[tokio::test]
async fn oversized_message_aborts_the_session() {
    let mut engine = common::engine();
    let cfg = ServerSection { max_message_bytes: 64, ..ServerSection::default() };
    let (mut client, server) = duplex(1024);

    let session = run_session(server, &mut engine, &cfg);
    let controller = async move {
        client.write_i32(1000).await.unwrap();
        client
    };
    let (res, _client) = tokio::join!(session, controller);
    assert!(matches!(res, Err(TransportError::Protocol(_))), "{res:?}");
    assert_eq!(
        engine.metrics().protocol_errors.get(&[("reason", "message_framing")]),
        1
    );
}

#[tokio::test]
async fn idle_controller_times_out() {
    let mut engine = common::engine();
    let cfg = ServerSection { read_timeout_ms: 50, ..ServerSection::default() };
    let (client, server) = duplex(1024);

    let res = run_session(server, &mut engine, &cfg).await;
    drop(client);
    assert!(matches!(res, Err(TransportError::Timeout(50))), "{res:?}");
    assert_eq!(engine.metrics().protocol_errors.get(&[("reason", "timeout")]), 1);
}
