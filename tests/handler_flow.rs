//! End-to-end handler flows: raw request bytes in, encoded reply bytes out

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use bytes::BytesMut;
use gs4_query::config::ProxySettings;
use gs4_query::core::codec::QueryCodec;
use gs4_query::protocol::{ChallengeStore, QueryHandler, QueryKind, QueryResponse, Reply, ResponseAssembler};
use gs4_query::service::{PluginDescription, SharedPlayerList};
use tokio_util::codec::Encoder;

struct Fixture {
    handler: QueryHandler,
    players: SharedPlayerList,
}

fn fixture(show_plugins: bool) -> Fixture {
    let settings = ProxySettings {
        bind: "192.0.2.10:25565".parse().unwrap(),
        motd: r#"{"text":"Hub ","extra":[{"text":"One","color":"gold"}]}"#.into(),
        show_plugins,
        ..ProxySettings::default()
    };
    let players = SharedPlayerList::new();
    let plugins = vec![
        PluginDescription::new("auth").with_name("Auth").with_version("2.0"),
        PluginDescription::new("tab-list"),
    ];
    let assembler = ResponseAssembler::new(Arc::new(settings), Arc::new(players.clone()), Arc::new(plugins));

    Fixture {
        handler: QueryHandler::new(ChallengeStore::default(), assembler),
        players,
    }
}

fn peer() -> SocketAddr {
    "198.51.100.4:40000".parse().unwrap()
}

async fn token(handler: &QueryHandler) -> i32 {
    token_from(handler, peer()).await
}

async fn token_from(handler: &QueryHandler, from: SocketAddr) -> i32 {
    match handler.handle(&[0xFE, 0xFD, 0x09, 0, 0, 0, 1], from).unwrap().await {
        Reply::Handshake { challenge_token, .. } => challenge_token,
        other => panic!("Expected handshake reply, got {other:?}"),
    }
}

fn full_request(token: i32) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFD, 0x00, 0, 0, 0, 1];
    bytes.extend_from_slice(&token.to_be_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

fn encode(reply: Reply) -> Vec<u8> {
    let mut dst = BytesMut::new();
    QueryCodec.encode(reply, &mut dst).unwrap();
    dst.to_vec()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn test_full_reply_reflects_live_state() {
    let fx = fixture(true);
    fx.players.add("alice");
    fx.players.add("bob");
    let token = token(&fx.handler).await;

    let reply = fx.handler.handle(&full_request(token), peer()).unwrap().await;
    let Reply::Stat { ref response, .. } = reply else {
        panic!("Expected stat reply");
    };
    assert_eq!(response.hostname(), "Hub One");
    assert_eq!(response.current_players(), 2);
    assert_eq!(response.proxy_host(), "192.0.2.10");

    let bytes = encode(reply);
    assert!(contains(&bytes, b"hostname\0Hub One\0"));
    assert!(contains(&bytes, b"plugins\0Velocity: Auth 2.0; tab-list\0"));
    assert!(contains(&bytes, b"hostport\025565\0"));
    assert!(bytes.ends_with(b"alice\0bob\0\0"));
}

#[tokio::test]
async fn test_plugins_hidden_when_disabled() {
    let fx = fixture(false);
    let token = token(&fx.handler).await;

    let bytes = encode(fx.handler.handle(&full_request(token), peer()).unwrap().await);
    assert!(contains(&bytes, b"plugins\0Velocity: \0"));
}

#[tokio::test]
async fn test_hook_sees_peer_and_response() {
    let hook = |kind: QueryKind, peer: IpAddr, response: QueryResponse| async move {
        response
            .to_builder()
            .hostname(format!("{kind:?} for {peer}"))
            .clear_players()
            .players(["hidden"])
            .build()
    };
    let fx = fixture(false);
    fx.players.add("alice");
    let handler = fx.handler.with_hook(Arc::new(hook));
    let token = token(&handler).await;

    let bytes = encode(handler.handle(&full_request(token), peer()).unwrap().await);
    assert!(contains(&bytes, b"hostname\0Full for 198.51.100.4\0"));
    assert!(bytes.ends_with(b"hidden\0\0"));
    assert_eq!(handler.metrics().snapshot().hook_replaced, 1);
}

#[tokio::test]
async fn test_new_handshake_replaces_token() {
    let fx = fixture(false);
    let first = token(&fx.handler).await;
    let mut second = token(&fx.handler).await;
    while second == first {
        second = token(&fx.handler).await;
    }

    assert!(fx.handler.handle(&full_request(first), peer()).is_err());
    assert!(fx.handler.handle(&full_request(second), peer()).is_ok());
    assert_eq!(fx.handler.sessions().len(), 1);
}

#[tokio::test]
async fn test_interleaved_peers_keep_separate_sessions() {
    let fx = fixture(false);
    let peer_a: SocketAddr = "198.51.100.4:40000".parse().unwrap();
    let peer_b: SocketAddr = "203.0.113.9:41000".parse().unwrap();

    let token_a = token_from(&fx.handler, peer_a).await;
    let token_b = token_from(&fx.handler, peer_b).await;

    assert!(fx.handler.handle(&full_request(token_a), peer_a).is_ok());
    assert!(fx.handler.handle(&full_request(token_b), peer_b).is_ok());

    if token_a != token_b {
        assert!(fx.handler.handle(&full_request(token_b), peer_a).is_err());
        assert!(fx.handler.handle(&full_request(token_a), peer_b).is_err());
    }

    // Both sessions survive the cross-peer attempts
    assert!(fx.handler.handle(&full_request(token_a), peer_a).is_ok());
    assert!(fx.handler.handle(&full_request(token_b), peer_b).is_ok());
    assert_eq!(fx.handler.sessions().len(), 2);
}
