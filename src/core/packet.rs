//! Query datagram framing.
//!
//! [`decode`] turns an inbound datagram into a [`QueryRequest`] or rejects it
//! with [`QueryError::MalformedPacket`]; it never yields a partially-valid
//! request. [`encode_handshake`] and [`encode_stat`] append a reply to a
//! caller-provided buffer.

use bytes::{Buf, BufMut, BytesMut};

use crate::core::writer::{write_string, ResponseWriter, StatKey};
use crate::error::{constants, QueryError, Result};
use crate::protocol::response::{QueryKind, QueryResponse};

/// Magic bytes opening every inbound query packet
pub const QUERY_MAGIC: [u8; 2] = [0xFE, 0xFD];

/// Handshake request/reply type code
pub const QUERY_TYPE_HANDSHAKE: u8 = 0x09;

/// Stat request/reply type code
pub const QUERY_TYPE_STAT: u8 = 0x00;

/// magic(2) + type(1) + session id(4)
pub const HEADER_LEN: usize = 7;

/// Length of the challenge token and of the full-stat padding
const TOKEN_LEN: usize = 4;
const FULL_PADDING_LEN: usize = 4;

/// Value reported for the `gametype` key
pub const GAME_TYPE: &str = "SMP";

/// Value reported for the `game_id` key
pub const GAME_ID: &str = "MINECRAFT";

/// A decoded inbound query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRequest {
    Handshake {
        session_id: i32,
    },
    Stat {
        session_id: i32,
        challenge_token: i32,
        kind: QueryKind,
    },
}

impl QueryRequest {
    /// Session id echoed back in the reply
    pub fn session_id(&self) -> i32 {
        match *self {
            QueryRequest::Handshake { session_id } | QueryRequest::Stat { session_id, .. } => {
                session_id
            }
        }
    }
}

/// Decode an inbound datagram.
///
/// Handshake requests ignore anything after the header. Stat requests must
/// carry a challenge token followed by either nothing (basic) or exactly four
/// opaque bytes (full).
pub fn decode(datagram: &[u8]) -> Result<QueryRequest> {
    if datagram.len() < HEADER_LEN {
        return Err(QueryError::MalformedPacket(constants::ERR_TOO_SHORT));
    }

    let mut buf = datagram;
    if buf[..2] != QUERY_MAGIC {
        return Err(QueryError::MalformedPacket(constants::ERR_BAD_MAGIC));
    }
    buf.advance(2);

    let packet_type = buf.get_u8();
    let session_id = buf.get_i32();

    match packet_type {
        QUERY_TYPE_HANDSHAKE => Ok(QueryRequest::Handshake { session_id }),
        QUERY_TYPE_STAT => {
            if buf.remaining() < TOKEN_LEN {
                return Err(QueryError::MalformedPacket(constants::ERR_MISSING_TOKEN));
            }
            let challenge_token = buf.get_i32();

            let kind = match buf.remaining() {
                0 => QueryKind::Basic,
                FULL_PADDING_LEN => QueryKind::Full,
                _ => return Err(QueryError::MalformedPacket(constants::ERR_TRAILING_BYTES)),
            };

            Ok(QueryRequest::Stat {
                session_id,
                challenge_token,
                kind,
            })
        }
        _ => Err(QueryError::MalformedPacket(constants::ERR_UNKNOWN_TYPE)),
    }
}

/// Append a handshake reply carrying `challenge_token` as decimal text.
pub fn encode_handshake(session_id: i32, challenge_token: i32, dst: &mut BytesMut) {
    dst.put_u8(QUERY_TYPE_HANDSHAKE);
    dst.put_i32(session_id);
    write_string(dst, &challenge_token.to_string());
}

/// Append a basic or full stat reply for `response`.
pub fn encode_stat(session_id: i32, response: &QueryResponse, kind: QueryKind, dst: &mut BytesMut) {
    dst.put_u8(QUERY_TYPE_STAT);
    dst.put_i32(session_id);

    let mut writer = ResponseWriter::new(dst, kind);
    writer.write(StatKey::Hostname, response.hostname());
    writer.write(StatKey::GameType, GAME_TYPE);

    writer.write(StatKey::GameId, GAME_ID);
    writer.write(StatKey::Version, response.game_version());
    writer.write_plugins(response.proxy_version(), response.plugins());

    writer.write(StatKey::Map, response.map());
    writer.write(StatKey::NumPlayers, response.current_players());
    writer.write(StatKey::MaxPlayers, response.max_players());
    writer.write(StatKey::HostPort, response.proxy_port());
    writer.write(StatKey::HostIp, response.proxy_host());

    writer.write_players(response.players());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(packet_type: u8, session_id: i32) -> Vec<u8> {
        let mut bytes = QUERY_MAGIC.to_vec();
        bytes.push(packet_type);
        bytes.extend_from_slice(&session_id.to_be_bytes());
        bytes
    }

    #[test]
    fn test_decode_handshake() {
        let bytes = header(QUERY_TYPE_HANDSHAKE, 0x0102_0304);
        assert_eq!(
            decode(&bytes).unwrap(),
            QueryRequest::Handshake {
                session_id: 0x0102_0304
            }
        );
    }

    #[test]
    fn test_decode_handshake_ignores_trailing_bytes() {
        let mut bytes = header(QUERY_TYPE_HANDSHAKE, 7);
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            decode(&bytes),
            Ok(QueryRequest::Handshake { session_id: 7 })
        ));
    }

    #[test]
    fn test_decode_basic_and_full_stat() {
        let mut basic = header(QUERY_TYPE_STAT, 1);
        basic.extend_from_slice(&(-5i32).to_be_bytes());
        assert_eq!(
            decode(&basic).unwrap(),
            QueryRequest::Stat {
                session_id: 1,
                challenge_token: -5,
                kind: QueryKind::Basic
            }
        );

        let mut full = basic.clone();
        full.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(
            decode(&full).unwrap(),
            QueryRequest::Stat {
                session_id: 1,
                challenge_token: -5,
                kind: QueryKind::Full
            }
        );
    }

    #[test]
    fn test_decode_rejects_bad_trailing_lengths() {
        for extra in [1usize, 2, 3, 5, 8] {
            let mut bytes = header(QUERY_TYPE_STAT, 1);
            bytes.extend_from_slice(&9i32.to_be_bytes());
            bytes.extend(std::iter::repeat(0u8).take(extra));
            assert!(matches!(
                decode(&bytes),
                Err(QueryError::MalformedPacket(constants::ERR_TRAILING_BYTES))
            ));
        }
    }

    #[test]
    fn test_decode_rejects_short_and_bad_headers() {
        assert!(matches!(
            decode(&[0xFE, 0xFD, 0x09, 0, 0, 0]),
            Err(QueryError::MalformedPacket(constants::ERR_TOO_SHORT))
        ));

        let mut bad_magic = header(QUERY_TYPE_HANDSHAKE, 1);
        bad_magic[1] = 0xFC;
        assert!(matches!(
            decode(&bad_magic),
            Err(QueryError::MalformedPacket(constants::ERR_BAD_MAGIC))
        ));

        assert!(matches!(
            decode(&header(0x01, 1)),
            Err(QueryError::MalformedPacket(constants::ERR_UNKNOWN_TYPE))
        ));

        let mut short_token = header(QUERY_TYPE_STAT, 1);
        short_token.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(
            decode(&short_token),
            Err(QueryError::MalformedPacket(constants::ERR_MISSING_TOKEN))
        ));
    }

    #[test]
    fn test_encode_handshake_writes_decimal_token() {
        let mut dst = BytesMut::new();
        encode_handshake(0x0A0B_0C0D, -1234, &mut dst);

        let mut expected = vec![QUERY_TYPE_HANDSHAKE, 0x0A, 0x0B, 0x0C, 0x0D];
        expected.extend_from_slice(b"-1234\0");
        assert_eq!(&dst[..], &expected[..]);
    }
}
