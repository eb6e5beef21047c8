//! `UdpFramed` codec for the query socket.
//!
//! Inbound, each datagram is handed over whole and unparsed so that
//! rejections can still be attributed to the sender address. Outbound,
//! each [`Reply`] is encoded into the buffer of its own datagram; rejected
//! requests never reach the encoder, so they never allocate a reply.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::core::packet;
use crate::error::QueryError;
use crate::protocol::handler::Reply;

#[derive(Debug, Default, Clone, Copy)]
pub struct QueryCodec;

impl Decoder for QueryCodec {
    type Item = BytesMut;
    type Error = QueryError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        Ok(Some(src.split()))
    }
}

impl Encoder<Reply> for QueryCodec {
    type Error = QueryError;

    fn encode(&mut self, reply: Reply, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match reply {
            Reply::Handshake {
                session_id,
                challenge_token,
            } => packet::encode_handshake(session_id, challenge_token, dst),
            Reply::Stat {
                session_id,
                kind,
                response,
            } => packet::encode_stat(session_id, &response, kind, dst),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::response::{QueryKind, QueryResponse};

    #[test]
    fn test_decoder_yields_whole_datagram() {
        let mut codec = QueryCodec;
        let mut src = BytesMut::from(&[0xFE, 0xFD, 0x09, 0, 0, 0, 1][..]);

        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(&frame[..], &[0xFE, 0xFD, 0x09, 0, 0, 0, 1]);
        assert!(src.is_empty());
        assert!(codec.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn test_encoder_writes_stat_header() {
        let mut codec = QueryCodec;
        let mut dst = BytesMut::new();
        let reply = Reply::Stat {
            session_id: 0x0102_0304,
            kind: QueryKind::Basic,
            response: QueryResponse::builder().build(),
        };

        codec.encode(reply, &mut dst).unwrap();
        assert_eq!(&dst[..5], &[0x00, 0x01, 0x02, 0x03, 0x04]);
    }
}
