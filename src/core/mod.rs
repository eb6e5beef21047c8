//! # Core Wire Components
//!
//! Byte-level handling of GS4 query datagrams.
//!
//! ## Components
//! - **Packet**: request decoding and reply encoding
//! - **Writer**: the shared key/value body writer for basic and full stat replies
//! - **Codec**: `UdpFramed` codec that hands raw datagrams in and encodes replies out
//!
//! ## Wire Format
//! ```text
//! request:   [Magic(2)=FE FD] [Type(1)] [SessionId(4, BE)] ([Token(4, BE)] [Padding(4)?])
//! handshake: [Type(1)=09] [SessionId(4, BE)] [Token as decimal text] [00]
//! stat:      [Type(1)=00] [SessionId(4, BE)] [Body]
//! ```
//!
//! All strings are single-byte (Latin-1) and NUL-terminated.

pub mod codec;
pub mod packet;
pub mod writer;
