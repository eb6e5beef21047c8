//! Stat reply body writer.
//!
//! One writer serves both layouts. In basic mode only the keys in
//! [`StatKey::in_basic`] are emitted, values only, with `hostport` as a
//! little-endian `u16`. In full mode every key is emitted as a key/value pair
//! of strings, framed by the two legacy padding blocks and followed by the
//! player list.

use std::borrow::Cow;
use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};

use crate::protocol::response::{PluginInfo, QueryKind};

/// Prefix of a full stat body: `"splitnum\0" 0x80 0x00`
pub const FULL_PADDING_START: [u8; 11] = [
    0x73, 0x70, 0x6C, 0x69, 0x74, 0x6E, 0x75, 0x6D, 0x00, 0x80, 0x00,
];

/// Separator between the key/value section and the player list: `0x01 "player_\0" 0x00`
pub const FULL_PADDING_PLAYERS: [u8; 10] = [0x01, 0x70, 0x6C, 0x61, 0x79, 0x65, 0x72, 0x5F, 0x00, 0x00];

/// Keys of the stat key/value section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKey {
    Hostname,
    GameType,
    GameId,
    Version,
    Plugins,
    Map,
    NumPlayers,
    MaxPlayers,
    HostPort,
    HostIp,
}

impl StatKey {
    /// Key name as sent in full replies
    pub fn name(self) -> &'static str {
        match self {
            StatKey::Hostname => "hostname",
            StatKey::GameType => "gametype",
            StatKey::GameId => "game_id",
            StatKey::Version => "version",
            StatKey::Plugins => "plugins",
            StatKey::Map => "map",
            StatKey::NumPlayers => "numplayers",
            StatKey::MaxPlayers => "maxplayers",
            StatKey::HostPort => "hostport",
            StatKey::HostIp => "hostip",
        }
    }

    /// Whether basic replies carry this key
    pub fn in_basic(self) -> bool {
        matches!(
            self,
            StatKey::Hostname
                | StatKey::GameType
                | StatKey::Map
                | StatKey::NumPlayers
                | StatKey::MaxPlayers
                | StatKey::HostPort
                | StatKey::HostIp
        )
    }
}

/// A stat value: text, or a port that basic replies write as binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Port(u16),
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(value))
    }
}

impl From<String> for FieldValue<'_> {
    fn from(value: String) -> Self {
        FieldValue::Text(Cow::Owned(value))
    }
}

impl From<u32> for FieldValue<'_> {
    fn from(value: u32) -> Self {
        FieldValue::Text(Cow::Owned(value.to_string()))
    }
}

impl From<u16> for FieldValue<'_> {
    fn from(value: u16) -> Self {
        FieldValue::Port(value)
    }
}

/// Write `value` as a NUL-terminated single-byte string.
///
/// Characters outside Latin-1 are replaced with `?`.
pub fn write_string(dst: &mut BytesMut, value: &str) {
    dst.reserve(value.len() + 1);
    for ch in value.chars() {
        let code = u32::from(ch);
        dst.put_u8(if code <= 0xFF { code as u8 } else { b'?' });
    }
    dst.put_u8(0x00);
}

/// Render the synthesized `plugins` value: `"<brand>: A 1.0; B"`
pub fn plugins_value(brand: &str, plugins: &[PluginInfo]) -> String {
    let mut out = String::with_capacity(brand.len() + 2 + plugins.len() * 16);
    out.push_str(brand);
    out.push_str(": ");
    for (i, plugin) in plugins.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        out.push_str(plugin.name());
        if let Some(version) = plugin.version() {
            let _ = write!(out, " {version}");
        }
    }
    out
}

/// Writes a stat body in either layout
pub struct ResponseWriter<'a> {
    dst: &'a mut BytesMut,
    kind: QueryKind,
}

impl<'a> ResponseWriter<'a> {
    /// Start a body; full replies get the leading padding block immediately.
    pub fn new(dst: &'a mut BytesMut, kind: QueryKind) -> Self {
        if kind == QueryKind::Full {
            dst.put_slice(&FULL_PADDING_START);
        }
        Self { dst, kind }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Write one key/value entry according to the layout.
    pub fn write<'v>(&mut self, key: StatKey, value: impl Into<FieldValue<'v>>) {
        let value = value.into();
        match self.kind {
            QueryKind::Basic => {
                if !key.in_basic() {
                    return;
                }
                match value {
                    FieldValue::Port(port) => self.dst.put_u16_le(port),
                    FieldValue::Text(text) => write_string(self.dst, &text),
                }
            }
            QueryKind::Full => {
                write_string(self.dst, key.name());
                match value {
                    FieldValue::Port(port) => write_string(self.dst, &port.to_string()),
                    FieldValue::Text(text) => write_string(self.dst, &text),
                }
            }
        }
    }

    /// Write the synthesized `plugins` entry (full only).
    pub fn write_plugins(&mut self, brand: &str, plugins: &[PluginInfo]) {
        if self.kind == QueryKind::Basic {
            return;
        }
        self.write(StatKey::Plugins, plugins_value(brand, plugins));
    }

    /// Close the key/value section and write the player list (full only).
    pub fn write_players<S: AsRef<str>>(&mut self, players: &[S]) {
        if self.kind == QueryKind::Basic {
            return;
        }

        self.dst.put_u8(0x00);
        self.dst.put_slice(&FULL_PADDING_PLAYERS);
        for player in players {
            write_string(self.dst, player.as_ref());
        }
        self.dst.put_u8(0x00);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugins_value_format() {
        let plugins = vec![PluginInfo::new("A", Some("1.0")), PluginInfo::new("B", None::<&str>)];
        assert_eq!(plugins_value("Proxy", &plugins), "Proxy: A 1.0; B");
        assert_eq!(plugins_value("Proxy", &[]), "Proxy: ");
    }

    #[test]
    fn test_write_string_latin1() {
        let mut dst = BytesMut::new();
        write_string(&mut dst, "é☃a");
        assert_eq!(&dst[..], &[0xE9, b'?', b'a', 0x00]);
    }

    #[test]
    fn test_basic_skips_full_only_keys() {
        let mut dst = BytesMut::new();
        let mut writer = ResponseWriter::new(&mut dst, QueryKind::Basic);
        writer.write(StatKey::GameId, "MINECRAFT");
        writer.write(StatKey::Version, "1.14");
        writer.write_plugins("Proxy", &[]);
        writer.write_players(&["alice"]);
        assert!(dst.is_empty());
    }

    #[test]
    fn test_basic_port_is_little_endian() {
        let mut dst = BytesMut::new();
        let mut writer = ResponseWriter::new(&mut dst, QueryKind::Basic);
        writer.write(StatKey::HostPort, 25577u16);
        assert_eq!(&dst[..], &25577u16.to_le_bytes());
    }

    #[test]
    fn test_full_port_is_text() {
        let mut dst = BytesMut::new();
        let mut writer = ResponseWriter::new(&mut dst, QueryKind::Full);
        writer.write(StatKey::HostPort, 25577u16);

        let mut expected = FULL_PADDING_START.to_vec();
        expected.extend_from_slice(b"hostport\x0025577\x00");
        assert_eq!(&dst[..], &expected[..]);
    }

    #[test]
    fn test_full_player_section() {
        let mut dst = BytesMut::new();
        let mut writer = ResponseWriter::new(&mut dst, QueryKind::Full);
        writer.write_players(&["alice", "bob"]);

        let mut expected = FULL_PADDING_START.to_vec();
        expected.push(0x00);
        expected.extend_from_slice(&FULL_PADDING_PLAYERS);
        expected.extend_from_slice(b"alice\x00bob\x00\x00");
        assert_eq!(&dst[..], &expected[..]);
    }
}
