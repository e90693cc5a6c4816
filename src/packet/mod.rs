use std::sync::Arc;

use net::{HandshakeC2s, HandshakeNextState, LoginStartC2s, PacketDecode, PacketEncode};

pub trait OwnedPacket<'a, P: PacketDecode<'a> + PacketEncode> {
    fn from_packet(packet: P) -> Self;
    fn as_packet(&'a self) -> P;
}

#[derive(Debug, Clone)]
/// Owned `HandshakeC2s`
pub struct OwnedHandshake {
    pub protocol_version: u32,
    pub server_address: Arc<str>,
    pub server_port: u16,
    pub next_state: HandshakeNextState,
}

/// Printable ASCII only, capped at 255 chars.
pub fn sanitize_for_log(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .take(255)
        .collect()
}

impl OwnedHandshake {
    /// Host the client typed, without Forge/FML markers after the first NUL.
    pub fn get_stripped_hostname(&self) -> Arc<str> {
        const FALLBACK: &str = "unknown-host";
        let ptr = self
            .server_address
            .find('\0')
            .map(|nul| &self.server_address[..nul])
            .unwrap_or(self.server_address.as_ref());
        let sanitized = sanitize_for_log(ptr);
        if !sanitized.is_empty() {
            Arc::from(sanitized)
        } else {
            Arc::from(FALLBACK)
        }
    }
}

impl<'a> OwnedPacket<'a, HandshakeC2s<'a>> for OwnedHandshake {
    fn from_packet(hs: HandshakeC2s<'a>) -> Self {
        Self {
            protocol_version: hs.protocol_version,
            server_address: Arc::from(hs.server_address),
            server_port: hs.server_port,
            next_state: hs.next_state,
        }
    }

    fn as_packet(&'a self) -> HandshakeC2s<'a> {
        HandshakeC2s {
            protocol_version: self.protocol_version,
            server_address: &self.server_address,
            server_port: self.server_port,
            next_state: self.next_state,
        }
    }
}

#[derive(Debug, Clone)]
/// Owned `LoginStartC2s`
pub struct OwnedLoginStart {
    pub username: String,
}

impl OwnedLoginStart {
    /// Username safe to print; the raw one still goes to notifications.
    pub fn get_stripped_username(&self) -> String {
        sanitize_for_log(&self.username)
    }
}

impl<'a> OwnedPacket<'a, LoginStartC2s<'a>> for OwnedLoginStart {
    fn from_packet(packet: LoginStartC2s<'a>) -> Self {
        Self {
            username: packet.username.to_string(),
        }
    }

    fn as_packet(&'a self) -> LoginStartC2s<'a> {
        LoginStartC2s {
            username: &self.username,
        }
    }
}
