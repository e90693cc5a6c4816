use super::{
    error::Result,
    frame::{PacketDecode, PacketEncode},
    io::{read_string, read_u16_be, read_u8, write_string, write_u16_be},
    state::HandshakeNextState,
    varint::{read_varint, write_varint},
};

/// Status ping and pong share this id; the pong is the ping frame echoed back.
pub const PING_PACKET_ID: u32 = 0x01;

/// Handshake (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeC2s<'a> {
    pub protocol_version: u32,
    pub server_address: &'a str,
    pub server_port: u16,
    pub next_state: HandshakeNextState,
}

/// Status request (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequestC2s;

/// Status response (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusResponseS2c<'a> {
    pub json: &'a str,
}

/// Login start (C2S) packet.
///
/// Only the username is read; the version dependent tail (profile id or
/// signature data) is left undecoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginStartC2s<'a> {
    pub username: &'a str,
}

/// Login disconnect (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginDisconnectS2c<'a> {
    pub reason: &'a str,
}

impl<'a> HandshakeC2s<'a> {
    pub const ID: u32 = 0x00;

    pub fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        let protocol_version = read_varint(input)?;
        let server_address = read_string(input)?;
        let server_port = read_u16_be(input)?;
        let next_state = HandshakeNextState::from_raw(read_u8(input)?)?;

        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }
}

impl<'a> PacketDecode<'a> for HandshakeC2s<'a> {
    const ID: u32 = HandshakeC2s::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        HandshakeC2s::decode_body(input)
    }
}

impl<'a> PacketEncode for HandshakeC2s<'a> {
    const ID: u32 = HandshakeC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_varint(out, self.protocol_version);
        write_string(out, self.server_address)?;
        write_u16_be(out, self.server_port);
        out.push(self.next_state.as_raw());
        Ok(())
    }
}

impl StatusRequestC2s {
    pub const ID: u32 = 0x00;
}

impl<'a> PacketDecode<'a> for StatusRequestC2s {
    const ID: u32 = StatusRequestC2s::ID;

    fn decode_body(_input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self)
    }
}

impl PacketEncode for StatusRequestC2s {
    const ID: u32 = StatusRequestC2s::ID;

    fn encode_body(&self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

impl<'a> StatusResponseS2c<'a> {
    pub const ID: u32 = 0x00;
}

impl<'a> PacketDecode<'a> for StatusResponseS2c<'a> {
    const ID: u32 = StatusResponseS2c::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            json: read_string(input)?,
        })
    }
}

impl<'a> PacketEncode for StatusResponseS2c<'a> {
    const ID: u32 = StatusResponseS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string(out, self.json)
    }
}

impl<'a> LoginStartC2s<'a> {
    pub const ID: u32 = 0x00;
}

impl<'a> PacketDecode<'a> for LoginStartC2s<'a> {
    const ID: u32 = LoginStartC2s::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        let username = read_string(input)?;
        *input = &[];
        Ok(Self { username })
    }
}

impl<'a> PacketEncode for LoginStartC2s<'a> {
    const ID: u32 = LoginStartC2s::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string(out, self.username)
    }
}

impl<'a> LoginDisconnectS2c<'a> {
    pub const ID: u32 = 0x00;
}

impl<'a> PacketDecode<'a> for LoginDisconnectS2c<'a> {
    const ID: u32 = LoginDisconnectS2c::ID;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self> {
        Ok(Self {
            reason: read_string(input)?,
        })
    }
}

impl<'a> PacketEncode for LoginDisconnectS2c<'a> {
    const ID: u32 = LoginDisconnectS2c::ID;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string(out, self.reason)
    }
}
