//! Length-prefixed framing plus the handful of packets a handshake needs.

mod error;
mod frame;
mod io;
mod packets;
mod state;
mod varint;


pub use error::{ProtoError, Result};
pub use frame::{
    encode_packet, encode_raw_packet, write_raw_packet, PacketDecode, PacketEncode, PacketFrame,
    MAX_PACKET_SIZE,
};
pub use io::{read_string, write_string};
pub use packets::{
    HandshakeC2s, LoginDisconnectS2c, LoginStartC2s, StatusRequestC2s, StatusResponseS2c,
    PING_PACKET_ID,
};
pub use state::HandshakeNextState;
pub use varint::{read_varint, read_varint_from, varint_len, write_varint};
