//! Minimal Minecraft protocol types for handshake, status, and login start.
pub mod mc;

pub use mc::{
    encode_packet, encode_raw_packet, write_raw_packet, HandshakeC2s, HandshakeNextState,
    LoginDisconnectS2c, LoginStartC2s, PacketDecode, PacketEncode, PacketFrame, ProtoError,
    StatusRequestC2s, StatusResponseS2c, MAX_PACKET_SIZE, PING_PACKET_ID,
};
