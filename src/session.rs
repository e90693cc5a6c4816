use std::{net::SocketAddr, sync::Arc};

use net::{
    write_raw_packet, HandshakeC2s, HandshakeNextState, LoginDisconnectS2c, LoginStartC2s,
    PacketFrame, ProtoError, StatusRequestC2s, StatusResponseS2c, PING_PACKET_ID,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    counter::{CounterKey, EventCounter},
    logging::HoneypotLogger,
    metrics::HandshakeMetrics,
    notify::{Notification, NotificationKind, Notifier},
    packet::{OwnedHandshake, OwnedLoginStart, OwnedPacket},
    responses::StaticResponses,
};

/// Everything a session shares with its siblings.
pub struct SessionContext {
    pub responses: Arc<StaticResponses>,
    pub counter: Arc<dyn EventCounter>,
    pub notifier: Arc<dyn Notifier>,
    pub metrics: HandshakeMetrics,
}

impl SessionContext {
    pub fn new(
        responses: Arc<StaticResponses>,
        counter: Arc<dyn EventCounter>,
        notifier: Arc<dyn Notifier>,
        metrics: HandshakeMetrics,
    ) -> Self {
        Self {
            responses,
            counter,
            notifier,
            metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Status served and the ping echoed.
    Status,
    /// Login attempt kicked.
    Login { username: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitHandshake,
    StatusQuery,
    AwaitPing,
    LoginAttempt,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitHandshake => "handshake",
            Self::StatusQuery => "status",
            Self::AwaitPing => "ping",
            Self::LoginAttempt => "login",
            Self::Closed => "closed",
        }
    }
}

enum Step {
    Handshake,
    Status(OwnedHandshake),
    Ping,
    Login(OwnedHandshake),
    Done(SessionOutcome),
}

/// One client connection, driven from handshake to close.
///
/// The session owns the stream; dropping it closes the connection.
pub struct Session<'a, S> {
    stream: S,
    peer: SocketAddr,
    ctx: &'a SessionContext,
    state: SessionState,
}

impl<'a, S> Session<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, peer: SocketAddr, ctx: &'a SessionContext) -> Self {
        Self {
            stream,
            peer,
            ctx,
            state: SessionState::AwaitHandshake,
        }
    }

    /// Where the session stopped, or is currently waiting.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the exchange to completion.
    ///
    /// Any read, decode or write failure aborts at once; nothing further is
    /// written and the state is left at the stage that failed.
    pub async fn run(&mut self) -> Result<SessionOutcome, ProtoError> {
        let mut step = Step::Handshake;
        loop {
            step = match step {
                Step::Handshake => self.handshake().await?,
                Step::Status(hs) => self.status(hs).await?,
                Step::Ping => self.ping().await?,
                Step::Login(hs) => self.login(hs).await?,
                Step::Done(outcome) => {
                    self.state = SessionState::Closed;
                    return Ok(outcome);
                }
            };
        }
    }

    async fn handshake(&mut self) -> Result<Step, ProtoError> {
        let frame = PacketFrame::read_from(&mut self.stream, Some(HandshakeC2s::ID)).await?;
        let handshake = OwnedHandshake::from_packet(frame.decode::<HandshakeC2s>()?);

        let next_state = handshake.next_state.as_str();
        HoneypotLogger::handshake_completed(&self.peer, handshake.protocol_version, next_state);
        self.ctx.metrics.record_attempt(next_state);

        Ok(match handshake.next_state {
            HandshakeNextState::Status => {
                self.state = SessionState::StatusQuery;
                Step::Status(handshake)
            }
            HandshakeNextState::Login | HandshakeNextState::Transfer => {
                self.state = SessionState::LoginAttempt;
                Step::Login(handshake)
            }
        })
    }

    async fn status(&mut self, hs: OwnedHandshake) -> Result<Step, ProtoError> {
        let frame = PacketFrame::read_from(&mut self.stream, Some(StatusRequestC2s::ID)).await?;
        frame.decode::<StatusRequestC2s>()?;

        let sequence = self.ctx.counter.increment(CounterKey::Ping(self.peer.ip()));
        let host = hs.get_stripped_hostname();
        HoneypotLogger::ping(
            &self.peer,
            &host,
            hs.server_port,
            hs.protocol_version,
            sequence,
        );
        emit(self.ctx, self.peer, &hs, sequence, NotificationKind::Ping).await;

        write_raw_packet(
            &mut self.stream,
            StatusResponseS2c::ID,
            &self.ctx.responses.status,
        )
        .await?;
        self.state = SessionState::AwaitPing;
        Ok(Step::Ping)
    }

    async fn ping(&mut self) -> Result<Step, ProtoError> {
        let frame = PacketFrame::read_from(&mut self.stream, Some(PING_PACKET_ID)).await?;
        frame.write_to(&mut self.stream).await?;
        Ok(Step::Done(SessionOutcome::Status))
    }

    async fn login(&mut self, hs: OwnedHandshake) -> Result<Step, ProtoError> {
        let frame = PacketFrame::read_from(&mut self.stream, Some(LoginStartC2s::ID)).await?;
        let login = OwnedLoginStart::from_packet(frame.decode::<LoginStartC2s>()?);

        write_raw_packet(
            &mut self.stream,
            LoginDisconnectS2c::ID,
            &self.ctx.responses.kick,
        )
        .await?;

        let sequence = self
            .ctx
            .counter
            .increment(CounterKey::Join(self.peer.ip(), login.username.clone()));
        let host = hs.get_stripped_hostname();
        HoneypotLogger::join(
            &self.peer,
            &login.get_stripped_username(),
            &host,
            hs.server_port,
            hs.protocol_version,
            sequence,
        );
        let kind = NotificationKind::Join {
            username: login.username.clone(),
        };
        emit(self.ctx, self.peer, &hs, sequence, kind).await;

        Ok(Step::Done(SessionOutcome::Login {
            username: login.username,
        }))
    }
}

async fn emit(
    ctx: &SessionContext,
    peer: SocketAddr,
    hs: &OwnedHandshake,
    sequence: u32,
    kind: NotificationKind,
) {
    ctx.metrics.record_event(kind.as_str());
    ctx.notifier
        .notify(Notification {
            peer,
            protocol_version: hs.protocol_version,
            server_address: hs.server_address.to_string(),
            server_port: hs.server_port,
            sequence,
            timestamp: Notification::now_secs(),
            kind,
        })
        .await;
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, Once};

    use async_trait::async_trait;
    use net::{encode_packet, encode_raw_packet, PacketEncode};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::{config::HoneypotConfig, counter::MemoryCounter, telemetry::get_meter};

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    fn context(notifier: Arc<RecordingNotifier>) -> (SessionContext, Arc<MemoryCounter>) {
        let responses = StaticResponses::build(&HoneypotConfig::default()).unwrap();
        let counter = Arc::new(MemoryCounter::new());
        let ctx = SessionContext::new(
            Arc::new(responses),
            counter.clone(),
            notifier,
            HandshakeMetrics::new(&get_meter()),
        );
        (ctx, counter)
    }

    struct CapturedLog(Mutex<Vec<String>>);

    impl log::Log for CapturedLog {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.0.lock().unwrap().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    static CAPTURED: CapturedLog = CapturedLog(Mutex::new(Vec::new()));

    fn captured_lines(marker: &str) -> Vec<String> {
        CAPTURED
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(marker))
            .cloned()
            .collect()
    }

    fn capture_logs() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = log::set_logger(&CAPTURED);
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    fn peer() -> SocketAddr {
        "198.51.100.7:40000".parse().unwrap()
    }

    fn handshake(next_state: u8) -> Vec<u8> {
        let mut body = Vec::new();
        net::mc::write_varint(&mut body, 772);
        net::mc::write_string(&mut body, "play.example.com").unwrap();
        body.extend_from_slice(&25565u16.to_be_bytes());
        body.push(next_state);
        let mut out = Vec::new();
        encode_raw_packet(&mut out, 0, &body).unwrap();
        out
    }

    fn frame(packet: &impl PacketEncode) -> Vec<u8> {
        let mut out = Vec::new();
        encode_packet(&mut out, packet).unwrap();
        out
    }

    #[tokio::test]
    async fn status_then_ping_echo() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, counter) = context(notifier.clone());
        let (mut client, server) = duplex(4096);

        let mut input = handshake(1);
        input.extend(frame(&StatusRequestC2s));
        let ping = [0x09, 0x01, 1, 2, 3, 4, 5, 6, 7, 8];
        input.extend_from_slice(&ping);
        client.write_all(&input).await.unwrap();

        let mut session = Session::new(server, peer(), &ctx);
        let outcome = session.run().await.unwrap();
        assert_eq!(outcome, SessionOutcome::Status);
        assert_eq!(session.state(), SessionState::Closed);
        drop(session);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        let mut expected = Vec::new();
        encode_raw_packet(&mut expected, 0, &ctx.responses.status).unwrap();
        expected.extend_from_slice(&ping);
        assert_eq!(written, expected);

        assert_eq!(counter.get(&CounterKey::Ping(peer().ip())), 1);
        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, NotificationKind::Ping);
        assert_eq!(seen[0].server_address, "play.example.com");
        assert_eq!(seen[0].server_port, 25565);
        assert_eq!(seen[0].protocol_version, 772);
        assert_eq!(seen[0].sequence, 1);
    }

    #[tokio::test]
    async fn login_is_kicked_once() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, counter) = context(notifier.clone());
        let (mut client, server) = duplex(4096);

        let mut input = handshake(2);
        let mut login = Vec::new();
        net::mc::write_string(&mut login, "Steve").unwrap();
        login.extend_from_slice(&[0xab; 16]);
        encode_raw_packet(&mut input, 0, &login).unwrap();
        client.write_all(&input).await.unwrap();

        let mut session = Session::new(server, peer(), &ctx);
        let outcome = session.run().await.unwrap();
        assert_eq!(
            outcome,
            SessionOutcome::Login {
                username: "Steve".into()
            }
        );
        drop(session);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        let mut expected = Vec::new();
        encode_raw_packet(&mut expected, 0, &ctx.responses.kick).unwrap();
        assert_eq!(written, expected);

        let key = CounterKey::Join(peer().ip(), "Steve".into());
        assert_eq!(counter.get(&key), 1);
        let seen = notifier.seen.lock().unwrap();
        assert_eq!(
            seen[0].kind,
            NotificationKind::Join {
                username: "Steve".into()
            }
        );
    }

    #[tokio::test]
    async fn repeated_joins_count_up() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, _counter) = context(notifier.clone());

        for _ in 0..3 {
            let (mut client, server) = duplex(4096);
            let mut input = handshake(3);
            input.extend(frame(&LoginStartC2s { username: "Alex" }));
            client.write_all(&input).await.unwrap();
            Session::new(server, peer(), &ctx).run().await.unwrap();
        }

        let seen = notifier.seen.lock().unwrap();
        let sequences: Vec<u32> = seen.iter().map(|n| n.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unknown_next_state_closes_without_writing() {
        for raw in [0u8, 4] {
            let notifier = Arc::new(RecordingNotifier::default());
            let (ctx, _) = context(notifier.clone());
            let (mut client, server) = duplex(4096);
            client.write_all(&handshake(raw)).await.unwrap();

            let mut session = Session::new(server, peer(), &ctx);
            let err = session.run().await.unwrap_err();
            assert_eq!(err, ProtoError::UnrecognizedNextState(raw));
            assert_eq!(session.state(), SessionState::AwaitHandshake);
            drop(session);

            let mut written = Vec::new();
            client.read_to_end(&mut written).await.unwrap();
            assert!(written.is_empty());
            assert!(notifier.seen.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn unexpected_packet_after_status_handshake_aborts() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, counter) = context(notifier.clone());
        let (mut client, server) = duplex(4096);

        let mut input = handshake(1);
        input.extend_from_slice(&[0x01, 0x05]);
        client.write_all(&input).await.unwrap();

        let mut session = Session::new(server, peer(), &ctx);
        let err = session.run().await.unwrap_err();
        assert_eq!(
            err,
            ProtoError::UnexpectedPacketId {
                expected: 0,
                actual: 5
            }
        );
        assert_eq!(session.state(), SessionState::StatusQuery);
        drop(session);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        assert!(written.is_empty());
        assert_eq!(counter.get(&CounterKey::Ping(peer().ip())), 0);
    }

    #[tokio::test]
    async fn peer_hanging_up_mid_handshake_is_eof() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, _) = context(notifier);
        let (mut client, server) = duplex(4096);

        let input = handshake(2);
        client.write_all(&input[..input.len() - 3]).await.unwrap();
        drop(client);

        let mut session = Session::new(server, peer(), &ctx);
        assert_eq!(session.run().await.unwrap_err(), ProtoError::UnexpectedEof);
    }

    #[tokio::test]
    async fn join_log_line_strips_control_characters() {
        capture_logs();
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, _) = context(notifier.clone());
        let (mut client, server) = duplex(4096);

        let username = "zq7\n[INFO] Join from Admin\x1b[2J";
        let mut input = handshake(2);
        input.extend(frame(&LoginStartC2s { username }));
        client.write_all(&input).await.unwrap();

        Session::new(server, peer(), &ctx).run().await.unwrap();

        let lines = captured_lines("zq7");
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(!lines[0].contains('\n'));
        assert!(!lines[0].contains('\x1b'));
        assert!(lines[0].starts_with("Join from zq7[INFO] Join from Admin[2J at "));

        let seen = notifier.seen.lock().unwrap();
        assert_eq!(
            seen[0].kind,
            NotificationKind::Join {
                username: username.into()
            }
        );
    }

    #[tokio::test]
    async fn status_write_to_a_closed_peer_aborts() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, _) = context(notifier);
        let (mut client, server) = duplex(4096);

        let mut input = handshake(1);
        input.extend(frame(&StatusRequestC2s));
        client.write_all(&input).await.unwrap();
        drop(client);

        let mut session = Session::new(server, peer(), &ctx);
        assert_eq!(
            session.run().await.unwrap_err(),
            ProtoError::WriteFailed(std::io::ErrorKind::BrokenPipe)
        );
        assert_eq!(session.state(), SessionState::StatusQuery);
    }

    #[tokio::test]
    async fn kick_write_to_a_closed_peer_aborts_before_counting() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (ctx, counter) = context(notifier.clone());
        let (mut client, server) = duplex(4096);

        let mut input = handshake(2);
        input.extend(frame(&LoginStartC2s { username: "Steve" }));
        client.write_all(&input).await.unwrap();
        drop(client);

        let mut session = Session::new(server, peer(), &ctx);
        assert_eq!(
            session.run().await.unwrap_err(),
            ProtoError::WriteFailed(std::io::ErrorKind::BrokenPipe)
        );
        assert_eq!(session.state(), SessionState::LoginAttempt);
        let key = CounterKey::Join(peer().ip(), "Steve".into());
        assert_eq!(counter.get(&key), 0);
        assert!(notifier.seen.lock().unwrap().is_empty());
    }
}
