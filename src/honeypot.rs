use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    net::{TcpListener, TcpStream},
    sync::{broadcast, Semaphore},
};

use crate::{
    config::HoneypotConfig,
    counter::{EventCounter, MemoryCounter},
    error::ReportableError,
    logging::HoneypotLogger,
    metrics::HandshakeMetrics,
    notify::Notifier,
    responses::StaticResponses,
    session::{Session, SessionContext, SessionOutcome},
    telemetry::get_meter,
    threat::ThreatControlService,
};

pub struct Honeypot {
    config: HoneypotConfig,
    context: SessionContext,
    threat: ThreatControlService,
}

impl Honeypot {
    pub fn new(
        config: HoneypotConfig,
        responses: Arc<StaticResponses>,
        notifier: Arc<dyn Notifier>,
    ) -> Honeypot {
        let counter: Arc<dyn EventCounter> = Arc::new(MemoryCounter::new());
        Self::with_counter(config, responses, counter, notifier)
    }

    pub fn with_counter(
        config: HoneypotConfig,
        responses: Arc<StaticResponses>,
        counter: Arc<dyn EventCounter>,
        notifier: Arc<dyn Notifier>,
    ) -> Honeypot {
        let metrics = HandshakeMetrics::new(&get_meter());
        Honeypot {
            config,
            context: SessionContext::new(responses, counter, notifier, metrics),
            threat: ThreatControlService::new(),
        }
    }

    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        HoneypotLogger::preparing_socket(&self.config.bind);
        let listener = TcpListener::bind(self.config.bind.as_str()).await?;
        HoneypotLogger::listening(&listener.local_addr()?);
        Ok(listener)
    }

    /// Accepts connections until `stop` fires, one task per connection.
    pub async fn serve(&'static self, listener: TcpListener, mut stop: broadcast::Receiver<()>) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_conn as usize));
        let nodelay = dotenvy::var("NO_NODELAY").is_err();

        loop {
            let (client, addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        HoneypotLogger::accept_failed(&e);
                        continue;
                    }
                },
                _ = stop.recv() => break,
            };

            // Try to acquire semaphore (non-blocking)
            let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                HoneypotLogger::connection_limited(&addr);
                drop(client);
                continue;
            };

            if nodelay {
                if let Err(e) = client.set_nodelay(true) {
                    HoneypotLogger::tcp_nodelay_failed(&e);
                }
            }

            tokio::spawn(async move {
                if let Err(e) = self.handle_connection(client, addr).await {
                    HoneypotLogger::connection_error(&addr, &e);
                }
                drop(permit);
            });
        }
    }

    pub async fn handle_connection(
        &self,
        client: TcpStream,
        addr: SocketAddr,
    ) -> Result<SessionOutcome, ReportableError> {
        HoneypotLogger::new_connection(&addr);
        self.context.metrics.record_open();

        let started = Instant::now();
        let deadline = Duration::from_secs(self.config.session_timeout);
        let mut session = Session::new(client, addr, &self.context);
        let run = self.threat.nuisance(deadline, session.run()).await;
        let result = match run {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(ReportableError::from(e)),
            Err(e) => {
                HoneypotLogger::deadline_missed(session.state().as_str(), deadline, &addr);
                Err(ReportableError::from(e))
            }
        };

        let state = session.state().as_str();
        drop(session);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.context.metrics.record_duration(elapsed_ms, state);
        if let Err(e) = &result {
            self.context.metrics.record_failure(state, e.kind());
        }
        HoneypotLogger::session_finished(&addr, state, elapsed_ms);
        result
    }
}
