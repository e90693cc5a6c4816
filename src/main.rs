use std::{error::Error, sync::Arc};

use mc_honeypot::{
    config::HoneypotConfig, honeypot::Honeypot, logging::HoneypotLogger, notify,
    responses::StaticResponses, telemetry::init_meter, utils::leak,
};
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    HoneypotLogger::init();

    let provider = if dotenvy::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        Some(init_meter()?)
    } else {
        None
    };

    let config = HoneypotConfig::resolve()?;
    let responses = Arc::new(StaticResponses::build(&config)?);
    let notifier = notify::from_config(&config)?;

    let honeypot = leak(Honeypot::new(config, responses, notifier));
    let listener = honeypot.bind().await?;

    let (stop, _) = broadcast::channel(1);
    let server = tokio::spawn(honeypot.serve(listener, stop.subscribe()));
    {
        use futures::future::{select_all, FutureExt};
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let sigint_fut = sigint.recv().boxed();
        let sigterm_fut = sigterm.recv().boxed();

        let _ = select_all([sigint_fut, sigterm_fut]).await;
        HoneypotLogger::stopping();
        stop.send(())?;
    }
    let _ = server.await;

    if let Some(provider) = provider {
        provider.shutdown()?;
    }
    Ok(())
}
