use std::{env, error::Error};

use lure_session::{
    SessionConfig, SessionConfigLoadError, SessionServer, telemetry::oltp::init_meter,
};

#[cfg(feature = "mimalloc")]
mod mimalloc {
    use mimalloc::MiMalloc;

    #[global_allocator]
    static GLOBAL: MiMalloc = MiMalloc;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    #[cfg(debug_assertions)]
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::init();

    let meter_provider = if dotenvy::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        Some(init_meter()?)
    } else {
        None
    };

    let config_file = env::current_dir()?.join("settings.toml");
    let config = match SessionConfig::load(&config_file) {
        Ok(config) => {
            // Save config to fill missing fields
            let _ = config.save(&config_file);
            config
        }
        Err(SessionConfigLoadError::Io(_)) => {
            let default_config = SessionConfig::default();
            let _ = default_config.save(&config_file);
            default_config
        }
        Err(error) => return Err(error.into()),
    };

    let server = SessionServer::new(config);
    let coordinator = server.shutdown_coordinator().clone();
    let accept = tokio::spawn({
        let server = server.clone();
        async move {
            if let Err(e) = server.start().await {
                log::error!("{e}");
            }
        }
    });

    {
        use futures::future::{FutureExt, select_all};
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let sigint_fut = sigint.recv().boxed();
        let sigterm_fut = sigterm.recv().boxed();

        let _ = select_all([sigint_fut, sigterm_fut]).await;
        log::info!("Received signal, stopping...");
    }

    coordinator.shutdown().await;
    let _ = accept.await;

    if let Some(provider) = meter_provider {
        if let Err(e) = provider.shutdown() {
            log::warn!("Meter provider shutdown failed: {e}");
        }
    }
    Ok(())
}
