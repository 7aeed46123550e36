use std::sync::Arc;

use clap::Parser;
use ecdis_risk_core::{CollisionRiskEngine, RiskAssessmentConfig};
use ecdis_risk_server::{
    config, monitor::RiskMonitor, serve, tokio_host::TokioHost, Cli, ServerError, VERSION,
};
use miette::{IntoDiagnostic, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    if args.write_default_config {
        let path = match args.config.clone() {
            Some(path) => path,
            None => config::default_config_path()
                .ok_or(ServerError::NoConfigDir)
                .into_diagnostic()?,
        };
        config::save_config(&path, &RiskAssessmentConfig::default()).into_diagnostic()?;
        return Ok(());
    }

    log::info!("ECDIS risk server {} starting", VERSION);

    let risk_config = config::load_config(args.config.as_deref()).into_diagnostic()?;
    let host = Arc::new(TokioHost::new());
    let engine = CollisionRiskEngine::new(risk_config, host.clone()).into_diagnostic()?;
    let monitor = Arc::new(RiskMonitor::new(Arc::new(engine)));

    // Subscribe before the monitor starts so no early event is missed
    let events = args.output.then(|| host.subscribe());

    serve(args, monitor, events).await
}
