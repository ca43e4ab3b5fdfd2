use cardio_etl::config::toml_config::ServerConfig;
use cardio_etl::server::Server;
use cardio_etl::utils::logger;
use clap::Parser;

#[derive(Parser)]
#[command(name = "cardio-server")]
#[command(about = "Heart sound analysis web service")]
struct Args {
    /// TOML configuration with [server] and [model] sections
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long, default_value = "models/heart_model.json")]
    model: String,

    #[arg(long, default_value = "models/scaler.json")]
    scaler: String,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut builder = Server::builder();
    let mut json_logs = args.json_logs;

    match &args.config {
        Some(path) => {
            let config = ServerConfig::from_file(path)?;
            json_logs |= config.server.json_logs;
            builder = builder.config(config);
        }
        None => builder = builder.model_files(&args.model, &args.scaler),
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }

    logger::init_server_logger(json_logs);
    tracing::info!("🫀 Starting cardio-server v{}", env!("CARGO_PKG_VERSION"));

    builder.build()?.run().await
}
