use cardio_etl::config::toml_config::TomlConfig;
use cardio_etl::core::ConfigProvider;
use cardio_etl::utils::validation::{is_remote, Validate};
use cardio_etl::utils::logger;
use cardio_etl::{AnalysisEngine, HeartSoundModel, HeartSoundPipeline, LocalStorage};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-analyze")]
#[command(about = "Heart sound analysis with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "cardio-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the input recording from config
    #[arg(long)]
    input: Option<String>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based heart sound analysis");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(input) = &args.input {
        config.source.input = input.clone();
        tracing::info!("🔧 Input overridden to: {}", input);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let result = match HeartSoundPipeline::new(storage, config) {
        Ok(pipeline) => {
            AnalysisEngine::new_with_monitoring(pipeline, monitor_enabled)
                .run()
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(output_path) => {
            println!("✅ Analysis completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Input: {}", config.input());
    println!("  Model: {}", config.model_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));

    if let Some(bundle) = config.bundle_filename() {
        println!("  Bundle: {}", bundle);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("🎧 Recording Source:");
    if is_remote(config.input()) {
        println!("  Remote: {} (timeout {}s)", config.input(), config.timeout_seconds());
    } else {
        let exists = std::path::Path::new(config.input()).exists();
        println!(
            "  Local: {} ({})",
            config.input(),
            if exists { "found" } else { "⚠️ not found" }
        );
    }

    let settings = config.settings();
    println!();
    println!("⚙️ Signal Processing:");
    println!(
        "  Resample to {} Hz, band-pass {}–{} Hz (order {})",
        settings.signal.target_sample_rate,
        settings.signal.lowcut_hz,
        settings.signal.highcut_hz,
        settings.signal.filter_order
    );
    println!(
        "  Peaks at least {}s apart, height {}× mean envelope, need {}",
        settings.detection.min_peak_distance_seconds,
        settings.detection.height_factor,
        settings.detection.min_peaks
    );
    println!(
        "  {} MFCCs × {} frames = {} features per cycle",
        settings.features.n_mfcc,
        settings.features.max_frames,
        settings.features.feature_len()
    );

    println!();
    println!("🧠 Model:");
    match HeartSoundModel::load(config.model_path(), config.scaler_path()) {
        Ok(model) if model.n_features() == settings.features.feature_len() => {
            println!("  ✅ Loaded ({} features)", model.n_features());
        }
        Ok(model) => println!(
            "  ⚠️ Model expects {} features but settings produce {}",
            model.n_features(),
            settings.features.feature_len()
        ),
        Err(e) => println!("  ❌ {}", e),
    }

    if let Some(patient) = config.patient() {
        println!();
        println!("👤 Patient: {:?}", patient);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
