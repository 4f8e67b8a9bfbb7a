use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::eyre;
use dgc_verifier::{
    cache::{Cache, FileStore},
    certificate::{CertificateDecoder, JsonDecoder},
    config::Config,
    crl::{CrlSyncEngine, FileRevocationStore},
    crypto::RingVerifier,
    remote::DgcClient,
    rules::VerificationMode,
    sync::Synchronizer,
    telemetry,
    validator::Validator,
};
use tracing::{info, warn};

const USAGE: &str = "Usage: dgc-verifier [--mode NORMAL_DGP|BOOSTER_DGP|SUPER_DGP] [--offline] [--watch] <certificate.json>...";

#[derive(Debug, Default)]
struct Args {
    mode: VerificationMode,
    offline: bool,
    watch: bool,
    documents: Vec<String>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> color_eyre::Result<Self> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--mode" => {
                    let mode = args.next().ok_or_else(|| eyre!("--mode needs a value"))?;
                    parsed.mode = mode.parse()?;
                }
                "--offline" => parsed.offline = true,
                "--watch" => parsed.watch = true,
                "-h" | "--help" => return Err(eyre!(USAGE)),
                _ => parsed.documents.push(arg),
            }
        }
        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let args = Args::parse(std::env::args().skip(1))?;

    // Load configuration
    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    let cache = Cache::new(FileStore::new(&config.cache.folder))
        .with_update_window(config.cache.update_window());
    let revoked = FileRevocationStore::in_folder(&config.cache.folder);
    let engine = Arc::new(CrlSyncEngine::new(cache, revoked));
    engine.initialize().await?;

    let synchronizer = Arc::new(Synchronizer::new(
        engine.clone(),
        DgcClient::new(&config.remote)?,
    ));
    if args.offline {
        info!("Offline mode, using cached resources only");
    } else if let Err(e) = synchronizer.update_all().await {
        warn!("Synchronisation failed, falling back to cached resources: {}", e);
    }

    let validator =
        Validator::from_cache(engine.clone(), config.rules.clone().into(), RingVerifier).await?;
    let decoder = JsonDecoder;

    for path in &args.documents {
        let raw = tokio::fs::read(path).await?;
        let certificate = match decoder.decode(&raw) {
            Ok(certificate) => certificate,
            Err(e) => {
                println!("{path}: cannot decode certificate: {e}");
                continue;
            }
        };

        let verdict = validator.validate(&certificate, args.mode).await;
        println!("{path}: {}", serde_json::to_string(&verdict)?);
    }

    if args.watch {
        let handle = synchronizer.start(Duration::from_secs(config.sync.interval_secs));
        info!("Watching the gateway, press Ctrl+C to stop");
        tokio::signal::ctrl_c().await?;
        handle.abort();
    }

    engine.teardown().await?;
    Ok(())
}
