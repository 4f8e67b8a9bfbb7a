use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info,dgc_verifier=debug,reqwest=warn,hyper_util=warn";

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let sync_spans = fmt::layer()
            .compact()
            .with_target(false)
            .with_span_events(FmtSpan::CLOSE);

        if let Err(e) = tracing_subscriber::registry()
            .with(env_filter)
            .with(sync_spans)
            .try_init()
        {
            eprintln!("Tracing already initialised elsewhere: {e}");
        }
    });
}
