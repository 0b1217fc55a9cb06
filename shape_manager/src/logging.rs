use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "shapedisplay=info,shape_manager=info,shape_core=info,shape_library=info";

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_logging(verbose: bool) {
    let fallback = if verbose {
        DEFAULT_FILTER.replace("=info", "=debug")
    } else {
        DEFAULT_FILTER.to_string()
    };

    // A second call (tests, embedding) leaves the first subscriber in place
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
