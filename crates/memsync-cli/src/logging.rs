use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "memory_sync=info,memsync_core=info,memsync_mcp=warn";

/// Initialize a tracing subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug for every
/// crate and the default shows sync decisions only.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .compact();

    let default = if verbose { "debug" } else { DEFAULT_FILTER };
    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_logging_init() {
        // We can only init once per process
        let _ = init(false);

        info!("This is an info message");
        warn!("This is a warning message");
    }
}
