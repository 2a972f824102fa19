use tracing_subscriber::{EnvFilter, fmt};

/// Default filter for a `-v` count: warnings only, then info, debug and
/// trace for each extra flag.
fn filter_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the subscriber. Records from the `log` facade used by the
/// compiler are forwarded through its log bridge.
///
/// `-v` wins over `RUST_LOG`; without it, `RUST_LOG` is honoured and falls
/// back to warnings.
pub fn init(verbosity: u8) {
    let filter = if verbosity > 0 {
        EnvFilter::new(filter_for(verbosity))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(0)))
    };

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filters() {
        assert_eq!(filter_for(0), "warn");
        assert_eq!(filter_for(2), "debug");
        assert_eq!(filter_for(9), "trace");
    }
}
