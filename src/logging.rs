use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. Output goes to stderr so stdout stays
/// usable for JSON results. `RUST_LOG` overrides the default `info` level.
///
/// Returns `false` when a subscriber was already installed, in which case the
/// existing one keeps receiving events.
pub fn init(json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    match installed {
        Ok(()) => {
            debug!(json, "logging initialized");
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_keeps_the_first_subscriber() {
        init(false);
        assert!(!init(true));
    }
}
