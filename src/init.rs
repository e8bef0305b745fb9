use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Install the global `tracing` subscriber.
///
/// **Parameters**
/// - `default_level`: filter directive used when `RUST_LOG` is unset or
///   unparsable, e.g. `"debug"` or `"log_pusher=debug,info"`.
///
/// **Effects**
///
/// Installs a [`Registry`] with an [`EnvFilter`] and a `fmt` layer as the
/// global default, so scheduler ticks, write outcomes and server events
/// all land on stdout.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing(default_level: &str) -> Result<(), SetGlobalDefaultError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true));
    tracing::subscriber::set_global_default(subscriber)
}
