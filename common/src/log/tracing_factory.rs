use std::sync::Once;

use tracing::Level;
use tracing_subscriber::fmt;

static INIT: Once = Once::new();

/// One-shot initialisation of the tracing subscriber.
///
/// Binaries and tests call this once; repeated calls are ignored so
/// that test cases can initialise logging independently.
#[derive(Debug, Clone, Default)]
pub struct TracingFactory;

impl TracingFactory {
    pub fn init_log(debug: bool) {
        let level = if debug { Level::TRACE } else { Level::INFO };
        Self::init_log_with_level(level);
    }

    pub fn init_log_with_level(level: Level) {
        INIT.call_once(|| {
            let _ = fmt()
                .with_max_level(level)
                .with_target(true)
                .try_init();
        });
    }
}
