pub mod fixtures;
pub mod harness;
pub mod host;
pub mod outbound;

pub use harness::{LineClient, RelayHarness};
pub use host::{HostEvent, MockHost, MockScreen};
pub use outbound::RecordingOutbound;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(
                    "inputsync=debug,inputsync_network=debug,inputsync_introspect=debug",
                )
            }))
            .with_test_writer()
            .init();
    });
}
