pub mod counters;
pub mod dom;
pub mod locator;
pub mod metrics;
pub mod overlay;
pub mod parse;
pub mod session;
pub mod store;
pub mod types;
pub mod watch;

pub use metrics::{derive_metrics, display_gate};
pub use session::Session;
pub use store::{load_settings, save_settings, StoreError};
pub use types::{DerivedMetrics, Settings, TelemetrySample};
