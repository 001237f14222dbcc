//! Internal instrumentation on a private prometheus registry. Nothing is
//! exposed over the network; tests and embedders read the counters
//! directly.

use prometheus::{IntCounter, Registry};

#[derive(Clone)]
pub struct Counters {
    registry: Registry,
    pub recompute_total: IntCounter,
    pub debounce_collapsed_total: IntCounter,
    pub parse_failure_total: IntCounter,
    pub session_setup_total: IntCounter,
    pub session_teardown_total: IntCounter,
}

impl Counters {
    pub fn new() -> Self {
        let registry = Registry::new();
        let make = |name: &str, help: &str| {
            let c = IntCounter::new(name.to_string(), help.to_string())
                .expect("static counter definition");
            registry.register(Box::new(c.clone())).expect("unique counter name");
            c
        };
        Self {
            recompute_total: make("recompute_total", "Completed metric recomputes"),
            debounce_collapsed_total: make(
                "debounce_collapsed_total",
                "Mutation notifications collapsed into a pending recompute",
            ),
            parse_failure_total: make(
                "parse_failure_total",
                "Telemetry fields that failed to parse",
            ),
            session_setup_total: make("session_setup_total", "Session setups after page appear"),
            session_teardown_total: make(
                "session_teardown_total",
                "Session teardowns after page disappear",
            ),
            registry,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}
