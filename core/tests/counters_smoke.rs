use stridelens_core::counters::Counters;

#[test]
fn smoke_registry_gathers_every_counter() {
    let counters = Counters::new();
    counters.recompute_total.inc();
    counters.recompute_total.inc();
    counters.parse_failure_total.inc();

    let families = counters.registry().gather();
    assert_eq!(families.len(), 5);

    let recompute = families
        .iter()
        .find(|f| f.get_name() == "recompute_total")
        .expect("recompute_total registered");
    assert_eq!(recompute.get_metric()[0].get_counter().get_value(), 2.0);
}

#[test]
fn clones_share_state() {
    // Counter handles are cheap clones over shared state, so the watcher
    // can hold its own handle.
    let counters = Counters::new();
    let handle = counters.debounce_collapsed_total.clone();
    handle.inc();
    assert_eq!(counters.debounce_collapsed_total.get(), 1);
}
