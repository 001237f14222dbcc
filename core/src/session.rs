//! Session lifecycle: wait for the analysis view to appear, set everything
//! up, recompute on telemetry mutations, and tear it all down the moment
//! the view goes away so no stale callback ever fires against a
//! half-destroyed page.

use crate::counters::Counters;
use crate::dom::Document;
use crate::locator::{
    locate_container, locate_critical_power, locate_lap_grid, locate_lap_header_row,
    locate_lap_rows, locate_lap_telemetry, locate_selection_telemetry, locate_summary_anchor,
    PageMap, TelemetryNodes,
};
use crate::metrics::{
    derive_metrics, display_gate, format_economy, format_percent, format_ratio, format_stride,
};
use crate::overlay::{MetricKind, OverlaySync};
use crate::parse::{parse_cadence_spm, parse_distance_m, parse_duration_s, parse_power_w};
use crate::types::{Settings, TelemetrySample};
use crate::watch::{ChangeWatcher, WatchEvent, WatcherId, DEBOUNCE_MS};

const GROUP_SELECTION: &str = "selection";
const GROUP_LAPS: &str = "laps";

/// One page-augmentation session. Owns the configuration snapshot, the
/// overlay registry and every active watcher handle.
///
/// Cooperative driving contract: call [`Session::pump`] after document
/// mutations and [`Session::advance`] to move virtual time; both dispatch
/// whatever events fell due.
pub struct Session {
    map: PageMap,
    settings: Settings,
    counters: Counters,
    watcher: ChangeWatcher,
    overlay: OverlaySync,
    cp_w: f64, // critical power resolved for the current run
    container_appear: Option<WatcherId>,
    container_gone: Option<WatcherId>,
    laps_watch: Option<WatcherId>,
    active: bool,
}

impl Session {
    pub fn new(settings: Settings, map: PageMap) -> Self {
        let counters = Counters::new();
        let watcher = ChangeWatcher::new(&counters);
        let mut session = Self {
            map,
            settings: settings.sanitized(),
            counters,
            watcher,
            overlay: OverlaySync::new(),
            cp_w: f64::NAN,
            container_appear: None,
            container_gone: None,
            laps_watch: None,
            active: false,
        };
        session.arm_appear_wait();
        session
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Active watcher handles, for teardown-safety checks.
    pub fn active_watchers(&self) -> usize {
        self.watcher.active()
    }

    /// Observe the document once and handle whatever changed.
    pub fn pump(&mut self, doc: &mut Document) {
        let events = self.watcher.poll(doc);
        self.dispatch(doc, events);
    }

    /// Move virtual time forward and run any recompute that fell due.
    pub fn advance(&mut self, doc: &mut Document, ms: u64) {
        let events = self.watcher.advance(ms);
        self.dispatch(doc, events);
    }

    fn dispatch(&mut self, doc: &mut Document, events: Vec<WatchEvent>) {
        for event in events {
            match event {
                WatchEvent::Appeared(id) if self.container_appear == Some(id) => {
                    self.container_appear = None;
                    self.setup(doc);
                }
                WatchEvent::Disappeared(id) if self.container_gone == Some(id) => {
                    self.container_gone = None;
                    self.teardown();
                }
                WatchEvent::RecomputeDue(group) if group == GROUP_SELECTION => {
                    self.recompute_selection(doc);
                }
                WatchEvent::RecomputeDue(group) if group == GROUP_LAPS => {
                    self.sync_lap_table(doc);
                }
                other => log::trace!("ignoring event {other:?}"),
            }
        }
    }

    fn arm_appear_wait(&mut self) {
        let map = self.map.clone();
        self.container_appear = Some(
            self.watcher
                .watch_appear("session.container.appear", move |doc| {
                    locate_container(doc, &map)
                }),
        );
    }

    /// Full setup after the analysis container appeared: resolve critical
    /// power, build the lap columns, compute the selection once, then
    /// observe for mutations and for the container going away again.
    fn setup(&mut self, doc: &mut Document) {
        self.counters.session_setup_total.inc();
        self.active = true;
        log::debug!("analysis container appeared, setting up");

        self.resolve_critical_power(doc);
        self.sync_lap_table(doc);
        self.recompute_selection(doc);

        let map = self.map.clone();
        self.container_gone = Some(
            self.watcher
                .watch_disappear("session.container.gone", move |doc| {
                    locate_container(doc, &map)
                }),
        );
        if let Some(grid) = locate_lap_grid(doc, &self.map) {
            self.laps_watch = Some(self.watcher.watch_mutations(
                "laps.grid",
                grid,
                GROUP_LAPS,
                DEBOUNCE_MS,
                doc,
            ));
        }
    }

    /// Cancel every handle before re-arming the appear wait: a leaked
    /// observer would keep firing against a detached subtree, and a
    /// doubled one would double-fire the calculator.
    fn teardown(&mut self) {
        self.counters.session_teardown_total.inc();
        log::debug!("analysis container gone, tearing down");
        self.watcher.cancel_all();
        self.overlay.clear();
        self.container_gone = None;
        self.laps_watch = None;
        self.cp_w = f64::NAN;
        self.active = false;
        self.arm_appear_wait();
    }

    /// Critical power for this run: the user override when set, otherwise
    /// the page's profile-card value. Unresolvable leaves NaN, which gates
    /// CP% off (omitted, never "N/A").
    fn resolve_critical_power(&mut self, doc: &Document) {
        self.cp_w = if self.settings.cp > 0 {
            self.settings.cp as f64
        } else {
            match locate_critical_power(doc, &self.map) {
                Some(node) => parse_power_w(doc.text(node)),
                None => f64::NAN,
            }
        };
        if !self.cp_w.is_finite() {
            log::debug!("critical power unavailable, CP% will be omitted");
        }
    }

    /// Read one telemetry sample off the given nodes, counting fields that
    /// fail to parse.
    fn read_sample(&self, doc: &Document, nodes: &TelemetryNodes) -> TelemetrySample {
        let sample = TelemetrySample {
            moving_time_s: parse_duration_s(doc.text(nodes.moving_time)),
            distance_m: parse_distance_m(doc.text(nodes.distance)),
            power_w: parse_power_w(doc.text(nodes.power)),
            cadence_spm: parse_cadence_spm(doc.text(nodes.cadence)),
            form_power_w: parse_power_w(doc.text(nodes.form_power)),
        };
        for v in [
            sample.moving_time_s,
            sample.distance_m,
            sample.power_w,
            sample.cadence_spm,
            sample.form_power_w,
        ] {
            if v.is_nan() {
                self.counters.parse_failure_total.inc();
            }
        }
        sample
    }

    /// The selection pipeline: locate → parse → derive → patch, then
    /// re-observe the telemetry nodes (the host replaces them when the
    /// selection changes, so stale handles must not linger).
    fn recompute_selection(&mut self, doc: &mut Document) {
        if !self.active {
            return;
        }
        self.counters.recompute_total.inc();
        let Some(nodes) = locate_selection_telemetry(doc, &self.map) else {
            log::debug!("selection telemetry not found, skipping recompute");
            return;
        };
        let Some(anchor) = locate_summary_anchor(doc, &self.map) else {
            log::debug!("summary anchor not found, skipping recompute");
            return;
        };

        let sample = self.read_sample(doc, &nodes);
        let derived = derive_metrics(self.cp_w, self.settings.weight, &sample);

        let stats = [
            (
                MetricKind::Economy,
                display_gate(derived.running_economy, true),
                format_economy(derived.running_economy),
            ),
            (
                MetricKind::CriticalPowerPct,
                display_gate(derived.critical_power_pct, self.settings.cp_toggle),
                format!("{} %", format_percent(derived.critical_power_pct)),
            ),
            (
                MetricKind::StrideLength,
                display_gate(derived.stride_length_m, self.settings.stride_length_toggle),
                format!("{} m", format_stride(derived.stride_length_m)),
            ),
            (
                MetricKind::PowerToWeight,
                display_gate(derived.power_to_weight, self.settings.wpkg_toggle),
                format_ratio(derived.power_to_weight),
            ),
            (
                MetricKind::FormPowerRatio,
                display_gate(derived.form_power_ratio, self.settings.fpr_toggle),
                format_ratio(derived.form_power_ratio),
            ),
        ];
        for (kind, gate, text) in stats {
            if gate.is_some() {
                self.overlay.upsert_summary(doc, anchor, kind, &text);
            } else {
                self.overlay.blank_summary(doc, anchor, kind);
            }
        }

        for (name, node) in nodes.all() {
            self.watcher.watch_mutations(
                &format!("selection.{name}"),
                node,
                GROUP_SELECTION,
                DEBOUNCE_MS,
                doc,
            );
        }
    }

    /// Idempotent lap-table sync: widen the grid, ensure the overlay
    /// headers, then ensure one computed cell per (metric, row). Re-run
    /// whenever the grid mutates so a freshly recorded lap gets its cells
    /// without disturbing populated rows.
    fn sync_lap_table(&mut self, doc: &mut Document) {
        if !self.active {
            return;
        }
        let Some(header_row) = locate_lap_header_row(doc, &self.map) else {
            log::debug!("lap header row not found, skipping lap sync");
            return;
        };

        if let Some(grid) = locate_lap_grid(doc, &self.map) {
            let columns = self.map.lap_host_columns
                + 1
                + usize::from(self.settings.cp_toggle)
                + usize::from(self.settings.stride_length_toggle);
            self.overlay.set_grid_columns(doc, grid, columns);
        }

        self.overlay.upsert_lap_header(doc, header_row, MetricKind::Economy);
        if self.settings.cp_toggle {
            self.overlay
                .upsert_lap_header(doc, header_row, MetricKind::CriticalPowerPct);
        }
        if self.settings.stride_length_toggle {
            self.overlay
                .upsert_lap_header(doc, header_row, MetricKind::StrideLength);
        }

        for (row, row_node) in locate_lap_rows(doc, &self.map).into_iter().enumerate() {
            let Some(nodes) = locate_lap_telemetry(doc, &self.map, row_node) else {
                log::debug!("lap row {row} has unexpected shape, skipping");
                continue;
            };
            let sample = self.read_sample(doc, &nodes);
            let derived = derive_metrics(self.cp_w, self.settings.weight, &sample);

            let economy = display_gate(derived.running_economy, true)
                .map(format_economy)
                .unwrap_or_default();
            self.overlay
                .upsert_lap_cell(doc, row_node, row, MetricKind::Economy, &economy);

            if self.settings.cp_toggle {
                let pct = display_gate(derived.critical_power_pct, true)
                    .map(format_percent)
                    .unwrap_or_default();
                self.overlay
                    .upsert_lap_cell(doc, row_node, row, MetricKind::CriticalPowerPct, &pct);
            }
            if self.settings.stride_length_toggle {
                let stride = display_gate(derived.stride_length_m, true)
                    .map(format_stride)
                    .unwrap_or_default();
                self.overlay
                    .upsert_lap_cell(doc, row_node, row, MetricKind::StrideLength, &stride);
            }
        }

        // Our own writes bumped the grid revision; re-baseline so the sync
        // does not schedule itself.
        if let Some(id) = self.laps_watch {
            self.watcher.resync(id, doc);
        }
    }
}
