//! Idempotent patching of the overlay nodes.
//!
//! Every overlay node carries a marker class unique per slot kind, and the
//! synchronizer keeps an explicit slot → node registry on top of that. A
//! slot is updated in place when its node exists and created by cloning a
//! structurally equivalent host sibling when it does not, so repeated syncs
//! converge to exactly one node per slot. Host-owned nodes are never
//! removed or restructured.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::locator::cell_value_node;

/// Class prefix shared by every node the overlay creates.
pub const MARK_PREFIX: &str = "sl-overlay";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Economy,
    CriticalPowerPct,
    StrideLength,
    PowerToWeight,
    FormPowerRatio,
}

impl MetricKind {
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Economy => "RE",
            MetricKind::CriticalPowerPct => "CP%",
            MetricKind::StrideLength => "Str Len",
            MetricKind::PowerToWeight => "W/kg",
            MetricKind::FormPowerRatio => "FPR",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            MetricKind::Economy => "economy",
            MetricKind::CriticalPowerPct => "cp-pct",
            MetricKind::StrideLength => "stride",
            MetricKind::PowerToWeight => "wpkg",
            MetricKind::FormPowerRatio => "fpr",
        }
    }

    fn summary_marker(self) -> String {
        format!("{MARK_PREFIX}-stat-{}", self.slug())
    }

    fn header_marker(self) -> String {
        format!("{MARK_PREFIX}-head-{}", self.slug())
    }

    fn cell_marker(self) -> String {
        format!("{MARK_PREFIX}-cell-{}", self.slug())
    }
}

/// Logical overlay slot. Lap cells are additionally keyed by row index so
/// rows appearing later never disturb populated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Summary(MetricKind),
    LapHeader(MetricKind),
    LapCell { metric: MetricKind, row: usize },
}

#[derive(Debug, Default)]
pub struct OverlaySync {
    registry: HashMap<SlotKey, NodeId>,
}

impl OverlaySync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every registered node. Called on session teardown; the next
    /// sync reconciles against whatever document replaced the old one.
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Ensure one summary entry for the metric and set its value text.
    /// Existing node → text update only, preserving whatever the host
    /// attached to its siblings. Absent → clone the first host entry as a
    /// structural template to inherit host styling.
    pub fn upsert_summary(
        &mut self,
        doc: &mut Document,
        anchor: NodeId,
        kind: MetricKind,
        value: &str,
    ) {
        let key = SlotKey::Summary(kind);
        let marker = kind.summary_marker();
        if let Some(node) = self.resolve(doc, key, anchor, &marker) {
            doc.set_text(node, value);
            return;
        }
        let Some(template) = host_template(doc, anchor, 0) else {
            log::debug!("summary strip has no entry to clone for {:?}", kind);
            return;
        };
        let entry = doc.clone_subtree(template);
        let kids = doc.children(entry).to_vec();
        let (Some(&value_node), Some(&label_node)) = (kids.first(), kids.get(1)) else {
            log::debug!("summary template missing value/label children");
            return;
        };
        doc.set_text(value_node, value);
        doc.add_class(value_node, &marker);
        doc.set_text(label_node, kind.label());
        doc.append_child(anchor, entry);
        self.registry.insert(key, value_node);
        log::debug!("created summary slot {:?}", kind);
    }

    /// Blank a summary value that became unavailable. The node (and its
    /// label) stays; only the value text goes. No-op when the slot was
    /// never created — unavailable metrics are omitted, not rendered as
    /// "N/A".
    pub fn blank_summary(&mut self, doc: &mut Document, anchor: NodeId, kind: MetricKind) {
        let key = SlotKey::Summary(kind);
        let marker = kind.summary_marker();
        if let Some(node) = self.resolve(doc, key, anchor, &marker) {
            doc.set_text(node, "");
        }
    }

    /// Ensure one header cell for the metric column, cloned from the last
    /// host header cell.
    pub fn upsert_lap_header(&mut self, doc: &mut Document, header_row: NodeId, kind: MetricKind) {
        let key = SlotKey::LapHeader(kind);
        let marker = kind.header_marker();
        if self.resolve(doc, key, header_row, &marker).is_some() {
            return;
        }
        let Some(template) = last_host_child(doc, header_row) else {
            log::debug!("lap header row has no cell to clone for {:?}", kind);
            return;
        };
        let cell = doc.clone_subtree(template);
        doc.add_class(cell, &marker);
        doc.set_text(cell_value_node(doc, cell), kind.label());
        doc.append_child(header_row, cell);
        self.registry.insert(key, cell);
        log::debug!("created lap header {:?}", kind);
    }

    /// Ensure one value cell for (metric, row) and set its text, cloning
    /// the row's last host cell when absent.
    pub fn upsert_lap_cell(
        &mut self,
        doc: &mut Document,
        row_node: NodeId,
        row: usize,
        kind: MetricKind,
        value: &str,
    ) {
        let key = SlotKey::LapCell { metric: kind, row };
        let marker = kind.cell_marker();
        if let Some(cell) = self.resolve(doc, key, row_node, &marker) {
            doc.set_text(cell_value_node(doc, cell), value);
            return;
        }
        let Some(template) = last_host_child(doc, row_node) else {
            log::debug!("lap row {row} has no cell to clone for {:?}", kind);
            return;
        };
        let cell = doc.clone_subtree(template);
        doc.add_class(cell, &marker);
        doc.set_text(cell_value_node(doc, cell), value);
        doc.append_child(row_node, cell);
        self.registry.insert(key, cell);
    }

    /// Widen the lap grid to fit the overlay columns.
    pub fn set_grid_columns(&self, doc: &mut Document, grid: NodeId, columns: usize) {
        let style = format!(
            "padding-bottom: 1rem; background: transparent; \
             grid-template-columns: repeat({columns}, auto);"
        );
        if doc.attr(grid, "style") != Some(style.as_str()) {
            doc.set_attr(grid, "style", &style);
        }
    }

    /// Registry lookup with reconciliation: a registered node must still be
    /// attached under `scope` and carry its marker; otherwise fall back to
    /// a marker search so the at-most-one invariant survives a lost
    /// registry. Either path re-registers the winner.
    fn resolve(
        &mut self,
        doc: &Document,
        key: SlotKey,
        scope: NodeId,
        marker: &str,
    ) -> Option<NodeId> {
        if let Some(&node) = self.registry.get(&key) {
            if doc.is_attached(node) && doc.has_class(node, marker) {
                return Some(node);
            }
        }
        let found = doc.find_in(scope, marker)?;
        self.registry.insert(key, found);
        Some(found)
    }
}

/// Last child of `parent` that the host rendered (skipping overlay nodes),
/// the safe structural template for cloning.
fn last_host_child(doc: &Document, parent: NodeId) -> Option<NodeId> {
    doc.children(parent)
        .iter()
        .rev()
        .copied()
        .find(|&c| !is_overlay_node(doc, c))
}

/// Host template at a fixed position, skipping overlay nodes.
fn host_template(doc: &Document, parent: NodeId, index: usize) -> Option<NodeId> {
    doc.children(parent)
        .iter()
        .copied()
        .filter(|&c| !is_overlay_node(doc, c))
        .nth(index)
}

fn is_overlay_node(doc: &Document, id: NodeId) -> bool {
    doc.classes(id).iter().any(|c| c.starts_with(MARK_PREFIX))
        || doc
            .children(id)
            .iter()
            .any(|&c| doc.classes(c).iter().any(|cl| cl.starts_with(MARK_PREFIX)))
}
