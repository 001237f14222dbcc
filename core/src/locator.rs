//! Structural lookup of the page regions the pipeline reads and patches.
//!
//! The host page assigns no stable identifiers, so everything resolves by
//! class marker plus position in document order. All lookups are
//! defensive: an unexpected shape yields None and the caller retries on a
//! later change, never panics.

use crate::dom::{Document, NodeId};

/// Per-target adapter: the class markers and list positions for one page
/// layout. Only this struct knows what the page looks like.
#[derive(Debug, Clone)]
pub struct PageMap {
    pub analysis_container: String, // full-screen analysis view wrapper
    pub selection_info: String,     // top summary strip wrapper
    pub summary_stat: String,       // stat value nodes in the strip
    pub selection_value: String,    // ribboned selection values above laps
    pub critical_power: String,     // profile-card critical power text
    pub lap_grid: String,           // lap table wrapper carrying the grid style
    pub lap_header_row: String,     // lap table header row
    pub lap_row: String,            // one lap data row
    pub lap_cell: String,           // one value cell inside a lap row

    pub lap_host_columns: usize, // grid columns the host renders on its own

    // positions inside the summary-stat list
    pub summary_time_idx: usize,
    pub summary_distance_idx: usize,
    // positions inside the selection-value list
    pub sel_power_idx: usize,
    pub sel_cadence_idx: usize,
    pub sel_form_power_idx: usize,
    // cell positions inside one lap row
    pub lap_time_idx: usize,
    pub lap_distance_idx: usize,
    pub lap_power_idx: usize,
    pub lap_cadence_idx: usize,
    pub lap_form_power_idx: usize,
}

impl PageMap {
    /// Layout of the Stryd PowerCenter analysis view.
    pub fn stryd() -> Self {
        Self {
            analysis_container: "analysis-page".into(),
            selection_info: "selection-info".into(),
            summary_stat: "stat-text".into(),
            selection_value: "data-value".into(),
            critical_power: "power-text".into(),
            lap_grid: "lap-grid".into(),
            lap_header_row: "lap-header-row".into(),
            lap_row: "lap-row".into(),
            lap_cell: "table-cell".into(),
            lap_host_columns: 13,
            summary_time_idx: 0,
            summary_distance_idx: 1,
            sel_power_idx: 0,
            sel_cadence_idx: 3,
            sel_form_power_idx: 5,
            lap_time_idx: 1,
            lap_distance_idx: 2,
            lap_power_idx: 3,
            lap_cadence_idx: 5,
            lap_form_power_idx: 6,
        }
    }
}

/// The five telemetry nodes one recompute reads.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryNodes {
    pub moving_time: NodeId,
    pub distance: NodeId,
    pub power: NodeId,
    pub cadence: NodeId,
    pub form_power: NodeId,
}

impl TelemetryNodes {
    pub fn all(&self) -> [(&'static str, NodeId); 5] {
        [
            ("moving-time", self.moving_time),
            ("distance", self.distance),
            ("power", self.power),
            ("cadence", self.cadence),
            ("form-power", self.form_power),
        ]
    }
}

pub fn locate_container(doc: &Document, map: &PageMap) -> Option<NodeId> {
    doc.find(&map.analysis_container)
}

/// Container whose children are the summary stat entries; new overlay
/// entries are appended here, cloned from its first child.
pub fn locate_summary_anchor(doc: &Document, map: &PageMap) -> Option<NodeId> {
    let info = doc.find(&map.selection_info)?;
    doc.children(info).first().copied()
}

/// Telemetry for the current selection: moving time and distance from the
/// summary strip, power/cadence/form power from the ribboned values.
pub fn locate_selection_telemetry(doc: &Document, map: &PageMap) -> Option<TelemetryNodes> {
    let stats = doc.find_all(&map.summary_stat);
    let values = doc.find_all(&map.selection_value);
    Some(TelemetryNodes {
        moving_time: stats.get(map.summary_time_idx).copied()?,
        distance: stats.get(map.summary_distance_idx).copied()?,
        power: values.get(map.sel_power_idx).copied()?,
        cadence: values.get(map.sel_cadence_idx).copied()?,
        form_power: values.get(map.sel_form_power_idx).copied()?,
    })
}

pub fn locate_critical_power(doc: &Document, map: &PageMap) -> Option<NodeId> {
    doc.find(&map.critical_power)
}

pub fn locate_lap_grid(doc: &Document, map: &PageMap) -> Option<NodeId> {
    doc.find(&map.lap_grid)
}

pub fn locate_lap_header_row(doc: &Document, map: &PageMap) -> Option<NodeId> {
    doc.find(&map.lap_header_row)
}

pub fn locate_lap_rows(doc: &Document, map: &PageMap) -> Vec<NodeId> {
    doc.find_all(&map.lap_row)
}

/// Telemetry cells of one lap row, by cell position.
pub fn locate_lap_telemetry(doc: &Document, map: &PageMap, row: NodeId) -> Option<TelemetryNodes> {
    let cells = doc.find_all_in(row, &map.lap_cell);
    let value_of = |idx: usize| -> Option<NodeId> {
        let cell = cells.get(idx).copied()?;
        Some(cell_value_node(doc, cell))
    };
    Some(TelemetryNodes {
        moving_time: value_of(map.lap_time_idx)?,
        distance: value_of(map.lap_distance_idx)?,
        power: value_of(map.lap_power_idx)?,
        cadence: value_of(map.lap_cadence_idx)?,
        form_power: value_of(map.lap_form_power_idx)?,
    })
}

/// The node carrying a cell's text: its first child when wrapped, else the
/// cell itself.
pub fn cell_value_node(doc: &Document, cell: NodeId) -> NodeId {
    doc.children(cell).first().copied().unwrap_or(cell)
}
