//! Shared fixture: a fake analysis page shaped like the Stryd layout the
//! default PageMap describes.

use stridelens_core::dom::{Document, NodeId};
use stridelens_core::locator::PageMap;

pub struct Page {
    pub container: NodeId,
    pub summary_anchor: NodeId,
    pub moving_time: NodeId,
    pub distance: NodeId,
    pub power: NodeId,
    pub cadence: NodeId,
    pub form_power: NodeId,
    pub cp_node: NodeId,
    pub lap_grid: NodeId,
    pub header_row: NodeId,
    pub lap_rows: Vec<NodeId>,
}

pub fn el(doc: &mut Document, tag: &str, classes: &[&str]) -> NodeId {
    let node = doc.create_element(tag);
    for c in classes {
        doc.add_class(node, c);
    }
    node
}

/// One summary entry: wrapper div with a value <p> (carrying the stat-text
/// class, like the host page) and a label <p>. Returns (entry, value node).
fn summary_entry(doc: &mut Document, value: &str, label: &str) -> (NodeId, NodeId) {
    let entry = el(doc, "div", &[]);
    let value_p = el(doc, "p", &["stat-text"]);
    doc.set_text(value_p, value);
    let label_p = el(doc, "p", &[]);
    doc.set_text(label_p, label);
    doc.append_child(entry, value_p);
    doc.append_child(entry, label_p);
    (entry, value_p)
}

fn header_cell(doc: &mut Document, label: &str) -> NodeId {
    let cell = el(doc, "div", &[]);
    let inner = el(doc, "div", &[]);
    doc.set_text(inner, label);
    doc.append_child(cell, inner);
    cell
}

fn lap_cell(doc: &mut Document, text: &str) -> NodeId {
    let cell = el(doc, "div", &["table-cell"]);
    let inner = el(doc, "div", &[]);
    doc.set_text(inner, text);
    doc.append_child(cell, inner);
    cell
}

pub fn add_lap_row(doc: &mut Document, grid: NodeId, values: &[&str]) -> NodeId {
    let row = el(doc, "div", &["lap-row"]);
    for v in values {
        let cell = lap_cell(doc, v);
        doc.append_child(row, cell);
    }
    doc.append_child(grid, row);
    row
}

pub const LAP_VALUES: [&str; 8] = [
    "1", "29:57", "5.64 km", "254 W", "5:18 /km", "185 spm", "138 bpm", "71 W",
];

/// Builds the full analysis view and attaches it to the document root.
pub fn build_analysis_page(doc: &mut Document) -> Page {
    let container = el(doc, "div", &["analysis-page"]);
    doc.append_child(doc.root(), container);

    // summary strip: anchor div whose children are stat entries
    let info = el(doc, "div", &["selection-info"]);
    doc.append_child(container, info);
    let summary_anchor = el(doc, "div", &[]);
    doc.append_child(info, summary_anchor);
    let (mt_entry, moving_time) = summary_entry(doc, "29:57", "Moving Time");
    doc.append_child(summary_anchor, mt_entry);
    let (dist_entry, distance) = summary_entry(doc, "5.64 km", "Distance");
    doc.append_child(summary_anchor, dist_entry);

    // ribboned selection values above the lap table
    let ribbon = el(doc, "div", &[]);
    doc.append_child(container, ribbon);
    let texts = ["254 W", "5:18 /km", "142 m", "185 spm", "138 bpm", "71 W"];
    let mut ribbon_nodes = Vec::new();
    for t in texts {
        let v = el(doc, "div", &["data-value"]);
        doc.set_text(v, t);
        doc.append_child(ribbon, v);
        ribbon_nodes.push(v);
    }

    // profile card with the critical power reference
    let profile = el(doc, "div", &[]);
    doc.append_child(container, profile);
    let cp_node = el(doc, "div", &["power-text"]);
    doc.set_text(cp_node, "300 W");
    doc.append_child(profile, cp_node);

    // lap table: header row + one data row inside the grid wrapper
    let lap_grid = el(doc, "div", &["lap-grid"]);
    doc.append_child(container, lap_grid);
    let header_row = el(doc, "div", &["lap-header-row"]);
    doc.append_child(lap_grid, header_row);
    for label in ["Lap", "Time", "Distance", "Power", "Pace", "Cadence", "HR", "Form Power"] {
        let cell = header_cell(doc, label);
        doc.append_child(header_row, cell);
    }
    let row = add_lap_row(doc, lap_grid, &LAP_VALUES);

    Page {
        container,
        summary_anchor,
        moving_time,
        distance,
        power: ribbon_nodes[0],
        cadence: ribbon_nodes[3],
        form_power: ribbon_nodes[5],
        cp_node,
        lap_grid,
        header_row,
        lap_rows: vec![row],
    }
}

pub fn stryd_map() -> PageMap {
    PageMap::stryd()
}
