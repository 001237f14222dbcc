mod common;

use stridelens_core::counters::Counters;
use stridelens_core::dom::Document;
use stridelens_core::watch::{ChangeWatcher, WatchEvent, DEBOUNCE_MS};

use common::el;

#[test]
fn appear_fires_exactly_once_then_retires() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();

    let id = watcher.watch_appear("t.appear", |doc| doc.find("target"));
    assert!(watcher.poll(&doc).is_empty()); // still absent

    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    assert_eq!(watcher.poll(&doc), vec![WatchEvent::Appeared(id)]);
    // one-shot: further polls see the present target but stay quiet
    assert!(watcher.poll(&doc).is_empty());
    assert_eq!(watcher.active(), 0);
}

#[test]
fn disappear_fires_once_on_detach() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    let id = watcher.watch_disappear("t.gone", |doc| doc.find("target"));
    assert!(watcher.poll(&doc).is_empty()); // still present

    doc.detach(target);
    assert_eq!(watcher.poll(&doc), vec![WatchEvent::Disappeared(id)]);
    assert!(watcher.poll(&doc).is_empty());
}

#[test]
fn burst_collapses_into_one_recompute() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    watcher.watch_mutations("t.mutate", target, "grp", DEBOUNCE_MS, &doc);

    for i in 0..5 {
        doc.set_text(target, &format!("v{i}"));
        assert!(watcher.poll(&doc).is_empty());
        let fired = watcher.advance(DEBOUNCE_MS / 5);
        assert!(fired.is_empty(), "fired inside the window: {fired:?}");
    }
    // burst quiesces; the window elapses once
    let events = watcher.advance(DEBOUNCE_MS);
    assert_eq!(events, vec![WatchEvent::RecomputeDue("grp".into())]);
    // 4 of the 5 notifications were collapsed into the pending deadline
    assert_eq!(counters.debounce_collapsed_total.get(), 4);
    // nothing left pending
    assert!(watcher.advance(DEBOUNCE_MS).is_empty());
}

#[test]
fn spaced_mutations_each_recompute() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    watcher.watch_mutations("t.mutate", target, "grp", DEBOUNCE_MS, &doc);

    let mut fired = 0;
    for i in 0..3 {
        doc.set_text(target, &format!("v{i}"));
        watcher.poll(&doc);
        fired += watcher.advance(DEBOUNCE_MS + 1).len();
    }
    assert_eq!(fired, 3);
    assert_eq!(counters.debounce_collapsed_total.get(), 0);
}

#[test]
fn grouped_targets_share_one_deadline() {
    // The host rewrites several sibling nodes as one logical update; the
    // group turns that into a single recompute.
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let a = el(&mut doc, "div", &["a"]);
    let b = el(&mut doc, "div", &["b"]);
    doc.append_child(doc.root(), a);
    doc.append_child(doc.root(), b);

    watcher.watch_mutations("t.a", a, "grp", DEBOUNCE_MS, &doc);
    watcher.watch_mutations("t.b", b, "grp", DEBOUNCE_MS, &doc);

    doc.set_text(a, "x");
    doc.set_text(b, "y");
    watcher.poll(&doc);

    let events = watcher.advance(DEBOUNCE_MS);
    assert_eq!(events, vec![WatchEvent::RecomputeDue("grp".into())]);
}

#[test]
fn same_purpose_install_replaces_not_leaks() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    watcher.watch_mutations("t.mutate", target, "grp", DEBOUNCE_MS, &doc);
    watcher.watch_mutations("t.mutate", target, "grp", DEBOUNCE_MS, &doc);
    assert_eq!(watcher.active(), 1);

    doc.set_text(target, "x");
    watcher.poll(&doc);
    assert_eq!(watcher.advance(DEBOUNCE_MS).len(), 1);
}

#[test]
fn cancel_all_drops_pending_deadlines() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    watcher.watch_mutations("t.mutate", target, "grp", DEBOUNCE_MS, &doc);
    doc.set_text(target, "x");
    watcher.poll(&doc);

    watcher.cancel_all();
    assert_eq!(watcher.active(), 0);
    assert!(watcher.advance(DEBOUNCE_MS * 2).is_empty());
}

#[test]
fn detached_target_is_inert() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    watcher.watch_mutations("t.mutate", target, "grp", DEBOUNCE_MS, &doc);
    doc.detach(target);
    doc.set_text(target, "still alive?");
    watcher.poll(&doc);
    assert!(watcher.advance(DEBOUNCE_MS).is_empty());
}

#[test]
fn resync_swallows_own_writes() {
    let counters = Counters::new();
    let mut watcher = ChangeWatcher::new(&counters);
    let mut doc = Document::new();
    let target = el(&mut doc, "div", &["target"]);
    doc.append_child(doc.root(), target);

    let id = watcher.watch_mutations("t.mutate", target, "grp", DEBOUNCE_MS, &doc);
    doc.set_text(target, "written by the overlay");
    watcher.resync(id, &doc);
    watcher.poll(&doc);
    assert!(watcher.advance(DEBOUNCE_MS).is_empty());
}
