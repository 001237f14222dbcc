//! Change detection: one generic "observe until" engine for the three
//! event classes the pipeline reacts to — a region appearing, a region
//! disappearing, and content mutating inside a present region.
//!
//! Mutation watchers belong to a debounce group: any burst of
//! notifications landing inside the group's window collapses into a
//! single `RecomputeDue`, scheduled cancel-and-restart (last write wins).
//!
//! Time is virtual and cooperative. The embedder calls [`ChangeWatcher::poll`]
//! after document changes and [`ChangeWatcher::advance`] to move the clock;
//! nothing blocks.

use std::collections::BTreeMap;

use prometheus::IntCounter;

use crate::counters::Counters;
use crate::dom::{Document, NodeId};

/// Debounce window matching the original 100 ms burst-collapse interval.
pub const DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

/// Resolves the currently-matching node for a watched target, if any.
pub type Selector = Box<dyn Fn(&Document) -> Option<NodeId>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A watched target transitioned ABSENT → PRESENT. Fires once; the
    /// watcher retires itself, matching one-shot observer semantics.
    Appeared(WatcherId),
    /// A watched target transitioned PRESENT → ABSENT. Also one-shot.
    Disappeared(WatcherId),
    /// A mutation group's debounce window elapsed with no new
    /// notifications; run the recompute for that group.
    RecomputeDue(String),
}

enum Target {
    Selector(Selector),
    Node(NodeId),
}

enum Kind {
    Appear,
    Disappear,
    Mutate { group: String },
}

struct Watcher {
    id: WatcherId,
    purpose: String,
    kind: Kind,
    target: Target,
    last_rev: u64,
}

struct Group {
    window_ms: u64,
    deadline: Option<u64>,
    members: usize,
}

pub struct ChangeWatcher {
    now_ms: u64,
    next_id: u64,
    watchers: Vec<Watcher>,
    groups: BTreeMap<String, Group>,
    collapsed: IntCounter,
}

impl ChangeWatcher {
    pub fn new(counters: &Counters) -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            watchers: Vec::new(),
            groups: BTreeMap::new(),
            collapsed: counters.debounce_collapsed_total.clone(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Active watcher count; teardown safety checks hinge on this.
    pub fn active(&self) -> usize {
        self.watchers.len()
    }

    /// Fire once when the selector starts matching.
    pub fn watch_appear(
        &mut self,
        purpose: &str,
        selector: impl Fn(&Document) -> Option<NodeId> + 'static,
    ) -> WatcherId {
        self.install(purpose, Kind::Appear, Target::Selector(Box::new(selector)), 0)
    }

    /// Fire once when the selector stops matching.
    pub fn watch_disappear(
        &mut self,
        purpose: &str,
        selector: impl Fn(&Document) -> Option<NodeId> + 'static,
    ) -> WatcherId {
        self.install(
            purpose,
            Kind::Disappear,
            Target::Selector(Box::new(selector)),
            0,
        )
    }

    /// Debounced subtree observation of one node, in the named group.
    /// The node's current revision is the baseline; a detached node is
    /// inert until the session tears it down.
    pub fn watch_mutations(
        &mut self,
        purpose: &str,
        node: NodeId,
        group: &str,
        window_ms: u64,
        doc: &Document,
    ) -> WatcherId {
        let baseline = doc.subtree_rev(node);
        let entry = self.groups.entry(group.to_string()).or_insert(Group {
            window_ms,
            deadline: None,
            members: 0,
        });
        entry.members += 1;
        self.install(
            purpose,
            Kind::Mutate {
                group: group.to_string(),
            },
            Target::Node(node),
            baseline,
        )
    }

    fn install(&mut self, purpose: &str, kind: Kind, target: Target, last_rev: u64) -> WatcherId {
        // At most one watcher per purpose: a second install replaces the
        // first instead of leaking it.
        if let Some(stale) = self
            .watchers
            .iter()
            .find(|w| w.purpose == purpose)
            .map(|w| w.id)
        {
            log::warn!("replacing active watcher for purpose {purpose}");
            self.cancel(stale);
        }
        self.next_id += 1;
        let id = WatcherId(self.next_id);
        log::trace!("install watcher {id:?} for {purpose}");
        self.watchers.push(Watcher {
            id,
            purpose: purpose.to_string(),
            kind,
            target,
            last_rev,
        });
        id
    }

    pub fn cancel(&mut self, id: WatcherId) -> bool {
        let Some(pos) = self.watchers.iter().position(|w| w.id == id) else {
            return false;
        };
        let w = self.watchers.remove(pos);
        log::trace!("cancel watcher {id:?} for {}", w.purpose);
        if let Kind::Mutate { group } = &w.kind {
            if let Some(g) = self.groups.get_mut(group) {
                g.members -= 1;
                // Last member gone: drop any pending recompute with it.
                if g.members == 0 {
                    self.groups.remove(group);
                }
            }
        }
        true
    }

    pub fn cancel_all(&mut self) {
        log::trace!("cancel all ({} watchers)", self.watchers.len());
        self.watchers.clear();
        self.groups.clear();
    }

    /// Re-baseline a mutation watcher to the node's current revision, so a
    /// sync that wrote into its own watched subtree does not re-trigger.
    pub fn resync(&mut self, id: WatcherId, doc: &Document) {
        if let Some(w) = self.watchers.iter_mut().find(|w| w.id == id) {
            if let Target::Node(n) = w.target {
                w.last_rev = doc.subtree_rev(n);
            }
        }
    }

    /// Observe the document once: emit appear/disappear transitions and
    /// restart debounce deadlines for mutated targets.
    pub fn poll(&mut self, doc: &Document) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        let mut retired = Vec::new();

        for w in &mut self.watchers {
            match (&w.kind, &w.target) {
                (Kind::Appear, Target::Selector(sel)) => {
                    if sel(doc).is_some() {
                        events.push(WatchEvent::Appeared(w.id));
                        retired.push(w.id);
                    }
                }
                (Kind::Disappear, Target::Selector(sel)) => {
                    let present = sel(doc).map(|n| doc.is_attached(n)).unwrap_or(false);
                    if !present {
                        events.push(WatchEvent::Disappeared(w.id));
                        retired.push(w.id);
                    }
                }
                (Kind::Mutate { group }, Target::Node(node)) => {
                    if !doc.is_attached(*node) {
                        continue; // torn-down subtree; session cancels us shortly
                    }
                    let rev = doc.subtree_rev(*node);
                    if rev != w.last_rev {
                        w.last_rev = rev;
                        if let Some(g) = self.groups.get_mut(group) {
                            if g.deadline.is_some() {
                                self.collapsed.inc();
                            }
                            g.deadline = Some(self.now_ms + g.window_ms);
                        }
                    }
                }
                _ => unreachable!("kind/target pairing is fixed at install"),
            }
        }
        for id in retired {
            self.cancel(id);
        }
        events
    }

    /// Move virtual time forward and fire every debounce deadline that
    /// elapsed.
    pub fn advance(&mut self, ms: u64) -> Vec<WatchEvent> {
        self.now_ms += ms;
        let mut events = Vec::new();
        for (name, g) in self.groups.iter_mut() {
            if let Some(deadline) = g.deadline {
                if deadline <= self.now_ms {
                    g.deadline = None;
                    events.push(WatchEvent::RecomputeDue(name.clone()));
                }
            }
        }
        events
    }
}
