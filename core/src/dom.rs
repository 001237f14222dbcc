//! In-memory document tree with the observable semantics the pipeline
//! needs from a host page: class-addressed lookup, text content, deep
//! cloning, attach/detach, and subtree change revisions.
//!
//! Text and structural changes stamp a fresh revision on the node and all
//! of its ancestors, so watching one node's revision observes its whole
//! subtree. Attribute and class changes do not bump revisions (observers
//! run with attributes off).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attrs: HashMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    rev: u64,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            attrs: HashMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            rev: 0,
        }
    }
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    rev: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("root")],
            rev: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// New detached element; attach it with [`Document::append_child`].
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Node::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let classes = &mut self.nodes[id.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes[id.0].classes.iter().any(|c| c == class)
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        &self.nodes[id.0].classes
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attrs.get(name).map(String::as_str)
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// No-op when the text is unchanged, so idempotent overlay patches do
    /// not churn revisions.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if self.nodes[id.0].text != text {
            self.nodes[id.0].text = text.to_string();
            self.touch(id);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none(), "child already attached");
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.touch(parent);
    }

    /// Unlink a subtree from its parent. The nodes keep their ids but stop
    /// matching document-scoped queries.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
            self.touch(parent);
        }
    }

    /// Deep copy of a subtree; the copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let src = self.nodes[id.0].clone();
        self.nodes.push(Node {
            children: Vec::new(),
            parent: None,
            rev: 0,
            ..src.clone()
        });
        let copy = NodeId(self.nodes.len() - 1);
        for child in src.children {
            let child_copy = self.clone_subtree(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// True when the node is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root() {
                return true;
            }
            match self.nodes[cur.0].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Revision covering the node's subtree: bumped by any text or
    /// structural change at or below the node.
    pub fn subtree_rev(&self, id: NodeId) -> u64 {
        self.nodes[id.0].rev
    }

    pub fn find(&self, class: &str) -> Option<NodeId> {
        self.find_in(self.root(), class)
    }

    pub fn find_all(&self, class: &str) -> Vec<NodeId> {
        self.find_all_in(self.root(), class)
    }

    /// First descendant of `scope` (exclusive) with the class, preorder.
    pub fn find_in(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.preorder(scope).into_iter().find(|n| self.has_class(*n, class))
    }

    /// All descendants of `scope` (exclusive) with the class, in document
    /// order, so positional contracts ("cadence is the 4th value") hold.
    pub fn find_all_in(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.preorder(scope)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    fn preorder(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev());
        }
        out
    }

    fn touch(&mut self, id: NodeId) {
        self.rev += 1;
        let stamp = self.rev;
        let mut cur = Some(id);
        while let Some(c) = cur {
            self.nodes[c.0].rev = stamp;
            cur = self.nodes[c.0].parent;
        }
    }
}
