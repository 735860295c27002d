//! Tree operations: insert, lookup by key path, walk, snapshot.

use std::collections::VecDeque;

use serde_json::{json, Map, Value};
use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The normalized widget tree, backed by a slotmap arena.
///
/// All nodes of one document live in a single `SlotMap`, including modal
/// content subtrees (which are extra parentless nodes). Children keep their
/// declaration order. Trees are built once per document and never patched.
pub struct WidgetTree {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: Option<NodeId>,
}

impl WidgetTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert a parentless node.
    ///
    /// If no root has been set yet, this node becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert a node as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        debug_assert!(
            self.nodes.contains_key(parent),
            "parent node does not exist"
        );
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
        }
        id
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node in declaration order. Returns an empty
    /// slice if the node has no children or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// The child of `parent` declared under `key`.
    pub fn child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|n| n.key == key))
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// The current root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Explicitly set the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of nodes in the tree, modal content included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Breadth-first traversal starting from `start`.
    pub fn walk_breadth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current) {
                queue.push_back(child);
            }
        }
        result
    }

    /// Resolve a `.`-joined chain of child keys below `start`.
    ///
    /// An empty path resolves to `start`.
    pub fn find_by_path(&self, start: NodeId, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return self.contains(start).then_some(start);
        }
        path.split('.')
            .try_fold(start, |current, key| self.child(current, key))
    }

    /// First node in depth-first order below `start` whose key is `key`.
    pub fn find_by_key(&self, start: NodeId, key: &str) -> Option<NodeId> {
        self.walk_depth_first(start)
            .into_iter()
            .find(|&id| self.nodes.get(id).is_some_and(|n| n.key == key))
    }

    /// Key path from the top of `id`'s subtree to `id`, excluding the top
    /// node's own key. Inverse of [`find_by_path`](Self::find_by_path).
    pub fn path_of(&self, id: NodeId) -> String {
        let mut keys: Vec<&str> = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if let Some(node) = self.nodes.get(current) {
                keys.push(&node.key);
            }
            current = parent;
        }
        keys.reverse();
        keys.join(".")
    }

    /// Structural snapshot of the subtree at `id`:
    /// `{type, attributes, children: {key: ...}}`.
    pub fn to_value(&self, id: NodeId) -> Value {
        let Some(node) = self.nodes.get(id) else {
            return Value::Null;
        };
        let children: Map<String, Value> = self
            .children(id)
            .iter()
            .filter_map(|&child| {
                let key = self.nodes.get(child)?.key.clone();
                Some((key, self.to_value(child)))
            })
            .collect();
        json!({
            "type": node.widget_type().as_str(),
            "attributes": Value::Object(node.attributes.as_map().clone()),
            "children": children,
        })
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WidgetTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetTree")
            .field("len", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}
