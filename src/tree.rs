//! Persistent, branch-preserving game tree.
//!
//! A [`GameTree`] is an immutable value: nodes live behind `Arc` in an
//! id-keyed arena, and [`GameTree::mutate`] hands a [`Draft`] to an edit
//! closure and returns a brand-new tree. Only the nodes touched by the edit
//! are copied; everything else is shared with the previous value, which
//! stays valid for whoever still holds it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::error::{SgfError, TreeError};
use crate::sgf::{self, NodeData, SgfNode};

/// Identifier of a node, unique within a tree lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of fresh node ids.
///
/// One generator is shared by every tree derived from the same original, so
/// ids are never handed out twice in a lineage.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&self) -> NodeId;
}

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// One position in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Variations in priority order; index 0 is the main line.
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }
}

#[derive(Debug, Clone)]
pub struct GameTree {
    root: NodeId,
    nodes: HashMap<NodeId, Arc<Node>>,
    ids: Arc<dyn IdGenerator>,
}

impl GameTree {
    /// A tree holding a single empty root node.
    pub fn new() -> Self {
        Self::with_ids(Arc::new(SequentialIds::new()))
    }

    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self::with_root_data(NodeData::default(), ids)
    }

    pub fn with_root_data(data: NodeData, ids: Arc<dyn IdGenerator>) -> Self {
        let root = ids.next_id();
        let node = Node {
            id: root,
            parent: None,
            children: Vec::new(),
            data,
        };
        Self {
            root,
            nodes: HashMap::from([(root, Arc::new(node))]),
            ids,
        }
    }

    /// Parse SGF text and build a tree from its first game.
    pub fn parse(text: &str) -> Result<Self, SgfError> {
        Self::parse_with(text, Arc::new(SequentialIds::new()))
    }

    pub fn parse_with(text: &str, ids: Arc<dyn IdGenerator>) -> Result<Self, SgfError> {
        let first = sgf::parse(text)?.into_iter().next().ok_or(SgfError::Empty)?;
        Ok(Self::from_sgf(&first, ids))
    }

    /// Like [`GameTree::parse_with`], but malformed text yields a tree with
    /// a single empty root instead of an error.
    pub fn parse_or_degenerate(text: &str, ids: Arc<dyn IdGenerator>) -> Self {
        match Self::parse_with(text, Arc::clone(&ids)) {
            Ok(tree) => tree,
            Err(err) => {
                warn!(%err, "malformed SGF, starting from an empty board");
                Self::with_ids(ids)
            }
        }
    }

    /// Convert a parsed SGF node and its descendants.
    pub fn from_sgf(root: &SgfNode, ids: Arc<dyn IdGenerator>) -> Self {
        let mut tree = Self::with_root_data(NodeData::from_properties(root.properties.clone()), ids);
        let root_id = tree.root;
        let mut pending: Vec<(NodeId, &SgfNode)> = root.children.iter().map(|c| (root_id, c)).collect();
        pending.reverse();
        while let Some((parent, sgf_node)) = pending.pop() {
            let id = tree.ids.next_id();
            let node = Node {
                id,
                parent: Some(parent),
                children: Vec::new(),
                data: NodeData::from_properties(sgf_node.properties.clone()),
            };
            tree.nodes.insert(id, Arc::new(node));
            if let Some(p) = tree.nodes.get_mut(&parent) {
                Arc::make_mut(p).children.push(id);
            }
            pending.extend(sgf_node.children.iter().rev().map(|c| (id, c)));
        }
        tree
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &Node {
        // the root is inserted on construction and never removed
        &self.nodes[&self.root]
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes
            .get(&id)
            .map(Arc::as_ref)
            .ok_or(TreeError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        Ok(&self.get(id)?.children)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.get(id)?.parent)
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> Result<usize, TreeError> {
        let mut depth = 0;
        let mut node = self.get(id)?;
        while let Some(parent) = node.parent {
            node = self.get(parent)?;
            depth += 1;
        }
        Ok(depth)
    }

    /// Nodes strictly after `ancestor` down to and including `node`, in
    /// root-to-leaf order.
    ///
    /// If `ancestor` is not on the path the walk stops at the root, and the
    /// whole path below the root is returned.
    pub fn path_from(&self, ancestor: NodeId, node: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = Vec::new();
        let mut current = self.get(node)?;
        while current.id != ancestor {
            let Some(parent) = current.parent else {
                break;
            };
            path.push(current.id);
            current = self.get(parent)?;
        }
        path.reverse();
        Ok(path)
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Follow first children from `id` until a leaf.
    pub fn main_line_end(&self, id: NodeId) -> Result<NodeId, TreeError> {
        let mut node = self.get(id)?;
        while let Some(next) = node.first_child() {
            node = self.get(next)?;
        }
        Ok(node.id)
    }

    /// Depth-first pre-order traversal from the root.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self.root];
        std::iter::from_fn(move || {
            let node = self.nodes.get(&stack.pop()?)?;
            stack.extend(node.children.iter().rev());
            Some(node.as_ref())
        })
    }

    /// Apply structural edits and return the edited tree together with the
    /// edit closure's result. `self` is left untouched.
    pub fn mutate<T>(&self, edit: impl FnOnce(&mut Draft<'_>) -> Result<T, TreeError>) -> Result<(Self, T), TreeError> {
        let mut draft = Draft {
            nodes: self.nodes.clone(),
            ids: self.ids.as_ref(),
        };
        let value = edit(&mut draft)?;
        let tree = Self {
            root: self.root,
            nodes: draft.nodes,
            ids: Arc::clone(&self.ids),
        };
        Ok((tree, value))
    }

    pub fn to_sgf(&self) -> String {
        sgf::serialize(self)
    }
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Scratch copy of a tree under edit.
pub struct Draft<'a> {
    nodes: HashMap<NodeId, Arc<Node>>,
    ids: &'a dyn IdGenerator,
}

impl Draft<'_> {
    pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes
            .get(&id)
            .map(Arc::as_ref)
            .ok_or(TreeError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or(TreeError::NodeNotFound(id))
    }

    /// Add a new last child under `parent` and return its id.
    pub fn append_node(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, TreeError> {
        let id = self.ids.next_id();
        self.get_mut(parent)?.children.push(id);
        let node = Node {
            id,
            parent: Some(parent),
            children: Vec::new(),
            data,
        };
        self.nodes.insert(id, Arc::new(node));
        Ok(id)
    }

    /// Append `value` to property `key` of node `id`.
    pub fn add_to_property(&mut self, id: NodeId, key: &str, value: impl Into<String>) -> Result<(), TreeError> {
        self.get_mut(id)?.data.push_value(key, value.into());
        Ok(())
    }
}
