//! TreeModel: the canonical tree for one collection.
//!
//! Items arrive as a flat pre-order list where each item carries its depth.
//! The model rebuilds parent/child links from the depth tags, keeps them in an
//! arena of nodes addressed by handle, and writes the same list format back
//! out for persistence.

use crate::error::{HierarchyViolation, MoveRejection, Result, TreeError};
use crate::events::{EventBus, ModelEvent, Subscription};
use crate::item::{ItemId, ROOT_DEPTH, ROOT_ID, TreeItem};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Handle into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// The root is always the first item of the list it was built from.
pub(crate) const ROOT_NODE: NodeId = NodeId(0);

#[derive(Debug)]
pub(crate) struct Node<T> {
    pub(crate) item: T,
    pub(crate) parent: Option<NodeId>,
    /// `None` is the leaf/collapsed marker, `Some(vec![])` a confirmed empty list.
    pub(crate) children: Option<Vec<NodeId>>,
}

/// Check that a pre-order list describes a valid tree.
///
/// The first item must be the root (id 0, depth -1), the second (if any) must have
/// depth 0, no later item may be negative, depth may grow by at most one per
/// step and ids must be unique.
pub fn validate_depths<T: TreeItem>(items: &[T]) -> Result<()> {
    let malformed = |index, violation| TreeError::MalformedHierarchy { index, violation };

    let Some(first) = items.first() else {
        return Err(malformed(0, HierarchyViolation::Empty));
    };
    if first.depth() != ROOT_DEPTH {
        return Err(malformed(
            0,
            HierarchyViolation::RootDepth {
                depth: first.depth(),
            },
        ));
    }

    if first.id() != ROOT_ID {
        return Err(malformed(0, HierarchyViolation::RootId { id: first.id() }));
    }

    let mut seen = HashSet::with_capacity(items.len());
    seen.insert(first.id());

    for (offset, pair) in items.windows(2).enumerate() {
        let index = offset + 1;
        let previous = pair[0].depth();
        let depth = pair[1].depth();

        if depth < 0 {
            return Err(malformed(index, HierarchyViolation::NegativeDepth { depth }));
        }
        if index == 1 && depth != 0 {
            return Err(malformed(index, HierarchyViolation::FirstChildDepth { depth }));
        }
        if depth > previous + 1 {
            return Err(malformed(
                index,
                HierarchyViolation::DepthJump { previous, depth },
            ));
        }
        if !seen.insert(pair[1].id()) {
            return Err(malformed(
                index,
                HierarchyViolation::DuplicateId { id: pair[1].id() },
            ));
        }
    }

    Ok(())
}

/// ListToTree: link every item to its parent in a single pass.
///
/// A stack holds the chain of open ancestors. Before an item is placed, every
/// open ancestor at the same or a deeper depth is closed; whatever remains on
/// top is its parent.
fn build_nodes<T: TreeItem>(items: Vec<T>) -> Result<(Vec<Node<T>>, HashMap<ItemId, NodeId>)> {
    validate_depths(&items)?;

    let mut nodes: Vec<Node<T>> = Vec::with_capacity(items.len());
    let mut index = HashMap::with_capacity(items.len());
    let mut open: Vec<NodeId> = Vec::new();

    for (position, item) in items.into_iter().enumerate() {
        let node = NodeId(position);
        let depth = item.depth();

        while let Some(&top) = open.last() {
            if nodes[top.0].item.depth() >= depth {
                open.pop();
            } else {
                break;
            }
        }

        let parent = open.last().copied();
        if let Some(parent) = parent {
            nodes[parent.0]
                .children
                .get_or_insert_with(Vec::new)
                .push(node);
        }

        index.insert(item.id(), node);
        nodes.push(Node {
            item,
            parent,
            children: None,
        });
        open.push(node);
    }

    Ok((nodes, index))
}

/// The canonical tree for one collection of items.
pub struct TreeModel<T> {
    pub(crate) nodes: Vec<Node<T>>,
    index: HashMap<ItemId, NodeId>,
    events: Arc<EventBus>,
}

impl<T: TreeItem> TreeModel<T> {
    /// Build a model from a depth-tagged pre-order list.
    pub fn new(items: Vec<T>) -> Result<Self> {
        let (nodes, index) = build_nodes(items)?;
        Ok(Self {
            nodes,
            index,
            events: Arc::new(EventBus::new()),
        })
    }

    /// Replace the whole item list.
    ///
    /// On error the model keeps its previous contents.
    pub fn set_data(&mut self, items: Vec<T>) -> Result<()> {
        let (nodes, index) = build_nodes(items)?;
        self.nodes = nodes;
        self.index = index;
        self.events.emit(ModelEvent::Reloaded {
            len: self.nodes.len(),
        });
        Ok(())
    }

    /// Subscribe to structural changes.
    pub fn subscribe(&self, callback: impl Fn(ModelEvent) + Send + Sync + 'static) -> Subscription {
        self.events.subscribe(callback)
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Number of items, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the model holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn root(&self) -> &T {
        &self.nodes[ROOT_NODE.0].item
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.node(id).map(|node| &self.nodes[node.0].item)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    /// Id of the parent of `id`. `None` for the root and for unknown ids.
    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        let node = self.node(id)?;
        self.nodes[node.0]
            .parent
            .map(|parent| self.nodes[parent.0].item.id())
    }

    /// Ids of the children of `id`, or `None` for unknown ids and leaves.
    ///
    /// `Some(vec![])` is returned for an item whose children list exists but
    /// is empty.
    pub fn children(&self, id: ItemId) -> Option<Vec<ItemId>> {
        let node = self.node(id)?;
        self.nodes[node.0]
            .children
            .as_ref()
            .map(|children| self.ids(children))
    }

    pub fn has_children(&self, id: ItemId) -> bool {
        self.node(id).is_some_and(|node| self.node_has_children(node))
    }

    /// TreeToList: pre-order flattening of the subtree under `from`.
    ///
    /// The subtree root is only included when it is the global root, so the
    /// full list `tree_to_list(root_id)` is exactly what [`TreeModel::new`]
    /// accepts. Children are visited in their stored order.
    pub fn tree_to_list(&self, from: ItemId) -> Vec<&T> {
        let Some(start) = self.node(from) else {
            return Vec::new();
        };
        let skip = usize::from(start != ROOT_NODE);
        self.preorder(start)
            .into_iter()
            .skip(skip)
            .map(|node| &self.nodes[node.0].item)
            .collect()
    }

    /// The whole tree as a depth-tagged list, root first.
    pub fn to_list(&self) -> Vec<&T> {
        self.tree_to_list(self.root().id())
    }

    /// Consume the model and return its items in pre-order, root first.
    pub fn into_list(self) -> Vec<T> {
        let order = self.preorder(ROOT_NODE);
        let mut slots: Vec<Option<T>> = self.nodes.into_iter().map(|node| Some(node.item)).collect();
        order
            .into_iter()
            .filter_map(|node| slots[node.0].take())
            .collect()
    }

    /// MoveElements: reparent `ids` under `parent`, inserted at `insert_index`.
    ///
    /// When both an item and one of its descendants are listed, only the
    /// ancestor moves and takes its subtree along. `insert_index` counts the
    /// destination's children before the move; it is clamped to the end.
    /// On rejection the tree is left untouched.
    pub fn move_elements(&mut self, parent: ItemId, insert_index: usize, ids: &[ItemId]) -> Result<()> {
        let reject = |rejection| Err(TreeError::InvalidMove(rejection));

        let Some(dest) = self.node(parent) else {
            return reject(MoveRejection::UnknownParent(parent));
        };

        let mut moved = Vec::with_capacity(ids.len());
        let mut moved_set = HashSet::with_capacity(ids.len());
        for &id in ids {
            let Some(node) = self.node(id) else {
                return reject(MoveRejection::UnknownItem(id));
            };
            if node == ROOT_NODE {
                return reject(MoveRejection::RootNotMovable);
            }
            if moved_set.insert(node) {
                moved.push(node);
            }
        }
        if moved.is_empty() {
            return Ok(());
        }

        let mut cursor = Some(dest);
        while let Some(node) = cursor {
            if moved_set.contains(&node) {
                return reject(MoveRejection::Cycle {
                    parent,
                    moved: self.nodes[node.0].item.id(),
                });
            }
            cursor = self.nodes[node.0].parent;
        }

        let top: Vec<NodeId> = moved
            .into_iter()
            .filter(|&node| !self.has_ancestor_in(node, &moved_set))
            .collect();
        let top_set: HashSet<NodeId> = top.iter().copied().collect();

        // Moved items sitting before the insertion point shift it left once removed.
        let current = self.nodes[dest.0].children.as_deref().unwrap_or(&[]);
        let before = insert_index.min(current.len());
        let shift = current[..before]
            .iter()
            .filter(|&child| top_set.contains(child))
            .count();
        let insert_at = before - shift;

        for &node in &top {
            if let Some(old_parent) = self.nodes[node.0].parent {
                let emptied = match self.nodes[old_parent.0].children.as_mut() {
                    Some(children) => {
                        children.retain(|&child| child != node);
                        children.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.nodes[old_parent.0].children = None;
                }
            }
            self.nodes[node.0].parent = Some(dest);
        }

        let children = self.nodes[dest.0].children.get_or_insert_with(Vec::new);
        let insert_at = insert_at.min(children.len());
        children.splice(insert_at..insert_at, top.iter().copied());

        let depth = self.nodes[dest.0].item.depth() + 1;
        for &node in &top {
            self.update_depths(node, depth);
        }

        let items = self.ids(&top);
        debug!("Moved {} item(s) under {} at {}", items.len(), parent, insert_at);
        self.events.emit(ModelEvent::Moved { parent, items });
        Ok(())
    }

    /// Ids from the root down to the parent of `id`. Empty for the root and
    /// for unknown ids.
    pub fn ancestors(&self, id: ItemId) -> Vec<ItemId> {
        let mut ancestors = Vec::new();
        let Some(node) = self.node(id) else {
            return ancestors;
        };
        let mut cursor = self.nodes[node.0].parent;
        while let Some(parent) = cursor {
            ancestors.push(self.nodes[parent.0].item.id());
            cursor = self.nodes[parent.0].parent;
        }
        ancestors.reverse();
        ancestors
    }

    /// Ids of `id` and every descendant of it that has children, i.e. every
    /// row under `id` that a view could expand.
    pub fn descendants_that_have_children(&self, id: ItemId) -> Vec<ItemId> {
        let Some(start) = self.node(id) else {
            return Vec::new();
        };
        self.preorder(start)
            .into_iter()
            .filter(|&node| self.node_has_children(node))
            .map(|node| self.nodes[node.0].item.id())
            .collect()
    }

    pub(crate) fn node(&self, id: ItemId) -> Option<NodeId> {
        self.index.get(&id).copied()
    }

    pub(crate) fn node_has_children(&self, node: NodeId) -> bool {
        self.nodes[node.0]
            .children
            .as_ref()
            .is_some_and(|children| !children.is_empty())
    }

    pub(crate) fn child_nodes(&self, node: NodeId) -> &[NodeId] {
        self.nodes[node.0].children.as_deref().unwrap_or(&[])
    }

    fn ids(&self, nodes: &[NodeId]) -> Vec<ItemId> {
        nodes.iter().map(|node| self.nodes[node.0].item.id()).collect()
    }

    pub(crate) fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.child_nodes(node).iter().rev().copied());
        }
        order
    }

    fn has_ancestor_in(&self, node: NodeId, set: &HashSet<NodeId>) -> bool {
        let mut cursor = self.nodes[node.0].parent;
        while let Some(parent) = cursor {
            if set.contains(&parent) {
                return true;
            }
            cursor = self.nodes[parent.0].parent;
        }
        false
    }

    fn update_depths(&mut self, start: NodeId, depth: i32) {
        let mut stack = vec![(start, depth)];
        while let Some((node, depth)) = stack.pop() {
            self.nodes[node.0].item.set_depth(depth);
            if let Some(children) = &self.nodes[node.0].children {
                stack.extend(children.iter().map(|&child| (child, depth + 1)));
            }
        }
    }
}
