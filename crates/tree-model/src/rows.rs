//! Row projection for display layers.
//!
//! Rows are a read-only view: sorting and searching produce new row lists and
//! never reorder the canonical children.

use crate::item::{ItemId, TreeItem};
use crate::model::{NodeId, ROOT_NODE, TreeModel};
use crate::sort::{Column, SortSpec, compare_by, natural_cmp};

use std::cmp::Ordering;

/// Depth used for every search result; the tree is flattened while searching.
const SEARCH_DEPTH: i32 = 0;

/// One display row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: ItemId,
    /// Display depth. Top-level items are at 0.
    pub depth: i32,
    /// Whether the row can be expanded.
    pub has_children: bool,
}

impl<T: TreeItem> TreeModel<T> {
    /// Rows in canonical order, descending only into expanded items.
    pub fn visible_rows(&self, is_expanded: impl Fn(ItemId) -> bool) -> Vec<Row> {
        let mut rows = Vec::new();
        for &child in self.child_nodes(ROOT_NODE) {
            self.push_rows(child, 0, &is_expanded, &mut rows);
        }
        rows
    }

    /// Rows with the top-level items ordered by `specs`.
    ///
    /// Only the top level is reordered; expanded subtrees keep their stored
    /// order. An empty `specs` yields [`visible_rows`](Self::visible_rows).
    pub fn sorted_rows<C: Column<T>>(
        &self,
        specs: &[SortSpec<C>],
        is_expanded: impl Fn(ItemId) -> bool,
    ) -> Vec<Row> {
        if specs.is_empty() {
            return self.visible_rows(is_expanded);
        }

        let mut top: Vec<NodeId> = self.child_nodes(ROOT_NODE).to_vec();
        top.sort_by(|a, b| compare_by(specs, &self.nodes[a.0].item, &self.nodes[b.0].item));

        let mut rows = Vec::new();
        for child in top {
            self.push_rows(child, 0, &is_expanded, &mut rows);
        }
        rows
    }

    /// Every item below the root matching `query`, flattened to depth 0 and
    /// ordered by natural comparison of names.
    ///
    /// An empty query matches nothing; use [`visible_rows`](Self::visible_rows).
    pub fn search(&self, query: &str) -> Vec<Row> {
        self.search_sorted_by(query, |a, b| natural_cmp(a.name(), b.name()))
    }

    /// Like [`search`](Self::search) with a caller-provided result order.
    pub fn search_sorted_by(&self, query: &str, compare: impl Fn(&T, &T) -> Ordering) -> Vec<Row> {
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<NodeId> = Vec::new();
        let mut stack: Vec<NodeId> = self.child_nodes(ROOT_NODE).to_vec();
        while let Some(node) = stack.pop() {
            if self.nodes[node.0].item.matches_search(query) {
                hits.push(node);
            }
            stack.extend(self.child_nodes(node).iter().copied());
        }

        hits.sort_by(|a, b| compare(&self.nodes[a.0].item, &self.nodes[b.0].item));
        hits.into_iter()
            .map(|node| Row {
                id: self.nodes[node.0].item.id(),
                depth: SEARCH_DEPTH,
                has_children: self.node_has_children(node),
            })
            .collect()
    }

    /// The row list a view shows: search results while a query is active,
    /// the expanded tree otherwise.
    pub fn build_rows(&self, search: Option<&str>, is_expanded: impl Fn(ItemId) -> bool) -> Vec<Row> {
        match search {
            Some(query) if !query.is_empty() => self.search(query),
            _ => self.visible_rows(is_expanded),
        }
    }

    fn push_rows(
        &self,
        node: NodeId,
        depth: i32,
        is_expanded: &impl Fn(ItemId) -> bool,
        rows: &mut Vec<Row>,
    ) {
        let id = self.nodes[node.0].item.id();
        let has_children = self.node_has_children(node);
        rows.push(Row {
            id,
            depth,
            has_children,
        });

        if has_children && is_expanded(id) {
            for &child in self.child_nodes(node) {
                self.push_rows(child, depth + 1, is_expanded, rows);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::tests::{Item, item, sample};
    use crate::sort::{Column, SortSpec};
    use crate::{ItemId, TreeModel};
    use std::cmp::Ordering;

    fn ids(rows: &[super::Row]) -> Vec<ItemId> {
        rows.iter().map(|row| row.id).collect()
    }

    #[test]
    fn test_visible_rows_respects_expansion() {
        let model = TreeModel::new(sample()).unwrap();

        let collapsed = model.visible_rows(|_| false);
        assert_eq!(ids(&collapsed), vec![1, 5, 7]);
        assert!(collapsed[0].has_children);
        assert!(!collapsed[2].has_children);

        let expanded = model.visible_rows(|id| id == 1);
        assert_eq!(ids(&expanded), vec![1, 2, 4, 5, 7]);
        assert_eq!(expanded[1].depth, 1);

        let all = model.visible_rows(|_| true);
        assert_eq!(ids(&all), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(all[2].depth, 2);
    }

    #[test]
    fn test_search_flattens_and_sorts_naturally() {
        let model = TreeModel::new(vec![
            item(0, -1, "Root"),
            item(1, 0, "tex10"),
            item(2, 1, "TEX2"),
            item(3, 0, "other"),
            item(4, 0, "tex1"),
        ])
        .unwrap();

        let rows = model.search("tex");
        assert_eq!(ids(&rows), vec![4, 2, 1]);
        assert!(rows.iter().all(|row| row.depth == 0));
        assert!(rows[2].has_children);

        // Structure untouched
        assert_eq!(model.children(0), Some(vec![1, 3, 4]));
    }

    #[test]
    fn test_search_empty_query_matches_nothing() {
        let model = TreeModel::new(sample()).unwrap();
        assert!(model.search("").is_empty());
        assert_eq!(ids(&model.build_rows(Some(""), |_| false)), vec![1, 5, 7]);
        assert_eq!(ids(&model.build_rows(Some("z"), |_| false)), vec![6]);
    }

    struct NameLength;

    impl Column<Item> for NameLength {
        fn compare(&self, a: &Item, b: &Item) -> Ordering {
            a.name.len().cmp(&b.name.len())
        }
    }

    #[test]
    fn test_sorted_rows_is_a_projection() {
        let model = TreeModel::new(vec![
            item(0, -1, "Root"),
            item(1, 0, "ccc"),
            item(2, 1, "child"),
            item(3, 0, "a"),
            item(4, 0, "bb"),
        ])
        .unwrap();

        let rows = model.sorted_rows(&[SortSpec::ascending(NameLength)], |_| true);
        assert_eq!(ids(&rows), vec![3, 4, 1, 2]);

        let rows = model.sorted_rows(&[SortSpec::descending(NameLength)], |_| false);
        assert_eq!(ids(&rows), vec![1, 4, 3]);

        // Canonical order is unchanged
        assert_eq!(model.children(0), Some(vec![1, 3, 4]));
        let none: [SortSpec<NameLength>; 0] = [];
        assert_eq!(ids(&model.sorted_rows(&none, |_| false)), vec![1, 3, 4]);
    }
}
