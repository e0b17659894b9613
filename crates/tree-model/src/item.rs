//! The capability interface every tree payload provides.

/// Identifier of an item within one tree. Dense, `0` is the synthetic root.
pub type ItemId = i32;

/// Id reserved for the synthetic root.
pub const ROOT_ID: ItemId = 0;

/// Depth of the synthetic root. Every other item has depth >= 0.
pub const ROOT_DEPTH: i32 = -1;

/// An item that can be stored in a [`TreeModel`](crate::TreeModel).
///
/// The model owns structure (parent and children handles); the item only
/// carries its identity, its depth tag and whatever payload it needs.
pub trait TreeItem {
    fn id(&self) -> ItemId;

    fn set_id(&mut self, id: ItemId);

    fn depth(&self) -> i32;

    fn set_depth(&mut self, depth: i32);

    /// Display name. For catalog leaves this is also the synchronization key.
    fn name(&self) -> &str;

    /// Whether this item matches a search query.
    ///
    /// Defaults to a case-insensitive substring match on [`name`](Self::name).
    fn matches_search(&self, query: &str) -> bool {
        contains_ignore_case(self.name(), query)
    }
}

/// Case-insensitive substring test.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Textures/Grass.PNG", "grass"));
        assert!(contains_ignore_case("Textures/Grass.PNG", ".png"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("Textures/Grass.PNG", "stone"));
    }
}
