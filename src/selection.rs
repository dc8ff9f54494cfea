//! Multi-select state for the object table.
//!
//! Selection is keyed by target (object vs directory prefix) and scoped to a
//! reset token derived from the listing context. Once the user navigates to
//! a different listing, the old selection is meaningless and is dropped
//! wholesale.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Object,
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionTarget {
    pub kind: TargetKind,
    pub key: String,
}

impl SelectionTarget {
    pub fn object(key: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Object,
            key: key.into(),
        }
    }

    pub fn prefix(key: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Prefix,
            key: key.into(),
        }
    }

    /// Stable composite key, e.g. for logging.
    pub fn storage_key(&self) -> String {
        let kind = match self.kind {
            TargetKind::Object => "object",
            TargetKind::Prefix => "prefix",
        };
        format!("{}:{}", kind, self.key)
    }
}

pub struct SelectionModel {
    token: String,
    selected: HashSet<SelectionTarget>,
}

impl SelectionModel {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            selected: HashSet::new(),
        }
    }

    /// Clear everything when the listing context the selection was made in
    /// has changed.
    pub fn sync_token(&mut self, token: &str) {
        if self.token != token {
            log::debug!("selection reset: token {:?} -> {:?}", self.token, token);
            self.token = token.to_string();
            self.selected.clear();
        }
    }

    pub fn is_selected(&self, target: &SelectionTarget) -> bool {
        self.selected.contains(target)
    }

    pub fn toggle(&mut self, target: SelectionTarget) {
        if self.selected.remove(&target) {
            log::debug!("deselected {}", target.storage_key());
        } else {
            log::debug!("selected {}", target.storage_key());
            self.selected.insert(target);
        }
    }

    /// Select or deselect exactly the targets on the current page. Items on
    /// other pages are never touched.
    pub fn toggle_select_all(&mut self, page: &[SelectionTarget]) {
        let all_selected = !page.is_empty() && page.iter().all(|t| self.selected.contains(t));
        if all_selected {
            for target in page {
                self.selected.remove(target);
            }
        } else {
            for target in page {
                self.selected.insert(target.clone());
            }
        }
    }

    pub fn page_selectable_count(&self, page: &[SelectionTarget]) -> usize {
        page.len()
    }

    pub fn page_selected_count(&self, page: &[SelectionTarget]) -> usize {
        page.iter().filter(|t| self.selected.contains(*t)).count()
    }

    pub fn total_selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(keys: &[&str]) -> Vec<SelectionTarget> {
        keys.iter().map(|k| SelectionTarget::object(*k)).collect()
    }

    #[test]
    fn toggle_flips_membership() {
        let mut model = SelectionModel::new("t");
        let target = SelectionTarget::object("a.txt");
        model.toggle(target.clone());
        assert!(model.is_selected(&target));
        model.toggle(target.clone());
        assert!(!model.is_selected(&target));
    }

    #[test]
    fn objects_and_prefixes_with_same_key_are_distinct() {
        let mut model = SelectionModel::new("t");
        model.toggle(SelectionTarget::object("logs/"));
        assert!(!model.is_selected(&SelectionTarget::prefix("logs/")));
        assert_eq!(model.total_selected_count(), 1);
    }

    #[test]
    fn select_all_is_scoped_to_the_page() {
        let mut model = SelectionModel::new("t");
        model.toggle(SelectionTarget::object("other-page.txt"));

        let current = page(&["a", "b"]);
        model.toggle_select_all(&current);
        assert_eq!(model.page_selected_count(&current), 2);
        assert_eq!(model.total_selected_count(), 3);

        model.toggle_select_all(&current);
        assert_eq!(model.page_selected_count(&current), 0);
        assert!(model.is_selected(&SelectionTarget::object("other-page.txt")));
    }

    #[test]
    fn select_all_completes_a_partial_page_first() {
        let mut model = SelectionModel::new("t");
        let current = page(&["a", "b", "c"]);
        model.toggle(current[0].clone());

        model.toggle_select_all(&current);
        assert_eq!(model.page_selected_count(&current), 3);
    }

    #[test]
    fn counts_respect_the_invariant() {
        let mut model = SelectionModel::new("t");
        let current = page(&["a", "b", "c"]);
        model.toggle(current[1].clone());

        let selected = model.page_selected_count(&current);
        let selectable = model.page_selectable_count(&current);
        assert!(selected <= selectable);
        assert!(selectable <= current.len());
        assert_eq!(selected, 1);
    }

    #[test]
    fn token_change_clears_everything() {
        let mut model = SelectionModel::new("bucket|a/|name|asc|any|0");
        model.toggle(SelectionTarget::object("a"));
        model.sync_token("bucket|a/|name|asc|any|0");
        assert_eq!(model.total_selected_count(), 1);

        model.sync_token("bucket|b/|name|asc|any|0");
        assert_eq!(model.total_selected_count(), 0);
    }

    #[test]
    fn empty_page_select_all_is_a_no_op() {
        let mut model = SelectionModel::new("t");
        model.toggle_select_all(&[]);
        assert_eq!(model.total_selected_count(), 0);
    }
}
