//! Pure focus and selection helpers for the flattened row list.
//!
//! Everything here is side-effect free so it can be tested without a
//! terminal. Focus is always tracked by key, never by index; indices are
//! derived at read time so focus survives re-sorts and refetches as long as
//! the key still exists.

use crossterm::event::KeyCode;

use crate::listing::IndexedObjectItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Directory,
    Object,
}

/// One row of the flattened keyboard-traversal list: directories first, then
/// objects, in display order. Recomputed per render pass, never stored as
/// mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigableItem {
    pub key: String,
    pub kind: ItemKind,
}

impl NavigableItem {
    pub fn directory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ItemKind::Directory,
        }
    }

    pub fn object(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ItemKind::Object,
        }
    }
}

/// Flatten one display page into traversal order.
pub fn flatten_page(directories: &[String], objects: &[IndexedObjectItem]) -> Vec<NavigableItem> {
    let mut items = Vec::with_capacity(directories.len() + objects.len());
    items.extend(directories.iter().map(|d| NavigableItem::directory(d.clone())));
    items.extend(objects.iter().map(|o| NavigableItem::object(o.key.clone())));
    items
}

/// Exact, case-sensitive key lookup. `None` in, `None` out.
pub fn find_item_index(items: &[NavigableItem], key: Option<&str>) -> Option<usize> {
    let key = key?;
    items.iter().position(|item| item.key == key)
}

/// A remembered focus key is only worth restoring if it still names a row in
/// the current list (the item may have been deleted, filtered or re-fetched
/// away in the meantime).
pub fn validate_stored_key(items: &[NavigableItem], stored: Option<&str>) -> Option<String> {
    let stored = stored?;
    items
        .iter()
        .find(|item| item.key == stored)
        .map(|item| item.key.clone())
}

/// Replacement focus after deleting `deleted_key` from `items` (the list as
/// it was before the deletion). Prefers the previous sibling, then the next,
/// then nothing. Focus on any other item is left untouched.
pub fn find_nearest_neighbor(
    items: &[NavigableItem],
    deleted_key: &str,
    focused_key: Option<&str>,
) -> Option<String> {
    if focused_key != Some(deleted_key) {
        return focused_key.map(str::to_string);
    }
    let index = items.iter().position(|item| item.key == deleted_key)?;
    if index > 0 {
        return Some(items[index - 1].key.clone());
    }
    items.get(index + 1).map(|item| item.key.clone())
}

/// Which row to highlight: keyboard focus wins while keyboard mode is active
/// and a focus exists, otherwise the route-derived selection. This is what
/// keeps the focused row highlighted after Escape closes a detail view.
pub fn visual_selection_key<'a>(
    route_selected: Option<&'a str>,
    keyboard_focused: Option<&'a str>,
    keyboard_active: bool,
) -> Option<&'a str> {
    if keyboard_active {
        if let Some(focused) = keyboard_focused {
            return Some(focused);
        }
    }
    route_selected
}

pub fn should_show_selection(item_key: &str, visual_key: Option<&str>) -> bool {
    visual_key == Some(item_key)
}

/// Which text-editing surface, if any, currently owns keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSurface {
    #[default]
    None,
    /// The listing search bar. Navigation keys deliberately pass through so
    /// a user can filter and immediately arrow into the results.
    Search,
    /// Any other text entry (prompts, rename fields).
    Text,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputContext {
    pub surface: InputSurface,
    /// A multi-key input sequence is mid-flight; swallow everything.
    pub composing: bool,
}

impl InputContext {
    pub fn is_editing(&self) -> bool {
        self.surface != InputSurface::None
    }
}

/// Whether list navigation must leave this key alone. Typing surfaces
/// swallow navigation keys, except that the search bar lets
/// Up/Down/Enter/Space/Right through.
pub fn should_ignore_key(ctx: InputContext, key: KeyCode) -> bool {
    if ctx.composing {
        return true;
    }
    match ctx.surface {
        InputSurface::None => false,
        InputSurface::Search => !matches!(
            key,
            KeyCode::Up | KeyCode::Down | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Right
        ),
        InputSurface::Text => true,
    }
}
