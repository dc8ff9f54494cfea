//! Keyboard navigation over the flattened directory+object list.
//!
//! The engine owns the focused key and the keyboard-mode flag, nothing else.
//! It never stores an index: the position is re-derived from the key on
//! every keystroke, so focus survives re-sorts and refetches for as long as
//! the key exists. It only acts while the FSM says the objects region is
//! active, and it never reacts to keys owned by a text-entry surface.

use crossterm::event::{KeyCode, KeyEvent};

use crate::focus::{
    find_item_index, find_nearest_neighbor, should_ignore_key, validate_stored_key, InputContext,
    ItemKind, NavigableItem,
};
use crate::focus_store::FocusStore;
use crate::fsm::{NavRegion, NavigationFsm};

/// Callbacks invoked synchronously from key activation. Their own async
/// behavior (route changes, refetches) is opaque to the engine.
pub trait NavigationActions {
    fn enter_directory(&mut self, key: &str);
    fn open_object(&mut self, key: &str);
    fn navigate_up(&mut self);
    /// Return false when there is no buckets list to go to; the key press
    /// then falls through unhandled.
    fn navigate_to_buckets(&mut self) -> bool {
        false
    }
}

pub struct KeyboardNavigationEngine {
    bucket: String,
    prefix: String,
    focused_key: Option<String>,
    keyboard_mode: bool,
}

impl KeyboardNavigationEngine {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
            focused_key: None,
            keyboard_mode: false,
        }
    }

    pub fn focused_key(&self) -> Option<&str> {
        self.focused_key.as_deref()
    }

    pub fn is_keyboard_mode(&self) -> bool {
        self.keyboard_mode
    }

    /// Point the engine at a (possibly new) listing. Keyboard mode drops and
    /// the per-bucket remembered focus is restored, but only if that key
    /// still names a row in the new list.
    pub fn set_context(
        &mut self,
        bucket: &str,
        prefix: &str,
        items: &[NavigableItem],
        store: &dyn FocusStore,
    ) {
        let prefix_changed = self.bucket != bucket || self.prefix != prefix;
        self.bucket = bucket.to_string();
        self.prefix = prefix.to_string();
        if prefix_changed {
            self.keyboard_mode = false;
        }
        let stored = store.get(bucket);
        self.focused_key = validate_stored_key(items, stored.as_deref());
        if let Some(key) = &self.focused_key {
            log::debug!("restored focus {:?} in {}/{}", key, bucket, prefix);
        }
    }

    /// Any mouse interaction inside the container leaves keyboard mode.
    pub fn on_mouse_click(&mut self) {
        self.keyboard_mode = false;
    }

    pub fn set_focus(&mut self, key: Option<String>, store: &dyn FocusStore) {
        if self.focused_key == key {
            return;
        }
        self.focused_key = key;
        match &self.focused_key {
            Some(key) => store.set(&self.bucket, key),
            None => store.remove(&self.bucket),
        }
    }

    /// The focused item was deleted; move focus to the nearest surviving
    /// sibling. `items` is the flattened list from before the deletion.
    pub fn on_item_removed(
        &mut self,
        items: &[NavigableItem],
        deleted_key: &str,
        store: &dyn FocusStore,
    ) {
        let next = find_nearest_neighbor(items, deleted_key, self.focused_key.as_deref());
        self.set_focus(next, store);
    }

    /// Handle one key event against the current flattened list. Returns
    /// whether the key was consumed.
    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        items: &[NavigableItem],
        ctx: InputContext,
        fsm: &NavigationFsm,
        actions: &mut dyn NavigationActions,
        store: &dyn FocusStore,
    ) -> bool {
        if fsm.current() != NavRegion::Objects {
            return false;
        }
        if should_ignore_key(ctx, key.code) {
            return false;
        }

        match key.code {
            KeyCode::Down => {
                self.keyboard_mode = true;
                self.move_focus(items, 1, store);
                true
            }
            KeyCode::Up => {
                self.keyboard_mode = true;
                self.move_focus(items, -1, store);
                true
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Right => {
                self.keyboard_mode = true;
                self.activate(items, actions)
            }
            KeyCode::Esc | KeyCode::Left => {
                if !self.prefix.is_empty() {
                    actions.navigate_up();
                    true
                } else {
                    actions.navigate_to_buckets()
                }
            }
            _ => false,
        }
    }

    /// Step focus to the adjacent row. No wrap-around: at either boundary
    /// the press is a no-op.
    fn move_focus(&mut self, items: &[NavigableItem], delta: i64, store: &dyn FocusStore) {
        if items.is_empty() {
            return;
        }
        let next = match find_item_index(items, self.focused_key.as_deref()) {
            Some(index) => {
                let target = index as i64 + delta;
                if target < 0 || target >= items.len() as i64 {
                    return;
                }
                items[target as usize].key.clone()
            }
            None => items[0].key.clone(),
        };
        self.set_focus(Some(next), store);
    }

    fn activate(&mut self, items: &[NavigableItem], actions: &mut dyn NavigationActions) -> bool {
        let Some(index) = find_item_index(items, self.focused_key.as_deref()) else {
            return false;
        };
        let item = &items[index];
        match item.kind {
            ItemKind::Directory => actions.enter_directory(&item.key),
            ItemKind::Object => actions.open_object(&item.key),
        }
        true
    }
}
