use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

use crate::app::App;
use crate::async_task::Task;
use crate::event::EventResult;
use crate::focus::find_item_index;
use crate::keyboard::NavigationActions;
use crate::remote::SortKey;
use crate::selection::{SelectionTarget, TargetKind};

/// Navigation callbacks recorded during one keystroke and applied after the
/// engine returns, so the engine's borrow of the app never overlaps the
/// mutations it requests.
#[derive(Default)]
struct PendingNav {
    enter: Option<String>,
    open: Option<String>,
    up: bool,
    to_buckets: bool,
}

impl NavigationActions for PendingNav {
    fn enter_directory(&mut self, key: &str) {
        self.enter = Some(key.to_string());
    }

    fn open_object(&mut self, key: &str) {
        self.open = Some(key.to_string());
    }

    fn navigate_up(&mut self) {
        self.up = true;
    }

    fn navigate_to_buckets(&mut self) -> bool {
        self.to_buckets = true;
        true
    }
}

pub fn handle_objects_event(
    key: KeyEvent,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    // Query editing first. Navigation keys deliberately fall through to the
    // engine so the user can filter and arrow into the results in one
    // motion.
    if app.search_editing {
        match key.code {
            KeyCode::Esc => {
                app.search_editing = false;
                app.search_input.clear();
                if app.committed_search.take().is_some() {
                    app.start_listing(task_sender, false);
                }
                return Ok(true);
            }
            KeyCode::Backspace => {
                app.search_input.pop();
                commit_search(app, task_sender);
                return Ok(true);
            }
            KeyCode::Char(c) if c != ' ' => {
                app.search_input.push(c);
                commit_search(app, task_sender);
                return Ok(true);
            }
            _ => {}
        }
    }

    // Keyboard navigation over the flattened page.
    let items = app.flattened_items();
    let ctx = app.input_context();
    let mut pending = PendingNav::default();
    let handled = app.keyboard.handle_key(
        key,
        &items,
        ctx,
        &app.fsm,
        &mut pending,
        app.focus_store.as_ref(),
    );
    if handled {
        if let Some(prefix) = pending.enter {
            app.enter_directory(&prefix, task_sender);
        } else if let Some(object_key) = pending.open {
            app.open_file_panel(&object_key);
        } else if pending.up {
            app.navigate_up(task_sender);
        } else if pending.to_buckets {
            app.navigate_to_buckets();
        }
        return Ok(true);
    }
    if app.search_editing {
        // Everything else belongs to the search bar while it is open.
        return Ok(false);
    }

    let keys = app.config.keybindings.clone();
    match key.code {
        KeyCode::Char(c) if c == keys.search => {
            app.search_editing = true;
            return Ok(true);
        }
        KeyCode::Char(c) if c == keys.refresh => {
            app.force_selection_reset();
            app.start_listing(task_sender, true);
            app.status_message = "Refreshing listing".to_string();
            return Ok(true);
        }
        KeyCode::Char(c) if c == keys.cycle_compression => {
            app.compressed = app.compressed.cycle();
            app.start_listing(task_sender, false);
            return Ok(true);
        }
        KeyCode::Char(c) if c == keys.sort_name => {
            app.set_sort(SortKey::Name);
            return Ok(true);
        }
        KeyCode::Char(c) if c == keys.sort_size => {
            app.set_sort(SortKey::Size);
            return Ok(true);
        }
        KeyCode::Char(c) if c == keys.sort_modified => {
            app.set_sort(SortKey::Modified);
            return Ok(true);
        }
        KeyCode::Char(c) if c == keys.toggle_selection => {
            if let Some(target) = focused_target(app, &items) {
                app.selection.toggle(target);
                return Ok(true);
            }
        }
        KeyCode::Char(c) if c == keys.select_all => {
            let page = app.page_targets();
            app.selection.toggle_select_all(&page);
            return Ok(true);
        }
        KeyCode::Char(c) if c == keys.previous_page => {
            if app.pagination().has_previous {
                app.page_index -= 1;
                return Ok(true);
            }
        }
        KeyCode::Char(c) if c == keys.next_page => {
            if app.pagination().has_next {
                app.page_index += 1;
                return Ok(true);
            }
        }
        _ => {}
    }

    Ok(false)
}

fn commit_search(app: &mut App, task_sender: &mpsc::Sender<Task>) {
    let query = app.search_input.trim();
    app.committed_search = if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    };
    app.start_listing(task_sender, false);
}

fn focused_target(app: &App, items: &[crate::focus::NavigableItem]) -> Option<SelectionTarget> {
    let index = find_item_index(items, app.keyboard.focused_key())?;
    let item = &items[index];
    let kind = match item.kind {
        crate::focus::ItemKind::Directory => TargetKind::Prefix,
        crate::focus::ItemKind::Object => TargetKind::Object,
    };
    Some(SelectionTarget {
        kind,
        key: item.key.clone(),
    })
}
