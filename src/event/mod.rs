use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use tokio::sync::mpsc;

use crate::app::App;
use crate::async_task::Task;
use crate::escape;
use crate::fsm::NavRegion;

pub mod buckets;
pub mod file_panel;
pub mod modal;
pub mod objects;

pub use buckets::*;
pub use file_panel::*;
pub use modal::*;
pub use objects::*;

pub type EventResult = crate::error::Result<bool>; // true if UI needs update

pub fn handle_event(
    event: Event,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    match event {
        Event::Key(key) => {
            if key.kind != KeyEventKind::Press {
                return Ok(false);
            }

            // Escape always goes through the overlay stack first; only the
            // topmost open overlay reacts, and an unconsumed press falls
            // through to the active region below.
            if key.code == KeyCode::Esc && escape::dispatch() {
                app.drain_overlay_signals();
                return Ok(true);
            }

            // Global keybindings
            let quit_key = app.config.keybindings.quit;
            if !app.input_context().is_editing() {
                match key.code {
                    KeyCode::Char(c) if c == quit_key => {
                        app.should_quit = true;
                        return Ok(false);
                    }
                    KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.force_redraw = true;
                        app.status_message = "Screen refreshed".to_string();
                        return Ok(true);
                    }
                    _ => {}
                }
            }

            // Region-specific keybindings
            match app.fsm.current() {
                NavRegion::Buckets => handle_buckets_event(key, app, task_sender),
                NavRegion::Objects => handle_objects_event(key, app, task_sender),
                NavRegion::FilePanel => handle_file_panel_event(key, app),
                NavRegion::Dropdown => handle_dropdown_event(key, app),
                NavRegion::Modal => handle_modal_event(key, app),
            }
        }
        Event::Mouse(mouse) => {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                // Any click drops keyboard mode; row highlighting falls back
                // to the route-derived selection.
                app.keyboard.on_mouse_click();
                return Ok(true);
            }
            Ok(false)
        }
        Event::Resize(_, _) => Ok(true),
        _ => Ok(false),
    }
}
