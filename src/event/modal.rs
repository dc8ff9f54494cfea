use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, PendingModal};
use crate::event::EventResult;

pub fn handle_modal_event(key: KeyEvent, app: &mut App) -> EventResult {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            if let Some(modal) = app.modal.take() {
                match modal.pending {
                    PendingModal::DeleteObject(object_key) => {
                        app.remove_object(&object_key);
                        app.status_message = format!("Deleted {}", object_key);
                    }
                }
            }
            app.close_modal(false);
        }
        KeyCode::Char('n') => {
            app.status_message = "Cancelled".to_string();
            app.close_modal(false);
        }
        _ => return Ok(false),
    }

    Ok(true)
}
