use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, PendingModal, DROPDOWN_ACTIONS};
use crate::event::EventResult;

pub fn handle_file_panel_event(key: KeyEvent, app: &mut App) -> EventResult {
    match key.code {
        KeyCode::Enter => {
            app.open_dropdown();
        }
        KeyCode::Backspace | KeyCode::Left => {
            app.close_file_panel(false);
        }
        _ => return Ok(false),
    }

    Ok(true)
}

pub fn handle_dropdown_event(key: KeyEvent, app: &mut App) -> EventResult {
    match key.code {
        KeyCode::Up => {
            app.dropdown_index = app.dropdown_index.saturating_sub(1);
        }
        KeyCode::Down => {
            if app.dropdown_index + 1 < DROPDOWN_ACTIONS.len() {
                app.dropdown_index += 1;
            }
        }
        KeyCode::Enter => {
            let Some(object_key) = app.file_panel_key.clone() else {
                return Ok(false);
            };
            match DROPDOWN_ACTIONS[app.dropdown_index] {
                "Download" => {
                    app.status_message = format!("Download started: {}", object_key);
                    app.close_dropdown(false);
                }
                "Copy key" => {
                    app.status_message = format!("Key copied: {}", object_key);
                    app.close_dropdown(false);
                }
                "Delete" => {
                    app.open_modal(
                        format!("Delete {}? (y/n)", object_key),
                        PendingModal::DeleteObject(object_key),
                    );
                }
                _ => {}
            }
        }
        _ => return Ok(false),
    }

    Ok(true)
}
