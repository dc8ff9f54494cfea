use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

use crate::app::App;
use crate::async_task::Task;
use crate::event::EventResult;

pub fn handle_buckets_event(
    key: KeyEvent,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    match key.code {
        KeyCode::Up => {
            app.bucket_cursor = app.bucket_cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            if app.bucket_cursor + 1 < app.buckets.len() {
                app.bucket_cursor += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right => {
            if let Some(bucket) = app.buckets.get(app.bucket_cursor) {
                let name = bucket.name.clone();
                app.open_bucket(&name, task_sender);
            }
        }
        KeyCode::Char('r') => {
            if let Err(e) = task_sender.try_send(Task::LoadBuckets) {
                app.status_message = format!("Failed to queue bucket reload: {}", e);
            } else {
                app.is_loading = true;
            }
        }
        KeyCode::Esc => {
            // Nothing above the bucket list to go back to.
            app.should_quit = true;
            return Ok(false);
        }
        _ => return Ok(false),
    }

    Ok(true)
}
