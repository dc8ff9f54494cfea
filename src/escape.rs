//! Process-wide LIFO registry of Escape handlers.
//!
//! Every overlay (file panel, dropdown, modal) registers a close handler on
//! open and unregisters it on close, so Escape always closes the innermost
//! open context first. There is exactly one dispatch point: the event loop
//! calls `dispatch()` for every Escape press, and only the topmost handler
//! runs, no fallthrough. The conceptual global key listener is attached
//! while at least one handler is registered and detached when the stack
//! drains.

use std::sync::Mutex;

use lazy_static::lazy_static;

pub type EscapeHandler = Box<dyn FnMut() -> bool + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

struct EscapeStackInner {
    handlers: Vec<(HandlerId, EscapeHandler)>,
    next_id: u64,
    listener_attached: bool,
    /// Handler temporarily taken out of the stack while it runs; cleared
    /// if that handler unregisters itself.
    dispatching: Option<HandlerId>,
}

impl EscapeStackInner {
    fn depth(&self) -> usize {
        self.handlers.len() + usize::from(self.dispatching.is_some())
    }

    fn sync_listener(&mut self) {
        self.listener_attached = self.depth() > 0;
    }
}

lazy_static! {
    static ref ESCAPE_STACK: Mutex<EscapeStackInner> = Mutex::new(EscapeStackInner {
        handlers: Vec::new(),
        next_id: 1,
        listener_attached: false,
        dispatching: None,
    });
}

fn lock() -> std::sync::MutexGuard<'static, EscapeStackInner> {
    ESCAPE_STACK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Push a handler onto the stack. The first registration attaches the
/// listener. Returns the id to unregister with; registration and
/// unregistration are expected to be paired with the overlay's lifetime.
pub fn register(handler: impl FnMut() -> bool + Send + 'static) -> HandlerId {
    let mut stack = lock();
    let id = HandlerId(stack.next_id);
    stack.next_id += 1;
    stack.handlers.push((id, Box::new(handler)));
    stack.sync_listener();
    log::debug!("escape stack: registered {:?}, depth {}", id, stack.depth());
    id
}

/// Remove a handler by identity. Unknown or already-removed ids are a safe
/// no-op; the listener detaches when the stack empties.
pub fn unregister(id: HandlerId) {
    let mut stack = lock();
    if stack.dispatching == Some(id) {
        stack.dispatching = None;
        stack.sync_listener();
        return;
    }
    if let Some(index) = stack.handlers.iter().position(|(h, _)| *h == id) {
        stack.handlers.remove(index);
    }
    stack.sync_listener();
}

/// Invoke the topmost handler, if any. Lower handlers never run, whatever
/// the topmost returns; the return value only reports whether the key was
/// consumed.
pub fn dispatch() -> bool {
    let (id, mut handler) = {
        let mut stack = lock();
        match stack.handlers.pop() {
            Some((id, handler)) => {
                stack.dispatching = Some(id);
                (id, handler)
            }
            None => return false,
        }
    };

    // The handler runs without the lock held so it may call back into
    // register/unregister.
    let consumed = handler();

    let mut stack = lock();
    if stack.dispatching == Some(id) {
        stack.dispatching = None;
        stack.handlers.push((id, handler));
    }
    stack.sync_listener();
    consumed
}

/// Forcibly empty the stack and detach the listener. Teardown/test hook.
pub fn clear() {
    let mut stack = lock();
    stack.handlers.clear();
    stack.dispatching = None;
    stack.sync_listener();
}

pub fn depth() -> usize {
    lock().depth()
}

pub fn is_listener_attached() -> bool {
    lock().listener_attached
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_handler(counter: &Arc<AtomicUsize>, consumed: bool) -> impl FnMut() -> bool + Send {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            consumed
        }
    }

    #[test]
    #[serial]
    fn only_the_topmost_handler_runs() {
        clear();
        let h1 = Arc::new(AtomicUsize::new(0));
        let h2 = Arc::new(AtomicUsize::new(0));
        let h3 = Arc::new(AtomicUsize::new(0));
        let id1 = register(counter_handler(&h1, true));
        let id2 = register(counter_handler(&h2, true));
        let id3 = register(counter_handler(&h3, true));

        assert!(dispatch());
        assert_eq!((h1.load(Ordering::SeqCst), h2.load(Ordering::SeqCst), h3.load(Ordering::SeqCst)), (0, 0, 1));

        unregister(id3);
        assert!(dispatch());
        assert_eq!((h1.load(Ordering::SeqCst), h2.load(Ordering::SeqCst), h3.load(Ordering::SeqCst)), (0, 1, 1));

        unregister(id2);
        unregister(id1);
        assert!(!dispatch());
    }

    #[test]
    #[serial]
    fn no_fallthrough_even_when_not_consumed() {
        clear();
        let lower = Arc::new(AtomicUsize::new(0));
        let top = Arc::new(AtomicUsize::new(0));
        register(counter_handler(&lower, true));
        register(counter_handler(&top, false));

        assert!(!dispatch());
        assert_eq!(lower.load(Ordering::SeqCst), 0);
        assert_eq!(top.load(Ordering::SeqCst), 1);
        clear();
    }

    #[test]
    #[serial]
    fn listener_attached_iff_stack_non_empty() {
        clear();
        assert!(!is_listener_attached());

        let id1 = register(|| true);
        assert!(is_listener_attached());
        let id2 = register(|| true);

        unregister(id1);
        assert!(is_listener_attached());
        unregister(id2);
        assert!(!is_listener_attached());

        // Duplicate unregister stays a no-op.
        unregister(id2);
        unregister(id1);
        assert!(!is_listener_attached());
        assert_eq!(depth(), 0);
    }

    #[test]
    #[serial]
    fn handler_may_unregister_itself_while_running() {
        clear();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_inner = Arc::clone(&fired);
        // The id is only known after registration, so thread it through a cell.
        let slot = Arc::new(Mutex::new(None::<HandlerId>));
        let slot_inner = Arc::clone(&slot);
        let id = register(move || {
            fired_inner.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot_inner.lock().unwrap() {
                unregister(id);
            }
            true
        });
        *slot.lock().unwrap() = Some(id);

        assert!(dispatch());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(depth(), 0);
        assert!(!is_listener_attached());

        // The handler is gone; a second escape finds nothing.
        assert!(!dispatch());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[serial]
    fn clear_resets_everything() {
        clear();
        register(|| true);
        register(|| true);
        assert_eq!(depth(), 2);
        clear();
        assert_eq!(depth(), 0);
        assert!(!is_listener_attached());
        assert!(!dispatch());
    }
}
