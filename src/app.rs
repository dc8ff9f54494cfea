//! Application state: one browsing session over one store.
//!
//! Composes the listing cache, the navigation FSM, the keyboard engine, the
//! selection model and the escape stack. Overlay escape handlers cannot
//! borrow the app, so they send close signals over a channel that the event
//! loop drains right after dispatching Escape.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::async_task::Task;
use crate::config::Config;
use crate::escape;
use crate::escape::HandlerId;
use crate::focus::{flatten_page, InputContext, InputSurface, NavigableItem};
use crate::focus_store::FocusStore;
use crate::fsm::{default_transitions, NavEvent, NavRegion, NavigationFsm};
use crate::keyboard::KeyboardNavigationEngine;
use crate::listing::{
    calculate_pagination_info, paginate_directories, paginate_objects, sort_directories,
    sort_objects, DirectoryCache, IndexedObjectItem, ListingRequest, PaginationInfo,
};
use crate::remote::{BucketStats, CompressionFilter, SortKey, SortOrder};
use crate::selection::{SelectionModel, SelectionTarget};

/// Entries of the file-panel actions dropdown, in display order.
pub const DROPDOWN_ACTIONS: [&str; 3] = ["Download", "Copy key", "Delete"];

#[derive(Debug, Clone, PartialEq)]
pub enum PendingModal {
    DeleteObject(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    pub message: String,
    pub pending: PendingModal,
}

/// Close requests emitted by escape-stack handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayClose {
    FilePanel,
    Dropdown,
    Modal,
}

pub struct App {
    pub config: Config,
    pub should_quit: bool,

    pub fsm: NavigationFsm,
    pub keyboard: KeyboardNavigationEngine,
    pub selection: SelectionModel,
    pub focus_store: Box<dyn FocusStore>,

    // Buckets region
    pub buckets: Vec<BucketStats>,
    pub bucket_cursor: usize,

    // Objects region
    pub bucket: Option<String>,
    pub prefix: String,
    pub search_input: String,
    pub search_editing: bool,
    pub committed_search: Option<String>,
    pub compressed: CompressionFilter,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub page_index: usize,
    /// Full listing for the current context, once loaded.
    pub cache: Option<DirectoryCache>,
    /// Cheap first page shown while the full listing streams in.
    pub preview: Option<DirectoryCache>,
    /// Selection carried in from outside (deep link analog).
    pub route_selected_key: Option<String>,
    reset_counter: u64,
    next_request_id: u64,
    /// Only results tagged with this id may touch the listing state.
    pub current_request_id: u64,
    inflight_cancel: Option<CancellationToken>,
    pub loaded_count: usize,

    // Overlays
    pub file_panel_key: Option<String>,
    file_panel_escape: Option<HandlerId>,
    pub dropdown_index: usize,
    dropdown_escape: Option<HandlerId>,
    pub modal: Option<ModalState>,
    modal_escape: Option<HandlerId>,
    overlay_tx: UnboundedSender<OverlayClose>,
    overlay_rx: UnboundedReceiver<OverlayClose>,

    // UI state
    pub status_message: String,
    pub is_loading: bool,
    pub force_redraw: bool,
}

impl App {
    pub fn new(config: Config, focus_store: Box<dyn FocusStore>, start_bucket: Option<String>) -> Self {
        let initial = if start_bucket.is_some() {
            NavRegion::Objects
        } else {
            NavRegion::Buckets
        };
        let (overlay_tx, overlay_rx) = mpsc::unbounded_channel();
        Self {
            config,
            should_quit: false,
            fsm: NavigationFsm::new(default_transitions(), initial),
            keyboard: KeyboardNavigationEngine::new(start_bucket.clone().unwrap_or_default()),
            selection: SelectionModel::new(""),
            focus_store,
            buckets: Vec::new(),
            bucket_cursor: 0,
            bucket: start_bucket,
            prefix: String::new(),
            search_input: String::new(),
            search_editing: false,
            committed_search: None,
            compressed: CompressionFilter::Any,
            sort_key: SortKey::Name,
            sort_order: SortOrder::Asc,
            page_index: 0,
            cache: None,
            preview: None,
            route_selected_key: None,
            reset_counter: 0,
            next_request_id: 0,
            current_request_id: 0,
            inflight_cancel: None,
            loaded_count: 0,
            file_panel_key: None,
            file_panel_escape: None,
            dropdown_index: 0,
            dropdown_escape: None,
            modal: None,
            modal_escape: None,
            overlay_tx,
            overlay_rx,
            status_message: "Ready".to_string(),
            is_loading: false,
            force_redraw: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.config.layout.page_size
    }

    /// The dataset currently worth rendering: the full listing if loaded,
    /// else the preview.
    pub fn active_cache(&self) -> Option<&DirectoryCache> {
        self.cache.as_ref().or(self.preview.as_ref())
    }

    pub fn page_objects(&self) -> &[IndexedObjectItem] {
        match self.active_cache() {
            Some(cache) => paginate_objects(&cache.objects, self.page_index, self.page_size()),
            None => &[],
        }
    }

    pub fn page_directories(&self) -> &[String] {
        match self.active_cache() {
            Some(cache) => {
                let objects_on_page =
                    paginate_objects(&cache.objects, self.page_index, self.page_size()).len();
                paginate_directories(
                    &cache.directories,
                    self.page_index,
                    self.page_size(),
                    objects_on_page,
                )
            }
            None => &[],
        }
    }

    /// Flattened traversal list for the current page: directories first.
    pub fn flattened_items(&self) -> Vec<NavigableItem> {
        flatten_page(self.page_directories(), self.page_objects())
    }

    /// Selection targets for the current page, same order as the rows.
    pub fn page_targets(&self) -> Vec<SelectionTarget> {
        let mut targets: Vec<SelectionTarget> = self
            .page_directories()
            .iter()
            .map(|d| SelectionTarget::prefix(d.clone()))
            .collect();
        targets.extend(self.page_objects().iter().map(|o| SelectionTarget::object(o.key.clone())));
        targets
    }

    pub fn pagination(&self) -> PaginationInfo {
        let total = self
            .active_cache()
            .map(|c| c.total_objects + c.total_directories)
            .unwrap_or(0);
        calculate_pagination_info(total, self.page_index, self.page_size())
    }

    /// Which text surface currently owns keystrokes.
    pub fn input_context(&self) -> InputContext {
        InputContext {
            surface: if self.search_editing {
                InputSurface::Search
            } else {
                InputSurface::None
            },
            composing: false,
        }
    }

    /// The selection scope: navigating anywhere else invalidates it.
    pub fn reset_token(&self) -> String {
        format!(
            "{}|{}|{:?}|{:?}|{:?}|{}",
            self.bucket.as_deref().unwrap_or(""),
            self.prefix,
            self.sort_key,
            self.sort_order,
            self.compressed,
            self.reset_counter
        )
    }

    fn sync_selection(&mut self) {
        let token = self.reset_token();
        self.selection.sync_token(&token);
    }

    /// Invalidate the selection without changing the listing context, e.g.
    /// when the dataset is about to be replaced wholesale.
    pub fn force_selection_reset(&mut self) {
        self.reset_counter += 1;
        self.sync_selection();
    }

    // --- Listing lifecycle ---------------------------------------------

    pub fn listing_request(&self) -> ListingRequest {
        ListingRequest {
            bucket: self.bucket.clone().unwrap_or_default(),
            prefix: self.prefix.clone(),
            search: self.committed_search.clone(),
            compressed: self.compressed,
        }
    }

    /// Kick off a fresh listing for the current context. Any in-flight fetch
    /// is cancelled and its late results will be dropped by id.
    pub fn start_listing(&mut self, task_sender: &mpsc::Sender<Task>, bypass_cache: bool) {
        if self.bucket.is_none() {
            return;
        }
        if let Some(token) = self.inflight_cancel.take() {
            token.cancel();
        }
        self.next_request_id += 1;
        self.current_request_id = self.next_request_id;
        let cancel = CancellationToken::new();
        self.inflight_cancel = Some(cancel.clone());
        self.cache = None;
        self.preview = None;
        self.loaded_count = 0;
        self.page_index = 0;
        self.is_loading = true;
        self.sync_selection();

        let task = Task::LoadListing {
            request: self.listing_request(),
            request_id: self.current_request_id,
            preview: true,
            bypass_cache,
            cancel,
        };
        if let Err(e) = task_sender.try_send(task) {
            self.is_loading = false;
            self.status_message = format!("Failed to queue listing: {}", e);
        }
    }

    /// Re-apply the current sort to a freshly loaded or re-sorted dataset.
    pub fn apply_sort(&mut self) {
        let (key, order) = (self.sort_key, self.sort_order);
        if let Some(cache) = self.cache.as_mut() {
            sort_objects(&mut cache.objects, key, order);
            cache.directories = sort_directories(&cache.directories, order);
        }
        if let Some(preview) = self.preview.as_mut() {
            sort_objects(&mut preview.objects, key, order);
            preview.directories = sort_directories(&preview.directories, order);
        }
    }

    /// Choose a sort column; choosing the active column flips direction.
    pub fn set_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_order = match self.sort_order {
                SortOrder::Asc => SortOrder::Desc,
                SortOrder::Desc => SortOrder::Asc,
            };
        } else {
            self.sort_key = key;
            self.sort_order = SortOrder::Asc;
        }
        self.page_index = 0;
        self.apply_sort();
        self.sync_selection();
    }

    // --- Navigation -----------------------------------------------------

    pub fn open_bucket(&mut self, name: &str, task_sender: &mpsc::Sender<Task>) {
        if self.fsm.current() == NavRegion::Buckets
            && !self.fsm.transition(NavEvent::NavigateToObjects)
        {
            return;
        }
        self.bucket = Some(name.to_string());
        self.prefix.clear();
        // Each bucket visit starts a fresh engine; remembered focus comes
        // back through the store once the listing lands.
        self.keyboard = KeyboardNavigationEngine::new(name);
        self.committed_search = None;
        self.search_input.clear();
        self.search_editing = false;
        self.route_selected_key = None;
        self.start_listing(task_sender, false);
    }

    pub fn enter_directory(&mut self, key: &str, task_sender: &mpsc::Sender<Task>) {
        self.prefix = key.to_string();
        self.committed_search = None;
        self.search_input.clear();
        self.search_editing = false;
        self.route_selected_key = None;
        self.start_listing(task_sender, false);
    }

    pub fn navigate_up(&mut self, task_sender: &mpsc::Sender<Task>) {
        if self.prefix.is_empty() {
            self.navigate_to_buckets();
            return;
        }
        self.prefix = parent_prefix(&self.prefix);
        self.committed_search = None;
        self.search_input.clear();
        self.route_selected_key = None;
        self.start_listing(task_sender, false);
    }

    pub fn navigate_to_buckets(&mut self) {
        if !self.fsm.transition(NavEvent::NavigateToBuckets) {
            return;
        }
        if let Some(token) = self.inflight_cancel.take() {
            token.cancel();
        }
        self.bucket = None;
        self.prefix.clear();
        self.cache = None;
        self.preview = None;
        self.committed_search = None;
        self.search_input.clear();
        self.search_editing = false;
        self.route_selected_key = None;
        self.is_loading = false;
    }

    // --- Overlays -------------------------------------------------------

    pub fn open_file_panel(&mut self, key: &str) {
        if !self.fsm.transition(NavEvent::OpenFilePanel) {
            return;
        }
        self.file_panel_key = Some(key.to_string());
        self.route_selected_key = Some(key.to_string());
        let tx = self.overlay_tx.clone();
        self.file_panel_escape = Some(escape::register(move || {
            let _ = tx.send(OverlayClose::FilePanel);
            true
        }));
    }

    pub fn close_file_panel(&mut self, via_escape: bool) {
        let event = if via_escape {
            NavEvent::EscapePressed
        } else {
            NavEvent::CloseFilePanel
        };
        if !self.fsm.transition(event) {
            return;
        }
        if let Some(id) = self.file_panel_escape.take() {
            escape::unregister(id);
        }
        self.file_panel_key = None;
    }

    pub fn open_dropdown(&mut self) {
        if !self.fsm.transition(NavEvent::OpenDropdown) {
            return;
        }
        self.dropdown_index = 0;
        let tx = self.overlay_tx.clone();
        self.dropdown_escape = Some(escape::register(move || {
            let _ = tx.send(OverlayClose::Dropdown);
            true
        }));
    }

    pub fn close_dropdown(&mut self, via_escape: bool) {
        let event = if via_escape {
            NavEvent::EscapePressed
        } else {
            NavEvent::CloseDropdown
        };
        if !self.fsm.transition(event) {
            return;
        }
        if let Some(id) = self.dropdown_escape.take() {
            escape::unregister(id);
        }
    }

    pub fn open_modal(&mut self, message: String, pending: PendingModal) {
        if !self.fsm.transition(NavEvent::OpenModal) {
            return;
        }
        self.modal = Some(ModalState { message, pending });
        let tx = self.overlay_tx.clone();
        self.modal_escape = Some(escape::register(move || {
            let _ = tx.send(OverlayClose::Modal);
            true
        }));
    }

    /// Closing a modal always lands on the objects region, so any overlays
    /// it was stacked on are torn down with it.
    pub fn close_modal(&mut self, via_escape: bool) {
        let event = if via_escape {
            NavEvent::EscapePressed
        } else {
            NavEvent::CloseModal
        };
        if !self.fsm.transition(event) {
            return;
        }
        if let Some(id) = self.modal_escape.take() {
            escape::unregister(id);
        }
        self.modal = None;
        if let Some(id) = self.dropdown_escape.take() {
            escape::unregister(id);
        }
        if let Some(id) = self.file_panel_escape.take() {
            escape::unregister(id);
        }
        self.file_panel_key = None;
    }

    /// Apply close requests queued by escape handlers.
    pub fn drain_overlay_signals(&mut self) {
        while let Ok(signal) = self.overlay_rx.try_recv() {
            match signal {
                OverlayClose::FilePanel => self.close_file_panel(true),
                OverlayClose::Dropdown => self.close_dropdown(true),
                OverlayClose::Modal => self.close_modal(true),
            }
        }
    }

    // --- Mutations ------------------------------------------------------

    /// Drop one object from the loaded dataset (after a confirmed delete)
    /// and move keyboard focus to its nearest surviving neighbor.
    pub fn remove_object(&mut self, key: &str) {
        let items_before = self.flattened_items();
        for cache in [self.cache.as_mut(), self.preview.as_mut()].into_iter().flatten() {
            if let Some(index) = cache.objects.iter().position(|o| o.key == key) {
                cache.objects.remove(index);
                cache.total_objects = cache.objects.len();
            }
        }
        if self.selection.is_selected(&SelectionTarget::object(key)) {
            self.selection.toggle(SelectionTarget::object(key));
        }
        if self.route_selected_key.as_deref() == Some(key) {
            self.route_selected_key = None;
        }
        self.keyboard
            .on_item_removed(&items_before, key, self.focus_store.as_ref());
    }
}

/// One path segment up: "a/b/" -> "a/", "a/" -> "".
pub fn parent_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => prefix[..=pos].to_string(),
        None => String::new(),
    }
}
