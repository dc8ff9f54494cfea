//! Finite state machine over the UI regions that can own keyboard focus.
//!
//! Exactly one region is active at a time; every open/close of an overlay is
//! an event against a static transition table. Centralizing this in one
//! machine keeps two independently-built overlays from both reacting to the
//! same key. The table is data, so completeness/reachability/uniqueness are
//! checked mechanically instead of by code review.

use serde::{Deserialize, Serialize};

/// UI regions that can own keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavRegion {
    Buckets,
    Objects,
    FilePanel,
    Dropdown,
    Modal,
}

pub const ALL_REGIONS: [NavRegion; 5] = [
    NavRegion::Buckets,
    NavRegion::Objects,
    NavRegion::FilePanel,
    NavRegion::Dropdown,
    NavRegion::Modal,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavEvent {
    NavigateToBuckets,
    NavigateToObjects,
    OpenFilePanel,
    CloseFilePanel,
    OpenDropdown,
    CloseDropdown,
    OpenModal,
    CloseModal,
    EscapePressed,
}

pub type Guard = Box<dyn Fn() -> bool + Send>;
pub type Action = Box<dyn FnMut() + Send>;

/// One row of the transition table. The first row matching
/// `{from: current, event}` whose guard passes wins.
pub struct Transition {
    pub from: NavRegion,
    pub event: NavEvent,
    pub to: NavRegion,
    guard: Option<Guard>,
    action: Option<Action>,
}

impl Transition {
    pub fn new(from: NavRegion, event: NavEvent, to: NavRegion) -> Self {
        Self {
            from,
            event,
            to,
            guard: None,
            action: None,
        }
    }

    /// A pure predicate evaluated at transition time; returning false vetoes
    /// the transition without touching state.
    pub fn with_guard(mut self, guard: impl Fn() -> bool + Send + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Runs exactly once, atomically with the state change.
    pub fn with_action(mut self, action: impl FnMut() + Send + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    fn guard_passes(&self) -> bool {
        self.guard.as_ref().map_or(true, |g| g())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRecord {
    pub from: NavRegion,
    pub to: NavRegion,
    pub event: NavEvent,
}

/// The default region wiring: buckets <-> objects, file panel over objects,
/// dropdown over the file panel, modal reachable from every non-modal
/// region. Escape unwinds one level at a time; a closed modal always lands
/// back on the objects region.
pub fn default_transitions() -> Vec<Transition> {
    use NavEvent::*;
    use NavRegion::*;

    let mut table = vec![
        Transition::new(Buckets, NavigateToObjects, Objects),
        Transition::new(Objects, NavigateToBuckets, Buckets),
        Transition::new(Objects, OpenFilePanel, FilePanel),
        Transition::new(FilePanel, CloseFilePanel, Objects),
        Transition::new(FilePanel, EscapePressed, Objects),
        Transition::new(FilePanel, OpenDropdown, Dropdown),
        Transition::new(Dropdown, CloseDropdown, FilePanel),
        Transition::new(Dropdown, EscapePressed, FilePanel),
    ];
    for from in [Buckets, Objects, FilePanel, Dropdown] {
        table.push(Transition::new(from, OpenModal, Modal));
    }
    table.push(Transition::new(Modal, CloseModal, Objects));
    table.push(Transition::new(Modal, EscapePressed, Objects));
    table
}

type TransitionCallback = Box<dyn FnMut(NavRegion, NavRegion, NavEvent) + Send>;
type InvalidCallback = Box<dyn FnMut(NavRegion, NavEvent) + Send>;

pub struct NavigationFsm {
    current: NavRegion,
    initial: NavRegion,
    transitions: Vec<Transition>,
    history: Vec<TransitionRecord>,
    on_transition: Option<TransitionCallback>,
    on_invalid_transition: Option<InvalidCallback>,
}

impl NavigationFsm {
    pub fn new(transitions: Vec<Transition>, initial: NavRegion) -> Self {
        Self {
            current: initial,
            initial,
            transitions,
            history: Vec::new(),
            on_transition: None,
            on_invalid_transition: None,
        }
    }

    /// The default table with the objects region active.
    pub fn with_defaults() -> Self {
        Self::new(default_transitions(), NavRegion::Objects)
    }

    pub fn current(&self) -> NavRegion {
        self.current
    }

    pub fn set_on_transition(&mut self, callback: impl FnMut(NavRegion, NavRegion, NavEvent) + Send + 'static) {
        self.on_transition = Some(Box::new(callback));
    }

    pub fn set_on_invalid_transition(&mut self, callback: impl FnMut(NavRegion, NavEvent) + Send + 'static) {
        self.on_invalid_transition = Some(Box::new(callback));
    }

    fn matching_index(&self, event: NavEvent) -> Option<usize> {
        self.transitions
            .iter()
            .position(|t| t.from == self.current && t.event == event && t.guard_passes())
    }

    /// Apply `event`. On a match: state moves, the row's action runs, the
    /// transition callback fires and the step is appended to history. On no
    /// match: state is untouched and only the invalid-transition callback
    /// fires.
    pub fn transition(&mut self, event: NavEvent) -> bool {
        match self.matching_index(event) {
            Some(index) => {
                let from = self.current;
                let to = self.transitions[index].to;
                self.current = to;
                if let Some(action) = self.transitions[index].action.as_mut() {
                    action();
                }
                if let Some(callback) = self.on_transition.as_mut() {
                    callback(from, to, event);
                }
                self.history.push(TransitionRecord { from, to, event });
                log::debug!("fsm: {:?} --{:?}--> {:?}", from, event, to);
                true
            }
            None => {
                log::debug!("fsm: invalid event {:?} in {:?}", event, self.current);
                if let Some(callback) = self.on_invalid_transition.as_mut() {
                    let current = self.current;
                    callback(current, event);
                }
                false
            }
        }
    }

    /// Same lookup as `transition`, without mutating anything.
    pub fn can_transition(&self, event: NavEvent) -> bool {
        self.matching_index(event).is_some()
    }

    /// Events satisfiable from the current state, guards respected.
    pub fn valid_events(&self) -> Vec<NavEvent> {
        let mut events = Vec::new();
        for t in &self.transitions {
            if t.from == self.current && t.guard_passes() && !events.contains(&t.event) {
                events.push(t.event);
            }
        }
        events
    }

    /// Back to the configured initial state, history cleared.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.history.clear();
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }
}

/// Configuration-time checks for a transition table. These run on the static
/// table, not per keystroke.
pub struct FsmValidator;

impl FsmValidator {
    /// Every region must have at least one outgoing transition.
    pub fn validate_completeness(transitions: &[Transition]) -> Vec<String> {
        ALL_REGIONS
            .iter()
            .filter(|region| !transitions.iter().any(|t| t.from == **region))
            .map(|region| format!("state {:?} has no outgoing transitions", region))
            .collect()
    }

    /// Every region must be reachable from `initial` via the table.
    pub fn validate_reachability(transitions: &[Transition], initial: NavRegion) -> Vec<String> {
        let mut reached = vec![initial];
        let mut frontier = vec![initial];
        while let Some(region) = frontier.pop() {
            for t in transitions {
                if t.from == region && !reached.contains(&t.to) {
                    reached.push(t.to);
                    frontier.push(t.to);
                }
            }
        }
        ALL_REGIONS
            .iter()
            .filter(|region| !reached.contains(region))
            .map(|region| format!("state {:?} is unreachable from {:?}", region, initial))
            .collect()
    }

    /// Duplicate `{from, event}` pairs shadow each other silently since
    /// lookup takes the first match.
    pub fn validate_uniqueness(transitions: &[Transition]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut errors = Vec::new();
        for t in transitions {
            if !seen.insert((t.from, t.event)) {
                errors.push(format!("duplicate transition {:?} --{:?}-->", t.from, t.event));
            }
        }
        errors
    }

    pub fn validate_all(transitions: &[Transition], initial: NavRegion) -> Vec<String> {
        let mut errors = Self::validate_completeness(transitions);
        errors.extend(Self::validate_reachability(transitions, initial));
        errors.extend(Self::validate_uniqueness(transitions));
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn default_table_passes_all_validations() {
        let errors = FsmValidator::validate_all(&default_transitions(), NavRegion::Objects);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn escape_unwinds_one_level_at_a_time() {
        let mut fsm = NavigationFsm::with_defaults();
        assert!(fsm.transition(NavEvent::OpenFilePanel));
        assert!(fsm.transition(NavEvent::OpenDropdown));
        assert_eq!(fsm.current(), NavRegion::Dropdown);

        assert!(fsm.transition(NavEvent::EscapePressed));
        assert_eq!(fsm.current(), NavRegion::FilePanel);
        assert!(fsm.transition(NavEvent::EscapePressed));
        assert_eq!(fsm.current(), NavRegion::Objects);
    }

    #[test]
    fn modal_is_reachable_from_non_modal_regions_and_closes_to_objects() {
        for start_events in [
            vec![],
            vec![NavEvent::NavigateToBuckets],
            vec![NavEvent::OpenFilePanel],
            vec![NavEvent::OpenFilePanel, NavEvent::OpenDropdown],
        ] {
            let mut fsm = NavigationFsm::with_defaults();
            for event in start_events {
                assert!(fsm.transition(event));
            }
            assert!(fsm.transition(NavEvent::OpenModal));
            assert_eq!(fsm.current(), NavRegion::Modal);
            assert!(fsm.transition(NavEvent::CloseModal));
            assert_eq!(fsm.current(), NavRegion::Objects);
        }
    }

    #[test]
    fn invalid_event_leaves_state_unchanged_and_reports() {
        let mut fsm = NavigationFsm::with_defaults();
        let invalid = Arc::new(AtomicUsize::new(0));
        let invalid_seen = Arc::clone(&invalid);
        fsm.set_on_invalid_transition(move |_, _| {
            invalid_seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!fsm.transition(NavEvent::CloseDropdown));
        assert_eq!(fsm.current(), NavRegion::Objects);
        assert_eq!(invalid.load(Ordering::SeqCst), 1);
        assert!(fsm.history().is_empty());
    }

    #[test]
    fn guard_vetoes_without_state_change() {
        let table = vec![
            Transition::new(NavRegion::Objects, NavEvent::OpenFilePanel, NavRegion::FilePanel)
                .with_guard(|| false),
            Transition::new(NavRegion::Objects, NavEvent::NavigateToBuckets, NavRegion::Buckets),
        ];
        let mut fsm = NavigationFsm::new(table, NavRegion::Objects);
        assert!(!fsm.can_transition(NavEvent::OpenFilePanel));
        assert!(!fsm.transition(NavEvent::OpenFilePanel));
        assert_eq!(fsm.current(), NavRegion::Objects);
        assert_eq!(fsm.valid_events(), vec![NavEvent::NavigateToBuckets]);
    }

    #[test]
    fn action_runs_once_per_successful_transition() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_action = Arc::clone(&fired);
        let table = vec![
            Transition::new(NavRegion::Objects, NavEvent::OpenFilePanel, NavRegion::FilePanel)
                .with_action(move || {
                    fired_in_action.fetch_add(1, Ordering::SeqCst);
                }),
            Transition::new(NavRegion::FilePanel, NavEvent::CloseFilePanel, NavRegion::Objects),
        ];
        let mut fsm = NavigationFsm::new(table, NavRegion::Objects);

        assert!(fsm.transition(NavEvent::OpenFilePanel));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!fsm.transition(NavEvent::OpenFilePanel));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn history_records_every_step_and_reset_clears() {
        let mut fsm = NavigationFsm::with_defaults();
        fsm.transition(NavEvent::OpenFilePanel);
        fsm.transition(NavEvent::EscapePressed);
        assert_eq!(
            fsm.history(),
            &[
                TransitionRecord {
                    from: NavRegion::Objects,
                    to: NavRegion::FilePanel,
                    event: NavEvent::OpenFilePanel,
                },
                TransitionRecord {
                    from: NavRegion::FilePanel,
                    to: NavRegion::Objects,
                    event: NavEvent::EscapePressed,
                },
            ]
        );

        fsm.reset();
        assert_eq!(fsm.current(), NavRegion::Objects);
        assert!(fsm.history().is_empty());
    }

    #[test]
    fn uniqueness_validation_flags_shadowed_rows() {
        let mut table = default_transitions();
        table.push(Transition::new(
            NavRegion::Objects,
            NavEvent::OpenFilePanel,
            NavRegion::Modal,
        ));
        let errors = FsmValidator::validate_uniqueness(&table);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn reachability_validation_flags_orphan_states() {
        // Dropping every edge into Modal makes it unreachable.
        let table: Vec<Transition> = default_transitions()
            .into_iter()
            .filter(|t| t.to != NavRegion::Modal)
            .collect();
        let errors = FsmValidator::validate_reachability(&table, NavRegion::Objects);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Modal"));
    }
}
