//! Per-target load state.

use std::collections::BTreeMap;

use crate::AssetTarget;

/// Lifecycle of one asset request. Transitions only leave `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Applied,
    Failed,
}

/// Tracks every requested asset until it is applied or has failed.
#[derive(Debug, Default)]
pub struct LoadTracker {
    states: BTreeMap<AssetTarget, LoadState>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `target` as pending. Re-tracking an existing target is a no-op.
    pub fn track(&mut self, target: AssetTarget) {
        self.states.entry(target).or_insert(LoadState::Pending);
    }

    /// Record a successful apply. Returns `false` if the target was not pending.
    pub fn mark_applied(&mut self, target: AssetTarget) -> bool {
        self.transition(target, LoadState::Applied)
    }

    /// Record a failure. Returns `false` if the target was not pending.
    pub fn mark_failed(&mut self, target: AssetTarget) -> bool {
        self.transition(target, LoadState::Failed)
    }

    fn transition(&mut self, target: AssetTarget, next: LoadState) -> bool {
        match self.states.get_mut(&target) {
            Some(state @ LoadState::Pending) => {
                *state = next;
                true
            }
            Some(state) => {
                log::warn!("Ignoring {:?} for {} already {:?}", next, target, state);
                false
            }
            None => {
                log::warn!("Ignoring {:?} for untracked {}", next, target);
                false
            }
        }
    }

    pub fn state(&self, target: AssetTarget) -> Option<LoadState> {
        self.states.get(&target).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.count(LoadState::Pending)
    }

    pub fn failed_count(&self) -> usize {
        self.count(LoadState::Failed)
    }

    pub fn applied_count(&self) -> usize {
        self.count(LoadState::Applied)
    }

    fn count(&self, wanted: LoadState) -> usize {
        self.states.values().filter(|s| **s == wanted).count()
    }

    /// True once nothing is pending.
    pub fn all_settled(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut tracker = LoadTracker::new();
        tracker.track(AssetTarget::Environment);
        tracker.track(AssetTarget::Orbiter(0));
        assert_eq!(tracker.pending_count(), 2);
        assert!(!tracker.all_settled());

        assert!(tracker.mark_applied(AssetTarget::Environment));
        assert!(tracker.mark_failed(AssetTarget::Orbiter(0)));
        assert!(tracker.all_settled());
        assert_eq!(tracker.applied_count(), 1);
        assert_eq!(tracker.failed_count(), 1);
        assert_eq!(
            tracker.state(AssetTarget::Orbiter(0)),
            Some(LoadState::Failed)
        );
    }

    #[test]
    fn test_settled_states_are_final() {
        let mut tracker = LoadTracker::new();
        tracker.track(AssetTarget::Backdrop);
        assert!(tracker.mark_failed(AssetTarget::Backdrop));
        assert!(!tracker.mark_applied(AssetTarget::Backdrop));
        assert_eq!(tracker.state(AssetTarget::Backdrop), Some(LoadState::Failed));

        // Re-tracking does not reset a settled target.
        tracker.track(AssetTarget::Backdrop);
        assert_eq!(tracker.state(AssetTarget::Backdrop), Some(LoadState::Failed));
    }

    #[test]
    fn test_untracked_target() {
        let mut tracker = LoadTracker::new();
        assert!(!tracker.mark_applied(AssetTarget::Orbiter(3)));
        assert_eq!(tracker.state(AssetTarget::Orbiter(3)), None);
        assert!(tracker.is_empty());
        assert!(tracker.all_settled());
    }
}
