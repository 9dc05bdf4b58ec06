use std::collections::BTreeMap;

use locomotion_common::HandId;

use crate::config::ModeKind;

/// Observer bracketing every hand activation change (logging, controller animation).
pub trait ActivationHook {
    fn before_change(&mut self, _mode: ModeKind, _hand: HandId, _active: bool) {}
    fn after_change(&mut self, _mode: ModeKind, _hand: HandId, _active: bool) {}
}

/// Errors from activating a hand for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("hand {0} is not registered with the rig")]
    UnknownHand(HandId),
    #[error("hand {requested} cannot activate while {active} is active")]
    ExclusiveConflict { requested: HandId, active: HandId },
}

/// Which hands are currently driving one mode.
///
/// Deactivation always succeeds. Activation requires a registered hand and, when
/// the mode is mutually exclusive, that no other hand is active.
pub struct HandActivationTracker {
    mode: ModeKind,
    states: BTreeMap<HandId, bool>,
    mutually_exclusive: bool,
    hooks: Vec<Box<dyn ActivationHook>>,
}

impl HandActivationTracker {
    pub fn new(mode: ModeKind, hands: &[HandId], mutually_exclusive: bool) -> Self {
        Self {
            mode,
            states: hands.iter().map(|h| (*h, false)).collect(),
            mutually_exclusive,
            hooks: Vec::new(),
        }
    }

    pub fn add_hook(&mut self, hook: Box<dyn ActivationHook>) {
        self.hooks.push(hook);
    }

    pub fn mutually_exclusive(&self) -> bool {
        self.mutually_exclusive
    }

    pub fn set_mutually_exclusive(&mut self, value: bool) {
        self.mutually_exclusive = value;
    }

    pub fn set_active(&mut self, hand: HandId, active: bool) -> Result<(), ActivationError> {
        let Some(current) = self.states.get(&hand).copied() else {
            if active {
                tracing::warn!(mode = %self.mode, %hand, "activation requested for unregistered hand");
                return Err(ActivationError::UnknownHand(hand));
            }
            return Ok(());
        };

        if active && self.mutually_exclusive {
            if let Some(other) = self.states.iter().find(|(h, on)| **h != hand && **on).map(|(h, _)| *h)
            {
                tracing::debug!(mode = %self.mode, %hand, active = %other, "exclusive activation refused");
                return Err(ActivationError::ExclusiveConflict {
                    requested: hand,
                    active: other,
                });
            }
        }

        if current == active {
            return Ok(());
        }

        for hook in &mut self.hooks {
            hook.before_change(self.mode, hand, active);
        }
        self.states.insert(hand, active);
        tracing::debug!(mode = %self.mode, %hand, active, "hand activation changed");
        for hook in &mut self.hooks {
            hook.after_change(self.mode, hand, active);
        }
        Ok(())
    }

    pub fn is_active(&self, hand: HandId) -> Result<bool, ActivationError> {
        self.states
            .get(&hand)
            .copied()
            .ok_or(ActivationError::UnknownHand(hand))
    }

    /// Active hands in deterministic (Left, Right) order.
    pub fn active_hands(&self) -> Vec<HandId> {
        self.states
            .iter()
            .filter(|(_, on)| **on)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn any_active(&self) -> bool {
        self.states.values().any(|on| *on)
    }

    pub fn deactivate_all(&mut self) {
        let hands: Vec<HandId> = self.active_hands();
        for hand in hands {
            // Deactivation cannot fail.
            let _ = self.set_active(hand, false);
        }
    }
}

impl std::fmt::Debug for HandActivationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandActivationTracker")
            .field("mode", &self.mode)
            .field("states", &self.states)
            .field("mutually_exclusive", &self.mutually_exclusive)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tracker(exclusive: bool) -> HandActivationTracker {
        HandActivationTracker::new(ModeKind::Fly, &HandId::ALL, exclusive)
    }

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl ActivationHook for Recorder {
        fn before_change(&mut self, mode: ModeKind, hand: HandId, active: bool) {
            self.0.borrow_mut().push(format!("pre {mode} {hand} {active}"));
        }
        fn after_change(&mut self, mode: ModeKind, hand: HandId, active: bool) {
            self.0.borrow_mut().push(format!("post {mode} {hand} {active}"));
        }
    }

    #[test]
    fn deactivate_always_succeeds() {
        let mut t = tracker(true);
        for hand in HandId::ALL {
            assert!(t.set_active(hand, false).is_ok());
        }
        t.set_active(HandId::Left, true).unwrap();
        for hand in HandId::ALL {
            assert!(t.set_active(hand, false).is_ok());
        }
        assert!(!t.any_active());

        // Even for a hand that was never registered.
        let mut lonely = HandActivationTracker::new(ModeKind::Fly, &[HandId::Left], true);
        assert!(lonely.set_active(HandId::Right, false).is_ok());
    }

    #[test]
    fn exclusive_blocks_second_hand_until_first_releases() {
        let mut t = tracker(true);
        t.set_active(HandId::Left, true).unwrap();
        assert_eq!(
            t.set_active(HandId::Right, true),
            Err(ActivationError::ExclusiveConflict {
                requested: HandId::Right,
                active: HandId::Left
            })
        );
        assert_eq!(t.is_active(HandId::Right), Ok(false));

        t.set_active(HandId::Left, false).unwrap();
        assert!(t.set_active(HandId::Right, true).is_ok());
        assert_eq!(t.active_hands(), vec![HandId::Right]);
    }

    #[test]
    fn non_exclusive_allows_both_hands() {
        let mut t = tracker(false);
        t.set_active(HandId::Right, true).unwrap();
        t.set_active(HandId::Left, true).unwrap();
        assert_eq!(t.active_hands(), vec![HandId::Left, HandId::Right]);
    }

    #[test]
    fn reactivating_same_hand_is_ok_under_exclusivity() {
        let mut t = tracker(true);
        t.set_active(HandId::Left, true).unwrap();
        assert!(t.set_active(HandId::Left, true).is_ok());
    }

    #[test]
    fn unknown_hand_is_an_error_not_a_panic() {
        let mut t = HandActivationTracker::new(ModeKind::Navigate, &[HandId::Right], false);
        assert_eq!(
            t.set_active(HandId::Left, true),
            Err(ActivationError::UnknownHand(HandId::Left))
        );
        assert_eq!(
            t.is_active(HandId::Left),
            Err(ActivationError::UnknownHand(HandId::Left))
        );
    }

    #[test]
    fn hooks_bracket_each_change() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut t = tracker(false);
        t.add_hook(Box::new(Recorder(log.clone())));

        t.set_active(HandId::Left, true).unwrap();
        t.set_active(HandId::Left, true).unwrap();
        t.set_active(HandId::Left, false).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "pre fly left true",
                "post fly left true",
                "pre fly left false",
                "post fly left false",
            ]
        );
    }

    #[test]
    fn refused_activation_runs_no_hooks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut t = tracker(true);
        t.set_active(HandId::Left, true).unwrap();
        t.add_hook(Box::new(Recorder(log.clone())));
        assert!(t.set_active(HandId::Right, true).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn deactivate_all_clears_everything() {
        let mut t = tracker(false);
        t.set_active(HandId::Left, true).unwrap();
        t.set_active(HandId::Right, true).unwrap();
        t.deactivate_all();
        assert!(t.active_hands().is_empty());
    }
}
