use std::collections::BTreeSet;

use glam::Vec2;
use locomotion_common::HandId;
use serde::{Deserialize, Serialize};

use crate::event::{HandEvent, HandEvents, HandState};
use crate::sample::{DeviceSample, InputFeature};

/// Analog thresholds used to turn raw channels into discrete events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputThresholds {
    /// Trigger value above which a pressed trigger begins a select.
    pub select_begin: f32,
    /// Trigger value below which an ongoing select completes.
    pub select_end: f32,
    /// Per-component axis magnitude above which the hand counts as navigating.
    pub navigate_tolerance: f32,
}

impl Default for InputThresholds {
    fn default() -> Self {
        Self {
            select_begin: 0.75,
            select_end: 0.25,
            navigate_tolerance: 0.3,
        }
    }
}

/// Last known value of every channel.
#[derive(Debug, Clone, Copy, Default)]
struct Levels {
    menu: bool,
    trigger_pressed: bool,
    trigger_value: f32,
    grip_pressed: bool,
    grip_value: f32,
    axis: Vec2,
    axis_click: bool,
}

/// Per-hand sampler: compares each sample with the previous one and raises
/// begin/complete events only on transitions.
#[derive(Debug, Clone)]
pub struct HandInputState {
    hand: HandId,
    thresholds: InputThresholds,
    last: Levels,
    state: HandState,
    missing: BTreeSet<InputFeature>,
}

impl HandInputState {
    pub fn new(hand: HandId, thresholds: InputThresholds) -> Self {
        Self {
            hand,
            thresholds,
            last: Levels::default(),
            state: HandState::default(),
            missing: BTreeSet::new(),
        }
    }

    pub fn hand(&self) -> HandId {
        self.hand
    }

    /// Levels after the most recent sample.
    pub fn state(&self) -> &HandState {
        &self.state
    }

    pub fn thresholds(&self) -> &InputThresholds {
        &self.thresholds
    }

    /// Features currently reported missing by the device.
    pub fn missing_features(&self) -> impl Iterator<Item = InputFeature> + '_ {
        self.missing.iter().copied()
    }

    /// Sample one frame of raw device state and return the transitions it caused.
    pub fn sample(&mut self, raw: &DeviceSample) -> HandEvents {
        self.track_missing(raw);
        let levels = Levels {
            menu: raw.menu.unwrap_or(self.last.menu),
            trigger_pressed: raw.trigger_pressed.unwrap_or(self.last.trigger_pressed),
            trigger_value: raw.trigger_value.unwrap_or(self.last.trigger_value),
            grip_pressed: raw.grip_pressed.unwrap_or(self.last.grip_pressed),
            grip_value: raw.grip_value.unwrap_or(self.last.grip_value),
            axis: raw.axis.unwrap_or(self.last.axis),
            axis_click: raw.axis_click.unwrap_or(self.last.axis_click),
        };

        let mut events = HandEvents::new();
        let state = &mut self.state;
        let t = &self.thresholds;

        if levels.menu != state.menu_held {
            state.menu_held = levels.menu;
            events.push(if levels.menu {
                HandEvent::MenuPressed
            } else {
                HandEvent::MenuReleased
            });
        }

        // Hysteresis: begin above the upper threshold, complete below the lower one.
        if !state.selecting && levels.trigger_pressed && levels.trigger_value > t.select_begin {
            state.selecting = true;
            events.push(HandEvent::SelectBegin);
        } else if state.selecting && levels.trigger_value < t.select_end {
            state.selecting = false;
            events.push(HandEvent::SelectComplete);
        }

        if levels.grip_pressed != state.grabbing {
            state.grabbing = levels.grip_pressed;
            events.push(if levels.grip_pressed {
                HandEvent::GrabBegin
            } else {
                HandEvent::GrabComplete
            });
        }

        let moving = levels.axis.x.abs() > t.navigate_tolerance
            || levels.axis.y.abs() > t.navigate_tolerance;
        if moving != state.navigating {
            state.navigating = moving;
            events.push(if moving {
                HandEvent::NavigateBegin
            } else {
                HandEvent::NavigateComplete
            });
        }

        if levels.axis_click != state.navigate_pressed {
            state.navigate_pressed = levels.axis_click;
            events.push(if levels.axis_click {
                HandEvent::NavigatePressBegin
            } else {
                HandEvent::NavigatePressComplete
            });
        }

        state.select_value = levels.trigger_value;
        state.grab_value = levels.grip_value;
        state.navigate_value = levels.axis;
        self.last = levels;

        if !events.is_empty() {
            tracing::trace!(hand = %self.hand, events = ?events.as_slice(), "hand input transitions");
        }
        events
    }

    /// Log each feature once when it goes missing and once when it returns.
    fn track_missing(&mut self, raw: &DeviceSample) {
        for feature in InputFeature::ALL {
            let present = feature.present_in(raw);
            if !present && self.missing.insert(feature) {
                tracing::warn!(hand = %self.hand, ?feature, "input feature unavailable, holding last value");
            } else if present && self.missing.remove(&feature) {
                tracing::info!(hand = %self.hand, ?feature, "input feature available again");
            }
        }
    }

    /// Forget all held levels, e.g. after the controller was disconnected.
    pub fn reset(&mut self) {
        self.last = Levels::default();
        self.state = HandState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler() -> HandInputState {
        HandInputState::new(HandId::Right, InputThresholds::default())
    }

    fn trigger(value: f32) -> DeviceSample {
        DeviceSample::idle().with_trigger(value > 0.0, value)
    }

    #[test]
    fn select_hysteresis_sequence() {
        let mut s = sampler();
        let seq = [0.0, 0.8, 0.9, 0.5, 0.2];
        let mut begins = Vec::new();
        let mut completes = Vec::new();
        for (i, v) in seq.iter().enumerate() {
            let events = s.sample(&trigger(*v));
            if events.contains(HandEvent::SelectBegin) {
                begins.push(i);
            }
            if events.contains(HandEvent::SelectComplete) {
                completes.push(i);
            }
        }
        assert_eq!(begins, vec![1]);
        assert_eq!(completes, vec![4]);
    }

    #[test]
    fn select_requires_pressed_flag() {
        let mut s = sampler();
        let events = s.sample(&DeviceSample::idle().with_trigger(false, 0.9));
        assert!(!events.contains(HandEvent::SelectBegin));
        assert!(!s.state().selecting);
    }

    #[test]
    fn no_select_begin_inside_band_after_complete() {
        let mut s = sampler();
        s.sample(&trigger(0.9));
        s.sample(&trigger(0.1));
        let events = s.sample(&trigger(0.5));
        assert!(events.is_empty());
    }

    #[test]
    fn menu_edges() {
        let mut s = sampler();
        assert!(s.sample(&DeviceSample::idle().with_menu(true)).contains(HandEvent::MenuPressed));
        assert!(s.sample(&DeviceSample::idle().with_menu(true)).is_empty());
        assert!(s.sample(&DeviceSample::idle()).contains(HandEvent::MenuReleased));
    }

    #[test]
    fn grab_ignores_analog_value() {
        let mut s = sampler();
        let mut raw = DeviceSample::idle();
        raw.grip_pressed = Some(true);
        raw.grip_value = Some(0.1);
        assert!(s.sample(&raw).contains(HandEvent::GrabBegin));
        assert!(s.state().grabbing);
        assert!(s.sample(&DeviceSample::idle()).contains(HandEvent::GrabComplete));
    }

    #[test]
    fn navigate_tolerance_on_either_component() {
        let mut s = sampler();
        assert!(s.sample(&DeviceSample::idle().with_axis(Vec2::new(0.2, 0.2))).is_empty());
        let events = s.sample(&DeviceSample::idle().with_axis(Vec2::new(0.0, -0.5)));
        assert!(events.contains(HandEvent::NavigateBegin));
        assert_eq!(s.state().navigate_value, Vec2::new(0.0, -0.5));
        let events = s.sample(&DeviceSample::idle().with_axis(Vec2::new(0.1, 0.0)));
        assert!(events.contains(HandEvent::NavigateComplete));
    }

    #[test]
    fn navigate_press_is_independent_edge() {
        let mut s = sampler();
        let events = s.sample(&DeviceSample::idle().with_axis_click(true));
        assert_eq!(events.as_slice(), &[HandEvent::NavigatePressBegin]);
        let events = s.sample(&DeviceSample::idle());
        assert_eq!(events.as_slice(), &[HandEvent::NavigatePressComplete]);
    }

    #[test]
    fn missing_feature_holds_last_value() {
        let mut s = sampler();
        s.sample(&DeviceSample::idle().with_grip(true));
        let mut raw = DeviceSample::idle();
        raw.grip_pressed = None;
        let events = s.sample(&raw);
        assert!(!events.contains(HandEvent::GrabComplete));
        assert!(s.state().grabbing);
        assert_eq!(s.missing_features().collect::<Vec<_>>(), vec![InputFeature::GripButton]);

        // Feature returns: normal edge detection resumes.
        let events = s.sample(&DeviceSample::idle());
        assert!(events.contains(HandEvent::GrabComplete));
        assert_eq!(s.missing_features().count(), 0);
    }

    #[test]
    fn empty_sample_produces_no_events() {
        let mut s = sampler();
        assert!(s.sample(&DeviceSample::default()).is_empty());
        assert_eq!(s.missing_features().count(), InputFeature::ALL.len());
    }

    #[test]
    fn reset_clears_levels() {
        let mut s = sampler();
        s.sample(&trigger(0.9));
        assert!(s.state().selecting);
        s.reset();
        assert!(!s.state().selecting);
    }
}
