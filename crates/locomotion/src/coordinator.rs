use std::collections::BTreeMap;

use glam::Vec3;
use locomotion_common::{Axis, HandId, RigPose};
use locomotion_input::{HandEvent, HandEvents, HandInputState};

use crate::activation::{ActivationError, ActivationHook};
use crate::config::{
    ConfigError, GravityConstraint, LocomotionConfig, ModeKind, MotionConstraint,
    MotionMultipliers, validate_max_distance,
};
use crate::frame::{FrameInput, HandFrame, RigSetup, TickContext};
use crate::manipulation::RigManipulator;
use crate::modes::{
    Armswing, Climb, Fly, LocomotionMode, Navigate, RigDelta, Teleport, TeleportState,
};
use crate::pause::PauseCounter;
use crate::raycast::{NoSurface, RayCaster};
use crate::telemetry::{TelemetryEvent, TelemetrySink, TelemetryStore};

/// Order in which enabled modes are consulted for a gravity constraint.
/// Teleport is instantaneous and never constrains gravity.
const GRAVITY_PRIORITY: [ModeKind; 4] = [
    ModeKind::Armswing,
    ModeKind::Fly,
    ModeKind::Navigate,
    ModeKind::Climb,
];

/// Host collaborators handed to the coordinator at initialization.
pub struct Dependencies {
    pub ray_caster: Box<dyn RayCaster>,
    pub sinks: Vec<Box<dyn TelemetrySink>>,
}

impl Default for Dependencies {
    fn default() -> Self {
        Self {
            ray_caster: Box::new(NoSurface),
            sinks: Vec::new(),
        }
    }
}

/// Why a mode was skipped this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityFault {
    #[error("no hands registered with the rig")]
    NoHands,
    #[error("head is not tracked")]
    MissingHead,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub events: BTreeMap<HandId, HandEvents>,
    /// Sum of continuous translations applied to the rig.
    pub displacement: Vec3,
    pub teleported_to: Option<Vec3>,
    pub paused: bool,
}

struct ModeSlot {
    mode: LocomotionMode,
    enabled: bool,
}

/// Top-level locomotion state machine.
///
/// Owns the per-hand samplers, the five modes and their enable flags, the pause
/// counter, gravity and motion-constraint state. The host drives it with
/// [`tick`](Self::tick) once per frame and owns the rig pose it writes to.
pub struct LocomotionCoordinator {
    hands: Vec<HandId>,
    inputs: BTreeMap<HandId, HandInputState>,
    previous_positions: BTreeMap<HandId, Vec3>,
    modes: BTreeMap<ModeKind, ModeSlot>,
    manipulator: RigManipulator,
    pause: PauseCounter,
    gravity_enabled: bool,
    motion_constraint: MotionConstraint,
    faults: BTreeMap<ModeKind, IntegrityFault>,
    telemetry: TelemetryStore,
    sinks: Vec<Box<dyn TelemetrySink>>,
    ray_caster: Box<dyn RayCaster>,
    tick_count: u64,
    shut_down: bool,
}

impl LocomotionCoordinator {
    /// Validate configuration and build every mode for the registered hands.
    ///
    /// A rig with no hands is accepted but reports itself non-functional and
    /// never moves.
    pub fn initialize(
        config: LocomotionConfig,
        rig: RigSetup,
        deps: Dependencies,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut hands = rig.hands;
        hands.sort();
        hands.dedup();
        if hands.is_empty() {
            tracing::error!("locomotion initialized without hands; all modes inactive");
        }

        let m = &config.modes;
        let modes = [
            LocomotionMode::Teleport(Teleport::new(m.teleport, config.teleport, &hands)),
            LocomotionMode::Armswing(Armswing::new(m.armswing, &hands)),
            LocomotionMode::Fly(Fly::new(m.fly, config.fly, &hands)),
            LocomotionMode::Navigate(Navigate::new(m.navigate, &hands)),
            LocomotionMode::Climb(Climb::new(m.climb, &hands)),
        ]
        .into_iter()
        .map(|mode| (mode.kind(), ModeSlot { mode, enabled: false }))
        .collect();

        let mut coordinator = Self {
            inputs: hands
                .iter()
                .map(|h| (*h, HandInputState::new(*h, config.input)))
                .collect(),
            hands,
            previous_positions: BTreeMap::new(),
            modes,
            manipulator: RigManipulator::new(config.manipulation),
            pause: PauseCounter::new(),
            gravity_enabled: config.gravity_enabled,
            motion_constraint: config.motion_constraint,
            faults: BTreeMap::new(),
            telemetry: TelemetryStore::new(),
            sinks: deps.sinks,
            ray_caster: deps.ray_caster,
            tick_count: 0,
            shut_down: false,
        };

        coordinator.publish_snapshot();
        for kind in &config.enabled_modes {
            coordinator.set_mode_enabled(*kind, true);
        }
        tracing::info!(
            hands = coordinator.hands.len(),
            enabled = ?config.enabled_modes,
            "locomotion initialized"
        );
        Ok(coordinator)
    }

    /// Whether the rig has what it needs to move at all.
    pub fn is_functional(&self) -> bool {
        !self.hands.is_empty() && !self.shut_down
    }

    pub fn hands(&self) -> &[HandId] {
        &self.hands
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // --- mode flags ---

    /// Set a mode's enable flag. Returns false (and warns) if it already had that value.
    pub fn set_mode_enabled(&mut self, kind: ModeKind, enabled: bool) -> bool {
        let Some(slot) = self.modes.get_mut(&kind) else {
            return false;
        };
        if slot.enabled == enabled {
            tracing::warn!(mode = %kind, enabled, "mode already in requested state");
            return false;
        }
        slot.enabled = enabled;
        if !enabled {
            slot.mode.reset();
        }
        tracing::info!(mode = %kind, enabled, "locomotion mode toggled");
        self.publish(TelemetryEvent::ModeEnabled {
            mode: kind,
            enabled,
        });
        self.apply_gravity_from_enabled_modes();
        true
    }

    /// The stored flag, regardless of pause.
    pub fn is_mode_enabled(&self, kind: ModeKind) -> bool {
        self.modes.get(&kind).is_some_and(|s| s.enabled)
    }

    /// The effective state: enabled and not paused.
    pub fn is_mode_active(&self, kind: ModeKind) -> bool {
        self.is_mode_enabled(kind) && !self.is_paused()
    }

    pub fn any_mode_enabled(&self) -> bool {
        self.modes.values().any(|s| s.enabled)
    }

    pub fn mode(&self, kind: ModeKind) -> Option<&LocomotionMode> {
        self.modes.get(&kind).map(|s| &s.mode)
    }

    pub fn active_hands(&self, kind: ModeKind) -> Vec<HandId> {
        self.mode(kind)
            .map(|m| m.tracker().active_hands())
            .unwrap_or_default()
    }

    /// Activate or deactivate a hand for a mode directly, bypassing input routing.
    pub fn set_hand_active(
        &mut self,
        kind: ModeKind,
        hand: HandId,
        active: bool,
    ) -> Result<(), ActivationError> {
        match self.modes.get_mut(&kind) {
            Some(slot) => slot.mode.tracker_mut().set_active(hand, active),
            None => Err(ActivationError::UnknownHand(hand)),
        }
    }

    pub fn add_activation_hook(&mut self, kind: ModeKind, hook: Box<dyn ActivationHook>) {
        if let Some(slot) = self.modes.get_mut(&kind) {
            slot.mode.tracker_mut().add_hook(hook);
        }
    }

    // --- rotate / scale flags ---

    pub fn set_rotation_enabled(&mut self, axis: Axis, enabled: bool) -> bool {
        let changed = self.manipulator.set_rotation_enabled(axis, enabled);
        if changed {
            self.publish(TelemetryEvent::RotationEnabled { axis, enabled });
        } else {
            tracing::warn!(?axis, enabled, "rotation already in requested state");
        }
        changed
    }

    pub fn is_rotation_enabled(&self, axis: Axis) -> bool {
        self.manipulator.rotation_enabled(axis)
    }

    pub fn set_scale_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.manipulator.set_scale_enabled(enabled);
        if changed {
            self.publish(TelemetryEvent::ScaleEnabled(enabled));
        } else {
            tracing::warn!(enabled, "scale already in requested state");
        }
        changed
    }

    pub fn is_scale_enabled(&self) -> bool {
        self.manipulator.scale_enabled()
    }

    // --- pause ---

    pub fn request_pause(&mut self) {
        if self.pause.request() {
            for slot in self.modes.values_mut() {
                slot.mode.reset();
            }
            tracing::info!("locomotion paused");
            self.publish(TelemetryEvent::PauseChanged(true));
        }
    }

    /// Release one pause hold. Releasing when not paused is a warning no-op.
    pub fn release_pause(&mut self) -> bool {
        let released = self.pause.release();
        if released && !self.pause.is_paused() {
            tracing::info!("locomotion resumed");
            self.publish(TelemetryEvent::PauseChanged(false));
            self.settle_motion_constraint();
        }
        released
    }

    /// Fast lasts only while a navigate press is held. Press edges are not
    /// routed while paused, so re-derive it from the samplers on resume.
    fn settle_motion_constraint(&mut self) {
        let pressed = self.inputs.values().any(|i| i.state().navigate_pressed);
        if self.motion_constraint == MotionConstraint::Fast && !pressed {
            self.set_motion_constraint(MotionConstraint::Normal);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn pause_count(&self) -> u32 {
        self.pause.count()
    }

    // --- gravity ---

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// First enabled mode in priority order whose constraint is not `Allowed` decides.
    /// When none does, gravity keeps its current state.
    fn apply_gravity_from_enabled_modes(&mut self) {
        let decision = GRAVITY_PRIORITY.iter().find_map(|kind| {
            let slot = self.modes.get(kind)?;
            if !slot.enabled {
                return None;
            }
            match slot.mode.config().gravity {
                GravityConstraint::Allowed => None,
                GravityConstraint::Required => Some(true),
                GravityConstraint::Prohibited => Some(false),
            }
        });
        if let Some(on) = decision {
            self.set_gravity(on);
        }
    }

    fn set_gravity(&mut self, on: bool) {
        if self.gravity_enabled != on {
            self.gravity_enabled = on;
            tracing::debug!(gravity = on, "gravity changed");
            self.publish(TelemetryEvent::GravityChanged(on));
        }
    }

    // --- motion constraint ---

    pub fn motion_constraint(&self) -> MotionConstraint {
        self.motion_constraint
    }

    pub fn set_motion_constraint(&mut self, constraint: MotionConstraint) {
        if self.motion_constraint != constraint {
            self.motion_constraint = constraint;
            tracing::debug!(%constraint, "motion constraint changed");
            self.publish(TelemetryEvent::MotionConstraintChanged(constraint));
        }
    }

    /// Multiplier the mode would use under the current motion constraint.
    pub fn current_multiplier(&self, kind: ModeKind) -> Option<f32> {
        self.mode(kind)
            .map(|m| m.config().multipliers.get(self.motion_constraint))
    }

    // --- configuration setters ---

    pub fn set_multipliers(
        &mut self,
        kind: ModeKind,
        multipliers: MotionMultipliers,
    ) -> Result<(), ConfigError> {
        multipliers.validate(kind)?;
        if let Some(slot) = self.modes.get_mut(&kind) {
            slot.mode.config_mut().multipliers = multipliers;
        }
        self.publish(TelemetryEvent::MultipliersChanged {
            mode: kind,
            multipliers,
        });
        Ok(())
    }

    pub fn set_gravity_constraint(&mut self, kind: ModeKind, gravity: GravityConstraint) {
        if let Some(slot) = self.modes.get_mut(&kind) {
            slot.mode.config_mut().gravity = gravity;
        }
        self.apply_gravity_from_enabled_modes();
    }

    pub fn set_mutually_exclusive(&mut self, kind: ModeKind, exclusive: bool) {
        if let Some(slot) = self.modes.get_mut(&kind) {
            slot.mode.config_mut().mutually_exclusive = exclusive;
            slot.mode.tracker_mut().set_mutually_exclusive(exclusive);
        }
    }

    pub fn set_teleport_max_distance(&mut self, max_distance: f32) -> Result<(), ConfigError> {
        validate_max_distance(max_distance)?;
        if let Some(teleport) = self.teleport_mut() {
            teleport.set_max_distance(max_distance);
        }
        Ok(())
    }

    pub fn set_teleport_blocked(&mut self, blocked: bool) {
        if let Some(teleport) = self.teleport_mut() {
            teleport.set_blocked(blocked);
        }
    }

    pub fn set_fly_reverse_motion(&mut self, reverse: bool) {
        if let Some(ModeSlot {
            mode: LocomotionMode::Fly(fly),
            ..
        }) = self.modes.get_mut(&ModeKind::Fly)
        {
            fly.set_reverse_motion(reverse);
        }
    }

    pub fn teleport_state(&self) -> TeleportState {
        match self.mode(ModeKind::Teleport) {
            Some(LocomotionMode::Teleport(t)) => t.state(),
            _ => TeleportState::Idle,
        }
    }

    pub fn climbing_hand(&self) -> Option<HandId> {
        match self.mode(ModeKind::Climb) {
            Some(LocomotionMode::Climb(c)) => c.climbing_hand(),
            _ => None,
        }
    }

    fn teleport_mut(&mut self) -> Option<&mut Teleport> {
        match self.modes.get_mut(&ModeKind::Teleport) {
            Some(ModeSlot {
                mode: LocomotionMode::Teleport(t),
                ..
            }) => Some(t),
            _ => None,
        }
    }

    // --- telemetry ---

    pub fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }

    pub fn subscribe(&mut self, sink: Box<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }

    fn publish(&mut self, event: TelemetryEvent) {
        self.telemetry.publish(&event);
        for sink in &mut self.sinks {
            sink.publish(&event);
        }
    }

    /// Publish every key once so observers start from a complete picture.
    fn publish_snapshot(&mut self) {
        let mut events = Vec::new();
        for (kind, slot) in &self.modes {
            events.push(TelemetryEvent::ModeEnabled {
                mode: *kind,
                enabled: slot.enabled,
            });
            events.push(TelemetryEvent::MultipliersChanged {
                mode: *kind,
                multipliers: slot.mode.config().multipliers,
            });
        }
        events.push(TelemetryEvent::MotionConstraintChanged(self.motion_constraint));
        events.push(TelemetryEvent::GravityChanged(self.gravity_enabled));
        events.push(TelemetryEvent::PauseChanged(self.is_paused()));
        for axis in Axis::ALL {
            events.push(TelemetryEvent::RotationEnabled {
                axis,
                enabled: self.manipulator.rotation_enabled(axis),
            });
        }
        events.push(TelemetryEvent::ScaleEnabled(self.manipulator.scale_enabled()));
        for event in events {
            self.publish(event);
        }
    }

    // --- per-frame ---

    /// Advance one frame: sample hands, route events, evaluate enabled modes,
    /// write the rig, then roll the previous-sample caches.
    pub fn tick(&mut self, frame: &FrameInput, rig: &mut RigPose, dt: f32) -> TickReport {
        if self.shut_down {
            tracing::warn!("tick after shutdown ignored");
            return TickReport::default();
        }
        self.tick_count += 1;
        let _span = tracing::info_span!("locomotion_tick", tick = self.tick_count).entered();

        let mut report = TickReport {
            tick: self.tick_count,
            paused: self.is_paused(),
            ..TickReport::default()
        };

        // Sample every hand before any mode sees it.
        let mut hand_frames = BTreeMap::new();
        for input in &frame.hands {
            let Some(sampler) = self.inputs.get_mut(&input.hand) else {
                tracing::trace!(hand = %input.hand, "ignoring unregistered hand");
                continue;
            };
            let events = sampler.sample(&input.device);
            let previous_position = self
                .previous_positions
                .get(&input.hand)
                .copied()
                .unwrap_or(input.pose.position);
            hand_frames.insert(
                input.hand,
                HandFrame {
                    hand: input.hand,
                    pose: input.pose,
                    previous_position,
                    state: *sampler.state(),
                },
            );
            report.events.insert(input.hand, events);
        }

        if !self.is_paused() {
            for (hand, events) in &report.events {
                for event in events {
                    self.route_event(*hand, *event, frame, rig);
                }
            }
            self.evaluate_modes(frame, &hand_frames, rig, dt, &mut report);
            if self.manipulator.any_enabled() {
                self.manipulator.apply(&hand_frames, rig);
            }
        }

        // A hand that drops out of tracking restarts from a zero delta when it returns.
        self.previous_positions.retain(|hand, _| hand_frames.contains_key(hand));
        for (hand, f) in &hand_frames {
            self.previous_positions.insert(*hand, f.pose.position);
        }
        report
    }

    fn route_event(&mut self, hand: HandId, event: HandEvent, frame: &FrameInput, rig: &RigPose) {
        let enabled = |kind: ModeKind, modes: &BTreeMap<ModeKind, ModeSlot>| {
            modes.get(&kind).is_some_and(|s| s.enabled)
        };

        match event {
            HandEvent::SelectBegin => {
                if enabled(ModeKind::Fly, &self.modes) {
                    self.activate(ModeKind::Fly, hand);
                }
                if enabled(ModeKind::Teleport, &self.modes) {
                    if let Some(teleport) = self.teleport_mut() {
                        teleport.begin_aim(hand);
                    }
                }
            }
            HandEvent::SelectComplete => {
                self.deactivate(ModeKind::Fly, hand);
                let head_tracked = frame.head.is_some();
                if let Some(teleport) = self.teleport_mut() {
                    teleport.release_aim(hand);
                    // Without a head there is no landing spot; the release still ends the aim.
                    if !head_tracked && teleport.release_pending() {
                        tracing::debug!(%hand, "teleport released while head untracked");
                        teleport.cancel();
                    }
                }
            }
            HandEvent::GrabBegin => {
                if enabled(ModeKind::Armswing, &self.modes) {
                    self.activate(ModeKind::Armswing, hand);
                }
                if enabled(ModeKind::Climb, &self.modes) {
                    let Some(input) = frame.hand(hand) else {
                        return;
                    };
                    let position = rig.transform_point(input.pose.position);
                    if let Some(ModeSlot {
                        mode: LocomotionMode::Climb(climb),
                        ..
                    }) = self.modes.get_mut(&ModeKind::Climb)
                    {
                        climb.grab(hand, position, &input.overlapping_anchors);
                    }
                }
            }
            HandEvent::GrabComplete => {
                self.deactivate(ModeKind::Armswing, hand);
                if let Some(ModeSlot {
                    mode: LocomotionMode::Climb(climb),
                    ..
                }) = self.modes.get_mut(&ModeKind::Climb)
                {
                    climb.release(hand);
                }
            }
            HandEvent::NavigateBegin => {
                if enabled(ModeKind::Navigate, &self.modes) {
                    self.activate(ModeKind::Navigate, hand);
                }
            }
            HandEvent::NavigateComplete => self.deactivate(ModeKind::Navigate, hand),
            HandEvent::NavigatePressBegin => {
                if self.any_mode_enabled() {
                    self.set_motion_constraint(MotionConstraint::Fast);
                }
            }
            HandEvent::NavigatePressComplete => {
                if self.motion_constraint == MotionConstraint::Fast {
                    self.set_motion_constraint(MotionConstraint::Normal);
                }
            }
            HandEvent::MenuPressed | HandEvent::MenuReleased => {
                tracing::trace!(%hand, ?event, "menu input has no locomotion binding");
            }
        }
    }

    fn activate(&mut self, kind: ModeKind, hand: HandId) {
        if let Err(err) = self.set_hand_active(kind, hand, true) {
            tracing::debug!(mode = %kind, %hand, %err, "hand activation refused");
        }
    }

    fn deactivate(&mut self, kind: ModeKind, hand: HandId) {
        let _ = self.set_hand_active(kind, hand, false);
    }

    fn evaluate_modes(
        &mut self,
        frame: &FrameInput,
        hand_frames: &BTreeMap<HandId, HandFrame>,
        rig: &mut RigPose,
        dt: f32,
        report: &mut TickReport,
    ) {
        for kind in ModeKind::ALL {
            let Some(slot) = self.modes.get_mut(&kind) else {
                continue;
            };
            if !slot.enabled {
                continue;
            }

            let fault = if self.hands.is_empty() {
                Some(IntegrityFault::NoHands)
            } else if slot.mode.requires_head() && frame.head.is_none() {
                Some(IntegrityFault::MissingHead)
            } else {
                None
            };
            match (fault, self.faults.get(&kind).copied()) {
                (Some(f), previous) if previous != Some(f) => {
                    tracing::warn!(mode = %kind, fault = %f, "mode failed integrity check, inactive");
                    self.faults.insert(kind, f);
                }
                (None, Some(_)) => {
                    tracing::info!(mode = %kind, "mode integrity restored");
                    self.faults.remove(&kind);
                }
                _ => {}
            }
            if fault.is_some() {
                continue;
            }

            let ctx = TickContext {
                rig: &*rig,
                head: frame.head.as_ref(),
                hands: hand_frames,
                dt,
                multiplier: slot.mode.config().multipliers.get(self.motion_constraint),
                ray_caster: self.ray_caster.as_ref(),
            };
            let delta = slot.mode.tick(&ctx);

            match delta {
                RigDelta::None => {}
                RigDelta::Translate(offset) => {
                    rig.position += offset;
                    report.displacement += offset;
                }
                RigDelta::Relocate(target) => {
                    let from = rig.position;
                    rig.position = target;
                    report.teleported_to = Some(target);
                    self.publish(TelemetryEvent::Teleported { from, to: target });
                }
            }
        }
    }

    /// Drop every hand and in-flight interaction. Later ticks are ignored.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            tracing::warn!("locomotion already shut down");
            return;
        }
        for slot in self.modes.values_mut() {
            slot.mode.reset();
        }
        for input in self.inputs.values_mut() {
            input.reset();
        }
        self.previous_positions.clear();
        self.shut_down = true;
        tracing::info!(ticks = self.tick_count, "locomotion shut down");
    }
}

impl std::fmt::Debug for LocomotionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let enabled: Vec<ModeKind> = self
            .modes
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(k, _)| *k)
            .collect();
        f.debug_struct("LocomotionCoordinator")
            .field("hands", &self.hands)
            .field("enabled", &enabled)
            .field("paused", &self.pause.count())
            .field("gravity", &self.gravity_enabled)
            .field("motion_constraint", &self.motion_constraint)
            .field("tick", &self.tick_count)
            .finish()
    }
}
