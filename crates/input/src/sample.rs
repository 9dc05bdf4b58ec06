use glam::Vec2;

/// One raw read of a hand controller, refreshed once per tick by the host's device layer.
///
/// Every channel is optional: `None` means the feature is not available on the
/// current hardware this frame. The sampler falls back to the last known value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceSample {
    pub menu: Option<bool>,
    pub trigger_pressed: Option<bool>,
    pub trigger_value: Option<f32>,
    pub grip_pressed: Option<bool>,
    pub grip_value: Option<f32>,
    pub axis: Option<Vec2>,
    pub axis_click: Option<bool>,
}

impl DeviceSample {
    /// A controller with every feature present and nothing held.
    pub fn idle() -> Self {
        Self {
            menu: Some(false),
            trigger_pressed: Some(false),
            trigger_value: Some(0.0),
            grip_pressed: Some(false),
            grip_value: Some(0.0),
            axis: Some(Vec2::ZERO),
            axis_click: Some(false),
        }
    }

    pub fn with_menu(mut self, pressed: bool) -> Self {
        self.menu = Some(pressed);
        self
    }

    pub fn with_trigger(mut self, pressed: bool, value: f32) -> Self {
        self.trigger_pressed = Some(pressed);
        self.trigger_value = Some(value);
        self
    }

    pub fn with_grip(mut self, pressed: bool) -> Self {
        self.grip_pressed = Some(pressed);
        self.grip_value = Some(if pressed { 1.0 } else { 0.0 });
        self
    }

    pub fn with_axis(mut self, axis: Vec2) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn with_axis_click(mut self, pressed: bool) -> Self {
        self.axis_click = Some(pressed);
        self
    }
}

/// Named device channels, used to report missing hardware features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputFeature {
    Menu,
    TriggerButton,
    TriggerValue,
    GripButton,
    GripValue,
    Axis,
    AxisClick,
}

impl InputFeature {
    pub const ALL: [InputFeature; 7] = [
        InputFeature::Menu,
        InputFeature::TriggerButton,
        InputFeature::TriggerValue,
        InputFeature::GripButton,
        InputFeature::GripValue,
        InputFeature::Axis,
        InputFeature::AxisClick,
    ];

    /// Whether this channel is present in the given sample.
    pub fn present_in(self, sample: &DeviceSample) -> bool {
        match self {
            Self::Menu => sample.menu.is_some(),
            Self::TriggerButton => sample.trigger_pressed.is_some(),
            Self::TriggerValue => sample.trigger_value.is_some(),
            Self::GripButton => sample.grip_pressed.is_some(),
            Self::GripValue => sample.grip_value.is_some(),
            Self::Axis => sample.axis.is_some(),
            Self::AxisClick => sample.axis_click.is_some(),
        }
    }
}
