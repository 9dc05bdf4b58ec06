use glam::Vec2;

/// A discrete semantic transition raised by a hand's input sampler.
///
/// Modes and the coordinator consume these, never raw device channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandEvent {
    MenuPressed,
    MenuReleased,
    /// Trigger pressed past the upper select threshold.
    SelectBegin,
    /// Trigger dropped below the lower select threshold.
    SelectComplete,
    GrabBegin,
    GrabComplete,
    /// Axis left the idle tolerance band.
    NavigateBegin,
    /// Axis returned inside the idle tolerance band.
    NavigateComplete,
    NavigatePressBegin,
    NavigatePressComplete,
}

/// The events raised by one sample, in channel order (menu, select, grab, navigate, press).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandEvents {
    events: Vec<HandEvent>,
}

impl HandEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: HandEvent) {
        self.events.push(event);
    }

    pub fn contains(&self, event: HandEvent) -> bool {
        self.events.contains(&event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn as_slice(&self) -> &[HandEvent] {
        &self.events
    }
}

impl<'a> IntoIterator for &'a HandEvents {
    type Item = &'a HandEvent;
    type IntoIter = std::slice::Iter<'a, HandEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<HandEvent> for HandEvents {
    fn from_iter<I: IntoIterator<Item = HandEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

/// Continuous levels of a hand after the latest sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandState {
    pub menu_held: bool,
    pub selecting: bool,
    pub grabbing: bool,
    pub navigating: bool,
    pub navigate_pressed: bool,
    pub select_value: f32,
    pub grab_value: f32,
    pub navigate_value: Vec2,
}
