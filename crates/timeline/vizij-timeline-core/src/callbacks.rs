//! Lifecycle callbacks stored on nodes.

use std::fmt;

use crate::outputs::{EventKind, NodeEvent};

/// Boxed lifecycle hook. Invoked synchronously inside the render call that
/// raised the event.
pub type Callback = Box<dyn FnMut(&NodeEvent)>;

/// Which callback slot an event maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Start,
    Update,
    Complete,
    Repeat,
    ReverseComplete,
    Interrupt,
}

impl From<EventKind> for CallbackKind {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Start => CallbackKind::Start,
            EventKind::Update => CallbackKind::Update,
            EventKind::Complete => CallbackKind::Complete,
            EventKind::Repeat { .. } => CallbackKind::Repeat,
            EventKind::ReverseComplete => CallbackKind::ReverseComplete,
            EventKind::Interrupt => CallbackKind::Interrupt,
        }
    }
}

#[derive(Default)]
pub struct Callbacks {
    pub(crate) on_start: Option<Callback>,
    pub(crate) on_update: Option<Callback>,
    pub(crate) on_complete: Option<Callback>,
    pub(crate) on_repeat: Option<Callback>,
    pub(crate) on_reverse_complete: Option<Callback>,
    pub(crate) on_interrupt: Option<Callback>,
}

impl Callbacks {
    pub(crate) fn slot_mut(&mut self, kind: CallbackKind) -> &mut Option<Callback> {
        match kind {
            CallbackKind::Start => &mut self.on_start,
            CallbackKind::Update => &mut self.on_update,
            CallbackKind::Complete => &mut self.on_complete,
            CallbackKind::Repeat => &mut self.on_repeat,
            CallbackKind::ReverseComplete => &mut self.on_reverse_complete,
            CallbackKind::Interrupt => &mut self.on_interrupt,
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_repeat", &self.on_repeat.is_some())
            .field("on_reverse_complete", &self.on_reverse_complete.is_some())
            .field("on_interrupt", &self.on_interrupt.is_some())
            .finish()
    }
}

/// Builder setters for every lifecycle hook on a vars type with a
/// `callbacks: Callbacks` field.
macro_rules! callback_setters {
    ($ty:ty) => {
        impl $ty {
            pub fn on_start(mut self, f: impl FnMut(&$crate::NodeEvent) + 'static) -> Self {
                self.callbacks.on_start = Some(Box::new(f));
                self
            }

            pub fn on_update(mut self, f: impl FnMut(&$crate::NodeEvent) + 'static) -> Self {
                self.callbacks.on_update = Some(Box::new(f));
                self
            }

            pub fn on_complete(mut self, f: impl FnMut(&$crate::NodeEvent) + 'static) -> Self {
                self.callbacks.on_complete = Some(Box::new(f));
                self
            }

            pub fn on_repeat(mut self, f: impl FnMut(&$crate::NodeEvent) + 'static) -> Self {
                self.callbacks.on_repeat = Some(Box::new(f));
                self
            }

            pub fn on_reverse_complete(
                mut self,
                f: impl FnMut(&$crate::NodeEvent) + 'static,
            ) -> Self {
                self.callbacks.on_reverse_complete = Some(Box::new(f));
                self
            }

            pub fn on_interrupt(mut self, f: impl FnMut(&$crate::NodeEvent) + 'static) -> Self {
                self.callbacks.on_interrupt = Some(Box::new(f));
                self
            }
        }
    };
}

pub(crate) use callback_setters;
