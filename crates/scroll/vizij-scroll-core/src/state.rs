//! Region state machine and the per-crossing toggle actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vizij_timeline_core::{Engine, NodeId, TimelineResult};

use crate::error::ScrollError;

/// Where the scroll position sits relative to a region's `[start, end)` window.
///
/// `Entering` and `Leaving` last for a single update: the first in-window
/// update after crossing `start` forward (or `end` backward). The next
/// in-window update settles to `Active`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollState {
    #[default]
    Before,
    Entering,
    Active,
    Leaving,
    After,
}

impl ScrollState {
    #[inline]
    pub fn is_inside(self) -> bool {
        matches!(
            self,
            ScrollState::Entering | ScrollState::Active | ScrollState::Leaving
        )
    }

    pub(crate) fn next(self, scroll: f64, start: f64, end: f64) -> ScrollState {
        if scroll < start {
            ScrollState::Before
        } else if scroll >= end {
            ScrollState::After
        } else {
            match self {
                ScrollState::Before => ScrollState::Entering,
                ScrollState::After => ScrollState::Leaving,
                _ => ScrollState::Active,
            }
        }
    }
}

/// Boundary crossings, in the order they happen for one update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossing {
    Enter,
    Leave,
    EnterBack,
    LeaveBack,
}

impl Crossing {
    /// Crossings between two states. Jumping over the whole window yields two.
    pub(crate) fn between(from: ScrollState, to: ScrollState) -> &'static [Crossing] {
        use ScrollState::*;
        match (from, to) {
            (Before, After) => &[Crossing::Enter, Crossing::Leave],
            (After, Before) => &[Crossing::EnterBack, Crossing::LeaveBack],
            (Before, t) if t.is_inside() => &[Crossing::Enter],
            (After, t) if t.is_inside() => &[Crossing::EnterBack],
            (f, After) if f.is_inside() => &[Crossing::Leave],
            (f, Before) if f.is_inside() => &[Crossing::LeaveBack],
            _ => &[],
        }
    }

    #[inline]
    pub fn activates(self) -> bool {
        matches!(self, Crossing::Enter | Crossing::EnterBack)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleAction {
    Play,
    Pause,
    Resume,
    Reverse,
    Restart,
    /// Pause and rewind to the beginning.
    Reset,
    /// Jump to the end and pause.
    Complete,
    #[default]
    None,
}

impl ToggleAction {
    pub fn apply(self, engine: &mut Engine, node: NodeId) -> TimelineResult<()> {
        match self {
            ToggleAction::Play => engine.play(node),
            ToggleAction::Pause => engine.pause(node),
            ToggleAction::Resume => engine.resume(node),
            ToggleAction::Reverse => engine.reverse(node),
            ToggleAction::Restart => engine.restart(node, true),
            ToggleAction::Reset => {
                engine.pause(node)?;
                engine.seek(node, 0.0, true)
            }
            ToggleAction::Complete => {
                engine.pause(node)?;
                engine.set_total_progress(node, 1.0, false)
            }
            ToggleAction::None => Ok(()),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ToggleAction::Play => "play",
            ToggleAction::Pause => "pause",
            ToggleAction::Resume => "resume",
            ToggleAction::Reverse => "reverse",
            ToggleAction::Restart => "restart",
            ToggleAction::Reset => "reset",
            ToggleAction::Complete => "complete",
            ToggleAction::None => "none",
        }
    }
}

impl FromStr for ToggleAction {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "play" => ToggleAction::Play,
            "pause" => ToggleAction::Pause,
            "resume" => ToggleAction::Resume,
            "reverse" => ToggleAction::Reverse,
            "restart" => ToggleAction::Restart,
            "reset" => ToggleAction::Reset,
            "complete" => ToggleAction::Complete,
            "none" => ToggleAction::None,
            other => {
                return Err(ScrollError::InvalidToggleActions {
                    input: s.to_string(),
                    reason: format!("unknown action {other:?}"),
                })
            }
        })
    }
}

/// One action per crossing, written `"onEnter onLeave onEnterBack onLeaveBack"`
/// as in `"play none none reverse"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleActions {
    pub enter: ToggleAction,
    pub leave: ToggleAction,
    pub enter_back: ToggleAction,
    pub leave_back: ToggleAction,
}

impl Default for ToggleActions {
    fn default() -> Self {
        Self {
            enter: ToggleAction::Play,
            leave: ToggleAction::None,
            enter_back: ToggleAction::None,
            leave_back: ToggleAction::None,
        }
    }
}

impl ToggleActions {
    pub fn for_crossing(&self, crossing: Crossing) -> ToggleAction {
        match crossing {
            Crossing::Enter => self.enter,
            Crossing::Leave => self.leave,
            Crossing::EnterBack => self.enter_back,
            Crossing::LeaveBack => self.leave_back,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = ScrollError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = input.split_whitespace().collect();
        let [enter, leave, enter_back, leave_back] = words.as_slice() else {
            return Err(ScrollError::InvalidToggleActions {
                input: input.to_string(),
                reason: format!("expected 4 actions, got {}", words.len()),
            });
        };
        Ok(Self {
            enter: enter.parse()?,
            leave: leave.parse()?,
            enter_back: enter_back.parse()?,
            leave_back: leave_back.parse()?,
        })
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.enter.name(),
            self.leave.name(),
            self.enter_back.name(),
            self.leave_back.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_states_settle() {
        let s = ScrollState::Before.next(150.0, 100.0, 300.0);
        assert_eq!(s, ScrollState::Entering);
        assert_eq!(s.next(160.0, 100.0, 300.0), ScrollState::Active);
        let s = ScrollState::After.next(250.0, 100.0, 300.0);
        assert_eq!(s, ScrollState::Leaving);
        assert_eq!(s.next(240.0, 100.0, 300.0), ScrollState::Active);
        assert_eq!(ScrollState::Active.next(300.0, 100.0, 300.0), ScrollState::After);
        assert_eq!(ScrollState::Active.next(99.0, 100.0, 300.0), ScrollState::Before);
    }

    #[test]
    fn crossings() {
        use ScrollState::*;
        assert_eq!(Crossing::between(Before, Entering), &[Crossing::Enter]);
        assert_eq!(Crossing::between(Active, After), &[Crossing::Leave]);
        assert_eq!(Crossing::between(After, Leaving), &[Crossing::EnterBack]);
        assert_eq!(Crossing::between(Active, Before), &[Crossing::LeaveBack]);
        assert_eq!(
            Crossing::between(Before, After),
            &[Crossing::Enter, Crossing::Leave]
        );
        assert!(Crossing::between(Entering, Active).is_empty());
    }

    #[test]
    fn toggle_actions_parse() {
        let actions: ToggleActions = "play pause resume reverse".parse().unwrap();
        assert_eq!(actions.enter, ToggleAction::Play);
        assert_eq!(actions.leave_back, ToggleAction::Reverse);
        assert_eq!(actions.to_string(), "play pause resume reverse");
        assert!("play none".parse::<ToggleActions>().is_err());
        assert!("play none none spin".parse::<ToggleActions>().is_err());
    }
}
