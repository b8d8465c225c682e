//! Single-button hold-duration state machine.
//!
//! The button is sampled once per frame. While it is down, the time since
//! the press started selects what the LEDs show (and, past 2 s, applies a
//! brightness preset right away). When it comes back up, the hold time
//! measured on that frame decides which queued action fires.

use anyhow::Result;
use embedded_hal::digital::InputPin;

use crate::error_with_location;
use crate::frame::Indicator;
use crate::presets::{
    ADVANCE_MAX_MS, CLEAR_FULL_MAX_MS, HOLD_FEEDBACK_MS, SET_FULL_MAX_MS, brightness_preset,
};
use crate::time::Millis;

pub trait Button {
    fn is_pressed(&mut self) -> Result<bool>;
}

/// Button wired so that a pressed button reads high.
pub struct ActiveHighButton<P>(pub P);

impl<P: InputPin> Button for ActiveHighButton<P> {
    fn is_pressed(&mut self) -> Result<bool> {
        self.0
            .is_high()
            .map_err(|err| error_with_location!("Failed to read button: {:?}", err))
    }
}

/// What a held button currently means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldAction {
    /// too short to show anything yet
    Pending,
    Advance,
    ClearFullBrightness,
    SetFullBrightness,
    /// `changed` is true on the first frame this level is reached in the
    /// current press
    Brightness { level: u8, changed: bool },
}

impl HoldAction {
    pub fn indicator(self) -> Option<Indicator> {
        match self {
            HoldAction::Pending => None,
            HoldAction::Advance => Some(Indicator::Advance),
            HoldAction::ClearFullBrightness => Some(Indicator::ClearFullBrightness),
            HoldAction::SetFullBrightness => Some(Indicator::SetFullBrightness),
            HoldAction::Brightness { .. } => Some(Indicator::BrightnessPreset),
        }
    }
}

/// Action queued by a hold, fired on release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseAction {
    None,
    AdvancePattern,
    ClearFullBrightness,
    SetFullBrightness,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// button up, and it was already up last frame
    Idle,
    /// first frame the button reads down
    Pressed,
    Held { held_ms: u16, action: HoldAction },
    Released { held_ms: u16, action: ReleaseAction },
}

impl InputEvent {
    /// Frames on which the pattern is rendered and audio is sampled.
    pub fn is_button_up(&self) -> bool {
        matches!(self, InputEvent::Idle | InputEvent::Released { .. })
    }
}

pub fn release_action(held_ms: u16) -> ReleaseAction {
    if held_ms <= HOLD_FEEDBACK_MS {
        ReleaseAction::None
    } else if held_ms <= ADVANCE_MAX_MS {
        ReleaseAction::AdvancePattern
    } else if held_ms <= CLEAR_FULL_MAX_MS {
        ReleaseAction::ClearFullBrightness
    } else if held_ms <= SET_FULL_MAX_MS {
        ReleaseAction::SetFullBrightness
    } else {
        ReleaseAction::None
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HoldStateMachine {
    down_since: Option<Millis>,
    applied_level: Option<u8>,
}

impl HoldStateMachine {
    pub const fn new() -> Self {
        Self {
            down_since: None,
            applied_level: None,
        }
    }

    pub fn down_since(&self) -> Option<Millis> {
        self.down_since
    }

    /// Forgets the preset applied during this press so the next held frame
    /// reports it as changed again.
    pub fn retry_preset(&mut self) {
        self.applied_level = None;
    }

    /// Advances the machine by one frame.
    ///
    /// Hold times wrap with the 16-bit clock: a hold longer than ~65.5 s
    /// reads as a short one again.
    pub fn update(&mut self, now: Millis, pressed: bool) -> InputEvent {
        if !pressed {
            return match self.down_since.take() {
                Some(since) => {
                    let held_ms = now.wrapping_since(since);
                    InputEvent::Released {
                        held_ms,
                        action: release_action(held_ms),
                    }
                }
                None => InputEvent::Idle,
            };
        }

        let Some(since) = self.down_since else {
            self.down_since = Some(now);
            self.applied_level = None;
            return InputEvent::Pressed;
        };

        let held_ms = now.wrapping_since(since);
        let action = if let Some(level) = brightness_preset(held_ms) {
            let changed = self.applied_level != Some(level);
            self.applied_level = Some(level);
            HoldAction::Brightness { level, changed }
        } else if held_ms > CLEAR_FULL_MAX_MS {
            HoldAction::SetFullBrightness
        } else if held_ms > ADVANCE_MAX_MS {
            HoldAction::ClearFullBrightness
        } else if held_ms > HOLD_FEEDBACK_MS {
            HoldAction::Advance
        } else {
            HoldAction::Pending
        };
        InputEvent::Held { held_ms, action }
    }
}
