//! The per-frame control loop body.
//!
//! One [`FrameScheduler::tick`] per frame: read the button, either show hold
//! feedback or sample audio and render the active pattern, apply whatever the
//! button asked for (persisting it on the spot), then flush the frame.

use anyhow::Result;
use log::{debug, info};

use crate::config::{Config, ConfigStore, PersistentConfig};
use crate::envelope::BrightnessController;
use crate::frame::{FrameBuffer, blank_frame};
use crate::input::{Button, HoldAction, HoldStateMachine, InputEvent, ReleaseAction};
use crate::patterns::{CATALOG, Pattern, RenderInput, UPDATES_PER_SECOND, next_index};
use crate::sink::FrameSink;
use crate::spectrum::SpectrumSource;
use crate::time::Millis;

/// Length of one frame at [`UPDATES_PER_SECOND`].
pub const FRAME_PERIOD_US: u64 = 1_000_000 / UPDATES_PER_SECOND as u64;

/// Sleep left in the frame budget after `work_us` of sampling, rendering,
/// persisting and flushing.
pub fn frame_delay_us(work_us: u64) -> u64 {
    FRAME_PERIOD_US.saturating_sub(work_us)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SchedulerOptions {
    /// Move on to the next pattern when the current one reports done.
    /// Off by default: patterns only change on a button press.
    pub auto_advance: bool,
}

/// Everything that changes from frame to frame, apart from the config.
#[derive(Clone, Debug)]
pub struct ControllerState {
    pub frame: FrameBuffer,
    pub phase: u16,
    pub pattern_started: Millis,
    pub brightness: BrightnessController,
    pub input: HoldStateMachine,
}

impl ControllerState {
    pub const fn new(now: Millis) -> Self {
        Self {
            frame: blank_frame(),
            phase: 0,
            pattern_started: now,
            brightness: BrightnessController::new(),
            input: HoldStateMachine::new(),
        }
    }
}

/// What the last tick did, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub event: InputEvent,
    /// brightness the pattern was rendered with, if one was rendered
    pub rendered_brightness: Option<u8>,
    /// the pattern reported that its run time is over
    pub pattern_done: bool,
}

pub struct FrameScheduler<B, A, K, C> {
    button: B,
    audio: A,
    sink: K,
    config: PersistentConfig<C>,
    state: ControllerState,
    options: SchedulerOptions,
}

impl<B, A, K, C> FrameScheduler<B, A, K, C>
where
    B: Button,
    A: SpectrumSource,
    K: FrameSink,
    C: ConfigStore,
{
    /// Loads the persisted config and blanks the strip.
    pub fn start(
        button: B,
        audio: A,
        mut sink: K,
        store: C,
        options: SchedulerOptions,
        now: Millis,
    ) -> Result<Self> {
        let config = PersistentConfig::load(store, CATALOG.len());
        let state = ControllerState::new(now);
        sink.show(&state.frame, config.get().brightness)?;
        info!(
            "Starting with pattern {:?}",
            Pattern::from_index(config.get().program_index)
        );
        Ok(Self {
            button,
            audio,
            sink,
            config,
            state,
            options,
        })
    }

    pub fn config(&self) -> &Config {
        self.config.get()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn store(&self) -> &C {
        self.config.store()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn tick(&mut self, now: Millis) -> Result<TickReport> {
        let pressed = self.button.is_pressed()?;
        let event = self.state.input.update(now, pressed);

        let mut report = TickReport {
            event,
            rendered_brightness: None,
            pattern_done: false,
        };

        let mut render_error = None;
        match event {
            InputEvent::Pressed => {}
            InputEvent::Held { action, .. } => self.show_hold(action)?,
            InputEvent::Idle | InputEvent::Released { .. } => {
                // the press is already consumed, so its action is applied
                // even when this frame fails to render
                let rendered = self.render(now);
                if let InputEvent::Released { action, held_ms } = event {
                    debug!("Button released after {held_ms} ms: {action:?}");
                    self.apply_release(action, now)?;
                }
                match rendered {
                    Ok((brightness, done)) => {
                        report.rendered_brightness = Some(brightness);
                        report.pattern_done = done;
                        if done && self.options.auto_advance && event == InputEvent::Idle {
                            self.advance_pattern(now)?;
                        }
                    }
                    Err(err) => render_error = Some(err),
                }
            }
        }

        self.sink.show(&self.state.frame, self.config.get().brightness)?;
        match render_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    fn show_hold(&mut self, action: HoldAction) -> Result<()> {
        if let HoldAction::Brightness {
            level,
            changed: true,
        } = action
        {
            info!("Brightness preset {level}");
            if let Err(err) = self.config.set_brightness(level) {
                self.state.input.retry_preset();
                return Err(err);
            }
        }
        if let Some(indicator) = action.indicator() {
            indicator.paint(&mut self.state.frame);
        }
        Ok(())
    }

    fn render(&mut self, now: Millis) -> Result<(u8, bool)> {
        let spectrum = self.audio.sample()?;
        let config = self.config.get();
        let brightness = self
            .state
            .brightness
            .process(&spectrum, config.full_brightness);

        let input = RenderInput {
            phase: self.state.phase,
            elapsed_ms: now.wrapping_since(self.state.pattern_started),
            brightness,
            spectrum: &spectrum,
        };
        let done = Pattern::from_index(config.program_index).render(&mut self.state.frame, &input);
        self.state.phase = self.state.phase.wrapping_add(1);
        Ok((brightness, done))
    }

    fn apply_release(&mut self, action: ReleaseAction, now: Millis) -> Result<()> {
        match action {
            ReleaseAction::None => Ok(()),
            ReleaseAction::AdvancePattern => self.advance_pattern(now),
            ReleaseAction::ClearFullBrightness => {
                info!("Full brightness off");
                self.config.set_full_brightness(false)
            }
            ReleaseAction::SetFullBrightness => {
                info!("Full brightness on");
                self.config.set_full_brightness(true)
            }
        }
    }

    fn advance_pattern(&mut self, now: Millis) -> Result<()> {
        let next = next_index(self.config.get().program_index);
        self.state.phase = 0;
        self.state.pattern_started = now;
        info!("Switching to pattern {:?}", Pattern::from_index(next));
        self.config.set_program_index(next)
    }
}
