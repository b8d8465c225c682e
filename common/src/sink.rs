use anyhow::Result;
use smart_leds::{RGB8, SmartLedsWrite, brightness};

use crate::color::scale8;
use crate::error_with_location;
use crate::frame::FrameBuffer;

/// Where finished frames go. `show` blocks until the strip has latched.
pub trait FrameSink {
    fn show(&mut self, frame: &FrameBuffer, brightness: u8) -> Result<()>;
}

/// Per-channel white balance for common 5050 strips.
pub const TYPICAL_LED_STRIP: RGB8 = RGB8::new(255, 176, 240);
pub const UNCORRECTED: RGB8 = RGB8::new(255, 255, 255);

/// Applies the global brightness and color correction, then hands the frame
/// to any `smart-leds` writer.
pub struct LedStrip<W> {
    writer: W,
    correction: RGB8,
}

impl<W> LedStrip<W>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            correction: UNCORRECTED,
        }
    }

    pub fn with_correction(mut self, correction: RGB8) -> Self {
        self.correction = correction;
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W> FrameSink for LedStrip<W>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    fn show(&mut self, frame: &FrameBuffer, level: u8) -> Result<()> {
        let correction = self.correction;
        let pixels = brightness(frame.iter().copied(), level).map(|c| {
            RGB8::new(
                scale8(c.r, correction.r),
                scale8(c.g, correction.g),
                scale8(c.b, correction.b),
            )
        });
        self.writer
            .write(pixels)
            .map_err(|err| error_with_location!("Failed to write to LED strip: {:?}", err))
    }
}
