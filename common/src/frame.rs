use smart_leds::{RGB8, colors};

pub const NUM_LEDS: usize = 96;
pub const HALF: usize = NUM_LEDS / 2;

/// One color per physical LED, rewritten every frame.
pub type FrameBuffer = [RGB8; NUM_LEDS];

pub const fn blank_frame() -> FrameBuffer {
    [RGB8::new(0, 0, 0); NUM_LEDS]
}

/// Folds a physical index onto a distance from the middle of the strip so
/// both halves render as mirror images.
///
/// The fold is `i` below the midpoint and `HALF - (i - HALF)` above it, so
/// LED `i` pairs with LED `NUM_LEDS - i` (LED 0 has no partner and LED
/// `HALF` maps onto itself).
pub const fn mirror_fold(i: usize) -> usize {
    if i < HALF { i } else { HALF - (i - HALF) }
}

/// Feedback shown while the button is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indicator {
    /// every 5th LED blue: release now to advance the pattern
    Advance,
    /// first 5 LEDs green: release now to leave full brightness
    ClearFullBrightness,
    /// first 5 LEDs purple: release now to force full brightness
    SetFullBrightness,
    /// first 5 LEDs red: a brightness preset was applied
    BrightnessPreset,
}

impl Indicator {
    pub fn paint(self, frame: &mut FrameBuffer) {
        let black = RGB8::new(0, 0, 0);
        for (i, led) in frame.iter_mut().enumerate() {
            *led = match self {
                Indicator::Advance if i % 5 == 0 => colors::BLUE,
                Indicator::ClearFullBrightness if i < 5 => colors::GREEN,
                Indicator::SetFullBrightness if i < 5 => colors::PURPLE,
                Indicator::BrightnessPreset if i < 5 => colors::RED,
                _ => black,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_mirrors_around_center() {
        assert_eq!(mirror_fold(0), 0);
        assert_eq!(mirror_fold(47), 47);
        assert_eq!(mirror_fold(48), 48);
        assert_eq!(mirror_fold(49), 47);
        assert_eq!(mirror_fold(95), 1);
        for i in 1..NUM_LEDS {
            assert_eq!(mirror_fold(i), mirror_fold(NUM_LEDS - i));
        }
    }

    #[test]
    fn advance_indicator_lights_every_fifth_led() {
        let mut frame = [colors::WHITE; NUM_LEDS];
        Indicator::Advance.paint(&mut frame);
        assert_eq!(frame[0], colors::BLUE);
        assert_eq!(frame[5], colors::BLUE);
        assert_eq!(frame[95], colors::BLUE);
        assert_eq!(frame[1], RGB8::default());
        assert_eq!(frame.iter().filter(|c| **c == colors::BLUE).count(), 20);
    }

    #[test]
    fn preset_indicator_lights_first_five() {
        let mut frame = [colors::WHITE; NUM_LEDS];
        Indicator::BrightnessPreset.paint(&mut frame);
        assert!(frame[..5].iter().all(|c| *c == colors::RED));
        assert!(frame[5..].iter().all(|c| *c == RGB8::default()));
    }
}
