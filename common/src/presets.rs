//! Hold-time thresholds and the brightness presets they select.
//!
//! All bounds are exclusive lower bounds: a hold of exactly 1000 ms is
//! still in the advance window, 1001 ms is in the next one.

/// Below this a press shows nothing.
pub const HOLD_FEEDBACK_MS: u16 = 30;
/// Release at or below this advances the pattern.
pub const ADVANCE_MAX_MS: u16 = 1000;
/// Release at or below this clears full brightness.
pub const CLEAR_FULL_MAX_MS: u16 = 1500;
/// Release at or below this sets full brightness.
pub const SET_FULL_MAX_MS: u16 = 2000;

/// `(held longer than, brightness)`, longest hold first.
pub const BRIGHTNESS_PRESETS: [(u16, u8); 6] = [
    (4500, 255),
    (4000, 180),
    (3500, 100),
    (3000, 80),
    (2500, 50),
    (2000, 20),
];

/// Brightness preset selected by a hold of `held_ms`, if any.
pub fn brightness_preset(held_ms: u16) -> Option<u8> {
    BRIGHTNESS_PRESETS
        .iter()
        .find(|(threshold, _)| held_ms > *threshold)
        .map(|&(_, level)| level)
}
