//! Procedural patterns and the fixed catalog the button cycles through.
//!
//! A pattern is a pure function of its [`RenderInput`]: it overwrites every
//! LED of the frame and reports whether it has been showing long enough to
//! hand over to the next one.

use smart_leds::{RGB8, colors};

use crate::color::{Blend, Palette32, RAINBOW, hsv};
use crate::frame::{FrameBuffer, NUM_LEDS, mirror_fold};
use crate::noise::{noise8, pixel_seed};
use crate::spectrum::{SPECTRUM_BANDS, SpectrumSample};

pub const UPDATES_PER_SECOND: u16 = 200;

/// Phase ticks per bar step, a fifth of a second.
const BAR_STEP: u16 = UPDATES_PER_SECOND / 5;

const SHORT_RUN_MS: u16 = 30_000;
const LONG_RUN_MS: u16 = 60_000;

/// Sparkle pixels light up above this noise value.
const NOISE_THRESHOLD: u8 = 170;

/// LEDs per spectrum band in [`Pattern::SpectrumBars`].
const BAND_WIDTH: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct RenderInput<'a> {
    /// frames since the pattern became active, wrapping
    pub phase: u16,
    /// milliseconds since the pattern became active, wrapping
    pub elapsed_ms: u16,
    pub brightness: u8,
    pub spectrum: &'a SpectrumSample,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// wide amber bars marching outwards from the middle
    CyclicalBarsWide,
    /// narrow yellow-green bars marching outwards from the middle
    CyclicalBars,
    BlueNoise,
    RotatingPurple,
    PlainColor,
    BlueYellow,
    RainbowCircle,
    Rainbow,
    RainbowSlow,
    /// one 8-LED meter per spectrum band
    SpectrumBars,
}

#[cfg(not(feature = "extended-catalog"))]
pub const CATALOG: &[Pattern] = &[
    Pattern::CyclicalBarsWide,
    Pattern::CyclicalBars,
    Pattern::BlueNoise,
    Pattern::RotatingPurple,
    Pattern::PlainColor,
    Pattern::BlueYellow,
    Pattern::RainbowCircle,
    Pattern::Rainbow,
];

#[cfg(feature = "extended-catalog")]
pub const CATALOG: &[Pattern] = &[
    Pattern::CyclicalBarsWide,
    Pattern::CyclicalBars,
    Pattern::BlueNoise,
    Pattern::RotatingPurple,
    Pattern::PlainColor,
    Pattern::BlueYellow,
    Pattern::RainbowCircle,
    Pattern::Rainbow,
    Pattern::RainbowSlow,
    Pattern::SpectrumBars,
];

/// Catalog entry after `index`, wrapping to the start.
pub fn next_index(index: u8) -> u8 {
    let next = index as usize + 1;
    if next >= CATALOG.len() { 0 } else { next as u8 }
}

impl Pattern {
    /// Catalog entry at `index`, first entry if out of range.
    pub fn from_index(index: u8) -> Pattern {
        CATALOG.get(index as usize).copied().unwrap_or(CATALOG[0])
    }

    /// How long the pattern wants to run before it reports done.
    pub fn run_time_ms(self) -> Option<u16> {
        match self {
            Pattern::Rainbow | Pattern::RainbowSlow => Some(LONG_RUN_MS),
            Pattern::SpectrumBars => None,
            _ => Some(SHORT_RUN_MS),
        }
    }

    /// Paints `frame` and returns true once the run time is exceeded.
    pub fn render(self, frame: &mut FrameBuffer, input: &RenderInput) -> bool {
        let RenderInput {
            phase, brightness, ..
        } = *input;

        match self {
            Pattern::CyclicalBarsWide => cyclical_bars(frame, phase, brightness, 30, 16),
            Pattern::CyclicalBars => cyclical_bars(frame, phase, brightness, 70, 5),
            Pattern::BlueNoise => {
                for (i, led) in frame.iter_mut().enumerate() {
                    let lit = noise8(pixel_seed(phase, i)) > NOISE_THRESHOLD;
                    *led = hsv(160, 255, if lit { brightness } else { 0 });
                }
            }
            Pattern::RotatingPurple => {
                let palette = Palette32::gradient3(colors::PURPLE, colors::BLACK, colors::BLACK);
                let index = phase.wrapping_mul(2) as u8;
                folded_sweep(frame, &palette, brightness, index, 10, Blend::Stepped);
            }
            Pattern::PlainColor => frame.fill(hsv(200, 255, brightness)),
            Pattern::BlueYellow => {
                let palette = Palette32::gradient2(colors::BLUE, colors::YELLOW);
                let index = phase.wrapping_mul(2) as u8;
                folded_sweep(frame, &palette, brightness, index, 10, Blend::Linear);
            }
            Pattern::RainbowCircle => {
                for (i, led) in frame.iter_mut().enumerate() {
                    // 40 LEDs per trip around the color wheel
                    let k = ((i % 40) as f32 * 6.4) as u8;
                    let index = (phase as u8).wrapping_add(k);
                    *led = RAINBOW.color_at(index, brightness, Blend::Linear);
                }
            }
            Pattern::Rainbow => {
                let index = phase.wrapping_mul(2) as u8;
                frame.fill(RAINBOW.color_at(index, brightness, Blend::Linear));
            }
            Pattern::RainbowSlow => {
                frame.fill(RAINBOW.color_at((phase / 2) as u8, brightness, Blend::Linear));
            }
            Pattern::SpectrumBars => spectrum_bars(frame, input.spectrum),
        }

        match self.run_time_ms() {
            Some(limit) => input.elapsed_ms > limit,
            None => false,
        }
    }
}

/// Bars of `width` folded LEDs, every third one lit, stepping every
/// [`BAR_STEP`] frames.
fn cyclical_bars(frame: &mut FrameBuffer, phase: u16, brightness: u8, hue: u8, width: usize) {
    let step = (phase / BAR_STEP) as usize;
    for (i, led) in frame.iter_mut().enumerate() {
        let k = mirror_fold(i);
        let lit = (k / width + step) % 3 == 0;
        *led = hsv(hue, 255, if lit { brightness } else { 0 });
    }
}

/// Palette lookup at `index + k * offset` with `k` the folded position.
fn folded_sweep(
    frame: &mut FrameBuffer,
    palette: &Palette32,
    brightness: u8,
    index: u8,
    offset: u8,
    blend: Blend,
) {
    for (i, led) in frame.iter_mut().enumerate() {
        let k = mirror_fold(i) as u8;
        *led = palette.color_at(index.wrapping_add(k.wrapping_mul(offset)), brightness, blend);
    }
}

/// Groups of [`BAND_WIDTH`] LEDs, one per band, filled in serpentine order
/// (even bands run forward, odd bands backward). LED `k` of a group lights
/// fully once the band passes `(k + 1) * 128` and partially between `k *
/// 128` and that. LEDs past the last group stay dark.
fn spectrum_bars(frame: &mut FrameBuffer, spectrum: &SpectrumSample) {
    frame.fill(RGB8::default());
    for (i, led) in frame.iter_mut().enumerate().take(BAND_WIDTH * SPECTRUM_BANDS) {
        let band = i / BAND_WIDTH;
        let offset = i % BAND_WIDTH;
        let k = (if band % 2 == 0 {
            offset
        } else {
            BAND_WIDTH - 1 - offset
        }) as u32;
        let amplitude = spectrum[band] as u32;
        let value = if amplitude >= (k + 1) * 128 {
            255
        } else if amplitude > k * 128 {
            ((amplitude - k * 128) * 255 / 128) as u8
        } else {
            0
        };
        *led = hsv(30, 255, value);
    }
}

const _: () = assert!(BAND_WIDTH * SPECTRUM_BANDS <= NUM_LEDS);
