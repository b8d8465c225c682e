//! Loudness tracking: spectrum → impulse → envelope → display brightness.

use crate::spectrum::SpectrumSample;

/// Weights for bands 0..=3. Bands 4..=6 do not contribute, which biases the
/// impulse heavily towards bass and low mids.
pub const BAND_WEIGHTS: [f64; 4] = [0.3, 0.3, 2.0, 2.0];

/// Per-frame release of the upper bound and rise of the lower bound.
pub const ENVELOPE_STEP: f64 = 0.1;

/// The lower bound stops rising here.
pub const LOWER_CEILING: f64 = 1024.0 * 100.0;

/// Lower bound used for the range is never above this.
pub const LOWER_CLAMP: f64 = 100.0;

/// Ranges at or below this are treated as silence.
pub const MIN_RANGE: f64 = 50.0;

pub const CURVE_COEFF: f64 = 50.49752469;
pub const CURVE_EXPONENT: f64 = 8.930413727e-1;

pub fn impulse(bands: &SpectrumSample) -> f64 {
    bands
        .iter()
        .zip(BAND_WEIGHTS)
        .map(|(&band, weight)| band as f64 * weight)
        .sum()
}

/// Slow-moving upper and lower bounds of the impulse.
///
/// Both bounds capture a new extreme instantly and otherwise drift towards
/// each other by [`ENVELOPE_STEP`] per frame. Nothing keeps `lower <= upper`;
/// [`normalize`] relies on the [`MIN_RANGE`] guard instead.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnvelopeTracker {
    upper: f64,
    lower: f64,
}

impl EnvelopeTracker {
    pub const fn new() -> Self {
        Self {
            upper: 0.0,
            lower: 0.0,
        }
    }

    pub fn update(&mut self, impulse: f64) {
        if impulse > self.upper {
            self.upper = impulse;
        } else if self.upper > 0.0 {
            self.upper -= ENVELOPE_STEP;
        }

        if impulse < self.lower {
            self.lower = impulse;
        } else if self.lower < LOWER_CEILING {
            self.lower += ENVELOPE_STEP;
        }
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }
}

/// Position of `impulse` inside the envelope, nominally 0..=1.
pub fn normalize(envelope: &EnvelopeTracker, impulse: f64) -> f64 {
    let lower = envelope.lower().min(LOWER_CLAMP);
    let range = envelope.upper() - lower;
    if range > MIN_RANGE {
        (impulse - lower) / range
    } else {
        0.0
    }
}

/// Sub-linear curve so moderate signal already reads as bright.
///
/// A `k` at or below zero (the lower bound may sit a step above the impulse)
/// maps to the floor instead of feeding a negative base to `pow`.
pub fn compress(k: f64) -> u8 {
    let raw = if k > 0.0 {
        CURVE_COEFF * libm::pow(k, CURVE_EXPONENT)
    } else {
        0.0
    };
    raw.clamp(1.0, 255.0) as u8
}

pub fn display_brightness(envelope: &EnvelopeTracker, impulse: f64, full_brightness: bool) -> u8 {
    if full_brightness {
        255
    } else {
        compress(normalize(envelope, impulse))
    }
}

/// Owns the envelope for the lifetime of the controller.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrightnessController {
    envelope: EnvelopeTracker,
}

impl BrightnessController {
    pub const fn new() -> Self {
        Self {
            envelope: EnvelopeTracker::new(),
        }
    }

    /// Feeds one frame's spectrum and returns the brightness to render with.
    pub fn process(&mut self, bands: &SpectrumSample, full_brightness: bool) -> u8 {
        let impulse = impulse(bands);
        self.envelope.update(impulse);
        display_brightness(&self.envelope, impulse, full_brightness)
    }

    pub fn envelope(&self) -> &EnvelopeTracker {
        &self.envelope
    }
}
