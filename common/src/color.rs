//! Palettes and color helpers used by the pattern generators.

use smart_leds::{
    RGB8,
    hsv::{Hsv, hsv2rgb},
};

/// Scales `value` by `scale / 256`, treating 255 as identity.
#[inline]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (scale as u16 + 1)) >> 8) as u8
}

pub const fn scale_rgb(color: RGB8, scale: u8) -> RGB8 {
    RGB8::new(
        scale8(color.r, scale),
        scale8(color.g, scale),
        scale8(color.b, scale),
    )
}

/// Fully saturated HSV color at the given value.
pub fn hsv(hue: u8, sat: u8, val: u8) -> RGB8 {
    hsv2rgb(Hsv { hue, sat, val })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    /// snap to the palette entry below the index
    Stepped,
    /// interpolate between neighbouring entries
    Linear,
}

fn mix(a: RGB8, b: RGB8, toward_b: u8) -> RGB8 {
    let toward_a = 255 - toward_b;
    RGB8::new(
        scale8(a.r, toward_a).saturating_add(scale8(b.r, toward_b)),
        scale8(a.g, toward_a).saturating_add(scale8(b.g, toward_b)),
        scale8(a.b, toward_a).saturating_add(scale8(b.b, toward_b)),
    )
}

/// 16-entry palette addressed by an 8-bit index: the high nibble picks the
/// entry, the low nibble blends towards the next one (wrapping at the end).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette16(pub [RGB8; 16]);

impl Palette16 {
    pub fn color_at(&self, index: u8, brightness: u8, blend: Blend) -> RGB8 {
        let hi = (index >> 4) as usize;
        let lo = index & 0x0F;
        let mut color = self.0[hi];
        if blend == Blend::Linear && lo != 0 {
            color = mix(color, self.0[(hi + 1) % 16], lo << 4);
        }
        scale_rgb(color, brightness)
    }
}

/// 32-entry palette: high 5 bits pick the entry, low 3 bits blend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette32(pub [RGB8; 32]);

impl Palette32 {
    /// Linear ramp from `from` (entry 0) to `to` (entry 31).
    pub fn gradient2(from: RGB8, to: RGB8) -> Self {
        let mut entries = [RGB8::default(); 32];
        fill_gradient(&mut entries, from, to);
        Self(entries)
    }

    /// Two ramps meeting at entry 16.
    pub fn gradient3(from: RGB8, via: RGB8, to: RGB8) -> Self {
        let mut entries = [RGB8::default(); 32];
        fill_gradient(&mut entries[..=16], from, via);
        fill_gradient(&mut entries[16..], via, to);
        Self(entries)
    }

    pub fn color_at(&self, index: u8, brightness: u8, blend: Blend) -> RGB8 {
        let hi = (index >> 3) as usize;
        let lo = index & 0x07;
        let mut color = self.0[hi];
        if blend == Blend::Linear && lo != 0 {
            color = mix(color, self.0[(hi + 1) % 32], lo << 5);
        }
        scale_rgb(color, brightness)
    }
}

fn fill_gradient(out: &mut [RGB8], from: RGB8, to: RGB8) {
    let steps = (out.len() - 1) as i32;
    let lerp = |a: u8, b: u8, i: i32| (a as i32 + (b as i32 - a as i32) * i / steps) as u8;
    for (i, c) in out.iter_mut().enumerate() {
        let i = i as i32;
        *c = RGB8::new(lerp(from.r, to.r, i), lerp(from.g, to.g, i), lerp(from.b, to.b, i));
    }
}

const fn rgb(hex: u32) -> RGB8 {
    RGB8::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

pub const RAINBOW: Palette16 = Palette16([
    rgb(0xFF0000),
    rgb(0xD52A00),
    rgb(0xAB5500),
    rgb(0xAB7F00),
    rgb(0xABAB00),
    rgb(0x56D500),
    rgb(0x00FF00),
    rgb(0x00D52A),
    rgb(0x00AB55),
    rgb(0x0056AA),
    rgb(0x0000FF),
    rgb(0x2A00D5),
    rgb(0x5500AB),
    rgb(0x7F0081),
    rgb(0xAB0055),
    rgb(0xD5002B),
]);

#[cfg(test)]
mod tests {
    use super::*;
    use smart_leds::colors;

    #[test]
    fn scale8_bounds() {
        assert_eq!(scale8(200, 255), 200);
        assert_eq!(scale8(200, 0), 0);
        assert_eq!(scale8(255, 127), 127);
    }

    #[test]
    fn rainbow_entries_and_blend() {
        assert_eq!(RAINBOW.color_at(0, 255, Blend::Linear), rgb(0xFF0000));
        assert_eq!(RAINBOW.color_at(0xA0, 255, Blend::Linear), rgb(0x0000FF));
        // halfway between red and orange-red
        let mid = RAINBOW.color_at(0x08, 255, Blend::Linear);
        assert!(mid.r < 0xFF && mid.r > 0xD5);
        assert!(mid.g > 0 && mid.g < 0x2A);
        // stepped ignores the low nibble
        assert_eq!(RAINBOW.color_at(0x0F, 255, Blend::Stepped), rgb(0xFF0000));
    }

    #[test]
    fn last_entry_blends_into_first() {
        let c = RAINBOW.color_at(0xF8, 255, Blend::Linear);
        assert!(c.r > 0xD5);
        assert!(c.b < 0x2B);
    }

    #[test]
    fn gradient_endpoints() {
        let p = Palette32::gradient2(colors::BLUE, colors::YELLOW);
        assert_eq!(p.0[0], colors::BLUE);
        assert_eq!(p.0[31], colors::YELLOW);

        let p = Palette32::gradient3(colors::PURPLE, colors::BLACK, colors::BLACK);
        assert_eq!(p.0[0], colors::PURPLE);
        assert_eq!(p.0[16], colors::BLACK);
        assert!(p.0[17..].iter().all(|c| *c == colors::BLACK));
        assert!(p.0[8].r > 0 && p.0[8].r < colors::PURPLE.r);
    }

    #[test]
    fn brightness_zero_is_black() {
        let p = Palette32::gradient2(colors::BLUE, colors::YELLOW);
        for i in 0..=255u8 {
            assert_eq!(p.color_at(i, 0, Blend::Linear), RGB8::default());
        }
    }
}
