//! Deterministic pixel noise.
//!
//! Sparkle patterns need a fresh random-looking value per pixel per frame,
//! but generators must stay pure functions of their frame input. The seed is
//! therefore a hash of `(phase, pixel)`, fed through 1D value noise.

/// murmur3 finalizer
const fn mix32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x85eb_ca6b);
    x ^= x >> 13;
    x = x.wrapping_mul(0xc2b2_ae35);
    x ^= x >> 16;
    x
}

/// Pseudo-random 16-bit value for one pixel of one frame.
pub const fn pixel_seed(phase: u16, pixel: usize) -> u16 {
    (mix32(((phase as u32) << 16) | (pixel as u32 & 0xFFFF)) >> 16) as u16
}

fn lattice(cell: u8) -> u8 {
    (mix32(cell as u32 ^ 0x9e37_79b9) >> 24) as u8
}

/// Smoothstep on a 0..=255 fraction.
fn ease8(t: u8) -> u8 {
    let t = t as u32;
    ((t * t * (768 - 2 * t)) >> 16) as u8
}

/// Value noise: the high byte selects a lattice cell, the low byte eases
/// between that cell and the next.
pub fn noise8(x: u16) -> u8 {
    let cell = (x >> 8) as u8;
    let a = lattice(cell) as i32;
    let b = lattice(cell.wrapping_add(1)) as i32;
    let t = ease8(x as u8) as i32;
    (a + ((b - a) * t) / 256) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_stable() {
        assert_eq!(pixel_seed(10, 3), pixel_seed(10, 3));
        assert_ne!(pixel_seed(10, 3), pixel_seed(11, 3));
        assert_ne!(pixel_seed(10, 3), pixel_seed(10, 4));
    }

    #[test]
    fn noise_hits_lattice_values_on_cell_boundaries() {
        for cell in 0..=255u8 {
            assert_eq!(noise8((cell as u16) << 8), lattice(cell));
        }
    }

    #[test]
    fn noise_is_continuous_inside_a_cell() {
        let mut last = noise8(0x1200) as i32;
        for x in 0x1201..0x1300u16 {
            let v = noise8(x) as i32;
            assert!((v - last).abs() <= 3, "jump at {x:#x}");
            last = v;
        }
    }

    #[test]
    fn sparkle_threshold_is_sometimes_crossed() {
        let lit = (0..2000usize)
            .filter(|i| noise8(pixel_seed(7, *i)) > 170)
            .count();
        assert!(lit > 0 && lit < 2000);
    }
}
