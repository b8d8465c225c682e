//! 16-bit wrapping millisecond timestamps.
//!
//! The frame loop only ever needs short durations (hold times of a few
//! seconds, pattern ages of up to a minute), so timestamps are kept in a
//! `u16` that rolls over every 65.536 s. Every duration is computed with
//! `wrapping_sub`, which stays correct across a rollover as long as the two
//! instants are less than one rollover window apart.

/// Milliseconds since boot, truncated to 16 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Millis(pub u16);

impl Millis {
    /// Truncates a monotonic millisecond counter.
    pub const fn from_ticks(ms: u64) -> Self {
        Self(ms as u16)
    }

    /// Milliseconds elapsed from `earlier` to `self`, modulo 2^16.
    pub const fn wrapping_since(self, earlier: Millis) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn wrapping_add(self, ms: u16) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}
