//! Audio-reactive LED bar controller logic.
//!
//! Everything here is hardware-agnostic: the firmware hands in pins, an ADC
//! channel, a flash region and an LED writer through the traits in
//! [`spectrum`], [`input`], [`config`] and [`sink`], and drives
//! [`scheduler::FrameScheduler::tick`] at a fixed rate.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod color;
pub mod config;
pub mod envelope;
pub mod frame;
pub mod input;
pub mod noise;
pub mod patterns;
pub mod presets;
pub mod scheduler;
pub mod sink;
pub mod spectrum;
pub mod time;
pub mod util;
