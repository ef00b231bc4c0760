//! DSP core for the triad keyboard module.
//!
//! Everything that turns published control state into 8-bit audio samples
//! lives here: the pitch step tables, the sine lookup table, the
//! phase-accumulator tone generator with its three-voice time multiplexer
//! and joystick square wave, and the Schroeder reverberator.
//!
//! The crate is `no_std` and allocation-free so the whole pipeline can be
//! exercised by host tests; the firmware crate owns the hardware side
//! (buffers, semaphores, the sample interrupt) and calls in here once per
//! 220-byte buffer fill.
//!
//! # Crate Features
//!
//! - **`defmt`** — structured logging support via [`defmt`] derives on the
//!   public types.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod engine;
pub mod pitch;
pub mod reverb;
pub mod tables;

pub use engine::{Controls, ToneGenerator, Waveform, BUFFER_LEN, SAMPLE_RATE_HZ};
pub use pitch::Note;
pub use reverb::Reverb;
pub use tables::SineTable;
