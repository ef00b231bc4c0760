//! Input logic for the triad keyboard module.
//!
//! Pure, host-testable models of everything between the switch matrix and
//! the published control state: the matrix snapshot and edge-detecting
//! scanner, the quadrature knob decoder, the left-packed three-slot voice
//! table, and the `Pxy`/`Rxy` serial note protocol.
//!
//! The firmware crate owns the GPIO walk and the shared-state statics; each
//! scan it hands the raw row bytes to [`KeyScanner::step`] and applies the
//! returned effects.
//!
//! # Crate Features
//!
//! - **`defmt`** — structured logging support via [`defmt`] derives on the
//!   public types.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod knob;
pub mod matrix;
pub mod protocol;
pub mod voice;

pub use knob::Knob;
pub use matrix::{KeyScanner, MatrixSnapshot, Modes, ScanStep};
pub use protocol::{EventKind, NoteEvent, ProtocolError};
pub use voice::{VoiceError, VoiceTable};
