//! The three-slot voice table.
//!
//! Occupied slots always form a prefix: releasing a voice shifts everything
//! above it down, and a new note takes the lowest empty slot. The local key
//! scanner instead replaces the whole table from the pressed keys, which
//! preserves the same invariant by construction.

use triad::engine::VOICE_SLOTS;
use triad::pitch::Note;

use crate::matrix::MatrixSnapshot;

/// Rejected voice-table operations; callers treat these as silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VoiceError {
    /// The note is already held by a voice.
    AlreadyHeld,
    /// All three voices are busy.
    AllVoicesBusy,
    /// No voice is holding the note.
    NotHeld,
}

/// Left-packed table of at most three held notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoiceTable {
    slots: [Option<Note>; VOICE_SLOTS],
}

impl VoiceTable {
    pub const fn new() -> Self {
        Self { slots: [None; VOICE_SLOTS] }
    }

    /// The raw slot assignment, for the display contract.
    pub fn slots(&self) -> [Option<Note>; VOICE_SLOTS] {
        self.slots
    }

    /// Number of held notes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots[0].is_none()
    }

    /// Assign `note` to the lowest empty slot. A note that is already held
    /// is left alone.
    pub fn press(&mut self, note: Note) -> Result<(), VoiceError> {
        if self.slots.contains(&Some(note)) {
            return Err(VoiceError::AlreadyHeld);
        }
        match self.slots.iter().position(|s| s.is_none()) {
            Some(slot) => {
                self.slots[slot] = Some(note);
                Ok(())
            }
            None => Err(VoiceError::AllVoicesBusy),
        }
    }

    /// Release the voice holding `note` and compact the table left.
    pub fn release(&mut self, note: Note) -> Result<(), VoiceError> {
        let slot = self
            .slots
            .iter()
            .position(|s| *s == Some(note))
            .ok_or(VoiceError::NotHeld)?;
        for i in slot..VOICE_SLOTS - 1 {
            self.slots[i] = self.slots[i + 1];
        }
        self.slots[VOICE_SLOTS - 1] = None;
        Ok(())
    }

    /// Replace the whole table from the currently pressed piano keys, in
    /// row-major order, at octave 4. Presses beyond the third are ignored
    /// until a voice frees up.
    pub fn rebuild_from_matrix(&mut self, snapshot: &MatrixSnapshot) {
        let mut pressed = snapshot
            .pressed_keys()
            .filter_map(|key| Note::new(key as u8, 0));
        self.slots = core::array::from_fn(|_| pressed.next());
    }

    /// Published step-size pairs `(sawtooth, sine)` per slot; `(0, 0)`
    /// marks an inactive slot.
    pub fn steps(&self) -> [(u32, u32); VOICE_SLOTS] {
        self.slots.map(|slot| match slot {
            Some(note) => (note.saw_step(), note.sine_step()),
            None => (0, 0),
        })
    }
}

impl Default for VoiceTable {
    fn default() -> Self {
        Self::new()
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
