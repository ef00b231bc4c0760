//! Key-matrix model and the edge-detecting scanner.
//!
//! The 7×4 switch matrix carries everything on the panel:
//!
//! ```text
//! rows 0..2, bits 0..3   twelve piano keys, key index = row·4 + bit
//! row  3,    bits 0..3   knob 3 (bits 0,1) and knob 2 (bits 2,3)
//! row  4,    bits 0..3   knob 1 (bits 0,1) and knob 0 (bits 2,3)
//! row  5,    bit 1       waveform toggle    bit 2   joystick-mode toggle
//! row  6,    bit 0       reverb toggle
//! ```
//!
//! Column readings are active-low: a stored 0 bit means the contact is
//! closed. [`KeyScanner`] compares successive snapshots and turns the
//! differences into note events, mode toggles and knob increments; the
//! firmware applies the returned [`ScanStep`] to the published state.

use heapless::Vec;
use triad::pitch::Note;

use crate::knob::{Knob, KNOB_COUNT};
use crate::protocol::{EventKind, NoteEvent};

/// Matrix dimensions.
pub const MATRIX_ROWS: usize = 7;
pub const MATRIX_COLS: usize = 4;

/// Number of piano keys on rows 0..2.
pub const PIANO_KEYS: usize = 12;

/// One settled reading of the whole matrix, low nibble per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatrixSnapshot {
    rows: [u8; MATRIX_ROWS],
}

impl MatrixSnapshot {
    /// Snapshot with every contact open.
    pub const IDLE: Self = Self { rows: [0x0F; MATRIX_ROWS] };

    /// Wrap raw row readings; anything above the low nibble is discarded.
    pub fn new(rows: [u8; MATRIX_ROWS]) -> Self {
        let mut masked = rows;
        for row in &mut masked {
            *row &= 0x0F;
        }
        Self { rows: masked }
    }

    /// The raw row bytes, for the display contract.
    pub fn rows(&self) -> [u8; MATRIX_ROWS] {
        self.rows
    }

    /// Raw level of one matrix position (true = open contact).
    fn bit(&self, row: usize, bit: usize) -> bool {
        self.rows[row] & (1 << bit) != 0
    }

    /// Whether a piano key (0..11) is currently pressed.
    pub fn key_pressed(&self, key: usize) -> bool {
        !self.bit(key / MATRIX_COLS, key % MATRIX_COLS)
    }

    /// Iterator over the pressed piano keys in row-major order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = usize> + '_ {
        (0..PIANO_KEYS).filter(|key| self.key_pressed(*key))
    }

    /// The `(A, B)` pair of one knob. The decoder only cares about
    /// transitions, so the raw active-low levels are fed in unchanged.
    pub fn knob_bits(&self, knob: usize) -> (bool, bool) {
        let (row, base) = match knob {
            0 => (4, 2),
            1 => (4, 0),
            2 => (3, 2),
            _ => (3, 0),
        };
        (self.bit(row, base), self.bit(row, base + 1))
    }

    /// Mode buttons, true = pressed.
    pub fn wave_button(&self) -> bool {
        !self.bit(5, 1)
    }

    pub fn joystick_button(&self) -> bool {
        !self.bit(5, 2)
    }

    pub fn reverb_button(&self) -> bool {
        !self.bit(6, 0)
    }
}

/// The three toggled mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modes {
    /// false = sawtooth, true = sine.
    pub sine_wave: bool,
    pub joystick: bool,
    pub reverb: bool,
}

/// Everything one scan derived from the matrix.
#[derive(Debug)]
pub struct ScanStep {
    /// Note events for the keys that changed, in row-major order.
    pub events: Vec<NoteEvent, PIANO_KEYS>,
    /// Whether any piano key changed; gates the voice-table rebuild so an
    /// unchanged chord is never reassigned.
    pub keys_changed: bool,
    /// Mode flags after edge-toggling.
    pub modes: Modes,
    /// Current knob rotations in `[0, 16]`.
    pub knob_rotations: [u8; KNOB_COUNT],
}

/// Scanner state carried between 50 ms scans.
pub struct KeyScanner {
    previous: MatrixSnapshot,
    knobs: [Knob; KNOB_COUNT],
    modes: Modes,
}

impl KeyScanner {
    pub const fn new() -> Self {
        Self {
            previous: MatrixSnapshot::IDLE,
            // Open contacts read high, so the decoders rest at (1, 1).
            knobs: [Knob::with_state(true, true); KNOB_COUNT],
            modes: Modes { sine_wave: false, joystick: false, reverb: false },
        }
    }

    /// Digest one settled snapshot.
    pub fn step(&mut self, current: MatrixSnapshot) -> ScanStep {
        let mut events = Vec::new();
        for key in 0..PIANO_KEYS {
            let was = self.previous.key_pressed(key);
            let now = current.key_pressed(key);
            if was == now {
                continue;
            }
            let kind =
                if now { EventKind::Press } else { EventKind::Release };
            // Local keys are always octave 4; key index 0..11 fits.
            if let Some(note) = Note::new(key as u8, 0) {
                // Capacity equals the key count, so this cannot overflow.
                events.push(NoteEvent { kind, note }).ok();
            }
        }

        // Toggles fire on the press edge only.
        if !self.previous.wave_button() && current.wave_button() {
            self.modes.sine_wave = !self.modes.sine_wave;
        }
        if !self.previous.joystick_button() && current.joystick_button() {
            self.modes.joystick = !self.modes.joystick;
        }
        if !self.previous.reverb_button() && current.reverb_button() {
            self.modes.reverb = !self.modes.reverb;
        }

        let mut knob_rotations = [0u8; KNOB_COUNT];
        for (i, knob) in self.knobs.iter_mut().enumerate() {
            let (a, b) = current.knob_bits(i);
            knob.update(a, b);
            knob_rotations[i] = knob.rotation();
        }

        let keys_changed = !events.is_empty();
        self.previous = current;
        ScanStep { events, keys_changed, modes: self.modes, knob_rotations }
    }
}

impl Default for KeyScanner {
    fn default() -> Self {
        Self::new()
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_keys(keys: &[usize]) -> MatrixSnapshot {
        let mut rows = [0x0Fu8; MATRIX_ROWS];
        for key in keys {
            rows[key / 4] &= !(1 << (key % 4));
        }
        MatrixSnapshot::new(rows)
    }

    fn snapshot_with_row(row: usize, value: u8) -> MatrixSnapshot {
        let mut rows = [0x0Fu8; MATRIX_ROWS];
        rows[row] = value;
        MatrixSnapshot::new(rows)
    }

    fn wire(events: &Vec<NoteEvent, PIANO_KEYS>) -> std::vec::Vec<[u8; 3]> {
        events.iter().map(|e| e.encode()).collect()
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    #[test]
    fn key_bits_are_active_low() {
        let snapshot = snapshot_with_keys(&[0, 5, 11]);
        assert!(snapshot.key_pressed(0));
        assert!(snapshot.key_pressed(5));
        assert!(snapshot.key_pressed(11));
        assert!(!snapshot.key_pressed(1));
        assert_eq!(
            snapshot.pressed_keys().collect::<std::vec::Vec<_>>(),
            [0, 5, 11]
        );
    }

    #[test]
    fn new_masks_to_the_low_nibble() {
        let snapshot = MatrixSnapshot::new([0xFF; MATRIX_ROWS]);
        assert_eq!(snapshot, MatrixSnapshot::IDLE);
    }

    #[test]
    fn knob_bits_come_from_the_documented_positions() {
        // Row 4 bit 2 low = knob 0's A active.
        let snapshot = snapshot_with_row(4, 0b1011);
        assert_eq!(snapshot.knob_bits(0), (false, true));
        assert_eq!(snapshot.knob_bits(1), (true, true));
        // Row 3 bit 0 low = knob 3's A active.
        let snapshot = snapshot_with_row(3, 0b1110);
        assert_eq!(snapshot.knob_bits(3), (false, true));
        assert_eq!(snapshot.knob_bits(2), (true, true));
    }

    // ── Note events ──────────────────────────────────────────────────

    #[test]
    fn chord_press_emits_events_in_row_major_order() {
        let mut scanner = KeyScanner::new();
        let step = scanner.step(snapshot_with_keys(&[0, 1, 2]));
        assert_eq!(wire(&step.events), [*b"P40", *b"P41", *b"P42"]);
        assert!(step.keys_changed);
    }

    #[test]
    fn release_emits_r_events() {
        let mut scanner = KeyScanner::new();
        scanner.step(snapshot_with_keys(&[10]));
        let step = scanner.step(snapshot_with_keys(&[]));
        assert_eq!(wire(&step.events), [*b"R4A"]);
    }

    #[test]
    fn constant_state_emits_nothing() {
        let mut scanner = KeyScanner::new();
        let held = snapshot_with_keys(&[3, 7]);
        scanner.step(held);
        for _ in 0..10 {
            let step = scanner.step(held);
            assert!(step.events.is_empty());
            assert!(!step.keys_changed);
        }
    }

    #[test]
    fn mixed_press_and_release_in_one_scan() {
        let mut scanner = KeyScanner::new();
        scanner.step(snapshot_with_keys(&[2]));
        let step = scanner.step(snapshot_with_keys(&[9]));
        assert_eq!(wire(&step.events), [*b"R42", *b"P49"]);
    }

    // ── Mode toggles ─────────────────────────────────────────────────

    #[test]
    fn wave_toggle_fires_on_press_edge_only() {
        let mut scanner = KeyScanner::new();
        let pressed = snapshot_with_row(5, 0b1101); // bit 1 low
        let released = MatrixSnapshot::IDLE;

        assert!(scanner.step(pressed).modes.sine_wave);
        // Held across scans: no further toggle.
        assert!(scanner.step(pressed).modes.sine_wave);
        assert!(scanner.step(released).modes.sine_wave);
        // Second press toggles back.
        assert!(!scanner.step(pressed).modes.sine_wave);
    }

    #[test]
    fn joystick_and_reverb_toggles_are_independent() {
        let mut scanner = KeyScanner::new();
        let joystick = snapshot_with_row(5, 0b1011); // bit 2 low
        let reverb = snapshot_with_row(6, 0b1110); // bit 0 low

        let step = scanner.step(joystick);
        assert!(step.modes.joystick);
        assert!(!step.modes.reverb);

        let step = scanner.step(reverb);
        assert!(step.modes.reverb);
        // Joystick button released in the same scan: still toggled on.
        assert!(step.modes.joystick);
    }

    #[test]
    fn mode_buttons_do_not_emit_note_events() {
        let mut scanner = KeyScanner::new();
        let step = scanner.step(snapshot_with_row(5, 0b1001));
        assert!(step.events.is_empty());
        assert!(!step.keys_changed);
    }

    // ── Knobs ────────────────────────────────────────────────────────

    #[test]
    fn knob_rotation_is_tracked_per_knob() {
        let mut scanner = KeyScanner::new();
        // Knob 0 lives in row 4 bits 2..3. Step it 11 -> 10 -> 00: two
        // single-bit transitions, one detent each.
        scanner.step(snapshot_with_row(4, 0b0111));
        let step = scanner.step(snapshot_with_row(4, 0b0011));
        assert_eq!(step.knob_rotations[0], 15);
        assert_eq!(step.knob_rotations[1], 0);
        assert_eq!(step.knob_rotations[2], 0);
        assert_eq!(step.knob_rotations[3], 0);
    }

    #[test]
    fn first_scan_of_an_idle_matrix_is_inert() {
        let mut scanner = KeyScanner::new();
        let step = scanner.step(MatrixSnapshot::IDLE);
        assert!(step.events.is_empty());
        assert_eq!(step.modes, Modes::default());
        assert_eq!(step.knob_rotations, [0; KNOB_COUNT]);
    }
}
