//! Semitone step tables and the [`Note`] type.
//!
//! The tone generator advances its phase accumulators by a fixed *step* per
//! sample; the step encodes the pitch. Both tables below are precomputed for
//! octave 4 at the 22 kHz output rate — other octaves are obtained by
//! shifting the base value, which doubles or halves the frequency exactly
//! under wrap-around arithmetic.

/// Number of semitones in one octave (C through B).
pub const SEMITONES: usize = 12;

/// Octave shifts accepted by [`Note`], inclusive. Shift 0 is octave 4.
pub const MIN_OCTAVE_SHIFT: i8 = -4;
pub const MAX_OCTAVE_SHIFT: i8 = 4;

/// Display names for the twelve semitones, indexed by key number.
pub const NOTE_NAMES: [&str; SEMITONES] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Sawtooth phase-accumulator steps for octave 4: `round(f · 2^32 / 22000)`.
///
/// The accumulator is 32-bit and its high byte is the output sample, so one
/// full wrap is one waveform cycle. `85_899_346 · 22000 / 2^32 = 440.0000`.
pub const SAW_STEPS: [u32; SEMITONES] = [
    51_076_063, // C4   261.63 Hz
    54_113_191, // C#4  277.18 Hz
    57_330_941, // D4   293.66 Hz
    60_740_013, // D#4  311.13 Hz
    64_351_807, // E4   329.63 Hz
    68_178_350, // F4   349.23 Hz
    72_232_448, // F#4  370.00 Hz
    76_527_610, // G4   392.00 Hz
    81_078_187, // G#4  415.30 Hz
    85_899_346, // A4   440.00 Hz
    91_007_194, // A#4  466.16 Hz
    96_418_756, // B4   493.88 Hz
];

/// Sine-table index steps for octave 4: `round(f · 5000 / 22000)`.
///
/// The steps are small integers, so the audible pitch is equal temperament
/// to within about ±0.8 % — inaudible next to the sawtooth detune of zero.
pub const SINE_STEPS: [u32; SEMITONES] = [
    59,  // C4
    63,  // C#4
    67,  // D4
    71,  // D#4
    75,  // E4
    79,  // F4
    84,  // F#4
    89,  // G4
    94,  // G#4
    100, // A4   exactly 440 Hz
    106, // A#4
    112, // B4
];

/// One held note: a semitone index plus an octave shift relative to octave 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Note {
    /// Semitone index, 0 (C) through 11 (B).
    pub semitone: u8,
    /// Octave shift in [-4, +4]; 0 means octave 4.
    pub octave_shift: i8,
}

impl Note {
    /// Construct a note, validating both fields.
    pub fn new(semitone: u8, octave_shift: i8) -> Option<Self> {
        if semitone as usize >= SEMITONES {
            return None;
        }
        if !(MIN_OCTAVE_SHIFT..=MAX_OCTAVE_SHIFT).contains(&octave_shift) {
            return None;
        }
        Some(Self { semitone, octave_shift })
    }

    /// Sawtooth phase step for this note. Never zero for a valid note.
    pub fn saw_step(&self) -> u32 {
        shift_step(SAW_STEPS[self.semitone as usize], self.octave_shift)
    }

    /// Sine-table index step for this note. Never zero for a valid note.
    pub fn sine_step(&self) -> u32 {
        shift_step(SINE_STEPS[self.semitone as usize], self.octave_shift)
    }
}

/// Apply an octave shift to a base step: left shift up, right shift down.
fn shift_step(base: u32, octave_shift: i8) -> u32 {
    if octave_shift >= 0 {
        base << octave_shift as u32
    } else {
        base >> (-octave_shift) as u32
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SAMPLE_RATE_HZ;
    use crate::tables::SINE_TABLE_LEN;

    /// Frequency reproduced by a sawtooth step at the output rate.
    fn saw_freq(step: u32) -> f64 {
        step as f64 * SAMPLE_RATE_HZ as f64 / 2f64.powi(32)
    }

    /// Frequency reproduced by a sine-table step at the output rate.
    fn sine_freq(step: u32) -> f64 {
        step as f64 * SAMPLE_RATE_HZ as f64 / SINE_TABLE_LEN as f64
    }

    const EQUAL_TEMPERAMENT: [f64; SEMITONES] = [
        261.6256, 277.1826, 293.6648, 311.1270, 329.6276, 349.2282,
        369.9944, 391.9954, 415.3047, 440.0000, 466.1638, 493.8833,
    ];

    // ── Step tables ──────────────────────────────────────────────────

    #[test]
    fn saw_steps_match_equal_temperament() {
        for (step, want) in SAW_STEPS.iter().zip(EQUAL_TEMPERAMENT) {
            let got = saw_freq(*step);
            // 32-bit steps resolve frequency to ~5 µHz; rounding error only.
            assert!((got - want).abs() < 0.001, "got {got}, want {want}");
        }
    }

    #[test]
    fn sine_steps_within_one_percent() {
        for (step, want) in SINE_STEPS.iter().zip(EQUAL_TEMPERAMENT) {
            let got = sine_freq(*step);
            assert!(
                (got - want).abs() / want < 0.01,
                "got {got}, want {want}"
            );
        }
    }

    #[test]
    fn a4_is_exact() {
        assert_eq!(saw_freq(SAW_STEPS[9]).round(), 440.0);
        assert_eq!(sine_freq(SINE_STEPS[9]), 440.0);
    }

    #[test]
    fn steps_are_strictly_increasing() {
        assert!(SAW_STEPS.windows(2).all(|w| w[0] < w[1]));
        assert!(SINE_STEPS.windows(2).all(|w| w[0] < w[1]));
    }

    // ── Octave shifts ────────────────────────────────────────────────

    #[test]
    fn octave_shift_doubles_and_halves() {
        let a4 = Note::new(9, 0).unwrap();
        let a5 = Note::new(9, 1).unwrap();
        let a3 = Note::new(9, -1).unwrap();
        assert_eq!(a5.saw_step(), a4.saw_step() * 2);
        assert_eq!(a3.saw_step(), a4.saw_step() / 2);
        assert_eq!(a5.sine_step(), a4.sine_step() * 2);
        assert_eq!(a3.sine_step(), a4.sine_step() / 2);
    }

    #[test]
    fn lowest_octave_a_is_a4_over_16() {
        // Octave 0 is four shifts down from octave 4.
        let a0 = Note::new(9, -4).unwrap();
        let a4 = Note::new(9, 0).unwrap();
        assert_eq!(a0.saw_step(), a4.saw_step() >> 4);
    }

    #[test]
    fn highest_shift_does_not_overflow() {
        // B4 << 4 must still fit in 32 bits.
        let b8 = Note::new(11, 4).unwrap();
        assert_eq!(b8.saw_step(), SAW_STEPS[11] << 4);
        assert!(b8.saw_step() > SAW_STEPS[11]);
    }

    #[test]
    fn valid_notes_have_nonzero_steps() {
        for semitone in 0..SEMITONES as u8 {
            for shift in MIN_OCTAVE_SHIFT..=MAX_OCTAVE_SHIFT {
                let note = Note::new(semitone, shift).unwrap();
                assert_ne!(note.saw_step(), 0);
                assert_ne!(note.sine_step(), 0);
            }
        }
    }

    // ── Validation ───────────────────────────────────────────────────

    #[test]
    fn new_rejects_out_of_range_fields() {
        assert!(Note::new(12, 0).is_none());
        assert!(Note::new(0, 5).is_none());
        assert!(Note::new(0, -5).is_none());
        assert!(Note::new(11, 4).is_some());
        assert!(Note::new(0, -4).is_some());
    }
}
