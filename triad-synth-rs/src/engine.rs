//! The tone generator: sawtooth and sine oscillators behind a three-voice
//! time multiplexer, plus the joystick square wave.
//!
//! There is no per-voice state. A single 32-bit sawtooth accumulator (and a
//! single sine position counter) is advanced each sample by the step size of
//! whichever voice currently has the turn; the turn rotates every
//! [`VOICE_ROTATION_SAMPLES`] samples. At 22 kHz the rotation is far below
//! audible pitch, so the ear integrates the interleaved phases into a chord.
//!
//! The generator is fed one [`Controls`] snapshot per buffer fill — it never
//! touches shared state itself.

use crate::tables::SineTable;

/// Output sample rate in Hz.
pub const SAMPLE_RATE_HZ: u32 = 22_000;

/// Length of one audio buffer in bytes (samples).
pub const BUFFER_LEN: usize = 220;

/// Number of voice slots in the polyphonic mixer.
pub const VOICE_SLOTS: usize = 3;

/// Samples between voice-turn advances. 22000 / 750 ≈ 29 rotations per
/// second per voice pair — well below pitch, well above flutter.
pub const VOICE_ROTATION_SAMPLES: u32 = 750;

/// Selected oscillator for the keyboard voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    #[default]
    Sawtooth,
    Sine,
}

/// Snapshot of the published control state consumed by one buffer fill.
///
/// A step size of 0 marks an inactive voice slot. The square-wave limits are
/// pre-divided sample counts so nothing on the audio path divides.
#[derive(Debug, Clone, Copy)]
pub struct Controls {
    pub waveform: Waveform,
    pub joystick_mode: bool,
    pub saw_steps: [u32; VOICE_SLOTS],
    pub sine_steps: [u32; VOICE_SLOTS],
    /// Samples the square wave spends at 0xFF per period.
    pub square_high: u32,
    /// Samples the square wave spends at 0x00 per period.
    pub square_low: u32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            joystick_mode: false,
            saw_steps: [0; VOICE_SLOTS],
            sine_steps: [0; VOICE_SLOTS],
            square_high: 28,
            square_low: 28,
        }
    }
}

/// Phase state for every sample source.
pub struct ToneGenerator {
    /// Sawtooth phase accumulator; the high byte is the output sample.
    saw_accumulator: u32,
    /// Sine table position, kept in `[0, SINE_TABLE_LEN)`.
    sine_position: u32,
    /// Samples since the last voice-turn advance.
    rotation: u32,
    /// Free-running voice-turn index; the active slot is `turn % voices`.
    turn: u32,
    /// Position inside the current square-wave period.
    square_phase: u32,
}

impl ToneGenerator {
    pub const fn new() -> Self {
        Self {
            saw_accumulator: 0,
            sine_position: 0,
            rotation: 0,
            turn: 0,
            square_phase: 0,
        }
    }

    /// Fill `buf` with consecutive output samples from the active source.
    /// Each byte is independent; there is no look-ahead.
    pub fn fill(&mut self, buf: &mut [u8], sine: &SineTable, controls: &Controls) {
        for out in buf.iter_mut() {
            *out = if controls.joystick_mode {
                self.square_sample(controls)
            } else {
                self.voice_sample(sine, controls)
            };
        }
    }

    /// One sample of the multiplexed keyboard voices.
    fn voice_sample(&mut self, sine: &SineTable, controls: &Controls) -> u8 {
        let steps = match controls.waveform {
            Waveform::Sawtooth => &controls.saw_steps,
            Waveform::Sine => &controls.sine_steps,
        };

        // A slot can transiently read 0 below a non-zero one while the
        // writer is mid-update; the 0-step voice then simply contributes
        // no phase advance for its turns.
        let voices = active_voices(steps);
        if voices > 0 {
            let step = steps[(self.turn % voices) as usize];
            match controls.waveform {
                Waveform::Sawtooth => {
                    self.saw_accumulator = self.saw_accumulator.wrapping_add(step);
                }
                Waveform::Sine => {
                    self.sine_position =
                        (self.sine_position + step) % crate::tables::SINE_TABLE_LEN as u32;
                }
            }
        }

        self.rotation += 1;
        if self.rotation == VOICE_ROTATION_SAMPLES {
            self.rotation = 0;
            self.turn = self.turn.wrapping_add(1);
        }

        match controls.waveform {
            Waveform::Sawtooth => (self.saw_accumulator >> 24) as u8,
            Waveform::Sine => sine.lookup(self.sine_position),
        }
    }

    /// One sample of the joystick square wave: 0x00 for the low window of
    /// the period, 0xFF for the rest. Wrap by comparison, no division.
    fn square_sample(&mut self, controls: &Controls) -> u8 {
        let period = controls.square_high + controls.square_low;
        if period == 0 {
            return 0x00;
        }
        if self.square_phase >= period {
            self.square_phase = 0;
        }
        let sample = if self.square_phase < controls.square_low {
            0x00
        } else {
            0xFF
        };
        self.square_phase += 1;
        sample
    }
}

impl Default for ToneGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Voice count from the highest occupied slot.
fn active_voices(steps: &[u32; VOICE_SLOTS]) -> u32 {
    if steps[2] != 0 {
        3
    } else if steps[1] != 0 {
        2
    } else if steps[0] != 0 {
        1
    } else {
        0
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
