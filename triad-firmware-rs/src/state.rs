//! The published shared state.
//!
//! Every value crossing a task (or interrupt) boundary lives here, with its
//! protection chosen by who touches it:
//!
//! - word-sized values read on the audio path — plain atomics, relaxed
//!   ordering (the consumers tolerate a stale read by one buffer);
//! - the float reverb parameters — a short-hold async mutex, since the
//!   scanner writes two fields together;
//! - the voice table and key-matrix snapshot — async mutexes held for a
//!   handful of word assignments;
//! - the outgoing note events — a bounded channel, senders block while a
//!   burst fills it;
//! - the audio buffer hand-off — one binary semaphore per buffer, signalled
//!   by the sample interrupt and taken by the producer.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;

use triad::engine::{Controls, Waveform, VOICE_SLOTS};
use triad::pitch::Note;
use triad_keys::knob::KNOB_COUNT;
use triad_keys::matrix::{MatrixSnapshot, MATRIX_ROWS};
use triad_keys::protocol::NoteEvent;
use triad_keys::voice::VoiceTable;

// ── Lock-free control state ──────────────────────────────────────────

/// Per-voice sawtooth phase steps; 0 marks an inactive slot.
pub static SAW_STEPS: [AtomicU32; VOICE_SLOTS] =
    [const { AtomicU32::new(0) }; VOICE_SLOTS];

/// Per-voice sine-table steps; 0 marks an inactive slot.
pub static SINE_STEPS: [AtomicU32; VOICE_SLOTS] =
    [const { AtomicU32::new(0) }; VOICE_SLOTS];

/// false = sawtooth, true = sine.
pub static SINE_WAVE: AtomicBool = AtomicBool::new(false);
pub static JOYSTICK_MODE: AtomicBool = AtomicBool::new(false);
pub static REVERB_ENABLED: AtomicBool = AtomicBool::new(false);

/// Volume in [0, 16], read by the sample interrupt. Starts muted.
pub static VOLUME: AtomicU32 = AtomicU32::new(0);

/// Published knob rotations, for the display.
pub static KNOB_ROTATIONS: [AtomicU32; KNOB_COUNT] =
    [const { AtomicU32::new(0) }; KNOB_COUNT];

/// Joystick square wave high/low durations in samples, pre-divided by the
/// scanner so the audio path never divides.
pub static SQUARE_HIGH_TIME: AtomicU32 = AtomicU32::new(28);
pub static SQUARE_LOW_TIME: AtomicU32 = AtomicU32::new(28);

// ── Locked state ─────────────────────────────────────────────────────

/// Reverb parameters. Floats, so these live behind a short-hold lock
/// rather than atomics. `time_scale` is consumed once at producer start-up;
/// later writes take effect on the next boot.
pub struct ReverbParams {
    /// Wet fraction in [0, 1].
    pub wet: f32,
    /// Delay-line length scale in [0, 1].
    pub time_scale: f32,
}

pub static REVERB_PARAMS: Mutex<CriticalSectionRawMutex, ReverbParams> =
    Mutex::new(ReverbParams { wet: 0.0, time_scale: 1.0 });

/// The voice table, shared by the scanner and the serial ingester.
pub static VOICES: Mutex<CriticalSectionRawMutex, VoiceTable> =
    Mutex::new(VoiceTable::new());

/// Latest settled matrix snapshot, for the display.
pub static KEY_MATRIX: Mutex<CriticalSectionRawMutex, MatrixSnapshot> =
    Mutex::new(MatrixSnapshot::IDLE);

// ── Hand-off structures ──────────────────────────────────────────────

/// Outgoing note events awaiting the serial drainer.
pub const OUTBOX_CAPACITY: usize = 8;
pub static OUTBOX: Channel<CriticalSectionRawMutex, NoteEvent, OUTBOX_CAPACITY> =
    Channel::new();

/// "Producer may fill me" semaphore per audio buffer. The sample interrupt
/// signals a buffer the moment it stops draining it.
pub static BUFFER_READY: [Signal<CriticalSectionRawMutex, ()>; 2] =
    [Signal::new(), Signal::new()];

// ── Accessors ────────────────────────────────────────────────────────

/// Publish step sizes for every slot of the given table.
pub fn publish_voice_steps(table: &VoiceTable) {
    for (slot, (saw, sine)) in table.steps().iter().enumerate() {
        SAW_STEPS[slot].store(*saw, Ordering::Relaxed);
        SINE_STEPS[slot].store(*sine, Ordering::Relaxed);
    }
}

/// Snapshot of everything one buffer fill needs, plus the reverb switch.
pub async fn producer_snapshot() -> (Controls, bool, f32) {
    let controls = Controls {
        waveform: if SINE_WAVE.load(Ordering::Relaxed) {
            Waveform::Sine
        } else {
            Waveform::Sawtooth
        },
        joystick_mode: JOYSTICK_MODE.load(Ordering::Relaxed),
        saw_steps: core::array::from_fn(|i| {
            SAW_STEPS[i].load(Ordering::Relaxed)
        }),
        sine_steps: core::array::from_fn(|i| {
            SINE_STEPS[i].load(Ordering::Relaxed)
        }),
        square_high: SQUARE_HIGH_TIME.load(Ordering::Relaxed),
        square_low: SQUARE_LOW_TIME.load(Ordering::Relaxed),
    };
    let reverb_enabled = REVERB_ENABLED.load(Ordering::Relaxed);
    let wet = REVERB_PARAMS.lock().await.wet;
    (controls, reverb_enabled, wet)
}

// ── Display contract ─────────────────────────────────────────────────

/// Read-only snapshot for the display composer. Nothing here writes back
/// into the core.
#[derive(defmt::Format)]
pub struct DisplaySnapshot {
    pub volume: u8,
    pub reverb_amount: u8,
    pub reverb_enabled: bool,
    pub waveform: Waveform,
    pub joystick_mode: bool,
    pub voices: [Option<Note>; VOICE_SLOTS],
    pub key_rows: [u8; MATRIX_ROWS],
}

pub async fn display_snapshot() -> DisplaySnapshot {
    let voices = VOICES.lock().await.slots();
    let key_rows = KEY_MATRIX.lock().await.rows();
    DisplaySnapshot {
        volume: KNOB_ROTATIONS[3].load(Ordering::Relaxed) as u8,
        reverb_amount: KNOB_ROTATIONS[0].load(Ordering::Relaxed) as u8,
        reverb_enabled: REVERB_ENABLED.load(Ordering::Relaxed),
        waveform: if SINE_WAVE.load(Ordering::Relaxed) {
            Waveform::Sine
        } else {
            Waveform::Sawtooth
        },
        joystick_mode: JOYSTICK_MODE.load(Ordering::Relaxed),
        voices,
        key_rows,
    }
}
