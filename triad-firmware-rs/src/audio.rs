//! The audio back end: double-buffered sample hand-off between the producer
//! task and the 22 kHz PWM-wrap sample interrupt.
//!
//! A PWM slice is the "DAC": its counter wraps at [`PWM_TOP`] (≈22 kHz at
//! the 150 MHz system clock) and the wrap interrupt writes the next sample
//! into the compare register. The interrupt is wait-free — it only touches
//! atomics and ends by signalling a semaphore.
//!
//! Buffer protocol: the interrupt drains one buffer while the producer owns
//! at most the other. When the read index reaches 219 the interrupt resets
//! it, switches buffers and releases the drained buffer's semaphore. The
//! last byte of each buffer is skipped by that swap; the hand-off cadence
//! is 219 samples, not 220.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use embassy_futures::select::{select, Either};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::pac;
use embassy_time::{with_timeout, Duration};

use triad::engine::{ToneGenerator, BUFFER_LEN};
use triad::reverb::Reverb;
use triad::tables::SineTable;

use crate::state;

/// PWM wrap value: 150 MHz / (PWM_TOP + 1) ≈ 22 002 Hz.
pub const PWM_TOP: u16 = 6817;

/// PWM slice carrying the audio pin (GPIO 16 = slice 0, channel A).
const AUDIO_SLICE: usize = 0;

/// How long the producer waits for a drained buffer before skipping a
/// turn. Slightly more than one buffer period (219 / 22 kHz ≈ 10 ms).
const FILL_WAIT: Duration = Duration::from_millis(10);

/// The audio double buffer. Byte atomics keep the producer's writes and
/// the interrupt's reads free of any lock; the semaphores in
/// [`state::BUFFER_READY`] order whole-buffer ownership.
static BUFFERS: [[AtomicU8; BUFFER_LEN]; 2] = {
    const ZERO: AtomicU8 = AtomicU8::new(0);
    const BUFFER: [AtomicU8; BUFFER_LEN] = [ZERO; BUFFER_LEN];
    [BUFFER, BUFFER]
};

/// Interrupt-owned cursor state. Atomics only so the statics are `Sync`;
/// nothing else writes them.
static READ_INDEX: AtomicUsize = AtomicUsize::new(0);
static READ_BUFFER: AtomicUsize = AtomicUsize::new(0);

/// Arm the sample clock: hand buffer 1 to the producer, then enable the
/// wrap interrupt. The interrupt starts by draining buffer 0, which holds
/// silence from boot.
pub fn start_sample_clock() {
    state::BUFFER_READY[1].signal(());

    pac::PWM.irq0_inte().modify(|w| w.set_ch0(true));
    interrupt::PWM_IRQ_WRAP_0.set_priority(Priority::P0);
    unsafe { interrupt::PWM_IRQ_WRAP_0.enable() };
}

/// 22 kHz sample interrupt: fetch one byte, scale by volume, write the
/// PWM compare, and swap buffers at the end of the drain.
#[interrupt]
fn PWM_IRQ_WRAP_0() {
    pac::PWM.intr().write(|w| w.set_ch0(true));

    let buffer = READ_BUFFER.load(Ordering::Relaxed);
    let index = READ_INDEX.load(Ordering::Relaxed);
    let sample = BUFFERS[buffer][index].load(Ordering::Relaxed);

    if index + 1 == BUFFER_LEN - 1 {
        READ_INDEX.store(0, Ordering::Relaxed);
        READ_BUFFER.store(1 - buffer, Ordering::Relaxed);
        state::BUFFER_READY[buffer].signal(());
    } else {
        READ_INDEX.store(index + 1, Ordering::Relaxed);
    }

    // Volume 0..16 maps to right shifts 8..0: a logarithmic curve with
    // true mute at 0.
    let volume = state::VOLUME.load(Ordering::Relaxed).min(16);
    let scaled = (sample as u32) >> (8 - volume / 2);
    let duty = (scaled * (PWM_TOP as u32 + 1)) >> 8;
    pac::PWM.ch(AUDIO_SLICE).cc().modify(|w| w.set_a(duty as u16));
}

/// Sample producer: waits for a drained buffer (buffer 1 first), renders
/// 220 bytes from the published control state, reverberates if enabled,
/// and publishes the result.
#[embassy_executor::task]
pub async fn producer_task(
    sine: &'static SineTable,
    reverb: &'static mut Reverb,
) {
    // Delay-line lengths are fixed from here on; runtime changes are not
    // supported.
    {
        let params = state::REVERB_PARAMS.lock().await;
        reverb.set_time_scale(params.time_scale);
    }

    let mut generator = ToneGenerator::new();
    let mut scratch = [0u8; BUFFER_LEN];

    loop {
        let ready = select(
            state::BUFFER_READY[1].wait(),
            state::BUFFER_READY[0].wait(),
        );
        let target = match with_timeout(FILL_WAIT, ready).await {
            Ok(Either::First(())) => 1,
            Ok(Either::Second(())) => 0,
            // The interrupt is still draining; it will signal on its next
            // swap and we catch up then.
            Err(_) => continue,
        };

        let (controls, reverb_enabled, wet) = state::producer_snapshot().await;
        generator.fill(&mut scratch, sine, &controls);
        if reverb_enabled {
            reverb.process(&mut scratch, wet);
        }

        for (slot, value) in BUFFERS[target].iter().zip(scratch.iter()) {
            slot.store(*value, Ordering::Relaxed);
        }
    }
}
