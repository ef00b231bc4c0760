//! The 50 ms key-scan task: matrix walk, event emission, voice rebuild,
//! joystick limits, mode flags and knob publication.

use core::sync::atomic::Ordering;

use defmt::debug;
use embassy_rp::adc::{Adc, Async, Channel as AdcChannel};
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Duration, Ticker, Timer};

use triad_keys::matrix::{KeyScanner, MatrixSnapshot, MATRIX_COLS, MATRIX_ROWS};

use crate::state;

/// Scan period.
const SCAN_PERIOD: Duration = Duration::from_millis(50);

/// Settling time after selecting a row before the columns are sampled.
const ROW_SETTLE: Duration = Duration::from_micros(10);

/// Base square-wave period in samples; the joystick X axis stretches it.
const SQUARE_BASE_PERIOD: u32 = 56;

#[embassy_executor::task]
pub async fn key_scan_task(
    mut rows: [Output<'static>; MATRIX_ROWS],
    cols: [Input<'static>; MATRIX_COLS],
    mut adc: Adc<'static, Async>,
    mut joy_x: AdcChannel<'static>,
    mut joy_y: AdcChannel<'static>,
) {
    let mut scanner = KeyScanner::new();
    let mut ticker = Ticker::every(SCAN_PERIOD);

    loop {
        ticker.next().await;

        // ── Walk the matrix ──────────────────────────────────────────
        let mut raw = [0u8; MATRIX_ROWS];
        for (row, select) in rows.iter_mut().enumerate() {
            select.set_low();
            Timer::after(ROW_SETTLE).await;
            let mut bits = 0u8;
            for (i, col) in cols.iter().enumerate() {
                if col.is_high() {
                    bits |= 1 << i;
                }
            }
            raw[row] = bits;
            select.set_high();
        }
        let snapshot = MatrixSnapshot::new(raw);

        // Publish the snapshot for the display before acting on it.
        *state::KEY_MATRIX.lock().await = snapshot;

        let step = scanner.step(snapshot);

        // ── Note events out ──────────────────────────────────────────
        // A full outbox blocks here until the drainer catches up.
        for event in &step.events {
            state::OUTBOX.send(*event).await;
        }

        // ── Voice assignment ─────────────────────────────────────────
        // Rebuild only when a key changed, so a held chord is never
        // reassigned underneath the producer.
        if step.keys_changed {
            let mut voices = state::VOICES.lock().await;
            voices.rebuild_from_matrix(&snapshot);
            state::publish_voice_steps(&voices);
            debug!("keys changed, {} voice(s) held", voices.len());
        }

        // ── Mode flags ───────────────────────────────────────────────
        state::SINE_WAVE.store(step.modes.sine_wave, Ordering::Relaxed);
        state::JOYSTICK_MODE.store(step.modes.joystick, Ordering::Relaxed);
        state::REVERB_ENABLED.store(step.modes.reverb, Ordering::Relaxed);

        // ── Knobs ────────────────────────────────────────────────────
        // Knob 0: reverb amount. Knob 1: reverb time scale (applied at
        // next boot). Knob 3: volume. Knob 2 is published only.
        for (i, rotation) in step.knob_rotations.iter().enumerate() {
            state::KNOB_ROTATIONS[i].store(*rotation as u32, Ordering::Relaxed);
        }
        state::VOLUME.store(step.knob_rotations[3] as u32, Ordering::Relaxed);
        {
            let mut params = state::REVERB_PARAMS.lock().await;
            params.wet = step.knob_rotations[0] as f32 / 16.0;
            params.time_scale = step.knob_rotations[1] as f32 / 16.0;
        }

        // ── Joystick square-wave limits ──────────────────────────────
        // The RP2350 ADC is 12-bit; shift to the 10-bit range the period
        // and duty formulas are written for. High and low times are
        // published separately so the audio path never divides.
        let x = adc.read(&mut joy_x).await;
        let y = adc.read(&mut joy_y).await;
        if let (Ok(x), Ok(y)) = (x, y) {
            let joy_x10 = (x >> 2) as u32;
            let joy_y10 = (y >> 2) as u32;
            let period = SQUARE_BASE_PERIOD + joy_x10 / 50;
            let high = period * joy_y10 / 1024;
            state::SQUARE_HIGH_TIME.store(high, Ordering::Relaxed);
            state::SQUARE_LOW_TIME.store(period - high, Ordering::Relaxed);
        }
        // On a failed conversion the previous limits stay published.
    }
}
