//! The serial link: note-event ingestion from peer modules and the outbox
//! drainer.

use defmt::{debug, warn};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use triad_keys::protocol::{EventKind, NoteEvent, MESSAGE_LEN};

use crate::state;

/// Ingest `Pxy` / `Rxy` lines and apply them to the voice table.
///
/// Bytes accumulate into a three-byte field until a line terminator;
/// anything malformed — wrong length, unknown kind, out-of-range fields —
/// is dropped without reply.
#[embassy_executor::task]
pub async fn serial_ingest_task(mut rx: BufferedUartRx<'static>) {
    let mut message = [0u8; MESSAGE_LEN];
    let mut filled = 0usize;
    let mut byte = [0u8; 1];

    loop {
        match rx.read(&mut byte).await {
            Ok(0) => continue,
            Ok(_) => {}
            Err(_) => {
                // Line noise; resynchronise at the next terminator.
                filled = 0;
                continue;
            }
        }
        match byte[0] {
            b'\n' | b'\r' => {
                if filled == MESSAGE_LEN {
                    match NoteEvent::parse(message) {
                        Ok(event) => apply_remote_event(event).await,
                        Err(_) => debug!("malformed note message dropped"),
                    }
                }
                filled = 0;
            }
            b => {
                if filled < MESSAGE_LEN {
                    message[filled] = b;
                }
                // Overlength lines keep counting so the terminator check
                // rejects them.
                filled = filled.saturating_add(1);
            }
        }
    }
}

/// Mutate the voice table for one remote event and republish step sizes.
async fn apply_remote_event(event: NoteEvent) {
    let mut voices = state::VOICES.lock().await;
    let result = match event.kind {
        EventKind::Press => voices.press(event.note),
        EventKind::Release => voices.release(event.note),
    };
    match result {
        Ok(()) => state::publish_voice_steps(&voices),
        // Duplicate press, full table or unmatched release: silent no-op.
        Err(_) => debug!("remote note event ignored"),
    }
}

/// Forward queued note events over serial, newline-terminated.
#[embassy_executor::task]
pub async fn outbox_drain_task(mut tx: BufferedUartTx<'static>) {
    loop {
        let event = state::OUTBOX.receive().await;
        let mut frame = [0u8; MESSAGE_LEN + 1];
        frame[..MESSAGE_LEN].copy_from_slice(&event.encode());
        frame[MESSAGE_LEN] = b'\n';
        if tx.write_all(&frame).await.is_err() {
            warn!("serial tx failed, note event dropped");
        }
    }
}
