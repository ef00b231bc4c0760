//! The serial note protocol.
//!
//! Peer modules exchange newline-terminated three-byte messages:
//!
//! ```text
//! Pxy   press note       Rxy   release note
//! ```
//!
//! `x` is the octave digit `'0'..'8'` (octave 4 is unshifted) and `y` is the
//! note index `'0'..'B'` in hex. Locally generated events always carry
//! `x = '4'`; incoming events accept any octave.

use triad::pitch::Note;

/// Length of one message body, excluding the newline.
pub const MESSAGE_LEN: usize = 3;

/// Octave digit corresponding to shift 0.
const OCTAVE_BASE: u8 = b'4';

/// Message direction of a note event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    Press,
    Release,
}

/// Parse failures; the ingester drops these silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// First byte is neither `P` nor `R`.
    UnknownKind,
    /// Octave digit outside `'0'..'8'`.
    BadOctave,
    /// Note index outside `'0'..'B'`.
    BadKey,
}

/// One note event, in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoteEvent {
    pub kind: EventKind,
    pub note: Note,
}

impl NoteEvent {
    /// Encode as the three-byte wire form.
    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let kind = match self.kind {
            EventKind::Press => b'P',
            EventKind::Release => b'R',
        };
        let octave = (OCTAVE_BASE as i8 + self.note.octave_shift) as u8;
        let key = match self.note.semitone {
            0..=9 => b'0' + self.note.semitone,
            s => b'A' + s - 10,
        };
        [kind, octave, key]
    }

    /// Decode the three-byte wire form.
    pub fn parse(raw: [u8; MESSAGE_LEN]) -> Result<Self, ProtocolError> {
        let kind = match raw[0] {
            b'P' => EventKind::Press,
            b'R' => EventKind::Release,
            _ => return Err(ProtocolError::UnknownKind),
        };
        if !(b'0'..=b'8').contains(&raw[1]) {
            return Err(ProtocolError::BadOctave);
        }
        let octave_shift = raw[1] as i8 - OCTAVE_BASE as i8;
        let semitone = match raw[2] {
            b'0'..=b'9' => raw[2] - b'0',
            b'A'..=b'B' => raw[2] - b'A' + 10,
            _ => return Err(ProtocolError::BadKey),
        };
        // Both fields are range-checked above, so this cannot fail.
        let note = Note { semitone, octave_shift };
        Ok(Self { kind, note })
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn note(semitone: u8, octave_shift: i8) -> Note {
        Note::new(semitone, octave_shift).unwrap()
    }

    // ── Encoding ─────────────────────────────────────────────────────

    #[test]
    fn encodes_press_at_octave_four() {
        let event = NoteEvent { kind: EventKind::Press, note: note(10, 0) };
        assert_eq!(&event.encode(), b"P4A");
    }

    #[test]
    fn encodes_release_with_octave_shift() {
        let event = NoteEvent { kind: EventKind::Release, note: note(0, -4) };
        assert_eq!(&event.encode(), b"R00");
        let event = NoteEvent { kind: EventKind::Press, note: note(11, 4) };
        assert_eq!(&event.encode(), b"P8B");
    }

    // ── Parsing ──────────────────────────────────────────────────────

    #[test]
    fn parses_all_valid_messages() {
        for kind in [EventKind::Press, EventKind::Release] {
            for semitone in 0..12u8 {
                for shift in -4..=4i8 {
                    let event =
                        NoteEvent { kind, note: note(semitone, shift) };
                    assert_eq!(NoteEvent::parse(event.encode()), Ok(event));
                }
            }
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_eq!(
            NoteEvent::parse(*b"X40"),
            Err(ProtocolError::UnknownKind)
        );
        // Lowercase is not accepted.
        assert_eq!(
            NoteEvent::parse(*b"p40"),
            Err(ProtocolError::UnknownKind)
        );
    }

    #[test]
    fn rejects_out_of_range_octave() {
        assert_eq!(NoteEvent::parse(*b"P90"), Err(ProtocolError::BadOctave));
        assert_eq!(NoteEvent::parse(*b"P/0"), Err(ProtocolError::BadOctave));
    }

    #[test]
    fn rejects_out_of_range_key() {
        assert_eq!(NoteEvent::parse(*b"P4C"), Err(ProtocolError::BadKey));
        assert_eq!(NoteEvent::parse(*b"P4a"), Err(ProtocolError::BadKey));
        assert_eq!(NoteEvent::parse(*b"P4:"), Err(ProtocolError::BadKey));
    }
}
