//! The sine lookup table.
//!
//! One unit-amplitude cycle, pre-quantized to bytes in `[0, 255]`. The table
//! is 5 KB, so the firmware keeps it in a `ConstStaticCell` and fills it once
//! at boot; [`SineTable::empty()`] is `const` for exactly that reason
//! (`libm::sinf` is not).

use core::f32::consts::TAU;

/// Number of entries in one sine cycle.
pub const SINE_TABLE_LEN: usize = 5000;

/// 5000-entry unit sine cycle, byte-scaled to `[0, 255]`.
pub struct SineTable {
    samples: [u8; SINE_TABLE_LEN],
}

impl SineTable {
    /// All-zero table, for placement in static storage before [`fill`].
    ///
    /// [`fill`]: Self::fill
    pub const fn empty() -> Self {
        Self { samples: [0; SINE_TABLE_LEN] }
    }

    /// Compute the cycle in place. Call once before the first lookup.
    pub fn fill(&mut self) {
        for (i, sample) in self.samples.iter_mut().enumerate() {
            let phase = i as f32 * (TAU / SINE_TABLE_LEN as f32);
            *sample = libm::roundf((libm::sinf(phase) + 1.0) * 0.5 * 255.0) as u8;
        }
    }

    /// Sample at `position`, which the generator keeps in `[0, len)`.
    pub fn lookup(&self, position: u32) -> u8 {
        self.samples[position as usize % SINE_TABLE_LEN]
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> SineTable {
        let mut table = SineTable::empty();
        table.fill();
        table
    }

    #[test]
    fn starts_at_midscale() {
        // sin(0) = 0 maps to 127.5, which rounds up.
        assert_eq!(filled().lookup(0), 128);
    }

    #[test]
    fn peak_and_trough_hit_full_scale() {
        let table = filled();
        // Quarter cycle: sin = +1. Three quarters: sin = -1.
        assert_eq!(table.lookup(SINE_TABLE_LEN as u32 / 4), 255);
        assert_eq!(table.lookup(3 * SINE_TABLE_LEN as u32 / 4), 0);
    }

    #[test]
    fn half_cycle_is_inverted_copy() {
        let table = filled();
        let half = SINE_TABLE_LEN as u32 / 2;
        for i in (0..half).step_by(37) {
            let a = table.lookup(i) as i32;
            let b = table.lookup(i + half) as i32;
            // a + b = 255 up to rounding.
            assert!((a + b - 255).abs() <= 1, "index {i}: {a} + {b}");
        }
    }

    #[test]
    fn lookup_wraps_past_the_end() {
        let table = filled();
        assert_eq!(table.lookup(SINE_TABLE_LEN as u32), table.lookup(0));
        assert_eq!(table.lookup(SINE_TABLE_LEN as u32 + 17), table.lookup(17));
    }

    #[test]
    fn empty_table_is_silent() {
        let table = SineTable::empty();
        assert!((0..SINE_TABLE_LEN as u32).all(|i| table.lookup(i) == 0));
    }
}
