//! Overflow correction for fixed-width hardware tick counters.
//!
//! Acquisition cards latch a free-running counter that silently wraps
//! after `2^W - 1`. Any decrease between consecutive readings is taken to be
//! exactly one wraparound, and every later reading is shifted up by one
//! counter period.

/// A fixed-width unsigned counter reading.
pub trait CounterWord: Copy + PartialOrd {
    /// Counter width in bits.
    const WIDTH: u32;

    /// Widens the raw reading to a signed 64-bit tick count.
    fn widen(self) -> i64;

    /// Number of ticks in one full counter period (`2^WIDTH`).
    #[inline]
    #[must_use]
    fn period() -> i64 {
        1_i64 << Self::WIDTH
    }
}

impl CounterWord for u8 {
    const WIDTH: u32 = 8;

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }
}

impl CounterWord for u16 {
    const WIDTH: u32 = 16;

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }
}

impl CounterWord for u32 {
    const WIDTH: u32 = 32;

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }
}

/// Reconstructs an unbounded tick sequence from wrapped counter readings.
///
/// Element `i` of the result is `raw[i] + k_i * 2^W` where `k_i` counts the
/// decreases `raw[j-1] > raw[j]` for `1 <= j <= i`. The input is not checked
/// for plausibility: every decrease is treated as an overflow.
#[must_use]
pub fn correct_overflow<W: CounterWord>(raw: &[W]) -> Vec<i64> {
    let period = W::period();
    let mut out = Vec::with_capacity(raw.len());
    let mut offset = 0_i64;
    let mut prev: Option<W> = None;

    for &value in raw {
        if let Some(p) = prev {
            if p > value {
                offset += period;
            }
        }
        out.push(value.widen() + offset);
        prev = Some(value);
    }

    out
}

/// Counts the wraparounds `correct_overflow` would apply to `raw`.
#[must_use]
pub fn wraparound_count<W: CounterWord>(raw: &[W]) -> usize {
    raw.windows(2).filter(|pair| pair[0] > pair[1]).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_wraparound() {
        let raw: [u32; 4] = [4_294_967_290, 4_294_967_294, 2, 6];
        assert_eq!(
            correct_overflow(&raw),
            vec![4_294_967_290, 4_294_967_294, 4_294_967_298, 4_294_967_302]
        );
        assert_eq!(wraparound_count(&raw), 1);
    }

    #[test]
    fn test_empty_and_single() {
        let empty: [u32; 0] = [];
        assert!(correct_overflow(&empty).is_empty());
        assert_eq!(correct_overflow(&[u32::MAX]), vec![i64::from(u32::MAX)]);
        assert_eq!(wraparound_count(&[7_u32]), 0);
    }

    #[test]
    fn test_multiple_wraparounds_counted_independently() {
        let raw: [u16; 6] = [65_000, 10, 60_000, 5, 5, 70];
        let out = correct_overflow(&raw);
        assert_eq!(out, vec![65_000, 65_546, 125_536, 131_077, 131_077, 131_142]);
        assert_eq!(wraparound_count(&raw), 2);
    }

    #[test]
    fn test_equal_values_are_not_overflow() {
        let raw: [u32; 3] = [10, 10, 10];
        assert_eq!(correct_overflow(&raw), vec![10, 10, 10]);
    }

    #[test]
    fn test_matches_prefix_count_formula() {
        // Pseudo-random walk that wraps a u8 counter repeatedly.
        let mut raw = Vec::new();
        let mut value: u8 = 3;
        for step in 0..200_u32 {
            raw.push(value);
            value = value.wrapping_add(u8::try_from(step % 37 + 1).unwrap());
        }

        let out = correct_overflow(&raw);
        for (i, &corrected) in out.iter().enumerate() {
            let k = raw[..=i].windows(2).filter(|w| w[0] > w[1]).count();
            let k = i64::try_from(k).unwrap();
            assert_eq!(corrected, i64::from(raw[i]) + k * 256);
        }
        assert!(out.windows(2).all(|w| w[0] <= w[1]));
    }
}
