//! Frequency-table normalization shared by the rANS backend: counts observed in a first pass are
//! scaled to sum to exactly `1 << precision_bits`, the precision rANS renormalization requires.

/// Scales `counts` to a table of the same length summing to `1 << precision_bits`. Every symbol
/// with a nonzero count keeps a nonzero frequency, so no observed symbol becomes unencodable.
pub fn normalize(counts: &[u32], precision_bits: u32) -> Vec<u32> {
    let total_target = 1u32 << precision_bits;
    let total_observed: u64 = counts.iter().map(|&c| c as u64).sum();
    if total_observed == 0 {
        // Degenerate: give every symbol equal weight so encode/decode of an empty stream is
        // still well-defined.
        let share = total_target / counts.len().max(1) as u32;
        let mut freqs = vec![share; counts.len()];
        let leftover = total_target - share * counts.len() as u32;
        for f in freqs.iter_mut().take(leftover as usize) {
            *f += 1;
        }
        return freqs;
    }

    let mut freqs: Vec<u32> = counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0
            } else {
                (((c as u64) * total_target as u64) / total_observed).max(1) as u32
            }
        })
        .collect();

    let mut sum: i64 = freqs.iter().map(|&f| f as i64).sum();
    let mut diff = total_target as i64 - sum;

    // Adjust the largest-frequency nonzero bucket repeatedly until the table sums exactly to
    // the target; this converges in a handful of steps for any realistic alphabet.
    while diff != 0 {
        let Some((idx, _)) = freqs
            .iter()
            .enumerate()
            .filter(|&(i, &f)| f > 0 && !(diff < 0 && f as i64 + diff < 1 && counts[i] > 0))
            .max_by_key(|&(_, &f)| f)
        else {
            break;
        };
        if diff > 0 {
            freqs[idx] += 1;
            diff -= 1;
        } else {
            freqs[idx] -= 1;
            diff += 1;
        }
        sum = freqs.iter().map(|&f| f as i64).sum();
        debug_assert_eq!(sum, total_target as i64 - diff);
    }

    freqs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_exact_total() {
        let counts = [5u32, 3, 0, 17, 1];
        let freqs = normalize(&counts, 12);
        assert_eq!(freqs.iter().sum::<u32>(), 1 << 12);
        assert_eq!(freqs[2], 0);
        for (i, &c) in counts.iter().enumerate() {
            if c > 0 {
                assert!(freqs[i] >= 1);
            }
        }
    }

    #[test]
    fn handles_empty_counts() {
        let counts = [0u32; 4];
        let freqs = normalize(&counts, 8);
        assert_eq!(freqs.iter().sum::<u32>(), 1 << 8);
    }

    #[test]
    fn single_symbol_takes_everything() {
        let counts = [0u32, 42, 0];
        let freqs = normalize(&counts, 10);
        assert_eq!(freqs, vec![0, 1 << 10, 0]);
    }
}
