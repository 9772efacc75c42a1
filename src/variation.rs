//! Deterministic pseudo-daily variation.
//!
//! The platform has no live traffic telemetry, so the collectors derive a
//! repeatable day-to-day fluctuation from a stable hash of the trek slug
//! fed through sinusoids. The same slug always yields the same offset on
//! the same calendar day, across calls and across processes.

/// Polynomial rolling hash of the slug, masked to 32 bits and folded
/// into `[0, 1000)`. Stable, not cryptographic.
pub fn slug_hash(key: &str) -> i64 {
    let mut hash: i32 = 0;
    for ch in key.chars() {
        hash = hash.wrapping_mul(31).wrapping_add(ch as i32);
    }
    i64::from((hash % 1000).abs())
}

/// `sin((day + hash) * frequency) * amplitude`. Callers add their own
/// offset and clamp to the collector's range.
pub fn wave(day: u32, hash: i64, frequency: f64, amplitude: f64) -> f64 {
    ((f64::from(day) + hash as f64) * frequency).sin() * amplitude
}

/// Cosine twin of [`wave`], phase-shifted so a collector can stack two
/// independent fluctuations on the same hash.
pub fn cowave(day: u32, hash: i64, frequency: f64, amplitude: f64) -> f64 {
    ((f64::from(day) + hash as f64) * frequency).cos() * amplitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_across_calls() {
        assert_eq!(slug_hash("valley-of-flowers"), slug_hash("valley-of-flowers"));
        assert_eq!(slug_hash("chadar-frozen-river"), slug_hash("chadar-frozen-river"));
    }

    #[test]
    fn hash_stays_in_range() {
        for key in ["", "a", "everest-base-camp", "चादर-ट्रेक", &"x".repeat(512)] {
            let hash = slug_hash(key);
            assert!((0..1000).contains(&hash), "hash {hash} out of range for {key:?}");
        }
    }

    #[test]
    fn distinct_slugs_diverge() {
        assert_ne!(slug_hash("hampta-pass"), slug_hash("roopkund"));
    }

    #[test]
    fn wave_is_bounded_by_amplitude() {
        let hash = slug_hash("hampta-pass");
        for day in 1..=366 {
            assert!(wave(day, hash, 0.1, 30.0).abs() <= 30.0);
            assert!(cowave(day, hash, 0.05, 15.0).abs() <= 15.0);
        }
    }

    #[test]
    fn wave_is_deterministic() {
        let hash = slug_hash("valley-of-flowers");
        assert_eq!(wave(196, hash, 0.15, 25.0), wave(196, hash, 0.15, 25.0));
    }
}
