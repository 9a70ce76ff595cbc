//! Random sources injected into phantom generation and the Nemesis showdown.
use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::constants::{CHAOS_MAX, CHAOS_MIN};
use crate::week::WeekKey;

type HmacSha256 = Hmac<Sha256>;

/// Supplies the multiplicative chaos factor applied to a Nemesis score.
pub trait ChaosSource {
    /// Draw a factor in `[CHAOS_MIN, CHAOS_MAX]`.
    fn chaos_factor(&mut self) -> f64;
}

impl<T: ChaosSource + ?Sized> ChaosSource for &mut T {
    fn chaos_factor(&mut self) -> f64 {
        (**self).chaos_factor()
    }
}

/// Uniform chaos drawn from any RNG.
#[derive(Debug, Clone)]
pub struct RngChaos<R> {
    rng: R,
}

impl<R: Rng> RngChaos<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> ChaosSource for RngChaos<R> {
    fn chaos_factor(&mut self) -> f64 {
        self.rng.gen_range(CHAOS_MIN..=CHAOS_MAX)
    }
}

/// Pinned chaos for deterministic callers. Values are clamped into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedChaos(pub f64);

impl ChaosSource for FixedChaos {
    fn chaos_factor(&mut self) -> f64 {
        if self.0.is_finite() {
            self.0.clamp(CHAOS_MIN, CHAOS_MAX)
        } else {
            1.0
        }
    }
}

/// Independent random streams for one encounter.
#[derive(Debug, Clone)]
pub struct EncounterRng {
    phantom: ChaCha20Rng,
    chaos: ChaCha20Rng,
}

impl EncounterRng {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            phantom: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"phantom")),
            chaos: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"chaos")),
        }
    }

    /// Streams keyed on the relationship and week, so a retried showdown
    /// replays the same draws.
    #[must_use]
    pub fn for_encounter(relationship_id: &str, week: WeekKey) -> Self {
        Self::from_seed(encounter_seed(relationship_id, week))
    }

    pub fn phantom(&mut self) -> &mut ChaCha20Rng {
        &mut self.phantom
    }

    pub fn chaos(&mut self) -> RngChaos<&mut ChaCha20Rng> {
        RngChaos::new(&mut self.chaos)
    }
}

/// Stable seed for one (relationship, week) pair.
#[must_use]
pub fn encounter_seed(relationship_id: &str, week: WeekKey) -> u64 {
    hmac_u64(relationship_id.as_bytes(), week.to_string().as_bytes())
}

fn derive_stream_seed(seed: u64, domain_tag: &[u8]) -> u64 {
    hmac_u64(&seed.to_le_bytes(), domain_tag)
}

fn hmac_u64(key: &[u8], message: &[u8]) -> u64 {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return 0;
    };
    mac.update(message);
    let digest = mac.finalize().into_bytes();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;

    #[test]
    fn rng_chaos_stays_in_range() {
        let mut chaos = RngChaos::new(SmallRng::seed_from_u64(7));
        for _ in 0..1_000 {
            let f = chaos.chaos_factor();
            assert!((CHAOS_MIN..=CHAOS_MAX).contains(&f), "{f}");
        }
    }

    #[test]
    fn fixed_chaos_clamps() {
        assert!((FixedChaos(2.0).chaos_factor() - CHAOS_MAX).abs() < f64::EPSILON);
        assert!((FixedChaos(0.1).chaos_factor() - CHAOS_MIN).abs() < f64::EPSILON);
        assert!((FixedChaos(f64::NAN).chaos_factor() - 1.0).abs() < f64::EPSILON);
        assert!((FixedChaos(0.9).chaos_factor() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn encounter_streams_are_reproducible() {
        let week = WeekKey::new(2026, 42).unwrap();
        let mut a = EncounterRng::for_encounter("rel-1", week);
        let mut b = EncounterRng::for_encounter("rel-1", week);
        assert_eq!(a.phantom().r#gen::<u64>(), b.phantom().r#gen::<u64>());
        assert!((a.chaos().chaos_factor() - b.chaos().chaos_factor()).abs() < f64::EPSILON);
    }

    #[test]
    fn encounter_seed_varies_by_week_and_relationship() {
        let w1 = WeekKey::new(2026, 42).unwrap();
        let w2 = w1.next();
        assert_ne!(encounter_seed("rel-1", w1), encounter_seed("rel-1", w2));
        assert_ne!(encounter_seed("rel-1", w1), encounter_seed("rel-2", w1));
    }

    #[test]
    fn phantom_and_chaos_streams_differ() {
        let mut bundle = EncounterRng::from_seed(99);
        let p: u64 = bundle.phantom().r#gen();
        let mut chaos_rng = bundle.chaos().into_inner().clone();
        let c: u64 = chaos_rng.r#gen();
        assert_ne!(p, c);
    }
}
