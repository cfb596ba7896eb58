//! Weighted fair selection of the next leader.
//!
//! The pool is the active roster minus the previous leader (when that still
//! leaves someone). Each candidate gets an integer weight
//! `(N - score mod N) * 10`, where `N` is the pool size, and one candidate is
//! drawn by roulette wheel. Randomness is injected so draws are reproducible
//! under a seeded generator.

use rand::Rng;

use crate::{Error, Result, participant::Participant, selection::Selection};

/// Multiplier applied to every weight so low-probability candidates stay
/// reachable but rare.
pub const WEIGHT_SCALE: u64 = 10;

/// A member of the selection pool with its roulette weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
  pub participant: &'a Participant,
  pub weight:      u64,
}

/// The weight of a participant with `fairness_score` in a pool of
/// `pool_size` candidates.
///
/// A pool always holds at least the participant being weighed, so a
/// `pool_size` of zero is treated as one.
pub fn weight(fairness_score: u32, pool_size: usize) -> u64 {
  let n = pool_size.max(1) as u64;
  (n - u64::from(fairness_score) % n) * WEIGHT_SCALE
}

/// Build the weighted pool from the active roster and the chronological
/// rotation history.
pub fn candidates<'a>(
  active: &'a [Participant],
  history: &[Selection],
) -> Result<Vec<Candidate<'a>>> {
  if active.is_empty() {
    return Err(Error::EmptyRoster);
  }

  let pool: Vec<&Participant> = match history.last() {
    // Nobody has led yet, so nobody is excluded.
    None => active.iter().collect(),
    Some(previous) => {
      let without_previous: Vec<&Participant> = active
        .iter()
        .filter(|p| p.participant_id != previous.participant_id)
        .collect();
      if without_previous.is_empty() {
        // The previous leader is the only one left; they lead again.
        active.iter().collect()
      } else {
        without_previous
      }
    }
  };

  let n = pool.len();
  Ok(
    pool
      .into_iter()
      .map(|participant| Candidate {
        participant,
        weight: weight(participant.fairness_score, n),
      })
      .collect(),
  )
}

/// Roulette-wheel draw over `candidates`.
///
/// Draws `r` uniformly from `[0, total)` and returns the first candidate whose
/// inclusive cumulative weight is `>= r`. The comparison is non-strict, so a
/// draw landing exactly on a boundary belongs to the candidate that ends
/// there rather than the one that starts there. With a continuous draw this
/// has probability zero and does not skew the distribution measurably.
pub fn draw<'a, R: Rng + ?Sized>(
  candidates: &[Candidate<'a>],
  rng: &mut R,
) -> Result<&'a Participant> {
  let total: u64 = candidates.iter().map(|c| c.weight).sum();
  if total == 0 {
    return Err(Error::EmptyRoster);
  }

  let r = rng.gen_range(0.0..total as f64);
  let mut upto = 0u64;
  for candidate in candidates {
    if (upto + candidate.weight) as f64 >= r {
      return Ok(candidate.participant);
    }
    upto += candidate.weight;
  }

  // Only reachable through float rounding at the top of the range.
  candidates
    .last()
    .map(|c| c.participant)
    .ok_or(Error::EmptyRoster)
}

/// Choose the leader for the next occurrence.
pub fn select<'a, R: Rng + ?Sized>(
  active: &'a [Participant],
  history: &[Selection],
  rng: &mut R,
) -> Result<&'a Participant> {
  let pool = candidates(active, history)?;
  draw(&pool, rng)
}
