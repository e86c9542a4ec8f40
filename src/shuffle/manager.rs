use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::prelude::*;
use tracing::debug;

use super::ShuffleError;

/// One round of a list: the indices not yet handed out, plus the item count
/// the permutation was built for.
#[derive(Debug)]
struct Round {
    size: usize,
    queue: VecDeque<usize>,
}

impl Round {
    /// Start a round over `0..size` and take its first pick. `size` must be non-zero.
    fn start<R: Rng + ?Sized>(size: usize, rng: &mut R) -> (usize, Self) {
        let first = rng.gen_range(0..size);
        let mut rest: Vec<usize> = (0..size).filter(|&i| i != first).collect();
        rest.shuffle(rng);
        (
            first,
            Self {
                size,
                queue: rest.into(),
            },
        )
    }

    /// Next pick, if this round was built for `size` items and is not used up
    fn next_for(&mut self, size: usize) -> Option<usize> {
        if self.size == size {
            self.queue.pop_front()
        } else {
            None
        }
    }
}

/// Hands out item indices per list.
///
/// With `avoid_previous_results` set, every list gets its own round: a shuffled
/// permutation of `0..size` dispensed front to back. A new round starts when the
/// previous one is used up or when the list's item count no longer matches the
/// round. Without it, each call is an independent uniform pick.
///
/// Rounds live only in memory. The cache sits behind a mutex so the
/// check / rebuild / pop sequence for a list is never interleaved with another call.
#[derive(Debug, Default)]
pub struct ShuffleSessionManager {
    rounds: Mutex<HashMap<String, Round>>,
}

impl ShuffleSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next index for `list_id` using the thread-local RNG
    pub fn next_index(
        &self,
        list_id: &str,
        size: usize,
        avoid_previous_results: bool,
    ) -> Result<usize, ShuffleError> {
        self.next_index_with(list_id, size, avoid_previous_results, &mut thread_rng())
    }

    /// Next index for `list_id`, drawing randomness from `rng`
    pub fn next_index_with<R: Rng + ?Sized>(
        &self,
        list_id: &str,
        size: usize,
        avoid_previous_results: bool,
        rng: &mut R,
    ) -> Result<usize, ShuffleError> {
        if size == 0 {
            return Err(ShuffleError::InvalidArgument(format!(
                "size must be > 0 (list '{}')",
                list_id
            )));
        }

        if !avoid_previous_results {
            return Ok(rng.gen_range(0..size));
        }

        let mut rounds = self.lock();
        match rounds.entry(list_id.to_string()) {
            Entry::Occupied(mut slot) => {
                if let Some(index) = slot.get_mut().next_for(size) {
                    return Ok(index);
                }
                let (index, round) = Round::start(size, rng);
                let previous = slot.insert(round);
                if previous.size != size && !previous.queue.is_empty() {
                    debug!(
                        "List '{}' changed size {} -> {}, dropping {} pending picks",
                        list_id,
                        previous.size,
                        size,
                        previous.queue.len()
                    );
                }
                debug!("Started new round for list '{}' ({} items)", list_id, size);
                Ok(index)
            }
            Entry::Vacant(slot) => {
                let (index, round) = Round::start(size, rng);
                slot.insert(round);
                debug!("Started first round for list '{}' ({} items)", list_id, size);
                Ok(index)
            }
        }
    }

    /// Forget the round for `list_id`. No-op when there is none.
    pub fn clear(&self, list_id: &str) {
        if self.lock().remove(list_id).is_some() {
            debug!("Cleared shuffle round for list '{}'", list_id);
        }
    }

    /// Forget every round, e.g. after all lists were replaced by an import
    pub fn reset(&self) {
        let mut rounds = self.lock();
        if !rounds.is_empty() {
            debug!("Resetting {} shuffle rounds", rounds.len());
            rounds.clear();
        }
    }

    /// Picks left in the current round for `list_id`, if one exists
    pub fn remaining(&self, list_id: &str) -> Option<usize> {
        self.lock().get(list_id).map(|round| round.queue.len())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Round>> {
        // The map stays consistent even if a holder panicked mid-call
        self.rounds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
