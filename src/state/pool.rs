//! The depleting question pool and its replenishment policy.

use crate::questions::{QuestionSource, QuestionsError};
use crate::types::QuestionRecord;
use rand::seq::SliceRandom;
use rand::Rng;

/// A shuffled backlog of questions for one named source plus the bounded
/// batch currently in play. `remaining` and `current` partition the undealt
/// questions; `total` is fixed per source load until the source changes.
#[derive(Debug, Default)]
pub struct QuestionPool {
    source_id: Option<String>,
    total: usize,
    remaining: Vec<QuestionRecord>,
    current: Vec<QuestionRecord>,
    current_limit: usize,
}

impl QuestionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    pub fn current_len(&self) -> usize {
        self.current.len()
    }

    pub fn current_limit(&self) -> usize {
        self.current_limit
    }

    /// Deal a fresh batch of up to `limit` questions.
    ///
    /// Three mutually exclusive branches, evaluated in order and preserved
    /// exactly from the original game (the recycling semantics are
    /// observable behavior, not an accident to simplify away):
    /// 1. different source: discard everything, fetch and shuffle the full
    ///    set, reset `total`;
    /// 2. same source but fewer than `limit` left: re-fetch and reshuffle
    ///    the whole source, so already-played questions may repeat while
    ///    `total` keeps its original value;
    /// 3. otherwise: recycle the unplayed leftovers of the previous batch
    ///    back into `remaining` before dealing.
    pub fn load<R: Rng>(
        &mut self,
        source: &dyn QuestionSource,
        source_id: &str,
        limit: usize,
        rng: &mut R,
    ) -> Result<(), QuestionsError> {
        if self.source_id.as_deref() != Some(source_id) {
            let questions = fetch_shuffled(source, source_id, rng)?;
            self.source_id = Some(source_id.to_string());
            self.total = questions.len();
            self.remaining = questions;
        } else if self.remaining.len() < limit {
            self.remaining = fetch_shuffled(source, source_id, rng)?;
        } else {
            self.remaining.append(&mut self.current);
        }

        let take = limit.min(self.remaining.len());
        self.current = self.remaining.drain(..take).collect();
        self.current_limit = limit;

        tracing::info!(
            source_id,
            total = self.total,
            using = self.current.len(),
            remaining = self.remaining.len(),
            "question batch dealt"
        );

        Ok(())
    }

    /// Remove and return the last question of the current batch (stack
    /// order; the shuffle at fetch time makes this invisible to players).
    pub fn pop(&mut self) -> Option<QuestionRecord> {
        self.current.pop()
    }
}

fn fetch_shuffled<R: Rng>(
    source: &dyn QuestionSource,
    source_id: &str,
    rng: &mut R,
) -> Result<Vec<QuestionRecord>, QuestionsError> {
    let mut questions = source.load(source_id)?;
    questions.shuffle(rng);
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FakeSource {
        sets: std::collections::HashMap<String, Vec<QuestionRecord>>,
    }

    impl FakeSource {
        fn with_questions(source_id: &str, count: usize) -> Self {
            let mut sets = std::collections::HashMap::new();
            sets.insert(source_id.to_string(), numbered(source_id, count));
            Self { sets }
        }
    }

    impl QuestionSource for FakeSource {
        fn load(&self, source_id: &str) -> Result<Vec<QuestionRecord>, QuestionsError> {
            self.sets
                .get(source_id)
                .cloned()
                .ok_or_else(|| QuestionsError::MissingDelimiter {
                    source_id: source_id.to_string(),
                })
        }
    }

    fn numbered(source_id: &str, count: usize) -> Vec<QuestionRecord> {
        (0..count)
            .map(|i| QuestionRecord {
                question: format!("{source_id} question {i}"),
                answer: format!("{source_id} answer {i}"),
                regexp: None,
            })
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_fresh_load_partitions_the_source() {
        let source = FakeSource::with_questions("demo", 25);
        let mut pool = QuestionPool::new();

        pool.load(&source, "demo", 10, &mut rng()).unwrap();

        assert_eq!(pool.total(), 25);
        assert_eq!(pool.current_len(), 10);
        assert_eq!(pool.remaining_len(), 15);
        assert_eq!(pool.current_limit(), 10);
    }

    #[test]
    fn test_pop_depletes_current_batch_only() {
        let source = FakeSource::with_questions("demo", 25);
        let mut pool = QuestionPool::new();
        pool.load(&source, "demo", 10, &mut rng()).unwrap();

        for _ in 0..10 {
            assert!(pool.pop().is_some());
        }
        assert!(pool.pop().is_none());
        assert_eq!(pool.remaining_len(), 15);
    }

    #[test]
    fn test_pop_is_stack_ordered() {
        let source = FakeSource::with_questions("demo", 25);
        let mut pool = QuestionPool::new();
        pool.load(&source, "demo", 3, &mut rng()).unwrap();

        // Same seed, same shuffle: dealing takes the front three, popping
        // returns them back-to-front.
        let mut expected = numbered("demo", 25);
        expected.shuffle(&mut rng());

        assert_eq!(pool.pop().unwrap(), expected[2]);
        assert_eq!(pool.pop().unwrap(), expected[1]);
        assert_eq!(pool.pop().unwrap(), expected[0]);
    }

    #[test]
    fn test_reload_with_enough_remaining_recycles_current() {
        let source = FakeSource::with_questions("demo", 30);
        let mut pool = QuestionPool::new();
        pool.load(&source, "demo", 10, &mut rng()).unwrap();

        // Play seven, leave three unplayed in the batch.
        for _ in 0..7 {
            pool.pop();
        }
        assert_eq!(pool.remaining_len(), 20);

        // remaining (20) >= limit (10): the three leftovers are recycled,
        // not discarded, and nothing is re-fetched.
        pool.load(&source, "demo", 10, &mut rng()).unwrap();
        assert_eq!(pool.current_len(), 10);
        assert_eq!(pool.remaining_len(), 13);
        assert_eq!(pool.total(), 30);
    }

    #[test]
    fn test_reload_at_exactly_limit_takes_recycle_branch() {
        let source = FakeSource::with_questions("demo", 20);
        let mut pool = QuestionPool::new();
        pool.load(&source, "demo", 10, &mut rng()).unwrap();

        // remaining is exactly limit: still the recycle branch.
        assert_eq!(pool.remaining_len(), 10);
        pool.load(&source, "demo", 10, &mut rng()).unwrap();

        assert_eq!(pool.current_len(), 10);
        assert_eq!(pool.remaining_len(), 10);
    }

    #[test]
    fn test_reload_below_limit_reshuffles_whole_source() {
        let source = FakeSource::with_questions("demo", 12);
        let mut pool = QuestionPool::new();
        pool.load(&source, "demo", 10, &mut rng()).unwrap();
        assert_eq!(pool.remaining_len(), 2);

        pool.load(&source, "demo", 10, &mut rng()).unwrap();

        // Full set re-fetched: 12 questions minus the fresh batch of 10.
        assert_eq!(pool.current_len(), 10);
        assert_eq!(pool.remaining_len(), 2);
        assert_eq!(pool.total(), 12);
    }

    #[test]
    fn test_switching_source_resets_total() {
        let mut source = FakeSource::with_questions("first", 8);
        source
            .sets
            .insert("second".to_string(), numbered("second", 14));

        let mut pool = QuestionPool::new();
        pool.load(&source, "first", 5, &mut rng()).unwrap();
        assert_eq!(pool.total(), 8);

        pool.load(&source, "second", 5, &mut rng()).unwrap();
        assert_eq!(pool.total(), 14);
        assert_eq!(pool.current_len(), 5);
        assert_eq!(pool.remaining_len(), 9);
        assert!(pool
            .pop()
            .unwrap()
            .question
            .starts_with("second"));
    }

    #[test]
    fn test_load_failure_leaves_pool_untouched() {
        let source = FakeSource::with_questions("demo", 10);
        let mut pool = QuestionPool::new();
        pool.load(&source, "demo", 4, &mut rng()).unwrap();

        assert!(pool.load(&source, "missing", 4, &mut rng()).is_err());
        assert_eq!(pool.total(), 10);
        assert_eq!(pool.current_len(), 4);
    }

    #[test]
    fn test_limit_larger_than_source_deals_everything() {
        let source = FakeSource::with_questions("demo", 3);
        let mut pool = QuestionPool::new();
        pool.load(&source, "demo", 10, &mut rng()).unwrap();

        assert_eq!(pool.current_len(), 3);
        assert_eq!(pool.remaining_len(), 0);
        assert_eq!(pool.current_limit(), 10);
    }
}
