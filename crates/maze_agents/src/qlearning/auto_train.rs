//! Repeated training until the greedy policy reaches the goal.

use super::agent::QLearningAgent;
use super::episode::{AttemptReport, AutoTrainSummary};
use crate::grid::GridView;
use crate::random::RandomSource;
use crate::types::Location;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops an [`AutoTrain`] sequence before its next attempt.
///
/// Clones share the same flag, so a token can be handed to another thread or
/// a UI callback.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once any clone has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An auto-train sequence, created by
/// [`QLearningAgent::start_auto_train`].
///
/// Each call to `next()` runs one training round and a greedy verification
/// rollout capped at `width * depth` steps. Dead ends found by one round are
/// kept for the following rounds. The iterator ends after the first verified
/// round, after `max_training_attempts` rounds, or once cancelled.
pub struct AutoTrain<'a, G: GridView, R: RandomSource> {
    agent: &'a mut QLearningAgent<G, R>,
    token: CancelToken,
    max_attempts: u32,
    attempts: u32,
    total_iterations: u64,
    finished: bool,
    cancelled: bool,
    final_path: Option<Vec<Location>>,
}

impl<'a, G: GridView, R: RandomSource> AutoTrain<'a, G, R> {
    pub(crate) fn new(agent: &'a mut QLearningAgent<G, R>) -> Self {
        agent.training = true;
        let max_attempts = agent.config().max_training_attempts;
        info!(
            "Auto-training started: up to {} attempts from {:?} to {:?}",
            max_attempts,
            agent.start(),
            agent.goal()
        );
        Self {
            agent,
            token: CancelToken::new(),
            max_attempts,
            attempts: 0,
            total_iterations: 0,
            finished: false,
            cancelled: false,
            final_path: None,
        }
    }

    /// Replaces the cancel flag with a shared one.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// A handle that can stop this sequence from elsewhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Stops the sequence before its next attempt.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The agent being trained.
    pub fn agent(&self) -> &QLearningAgent<G, R> {
        &*self.agent
    }

    /// Returns the number of attempts run so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Runs the remaining attempts and returns the totals.
    pub fn finish(mut self) -> AutoTrainSummary {
        for _ in self.by_ref() {}
        AutoTrainSummary {
            success: self.final_path.is_some(),
            attempts: self.attempts,
            total_iterations: self.total_iterations,
            cancelled: self.cancelled,
            final_path: self.final_path.take(),
        }
    }
}

impl<G: GridView, R: RandomSource> Iterator for AutoTrain<'_, G, R> {
    type Item = AttemptReport;

    fn next(&mut self) -> Option<AttemptReport> {
        if self.finished {
            return None;
        }
        if self.token.is_cancelled() {
            info!("Auto-training cancelled after {} attempts", self.attempts);
            self.cancelled = true;
            self.finished = true;
            return None;
        }
        if self.attempts >= self.max_attempts {
            info!(
                "Auto-training failed: {} attempts, {} iterations",
                self.attempts, self.total_iterations
            );
            self.finished = true;
            return None;
        }

        self.attempts += 1;
        let episode = match self.agent.train_round() {
            Ok(episode) => episode,
            Err(e) => {
                warn!("Auto-training aborted: {}", e);
                self.finished = true;
                return None;
            }
        };
        self.total_iterations += u64::from(episode.iterations);

        let grid = self.agent.grid();
        let cap = grid.cell_count();
        let verified_path = self.agent.greedy_rollout(cap, true).ok();

        if let Some(path) = &verified_path {
            info!(
                "Auto-training succeeded: attempt {}, {} iterations in total, path of {} cells",
                self.attempts,
                self.total_iterations,
                path.len()
            );
            self.final_path = Some(path.clone());
            self.finished = true;
        }

        Some(AttemptReport {
            attempt: self.attempts,
            episode,
            verified_path,
        })
    }
}

impl<G: GridView, R: RandomSource> Drop for AutoTrain<'_, G, R> {
    fn drop(&mut self) {
        self.agent.training = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_across_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel())
            .join()
            .unwrap();
        assert!(token.is_cancelled());
    }
}
