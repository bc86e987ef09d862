//! Quiz round state machine.
//!
//! All play state lives in [`Quiz`] and changes only through [`Quiz::apply`]
//! (or the per-event helpers it dispatches to). The random source is passed
//! in by the caller so rounds can be replayed with a seeded generator.

use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::area::{AreaId, AreaSet};

/// Uniform in-place Fisher–Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    Guess(AreaId),
    Skip,
    Restart,
    /// The active area collection was replaced (e.g. a region filter changed).
    ActiveSetChanged(AreaSet),
}

/// What a single event did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Correct,
    Wrong,
    Skipped,
    Reset,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AreaLabel {
    name: String,
    group: String,
}

/// Display lookups built once per active set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaIndex {
    labels: HashMap<AreaId, AreaLabel>,
}

impl AreaIndex {
    pub fn build(areas: &AreaSet) -> Self {
        let labels = areas
            .iter()
            .map(|area| {
                let label = AreaLabel {
                    name: area.name.clone(),
                    group: area.group_name().unwrap_or_default().to_string(),
                };
                (area.id.clone(), label)
            })
            .collect();
        Self { labels }
    }

    /// Display name, or `""` for an unknown id.
    pub fn name(&self, id: &str) -> &str {
        self.labels.get(id).map_or("", |label| label.name.as_str())
    }

    /// Containing group name, or `""` when unknown or ungrouped.
    pub fn group(&self, id: &str) -> &str {
        self.labels.get(id).map_or("", |label| label.group.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    active: AreaSet,
    index: AreaIndex,
    order: Vec<AreaId>,
    current_index: usize,
    solved: HashSet<AreaId>,
    errors: u32,
}

impl Quiz {
    pub fn new<R: Rng + ?Sized>(active: AreaSet, rng: &mut R) -> Self {
        let mut quiz = Self {
            index: AreaIndex::build(&active),
            active,
            order: Vec::new(),
            current_index: 0,
            solved: HashSet::new(),
            errors: 0,
        };
        quiz.restart(rng);
        quiz
    }

    /// Single entry point for every event source.
    pub fn apply<R: Rng + ?Sized>(&mut self, event: QuizEvent, rng: &mut R) -> Transition {
        match event {
            QuizEvent::Guess(id) => self.guess(&id),
            QuizEvent::Skip => self.skip(),
            QuizEvent::Restart => {
                self.restart(rng);
                Transition::Reset
            }
            QuizEvent::ActiveSetChanged(active) => self.set_active(active, rng),
        }
    }

    pub fn guess(&mut self, id: &str) -> Transition {
        if self.is_complete() || self.solved.contains(id) {
            return Transition::Ignored;
        }
        let Some(target) = self.order.get(self.current_index) else {
            return Transition::Ignored;
        };

        if target == id {
            self.solved.insert(id.to_string());
            self.current_index += 1;
            tracing::debug!(id, solved = self.solved.len(), "correct guess");
            Transition::Correct
        } else {
            self.errors += 1;
            tracing::debug!(id, expected = %target, errors = self.errors, "wrong guess");
            Transition::Wrong
        }
    }

    /// Re-queue the current target at the end of the order and move on.
    pub fn skip(&mut self) -> Transition {
        if self.is_complete() {
            return Transition::Ignored;
        }
        let Some(target) = self.order.get(self.current_index).cloned() else {
            return Transition::Ignored;
        };
        tracing::debug!(id = %target, "target skipped");
        self.order.push(target);
        self.current_index += 1;
        Transition::Skipped
    }

    /// Fresh permutation of the current active ids; clears all progress.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<AreaId> = self.active.ids().map(str::to_string).collect();
        shuffle(&mut order, rng);
        self.order = order;
        self.current_index = 0;
        self.solved.clear();
        self.errors = 0;
        tracing::debug!(areas = self.order.len(), "round reset");
    }

    /// Reset against a new active set. A set with the same identity is ignored.
    pub fn set_active<R: Rng + ?Sized>(&mut self, active: AreaSet, rng: &mut R) -> Transition {
        if self.active.same_as(&active) {
            return Transition::Ignored;
        }
        self.index = AreaIndex::build(&active);
        self.active = active;
        self.restart(rng);
        Transition::Reset
    }

    pub fn phase(&self) -> Phase {
        if self.is_complete() {
            Phase::Complete
        } else {
            Phase::Playing
        }
    }

    /// Complete once every active area has been matched, however many skips.
    pub fn is_complete(&self) -> bool {
        self.solved.len() >= self.total()
    }

    pub fn current_target(&self) -> Option<&str> {
        self.order.get(self.current_index).map(String::as_str)
    }

    pub fn current_name(&self) -> &str {
        self.current_target().map_or("", |id| self.index.name(id))
    }

    pub fn current_group(&self) -> &str {
        self.current_target().map_or("", |id| self.index.group(id))
    }

    /// `current_index / total`, capped at 1.
    ///
    /// The denominator is the number of active areas, not the queue length:
    /// skips grow the queue but must not make a finished round look unfinished.
    pub fn progress(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        (self.current_index as f64 / total as f64).min(1.0)
    }

    pub fn total(&self) -> usize {
        self.active.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    pub fn order(&self) -> &[AreaId] {
        &self.order
    }

    pub fn solved(&self) -> &HashSet<AreaId> {
        &self.solved
    }

    pub fn is_solved(&self, id: &str) -> bool {
        self.solved.contains(id)
    }

    pub fn active(&self) -> &AreaSet {
        &self.active
    }

    pub fn index(&self) -> &AreaIndex {
        &self.index
    }
}
