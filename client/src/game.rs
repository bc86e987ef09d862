use leptos::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use kartquiz_shared::{AreaSet, Quiz, QuizEvent, Transition};

use crate::stopwatch::{Stopwatch, now_ms};

/// Reactive handle around the quiz reducer and the round timer.
///
/// Every UI event goes through [`Game::dispatch`], so the quiz signal only
/// notifies when a transition actually changed something.
#[derive(Clone, Copy)]
pub(crate) struct Game {
    pub quiz: RwSignal<Quiz>,
    pub stopwatch: RwSignal<Stopwatch>,
    rng: StoredValue<SmallRng>,
}

impl Game {
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let quiz = Quiz::new(AreaSet::empty(), &mut rng);
        Self {
            quiz: RwSignal::new(quiz),
            stopwatch: RwSignal::new(Stopwatch::started(now_ms())),
            rng: StoredValue::new(rng),
        }
    }

    pub fn dispatch(&self, event: QuizEvent) -> Transition {
        let quiz = self.quiz;
        let transition = self
            .rng
            .try_update_value(|rng| {
                let mut transition = Transition::Ignored;
                quiz.maybe_update(|quiz| {
                    transition = quiz.apply(event, rng);
                    transition != Transition::Ignored
                });
                transition
            })
            .unwrap_or(Transition::Ignored);

        let complete = quiz.with_untracked(Quiz::is_complete);
        let now = now_ms();
        match transition {
            Transition::Reset => self.stopwatch.update(|watch| {
                watch.reset(now);
                if complete {
                    watch.stop(now);
                }
            }),
            Transition::Correct if complete => self.stopwatch.update(|watch| watch.stop(now)),
            _ => {}
        }
        transition
    }

    pub fn guess(&self, id: &str) {
        if self.dispatch(QuizEvent::Guess(id.to_string())) == Transition::Wrong {
            let expected = self
                .quiz
                .with_untracked(|quiz| quiz.current_name().to_string());
            web_sys::console::debug_1(&format!("wrong guess {id}, looking for {expected}").into());
        }
    }
}

/// Seed for the session shuffle; rounds differ per page load.
pub(crate) fn session_seed() -> u64 {
    let entropy = (js_sys::Math::random() * u32::MAX as f64) as u64;
    (entropy << 32) ^ now_ms() as u64
}
