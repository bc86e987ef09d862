use leptos::prelude::*;

use kartquiz_shared::{Phase, QuizEvent};

use crate::app::Tick;
use crate::game::Game;
use crate::time_format::format_clock;

/// Shown over the map once every active area is found.
#[component]
pub fn CompletionOverlay() -> impl IntoView {
    let game: Game = expect_context();
    let Tick(tick) = expect_context();

    let complete = move || game.quiz.with(|quiz| quiz.phase() == Phase::Complete);
    let summary = move || {
        game.quiz.with(|quiz| {
            let total = quiz.total();
            let errors = quiz.errors();
            let noun = if total == 1 { "kommune" } else { "kommuner" };
            format!("{total} {noun}, {errors} feil")
        })
    };
    let time = move || format_clock(game.stopwatch.get().elapsed_secs(tick.get()));

    view! {
        {move || complete().then(|| view! {
            <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; background: rgba(12,14,23,0.72); z-index: 20;">
                <div style="background: #161921; border: 1px solid #282c3e; border-radius: 8px; padding: 24px 32px; text-align: center; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; box-shadow: 0 4px 16px rgba(0,0,0,0.5);">
                    <div style="font-size: 1.3rem; font-weight: 700; margin-bottom: 8px;">"Ferdig!"</div>
                    <div style="font-size: 0.85rem; color: #9a9590;">{summary}</div>
                    <div style="font-size: 1.6rem; font-family: 'JetBrains Mono', monospace; margin: 12px 0;">{time}</div>
                    <button
                        style="background: #f5c542; border: none; border-radius: 4px; color: #13161f; font-weight: 700; padding: 8px 18px; cursor: pointer;"
                        on:click=move |_| { game.dispatch(QuizEvent::Restart); }
                    >
                        "Spill igjen"
                    </button>
                </div>
            </div>
        })}
    }
}
