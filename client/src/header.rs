use leptos::prelude::*;
use wasm_bindgen::JsCast;

use kartquiz_shared::QuizEvent;

use crate::app::{GroupHintEnabled, LensEnabled, Loaded, SelectedGroup, Tick};
use crate::game::Game;
use crate::time_format::format_clock;

const ALL_GROUPS_LABEL: &str = "Hele Norge";

const BUTTON_STYLE: &str = "background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; font-size: 0.75rem; padding: 6px 12px; cursor: pointer; font-family: 'Inter', system-ui, sans-serif;";

/// Prompt, progress, timer and the round controls.
#[component]
pub fn QuizHeader() -> impl IntoView {
    let game: Game = expect_context();
    let Tick(tick) = expect_context();
    let GroupHintEnabled(group_hint) = expect_context();

    let target = move || game.quiz.with(|quiz| quiz.current_target().map(str::to_string));
    let name = move || game.quiz.with(|quiz| quiz.current_name().to_string());
    let hint = move || {
        if !group_hint.get() {
            return None;
        }
        let group = game.quiz.with(|quiz| quiz.current_group().to_string());
        (!group.is_empty()).then_some(group)
    };
    let progress = move || {
        game.quiz
            .with(|quiz| format!("{}/{}", quiz.current_index().min(quiz.total()), quiz.total()))
    };
    let progress_width = move || format!("{:.1}%", game.quiz.with(|quiz| quiz.progress()) * 100.0);
    let errors = move || game.quiz.with(|quiz| quiz.errors());
    let elapsed = move || format_clock(game.stopwatch.get().elapsed_secs(tick.get()));

    // Id whose shield failed to load; hides the image until the target changes.
    let broken_shield: RwSignal<Option<String>> = RwSignal::new(None);
    let shield_src = move || target().map(|id| format!("/shields/{id}.png")).unwrap_or_default();
    let shield_hidden = move || {
        let current = target();
        current.is_none() || broken_shield.with(|broken| *broken == current)
    };

    view! {
        <header style="display: flex; align-items: center; gap: 16px; padding: 10px 16px; background: #13161f; border-bottom: 1px solid #282c3e; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;">
            <img
                src=shield_src
                alt=""
                width="40"
                height="48"
                style:display=move || if shield_hidden() { "none" } else { "block" }
                on:error=move |_| broken_shield.set(target())
            />
            <div style="display: flex; flex-direction: column; min-width: 180px;">
                <span style="font-size: 0.65rem; color: #9a9590; text-transform: uppercase; letter-spacing: 0.05em;">"Finn"</span>
                <span style="font-size: 1.2rem; font-weight: 700;">{name}</span>
                {move || hint().map(|group| view! {
                    <span style="font-size: 0.72rem; color: #9a9590;">{group}</span>
                })}
            </div>
            <div style="display: flex; flex-direction: column; gap: 4px; min-width: 120px;">
                <span style="font-size: 0.72rem; font-family: 'JetBrains Mono', monospace; font-variant-numeric: tabular-nums;">{progress}</span>
                <div style="height: 4px; background: rgba(255,255,255,0.06); border-radius: 2px; overflow: hidden;">
                    <div style:width=progress_width style="height: 100%; background: #f5c542;" />
                </div>
            </div>
            <span style="font-size: 0.72rem; color: #e07a5f; font-family: 'JetBrains Mono', monospace;">
                {move || format!("Feil: {}", errors())}
            </span>
            <span style="font-size: 0.9rem; font-family: 'JetBrains Mono', monospace; font-variant-numeric: tabular-nums;">
                {elapsed}
            </span>
            <div style="margin-left: auto; display: flex; align-items: center; gap: 8px;">
                <button style=BUTTON_STYLE on:click=move |_| { game.dispatch(QuizEvent::Skip); }>"Hopp over"</button>
                <button style=BUTTON_STYLE on:click=move |_| { game.dispatch(QuizEvent::Restart); }>"Start på nytt"</button>
                <Controls />
            </div>
        </header>
    }
}

/// Region filter and display toggles. All of these persist with the settings.
#[component]
fn Controls() -> impl IntoView {
    let Loaded(loaded) = expect_context();
    let SelectedGroup(selected_group) = expect_context();
    let LensEnabled(lens_enabled) = expect_context();
    let GroupHintEnabled(group_hint) = expect_context();

    let groups = move || {
        loaded.with(|loaded| {
            loaded
                .as_ref()
                .map(|loaded| loaded.groups.to_vec())
                .unwrap_or_default()
        })
    };

    let on_group_change = move |e: web_sys::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(select) = target.dyn_into::<web_sys::HtmlSelectElement>() else {
            return;
        };
        let value = select.value();
        let next = (!value.is_empty()).then_some(value);
        if selected_group.with_untracked(|current| *current != next) {
            selected_group.set(next);
        }
    };

    view! {
        <select
            style="background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; font-size: 0.75rem; padding: 6px;"
            prop:value=move || selected_group.get().unwrap_or_default()
            on:change=on_group_change
        >
            <option value="">{ALL_GROUPS_LABEL}</option>
            {move || groups().into_iter().map(|group| view! {
                <option value=group.id.clone()>{group.name.clone()}</option>
            }).collect_view()}
        </select>
        <label style="font-size: 0.72rem; display: flex; align-items: center; gap: 4px; cursor: pointer;">
            <input
                type="checkbox"
                prop:checked=move || lens_enabled.get()
                on:change=move |_| lens_enabled.update(|v| *v = !*v)
            />
            "Lupe"
        </label>
        <label style="font-size: 0.72rem; display: flex; align-items: center; gap: 4px; cursor: pointer;">
            <input
                type="checkbox"
                prop:checked=move || group_hint.get()
                on:change=move |_| group_hint.update(|v| *v = !*v)
            />
            "Vis fylke"
        </label>
    }
}
