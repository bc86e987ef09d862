use std::cell::RefCell;

use gloo_storage::Storage;
use gloo_timers::callback::Interval;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use kartquiz_shared::{Lens, PathCache, QuizEvent};

use crate::completion::CompletionOverlay;
use crate::data::{self, LoadStatus, LoadedMap};
use crate::game::{self, Game};
use crate::header::QuizHeader;
use crate::map::{QuizMap, SharedPaths};
use crate::stopwatch::now_ms;

const SETTINGS_KEY: &str = "kartquiz_settings";
const TICK_INTERVAL_MS: u32 = 250;

fn remove_loading_shell() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    if let Some(shell) = document.get_element_by_id("app-loading-shell") {
        shell.remove();
    }
}

thread_local! {
    static TICK_INTERVAL: RefCell<Option<Interval>> = const { RefCell::new(None) };
}

/// Newtype wrappers so signals of the same type get distinct context slots.
#[derive(Clone, Copy)]
pub(crate) struct Loaded(pub RwSignal<Option<LoadedMap>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedGroup(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct LensEnabled(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct GroupHintEnabled(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct LensState(pub RwSignal<Lens>);
#[derive(Clone, Copy)]
pub(crate) struct PathsMemo(pub Memo<Option<SharedPaths>>);
/// Wall clock in epoch milliseconds, advanced by the tick interval.
#[derive(Clone, Copy)]
pub(crate) struct Tick(pub RwSignal<i64>);

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    lens_enabled: bool,
    group_hint: bool,
    selected_group: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lens_enabled: true,
            group_hint: false,
            selected_group: None,
        }
    }
}

/// Root application component. Provides global reactive signals via context.
#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let selected_group: RwSignal<Option<String>> = RwSignal::new(saved.selected_group);
    let lens_enabled: RwSignal<bool> = RwSignal::new(saved.lens_enabled);
    let group_hint: RwSignal<bool> = RwSignal::new(saved.group_hint);

    let status: RwSignal<LoadStatus> = RwSignal::new(LoadStatus::Loading);
    let loaded: RwSignal<Option<LoadedMap>> = RwSignal::new(None);
    let lens: RwSignal<Lens> = RwSignal::new(Lens::default());
    let tick: RwSignal<i64> = RwSignal::new(now_ms());
    let game = Game::new(game::session_seed());

    // Same selection keeps the same set identity, so the round is not reset.
    let active = Memo::new(move |_| {
        let group = selected_group.get();
        loaded.with(|loaded| {
            loaded
                .as_ref()
                .map(|loaded| loaded.all.filter_group(group.as_deref()))
        })
    });

    let path_cache = StoredValue::new(PathCache::new());
    let paths = Memo::new(move |_| {
        let active = active.get()?;
        loaded.with(|loaded| {
            let loaded = loaded.as_ref()?;
            path_cache.try_update_value(|cache| {
                SharedPaths(cache.get(&loaded.all, &loaded.borders, &active))
            })
        })
    });

    provide_context(game);
    provide_context(Loaded(loaded));
    provide_context(SelectedGroup(selected_group));
    provide_context(LensEnabled(lens_enabled));
    provide_context(GroupHintEnabled(group_hint));
    provide_context(LensState(lens));
    provide_context(PathsMemo(paths));
    provide_context(Tick(tick));

    // Persist settings to localStorage on any change
    Effect::new(move || {
        let settings = Settings {
            lens_enabled: lens_enabled.get(),
            group_hint: group_hint.get(),
            selected_group: selected_group.get(),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    // Load the dataset once on mount.
    Effect::new(move || {
        spawn_local(async move {
            match data::fetch_dataset().await {
                Ok(dataset) => {
                    let map = LoadedMap::from_dataset(dataset);
                    web_sys::console::info_1(
                        &format!(
                            "dataset loaded: {} areas, {} groups",
                            map.all.len(),
                            map.groups.len()
                        )
                        .into(),
                    );
                    if map.skipped > 0 {
                        web_sys::console::warn_1(
                            &format!("skipped {} unplayable areas", map.skipped).into(),
                        );
                    }
                    let stale_group = selected_group
                        .with_untracked(|group| group.as_deref().is_some_and(|id| !map.has_group(id)));
                    if stale_group {
                        selected_group.set(None);
                    }
                    loaded.set(Some(map));
                    status.set(LoadStatus::Ready);
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("Dataset fetch failed: {e}").into());
                    status.set(LoadStatus::Failed(e));
                }
            }
        });
    });

    // New active set (dataset arrived or region filter changed) resets the round.
    Effect::new(move || {
        if let Some(set) = active.get() {
            game.dispatch(QuizEvent::ActiveSetChanged(set));
        }
    });

    Effect::new(move || {
        if !lens_enabled.get() {
            lens.update(|lens| lens.clear());
        }
    });

    Effect::new(move || {
        if status.get() != LoadStatus::Loading {
            remove_loading_shell();
        }
    });

    // Advance the clock that drives the stopwatch display
    Effect::new(move || {
        TICK_INTERVAL.with(|slot| {
            // Replacing the handle drops and cancels any previous interval.
            *slot.borrow_mut() = Some(Interval::new(TICK_INTERVAL_MS, move || {
                tick.set(now_ms());
            }));
        });
    });

    view! {
        <div style="width: 100%; height: 100%; display: flex; flex-direction: column; background: #0c0e17;">
            <QuizHeader />
            <main style="flex: 1; position: relative; overflow: hidden;">
                {move || match status.get() {
                    LoadStatus::Loading => view! {
                        <div style="padding: 24px; color: #9a9590; font-family: 'Inter', system-ui, sans-serif;">
                            "Laster kart..."
                        </div>
                    }.into_any(),
                    LoadStatus::Failed(e) => view! {
                        <div style="padding: 24px; color: #e07a5f; font-family: 'Inter', system-ui, sans-serif;">
                            {format!("Kunne ikke laste kartet: {e}")}
                        </div>
                    }.into_any(),
                    LoadStatus::Ready => view! {
                        <QuizMap />
                        <CompletionOverlay />
                    }.into_any(),
                }}
            </main>
        </div>
    }
}
