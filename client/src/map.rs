use std::ops::Deref;
use std::sync::Arc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

use kartquiz_shared::{Affine, MapPaths, Point, ProjectedPath};

use crate::app::{LensEnabled, LensState, PathsMemo};
use crate::game::Game;
use crate::lens::LensOverlay;

/// Cached paths compared by identity, so memos downstream of the path cache
/// only notify when the cache actually rebuilt.
#[derive(Clone)]
pub(crate) struct SharedPaths(pub Arc<MapPaths>);

impl PartialEq for SharedPaths {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for SharedPaths {
    type Target = MapPaths;

    fn deref(&self) -> &MapPaths {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShapeState {
    /// Outside the selected region: drawn dimmed, not clickable.
    Inactive,
    Open,
    Solved,
}

impl ShapeState {
    pub fn of(active: bool, solved: bool) -> Self {
        if !active {
            Self::Inactive
        } else if solved {
            Self::Solved
        } else {
            Self::Open
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Inactive => "area area-inactive",
            Self::Open => "area area-open",
            Self::Solved => "area area-solved",
        }
    }

    pub fn is_clickable(self) -> bool {
        self == Self::Open
    }
}

/// Build one clickable area shape. Used by the base map and the lens.
pub(crate) fn area_shape(game: Game, path: &ProjectedPath, active: bool) -> impl IntoView + use<> {
    let class_id = path.id.clone();
    let click_id = path.id.clone();
    let state = move || ShapeState::of(active, game.quiz.with(|quiz| quiz.is_solved(&class_id)));

    view! {
        <path
            d=path.d.clone()
            class=move || state().class()
            on:click=move |_| {
                let solved = game.quiz.with_untracked(|quiz| quiz.is_solved(&click_id));
                if ShapeState::of(active, solved).is_clickable() {
                    game.guess(&click_id);
                }
            }
        />
    }
}

pub(crate) fn screen_ctm(svg: &web_sys::SvgGraphicsElement) -> Option<Affine> {
    let m = svg.get_screen_ctm()?;
    Some(Affine::new(
        f64::from(m.a()),
        f64::from(m.b()),
        f64::from(m.c()),
        f64::from(m.d()),
        f64::from(m.e()),
        f64::from(m.f()),
    ))
}

/// SVG map of every area, with the lens drawn on top.
#[component]
pub fn QuizMap() -> impl IntoView {
    let game: Game = expect_context();
    let PathsMemo(paths) = expect_context();
    let LensEnabled(lens_enabled) = expect_context();
    let LensState(lens) = expect_context();

    let view_box = move || {
        paths
            .with(|paths| paths.as_ref().map(|p| p.viewport.view_box()))
            .unwrap_or_else(|| "0 0 500 500".to_string())
    };

    let on_pointer_move = move |e: web_sys::PointerEvent| {
        if !lens_enabled.get_untracked() {
            return;
        }
        let Some(svg) = e
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::SvgGraphicsElement>().ok())
        else {
            return;
        };
        let Some(ctm) = screen_ctm(&svg) else {
            return;
        };
        let raw = Point::new(f64::from(e.client_x()), f64::from(e.client_y()));
        lens.update(|lens| {
            lens.move_to(raw, &ctm);
        });
    };

    view! {
        <svg
            class="quiz-map"
            viewBox=view_box
            preserveAspectRatio="xMidYMid meet"
            style="width: 100%; height: 100%; display: block; touch-action: manipulation;"
            on:pointermove=on_pointer_move
            on:pointerleave=move |_| lens.update(|lens| lens.clear())
        >
            <g class="areas">
                {move || paths.get().map(|paths| {
                    paths
                        .all
                        .iter()
                        .map(|path| area_shape(game, path, paths.is_active(&path.id)))
                        .collect_view()
                })}
            </g>
            <path
                class="group-borders"
                d=move || {
                    paths
                        .with(|paths| paths.as_ref().and_then(|p| p.borders.as_deref().map(str::to_string)))
                        .unwrap_or_default()
                }
                style="fill: none; pointer-events: none;"
            />
            {move || lens_enabled.get().then(|| view! { <LensOverlay /> })}
        </svg>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kartquiz_shared::{AreaSet, PathCache};

    #[test]
    fn inactive_beats_solved() {
        assert_eq!(ShapeState::of(false, true), ShapeState::Inactive);
        assert_eq!(ShapeState::of(false, false), ShapeState::Inactive);
        assert_eq!(ShapeState::of(true, true), ShapeState::Solved);
        assert_eq!(ShapeState::of(true, false), ShapeState::Open);
    }

    #[test]
    fn only_open_shapes_take_clicks() {
        assert!(ShapeState::Open.is_clickable());
        assert!(!ShapeState::Solved.is_clickable());
        assert!(!ShapeState::Inactive.is_clickable());
    }

    #[test]
    fn classes_are_distinct() {
        let classes = [
            ShapeState::Inactive.class(),
            ShapeState::Open.class(),
            ShapeState::Solved.class(),
        ];
        assert!(classes.iter().all(|c| c.starts_with("area ")));
        assert_ne!(classes[0], classes[1]);
        assert_ne!(classes[1], classes[2]);
    }

    #[test]
    fn shared_paths_compare_by_identity() {
        let all = AreaSet::empty();
        let mut cache = PathCache::new();
        let a = SharedPaths(cache.get(&all, &[], &all));
        let b = SharedPaths(cache.get(&all, &[], &all));
        assert!(a == b);

        let fresh = SharedPaths(Arc::new((*a.0).clone()));
        assert!(a != fresh);
    }
}
