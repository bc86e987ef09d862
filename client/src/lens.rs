use leptos::prelude::*;

use crate::app::{LensState, PathsMemo};
use crate::game::Game;
use crate::map::area_shape;

/// Magnified copy of the active areas, clipped to a circle at the pointer.
///
/// The path list only depends on the path cache; pointer moves touch the
/// clip circle and the group transform and nothing else.
#[component]
pub fn LensOverlay() -> impl IntoView {
    let game: Game = expect_context();
    let PathsMemo(paths) = expect_context();
    let LensState(lens) = expect_context();

    let visible = move || lens.with(|lens| lens.is_visible());
    let clip = move || lens.with(|lens| lens.clip());
    let cx = move || clip().map(|c| c.cx.to_string()).unwrap_or_default();
    let cy = move || clip().map(|c| c.cy.to_string()).unwrap_or_default();
    let r = move || clip().map(|c| c.r.to_string()).unwrap_or_default();
    let transform = move || lens.with(|lens| lens.transform_attr()).unwrap_or_default();

    view! {
        <g class="lens" style:display=move || if visible() { "inline" } else { "none" }>
            <defs>
                <clipPath id="lens-clip">
                    <circle cx=cx cy=cy r=r />
                </clipPath>
            </defs>
            <g clip-path="url(#lens-clip)">
                <circle class="lens-backdrop" cx=cx cy=cy r=r />
                <g transform=transform>
                    {move || paths.get().map(|paths| {
                        paths
                            .active
                            .iter()
                            .map(|path| area_shape(game, path, true))
                            .collect_view()
                    })}
                </g>
            </g>
            <circle class="lens-ring" cx=cx cy=cy r=r style="fill: none; pointer-events: none;" />
        </g>
    }
}
