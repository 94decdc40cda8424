//! Scope Status Component
//!
//! Busy indicator and search status line mounted next to a client control.

use leptos::prelude::*;

use crate::typeahead::SearchStatus;

#[component]
pub fn ScopeStatus(
    busy: ReadSignal<bool>,
    status: ReadSignal<SearchStatus>,
) -> impl IntoView {
    view! {
        <Show when=move || busy.get()>
            <span class="client-autofill-busy" role="status" aria-live="polite">
                "Loading client defaults…"
            </span>
        </Show>
        {move || status.get().message().map(|message| view! {
            <span
                class=move || if status.get() == SearchStatus::Failed {
                    "client-autofill-message error"
                } else {
                    "client-autofill-message"
                }
            >
                {message}
            </span>
        })}
    }
}
