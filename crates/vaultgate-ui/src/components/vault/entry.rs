//! Entry detail pane: fields, protected-value reveal, attachment download.
//!
//! Protected values never ride along with the entry payload; each reveal is
//! its own request on the `Protected` channel and auto-hides again after a
//! short delay.

use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use uuid::Uuid;
use vaultgate_api_models::Entry;
use yew::prelude::*;
use yew_router::prelude::*;

use super::icon_src;
use crate::app::handle_data_error;
use crate::core::request::{ApiError, Channel, build_query};
use crate::services::api::Method;
use crate::services::ctx::ServicesCtx;

const REVEAL_HIDE_MS: u32 = 30_000;

#[derive(Properties, PartialEq)]
pub(super) struct EntryPanelProps {
    pub entry: Option<Entry>,
    pub mask: bool,
}

#[derive(Default, PartialEq)]
struct Revealed(HashMap<String, String>);

enum RevealAction {
    Show(String, String),
    Hide(String),
    Clear,
}

impl Reducible for Revealed {
    type Action = RevealAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = self.0.clone();
        match action {
            RevealAction::Show(name, value) => {
                next.insert(name, value);
            }
            RevealAction::Hide(name) => {
                next.remove(&name);
            }
            RevealAction::Clear => next.clear(),
        }
        Rc::new(Self(next))
    }
}

#[function_component(EntryPanel)]
pub(super) fn entry_panel(props: &EntryPanelProps) -> Html {
    let services = use_context::<ServicesCtx>();
    let navigator = use_navigator();
    let revealed = use_reducer(Revealed::default);

    // drop revealed values whenever another entry is shown
    {
        let revealed = revealed.clone();
        use_effect_with_deps(
            move |_| {
                revealed.dispatch(RevealAction::Clear);
                || ()
            },
            props.entry.as_ref().map(|entry| entry.id),
        );
    }

    let classes = classes!(
        "panel",
        "panel-default",
        props.mask.then_some("loading-mask")
    );
    let ((Some(services), Some(navigator)), Some(entry)) =
        ((services, navigator), props.entry.as_ref())
    else {
        return html! { <div class={classes}></div> };
    };

    let reveal = {
        let services = services.clone();
        let navigator = navigator.clone();
        let revealed = revealed.clone();
        let entry_id = entry.id;
        Callback::from(move |name: String| {
            let client = services.client.clone();
            let navigator = navigator.clone();
            let revealed = revealed.clone();
            yew::platform::spawn_local(async move {
                let path = build_query(
                    "get_protected",
                    &[("entry_id", entry_id.to_string()), ("name", name.clone())],
                );
                let result = client
                    .fetch_data::<String>(Channel::Protected, Method::Get, &path, None)
                    .await;
                match result {
                    Ok(value) => {
                        revealed.dispatch(RevealAction::Show(name.clone(), value));
                        let revealed = revealed.clone();
                        Timeout::new(REVEAL_HIDE_MS, move || {
                            revealed.dispatch(RevealAction::Hide(name));
                        })
                        .forget();
                    }
                    Err(ApiError::Aborted) => {}
                    Err(err) => handle_data_error(&err, &navigator),
                }
            });
        })
    };

    let hide = {
        let revealed = revealed.clone();
        Callback::from(move |name: String| revealed.dispatch(RevealAction::Hide(name)))
    };

    let download = {
        let services = services.clone();
        let entry_id = entry.id;
        Callback::from(move |filename: String| {
            let client = services.client.clone();
            yew::platform::spawn_local(async move {
                let path = build_query(
                    "get_file",
                    &[
                        ("entry_id", entry_id.to_string()),
                        ("filename", filename.clone()),
                    ],
                );
                if let Err(err) = client.download(&path, &filename).await {
                    gloo::dialogs::alert(&err.to_string());
                }
            });
        })
    };

    let mut strings: Vec<(&String, &Option<String>)> =
        entry.strings.iter().flatten().collect();
    strings.sort_by_key(|(name, _)| name.as_str());

    html! {
        <div class={classes}>
            <div class="panel-heading">
                {icon(entry)}
                {entry.title.clone().unwrap_or_default()}
            </div>
            <div class="panel-body">
                <table class="table vg-table">
                    <tbody>
                        <tr>
                            <th>{"Username"}</th>
                            <td>{entry.username.clone().unwrap_or_default()}</td>
                        </tr>
                        {protected_row("Password", "password", &revealed, &reveal, &hide)}
                        {url_row(entry)}
                        {for strings.into_iter().map(|(name, value)| {
                            if entry.is_protected(name) || value.is_none() {
                                protected_row(name, name, &revealed, &reveal, &hide)
                            } else {
                                html! {
                                    <tr key={name.clone()}>
                                        <th>{name}</th>
                                        <td>{value.clone().unwrap_or_default()}</td>
                                    </tr>
                                }
                            }
                        })}
                        {tags_row(entry)}
                        {notes_row(entry)}
                        {binaries_row(entry, &download)}
                    </tbody>
                </table>
            </div>
        </div>
    }
}

fn protected_row(
    label: &str,
    name: &str,
    revealed: &UseReducerHandle<Revealed>,
    reveal: &Callback<String>,
    hide: &Callback<String>,
) -> Html {
    let value = revealed.0.get(name).cloned();
    let toggle = {
        let reveal = reveal.clone();
        let hide = hide.clone();
        let name = name.to_string();
        let shown = value.is_some();
        Callback::from(move |_: MouseEvent| {
            if shown {
                hide.emit(name.clone());
            } else {
                reveal.emit(name.clone());
            }
        })
    };
    html! {
        <tr key={name.to_string()}>
            <th>{label}</th>
            <td>
                <span class="vg-protected">
                    {value.unwrap_or_else(|| "\u{2022}".repeat(8))}
                </span>
                <button type="button" class="btn btn-default btn-xs" onclick={toggle}>
                    {"\u{1f441}"}
                </button>
            </td>
        </tr>
    }
}

fn url_row(entry: &Entry) -> Html {
    entry.url.as_ref().map_or_else(
        || html! {},
        |url| {
            html! {
                <tr>
                    <th>{"URL"}</th>
                    <td><a href={url.clone()} target="_blank" rel="noreferrer">{url}</a></td>
                </tr>
            }
        },
    )
}

fn tags_row(entry: &Entry) -> Html {
    match entry.tags.as_deref() {
        Some(tags) if !tags.is_empty() => html! {
            <tr>
                <th>{"Tags"}</th>
                <td>{tags.join(", ")}</td>
            </tr>
        },
        _ => html! {},
    }
}

fn notes_row(entry: &Entry) -> Html {
    entry.notes.as_ref().map_or_else(
        || html! {},
        |notes| {
            html! {
                <tr>
                    <th>{"Notes"}</th>
                    <td><pre class="vg-notes">{notes}</pre></td>
                </tr>
            }
        },
    )
}

fn binaries_row(entry: &Entry, download: &Callback<String>) -> Html {
    match entry.binary.as_deref() {
        Some(files) if !files.is_empty() => html! {
            <tr>
                <th>{"Files"}</th>
                <td>
                    {for files.iter().map(|filename| {
                        let onclick = {
                            let download = download.clone();
                            let filename = filename.clone();
                            Callback::from(move |_: MouseEvent| download.emit(filename.clone()))
                        };
                        html! {
                            <button type="button" class="btn btn-default btn-xs" {onclick}
                                key={filename.clone()}>
                                {filename}
                            </button>
                        }
                    })}
                </td>
            </tr>
        },
        _ => html! {},
    }
}

fn icon(entry: &Entry) -> Html {
    icon_src(entry.icon, entry.custom_icon_uuid).map_or_else(
        || html! {},
        |src| html! { <img class="vg-icon" src={src} /> },
    )
}
