//! Authenticated vault viewport: tree, group, and entry panes.
//!
//! All pane fetches share the `Data` channel, so selecting quickly
//! supersedes the previous fetch instead of racing it; a superseded fetch
//! leaves the masks alone because the newer request owns them.

use std::rc::Rc;

use uuid::Uuid;
use vaultgate_api_models::{Entry, EntryGroup, Group, GroupTree};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::handle_data_error;
use crate::components::navbar::NavBar;
use crate::core::request::{ApiError, Channel, build_query};
use crate::services::api::{ApiClient, Method};
use crate::services::ctx::ServicesCtx;

use entry::EntryPanel;
use group::GroupPanel;
use tree::TreePanel;

mod entry;
mod group;
mod tree;

// builtin icons ship with the app; custom ones come from the vault
pub(super) fn icon_src(icon: Option<usize>, custom: Option<Uuid>) -> Option<String> {
    custom
        .map(|uuid| format!("api/v1/icon/{uuid}"))
        .or_else(|| icon.map(|index| format!("assets/img/icons/{index}.png")))
}

/// Handles of the entry-list pane, shared by group selection and search.
#[derive(Clone)]
struct GroupPane {
    group: UseStateHandle<Option<EntryGroup>>,
    entry: UseStateHandle<Option<Entry>>,
    selected: UseStateHandle<Option<Uuid>>,
    mask: UseStateHandle<bool>,
}

fn spawn_group_fetch(
    client: Rc<ApiClient>,
    navigator: Navigator,
    pane: GroupPane,
    path: String,
    select: Option<Uuid>,
) {
    pane.mask.set(true);
    pane.entry.set(None);
    yew::platform::spawn_local(async move {
        let result = client
            .fetch_data::<EntryGroup>(Channel::Data, Method::Get, &path, None)
            .await;
        match result {
            Ok(data) => {
                pane.mask.set(false);
                pane.group.set(Some(data));
                pane.selected.set(select);
            }
            // superseded; the newer fetch owns the mask
            Err(ApiError::Aborted) => {}
            Err(err) => {
                pane.mask.set(false);
                handle_data_error(&err, &navigator);
            }
        }
    });
}

fn spawn_entry_fetch(
    client: Rc<ApiClient>,
    navigator: Navigator,
    entry: UseStateHandle<Option<Entry>>,
    mask: UseStateHandle<bool>,
    id: Uuid,
) {
    mask.set(true);
    yew::platform::spawn_local(async move {
        let path = build_query("get_entry", &[("id", id.to_string())]);
        let result = client
            .fetch_data::<Entry>(Channel::Data, Method::Get, &path, None)
            .await;
        match result {
            Ok(data) => {
                mask.set(false);
                entry.set(Some(data));
            }
            Err(ApiError::Aborted) => {}
            Err(err) => {
                mask.set(false);
                handle_data_error(&err, &navigator);
            }
        }
    });
}

#[function_component(VaultView)]
pub(crate) fn vault_view() -> Html {
    let services = use_context::<ServicesCtx>();
    let navigator = use_navigator();

    let tree = use_state(|| None::<Group>);
    let group = use_state(|| None::<EntryGroup>);
    let entry = use_state(|| None::<Entry>);
    let selected_group = use_state(|| None::<Uuid>);
    let group_mask = use_state(|| false);
    let entry_mask = use_state(|| false);

    let pane = GroupPane {
        group: group.clone(),
        entry: entry.clone(),
        selected: selected_group.clone(),
        mask: group_mask.clone(),
    };

    {
        let services = services.clone();
        let navigator = navigator.clone();
        let tree = tree.clone();
        let pane = pane.clone();
        use_effect_with_deps(
            move |_| {
                let on_teardown = services.clone();
                if let (Some(services), Some(navigator)) = (services, navigator) {
                    let client = services.client.clone();
                    yew::platform::spawn_local(async move {
                        let result = client
                            .fetch_data::<GroupTree>(
                                Channel::Data,
                                Method::Get,
                                "get_groups",
                                None,
                            )
                            .await;
                        match result {
                            Ok(data) => {
                                tree.set(Some(data.groups));
                                if let Some(id) = data.last_selected {
                                    let path = build_query(
                                        "get_group_entries",
                                        &[("id", id.to_string())],
                                    );
                                    spawn_group_fetch(client, navigator, pane, path, Some(id));
                                }
                            }
                            Err(ApiError::Aborted) => {}
                            Err(err) => handle_data_error(&err, &navigator),
                        }
                    });
                }
                move || {
                    if let Some(services) = on_teardown {
                        services.client.cancel(Channel::Data);
                        services.client.cancel(Channel::Protected);
                    }
                }
            },
            (),
        );
    }

    let (Some(services), Some(navigator)) = (services, navigator) else {
        return html! {};
    };

    let load_group = {
        let client = services.client.clone();
        let navigator = navigator.clone();
        let pane = pane.clone();
        Callback::from(move |id: Uuid| {
            // ignore already selected
            if *pane.selected == Some(id) {
                return;
            }
            let path = build_query("get_group_entries", &[("id", id.to_string())]);
            spawn_group_fetch(client.clone(), navigator.clone(), pane.clone(), path, Some(id));
        })
    };

    let load_entry = {
        let client = services.client.clone();
        let navigator = navigator.clone();
        let entry = entry.clone();
        let entry_mask = entry_mask.clone();
        Callback::from(move |id: Uuid| {
            if entry.as_ref().is_some_and(|current| current.id == id) {
                return;
            }
            spawn_entry_fetch(
                client.clone(),
                navigator.clone(),
                entry.clone(),
                entry_mask.clone(),
                id,
            );
        })
    };

    let on_search = {
        let client = services.client.clone();
        let navigator = navigator.clone();
        let pane = pane;
        Callback::from(move |term: String| {
            let path = build_query("search_entries", &[("term", term)]);
            spawn_group_fetch(client.clone(), navigator.clone(), pane.clone(), path, None);
        })
    };

    html! {
        <div class="container-fluid">
            <NavBar show_search=true on_search={on_search} />
            <div class="row">
                <div class="col-sm-2 dir-tree">
                    <TreePanel tree={(*tree).clone()} on_select={load_group} />
                </div>
                <div id="group-viewer" class="col-sm-4">
                    <GroupPanel group={(*group).clone()} mask={*group_mask} on_select={load_entry} />
                </div>
                <div id="entry-viewer" class="col-sm-6">
                    <EntryPanel entry={(*entry).clone()} mask={*entry_mask} />
                </div>
            </div>
        </div>
    }
}
