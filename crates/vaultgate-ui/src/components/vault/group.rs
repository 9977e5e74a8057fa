//! Entry listing pane for the selected group or search result.

use uuid::Uuid;
use vaultgate_api_models::{Entry, EntryGroup};
use yew::prelude::*;

use super::icon_src;

#[derive(Properties, PartialEq)]
pub(super) struct GroupPanelProps {
    pub group: Option<EntryGroup>,
    pub mask: bool,
    pub on_select: Callback<Uuid>,
}

#[function_component(GroupPanel)]
pub(super) fn group_panel(props: &GroupPanelProps) -> Html {
    let classes = classes!(
        "panel",
        "panel-default",
        props.mask.then_some("loading-mask")
    );
    let Some(group) = props.group.as_ref() else {
        return html! { <div class={classes}></div> };
    };

    html! {
        <div class={classes}>
            <div class="panel-heading">
                {entry_icon(group.icon, group.custom_icon_uuid)}
                {&group.title}
            </div>
            <div class="panel-body">
                <table class="table table-hover table-condensed vg-table">
                    <thead>
                        <tr>
                            <th>{"Entry Name"}</th>
                            <th>{"Username"}</th>
                        </tr>
                    </thead>
                    <tbody class="groupview-body">
                        {for group.entries.iter().map(|entry| render_row(entry, &props.on_select))}
                    </tbody>
                </table>
            </div>
        </div>
    }
}

fn render_row(entry: &Entry, on_select: &Callback<Uuid>) -> Html {
    let onclick = {
        let on_select = on_select.clone();
        let id = entry.id;
        Callback::from(move |_: MouseEvent| on_select.emit(id))
    };
    html! {
        <tr key={entry.id.to_string()} {onclick}>
            <td class="vg-wrap">
                {entry_icon(entry.icon, entry.custom_icon_uuid)}
                {entry.title.clone().unwrap_or_default()}
            </td>
            <td class="vg-wrap">{entry.username.clone().unwrap_or_default()}</td>
        </tr>
    }
}

fn entry_icon(icon: Option<usize>, custom: Option<Uuid>) -> Html {
    icon_src(icon, custom).map_or_else(
        || html! {},
        |src| html! { <img class="vg-icon" src={src} /> },
    )
}
