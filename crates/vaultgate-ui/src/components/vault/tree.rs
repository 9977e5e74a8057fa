//! Vault group tree pane.

use uuid::Uuid;
use vaultgate_api_models::Group;
use yew::prelude::*;

use super::icon_src;

#[derive(Properties, PartialEq)]
pub(super) struct TreePanelProps {
    pub tree: Option<Group>,
    pub on_select: Callback<Uuid>,
}

#[function_component(TreePanel)]
pub(super) fn tree_panel(props: &TreePanelProps) -> Html {
    let Some(root) = props.tree.as_ref() else {
        return html! { <div class="panel panel-default loading-mask"></div> };
    };

    let on_root = {
        let on_select = props.on_select.clone();
        let id = root.id;
        Callback::from(move |_: MouseEvent| on_select.emit(id))
    };

    html! {
        <div class="panel panel-default">
            <div class="treeview-header panel-heading" onclick={on_root}>
                {node_icon(root)}
                {&root.title}
            </div>
            <ul class="treeview-body list-group">
                {for root.children.iter().map(|child| render_node(child, 1, &props.on_select))}
            </ul>
        </div>
    }
}

fn render_node(node: &Group, level: usize, on_select: &Callback<Uuid>) -> Html {
    let onclick = {
        let on_select = on_select.clone();
        let id = node.id;
        Callback::from(move |_: MouseEvent| on_select.emit(id))
    };
    html! {
        <li class="list-group-item" key={node.id.to_string()}>
            <a class="treeview-node" style={format!("padding-left: {}px", level * 16)} {onclick}>
                {node_icon(node)}
                {&node.title}
            </a>
            <ul class="list-group">
                {for node.children.iter().map(|child| render_node(child, level + 1, on_select))}
            </ul>
        </li>
    }
}

fn node_icon(node: &Group) -> Html {
    icon_src(node.icon, node.custom_icon_uuid).map_or_else(
        || html! {},
        |src| html! { <img class="vg-icon" src={src} /> },
    )
}
