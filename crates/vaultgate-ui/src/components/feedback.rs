//! Inline error and info boxes rendered under forms.

use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub(crate) struct AlertProps {
    #[prop_or_default]
    pub error: Option<String>,
}

#[function_component(AlertBox)]
pub(crate) fn alert_box(props: &AlertProps) -> Html {
    match props.error.as_deref() {
        Some(error) if !error.is_empty() => html! {
            <div class="alert alert-danger" role="alert">{error}</div>
        },
        _ => html! {},
    }
}

#[derive(Properties, PartialEq)]
pub(crate) struct InfoProps {
    #[prop_or_default]
    pub info: Option<String>,
}

#[function_component(InfoBox)]
pub(crate) fn info_box(props: &InfoProps) -> Html {
    match props.info.as_deref() {
        Some(info) if !info.is_empty() => html! {
            <div class="alert alert-info" role="status">{info}</div>
        },
        _ => html! {},
    }
}
