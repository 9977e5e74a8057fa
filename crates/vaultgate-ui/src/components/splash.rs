//! Landing view: probes the session and routes to the right place.

use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::follow_auth_action;
use crate::components::navbar::NavBar;
use crate::core::auth::NavState;
use crate::core::request::Channel;
use crate::services::api::Method;
use crate::services::ctx::ServicesCtx;

#[function_component(SplashView)]
pub(crate) fn splash_view() -> Html {
    let services = use_context::<ServicesCtx>();
    let navigator = use_navigator();
    let state = use_location()
        .and_then(|location| location.state::<NavState>())
        .map(|state| (*state).clone())
        .unwrap_or_default();

    use_effect_with_deps(
        move |_| {
            if let (Some(services), Some(navigator)) = (services, navigator) {
                let client = services.client.clone();
                yew::platform::spawn_local(async move {
                    let outcome = client
                        .dispatch(Channel::AuthCheck, Method::Get, "authenticated", None)
                        .await;
                    let action = client.resolve(outcome, state);
                    follow_auth_action(action, &navigator);
                });
            }
            || ()
        },
        (),
    );

    html! {
        <div class="loading-mask">
            <NavBar />
        </div>
    }
}
