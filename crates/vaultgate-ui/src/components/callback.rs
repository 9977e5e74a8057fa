//! SSO return view: picks up the session payload the server embedded into
//! the page and persists it.

use vaultgate_api_models::{Envelope, SessionData};
use wasm_bindgen::JsValue;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::Route;
use crate::components::feedback::AlertBox;
use crate::components::navbar::NavBar;
use crate::services::ctx::ServicesCtx;

// global the server writes into index.html while answering the IdP callback
const RESPONSE_GLOBAL: &str = "VaultgateResponse";

fn embedded_response() -> Option<Envelope<SessionData>> {
    let global = js_sys::Reflect::get(&gloo::utils::window(), &JsValue::from_str(RESPONSE_GLOBAL))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())?;
    let raw = js_sys::JSON::stringify(&global).ok()?;
    serde_json::from_str(&String::from(raw)).ok()
}

#[function_component(CallbackUserAuthView)]
pub(crate) fn callback_user_auth_view() -> Html {
    let services = use_context::<ServicesCtx>();
    let navigator = use_navigator();
    let error = use_state(|| None::<String>);

    {
        let error = error.clone();
        use_effect_with_deps(
            move |_| {
                if let (Some(services), Some(navigator)) = (services, navigator) {
                    match embedded_response() {
                        Some(envelope) => match envelope.data {
                            Some(data) => {
                                services.client.store_session(data);
                                navigator.replace(&Route::Splash);
                            }
                            None => error.set(Some(
                                envelope
                                    .message
                                    .unwrap_or_else(|| "login callback failed".to_string()),
                            )),
                        },
                        None => error.set(Some("failed to retrieve session data".to_string())),
                    }
                }
                || ()
            },
            (),
        );
    }

    html! {
        <div>
            <NavBar />
            <div class="container">
                <div class="vg-login">
                    <AlertBox error={(*error).clone()} />
                    <Link<Route> to={Route::Splash}>{"Get me home"}</Link<Route>>
                </div>
            </div>
        </div>
    }
}
