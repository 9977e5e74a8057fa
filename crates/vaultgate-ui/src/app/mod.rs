//! App shell: service wiring, routing, and execution of resolved actions.
//!
//! # Design
//! - Views never decide auth routing themselves; they hand settled outcomes
//!   to the engine and execute the returned action here.
//! - An external redirect is terminal: nothing runs after setting the
//!   location, so a redirect loop cannot be re-entered from this client run.

use gloo::console;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::components::callback::CallbackUserAuthView;
use crate::components::login::{BackendLoginView, DbLoginView, UserLoginView};
use crate::components::splash::SplashView;
use crate::components::vault::VaultView;
use crate::core::auth::{LoginStage, NavState, NextAction};
use crate::core::request::ApiError;
use crate::services::ctx::ServicesCtx;

mod routes;
pub(crate) use routes::Route;

#[function_component(VaultgateApp)]
fn vaultgate_app() -> Html {
    let services = use_memo(|_| ServicesCtx::new(), ());

    html! {
        <ContextProvider<ServicesCtx> context={(*services).clone()}>
            <BrowserRouter>
                <Switch<Route> render={switch} />
            </BrowserRouter>
        </ContextProvider<ServicesCtx>>
    }
}

fn switch(route: Route) -> Html {
    match route {
        Route::Splash => html! { <SplashView /> },
        Route::Vault => html! { <VaultView /> },
        Route::UserLogin => html! { <UserLoginView /> },
        Route::BackendLogin => html! { <BackendLoginView /> },
        Route::DbLogin => html! { <DbLoginView /> },
        Route::CallbackUserAuth => html! { <CallbackUserAuthView /> },
        Route::NotFound => html! {
            <div class="container">
                <h4>{"Not found"}</h4>
                <Link<Route> to={Route::Splash}>{"Get me home"}</Link<Route>>
            </div>
        },
    }
}

/// Execute a resolved [`NextAction`] from the auth flow.
pub(crate) fn follow_auth_action(action: NextAction, navigator: &Navigator) {
    match action {
        NextAction::Noop => {}
        NextAction::Proceed => navigator.replace(&Route::Vault),
        NextAction::NavigateTo { stage, state } => navigate_to_stage(navigator, stage, state),
        NextAction::RedirectExternal(url) => redirect_external(&url),
        NextAction::Alert(message) => gloo::dialogs::alert(&message),
    }
}

/// Show the login view of `stage`, carrying `state` to the destination.
pub(crate) fn navigate_to_stage(navigator: &Navigator, stage: LoginStage, state: NavState) {
    let route = match stage {
        LoginStage::User => Route::UserLogin,
        LoginStage::Backend => Route::BackendLogin,
        LoginStage::Db => Route::DbLogin,
    };
    if state.replace {
        navigator.replace_with_state(&route, state);
    } else {
        navigator.push_with_state(&route, state);
    }
}

/// Surface a failed data fetch on the initiating view.
///
/// A 401 bounces to the splash screen, whose mount-time probe routes to the
/// proper login stage; other errors alert; cancellations stay silent.
pub(crate) fn handle_data_error(err: &ApiError, navigator: &Navigator) {
    match err {
        ApiError::Aborted => {}
        ApiError::Unauthorized { .. } => {
            navigator.replace_with_state(&Route::Splash, NavState::with_info("Session expired"));
        }
        other => gloo::dialogs::alert(&other.to_string()),
    }
}

pub(crate) fn redirect_external(url: &str) {
    if let Err(err) = gloo::utils::window().location().set_href(url) {
        console::error!("external redirect failed", err);
    }
}

/// Entrypoint invoked by Trunk for wasm32 builds.
pub fn run_app() {
    console_error_panic_hook::set_once();
    if let Some(root) = gloo::utils::document().get_element_by_id("root") {
        yew::Renderer::<VaultgateApp>::with_root(root).render();
    } else {
        yew::Renderer::<VaultgateApp>::new().render();
    }
}
