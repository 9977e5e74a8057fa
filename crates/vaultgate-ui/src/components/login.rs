//! Login views for the three authentication stages.
//!
//! # Design
//! - Shared submit flow: supersede any outstanding request, POST the
//!   credentials, then re-probe `authenticated` — the preceding factor could
//!   have expired while the form was open, and only the probe decides where
//!   the client goes next.
//! - A background probe repeats every `settings.interval` seconds so an
//!   abandoned form still routes to the right stage.
//! - Credential failures stay local to the form; they never alert globally.

use std::cell::RefCell;
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use gloo_timers::callback::Interval;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::follow_auth_action;
use crate::components::feedback::{AlertBox, InfoBox};
use crate::components::navbar::NavBar;
use crate::core::auth::NavState;
use crate::core::request::{Channel, Outcome};
use crate::services::api::{ApiClient, Method};
use crate::services::ctx::ServicesCtx;

/// Shared handles of one login form instance.
#[derive(Clone)]
struct LoginForm {
    client: Rc<ApiClient>,
    navigator: Navigator,
    error: UseStateHandle<Option<String>>,
    mask: UseStateHandle<bool>,
    busy: Rc<RefCell<bool>>,
}

impl LoginForm {
    fn begin(&self, path: &'static str, fields: Vec<(&'static str, String)>) {
        if *self.busy.borrow() {
            return;
        }
        *self.busy.borrow_mut() = true;
        self.error.set(None);
        self.mask.set(true);
        let form = self.clone();
        yew::platform::spawn_local(async move {
            form.submit_and_probe(path, fields).await;
        });
    }

    async fn submit_and_probe(&self, path: &'static str, fields: Vec<(&'static str, String)>) {
        let outcome = self
            .client
            .dispatch(Channel::Login, Method::Post, path, Some(&fields))
            .await;
        match outcome {
            // superseded by a newer submit, which owns the form state now
            Outcome::Aborted => return,
            Outcome::Success(data) => {
                let _ = self.client.resolve(Outcome::Success(data), NavState::default());
            }
            Outcome::Unauthorized { message, .. } => {
                self.error
                    .set(Some(message.unwrap_or_else(|| "login failed".to_string())));
            }
            Outcome::OtherError { message, .. } => self.error.set(Some(message)),
        }

        // check which authentication is required next
        let probe = self
            .client
            .dispatch(Channel::AuthCheck, Method::Get, "authenticated", None)
            .await;
        *self.busy.borrow_mut() = false;
        self.mask.set(false);
        if probe == Outcome::Aborted {
            return;
        }
        let action = self.client.resolve(probe, NavState::default());
        follow_auth_action(action, &self.navigator);
    }
}

fn background_probe(
    client: &Rc<ApiClient>,
    navigator: &Navigator,
    busy: &Rc<RefCell<bool>>,
    state: &NavState,
) {
    // don't interfere with an ongoing login
    if *busy.borrow() {
        return;
    }
    let client = client.clone();
    let navigator = navigator.clone();
    // keep the caller state so "session expired" notices survive the hop
    let state = state.clone();
    yew::platform::spawn_local(async move {
        let probe = client
            .dispatch(Channel::AuthCheck, Method::Get, "authenticated", None)
            .await;
        let action = client.resolve(probe, state);
        follow_auth_action(action, &navigator);
    });
}

#[hook]
fn use_probe_schedule(form: Option<LoginForm>, state: NavState) {
    use_effect_with_deps(
        move |_| {
            let ticker = form.as_ref().map(|form| {
                let client = form.client.clone();
                let navigator = form.navigator.clone();
                let busy = form.busy.clone();
                let millis = u32::try_from(client.probe_interval().saturating_mul(1_000))
                    .unwrap_or(u32::MAX);
                Interval::new(millis, move || {
                    background_probe(&client, &navigator, &busy, &state);
                })
            });
            move || {
                if let Some(form) = form {
                    form.client.cancel(Channel::Login);
                    form.client.cancel(Channel::AuthCheck);
                }
                drop(ticker);
            }
        },
        (),
    );
}

#[hook]
fn use_login_form() -> Option<(LoginForm, NavState)> {
    let services = use_context::<ServicesCtx>();
    let navigator = use_navigator();
    let state = use_location()
        .and_then(|location| location.state::<NavState>())
        .map(|state| (*state).clone())
        .unwrap_or_default();
    let error = use_state(|| None::<String>);
    let mask = use_state(|| false);
    let busy = use_mut_ref(|| false);

    let form = match (services, navigator) {
        (Some(services), Some(navigator)) => Some(LoginForm {
            client: services.client.clone(),
            navigator,
            error,
            mask,
            busy,
        }),
        _ => None,
    };
    use_probe_schedule(form.clone(), state.clone());
    form.map(|form| (form, state))
}

fn input_value(node: &NodeRef) -> String {
    node.cast::<HtmlInputElement>()
        .map(|input| input.value())
        .unwrap_or_default()
}

#[function_component(UserLoginView)]
pub(crate) fn user_login_view() -> Html {
    let username_ref = use_node_ref();
    let password_ref = use_node_ref();
    let hooks = use_login_form();

    let auto_submit = hooks
        .as_ref()
        .is_some_and(|(_, state)| state.auto_submit);
    let do_submit = {
        let hooks = hooks.clone();
        let username_ref = username_ref.clone();
        let password_ref = password_ref.clone();
        Callback::from(move |()| {
            if let Some((form, _)) = &hooks {
                form.begin(
                    "user_login",
                    vec![
                        ("username", input_value(&username_ref)),
                        ("password", input_value(&password_ref)),
                    ],
                );
            }
        })
    };

    // credential-less logins submit immediately on mount
    {
        let do_submit = do_submit.clone();
        use_effect_with_deps(
            move |_| {
                if auto_submit {
                    do_submit.emit(());
                }
                || ()
            },
            (),
        );
    }

    let Some((form, state)) = hooks else {
        return html! {};
    };
    let onsubmit = {
        let do_submit = do_submit;
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            do_submit.emit(());
        })
    };

    html! {
        <div>
            <NavBar />
            <div class="container">
                <div class={classes!("vg-login", (*form.mask).then_some("loading-mask"))}>
                    <form class="vg-login-inner" {onsubmit}>
                        <h4>{"User Login"}</h4>
                        <input class="form-control" type="text" ref={username_ref}
                            placeholder="Username" required=true autocomplete="on" />
                        <input class="form-control" type="password" ref={password_ref}
                            placeholder="Password" required=true />
                        <button class="btn btn-block btn-lg btn-success" type="submit"
                            disabled={*form.mask}>{"Login"}</button>
                        <AlertBox error={(*form.error).clone()} />
                        <InfoBox info={state.info} />
                    </form>
                </div>
            </div>
        </div>
    }
}

#[function_component(BackendLoginView)]
pub(crate) fn backend_login_view() -> Html {
    let username_ref = use_node_ref();
    let password_ref = use_node_ref();
    let Some((form, state)) = use_login_form() else {
        return html! {};
    };

    let onsubmit = {
        let form = form.clone();
        let username_ref = username_ref.clone();
        let password_ref = password_ref.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            form.begin(
                "backend_login",
                vec![
                    ("username", input_value(&username_ref)),
                    ("password", input_value(&password_ref)),
                ],
            );
        })
    };

    html! {
        <div>
            <NavBar />
            <div class="container">
                <div class={classes!("vg-login", (*form.mask).then_some("loading-mask"))}>
                    <form class="vg-login-inner" {onsubmit}>
                        <h4>{"Backend Login"}</h4>
                        <input class="form-control" type="text" ref={username_ref}
                            placeholder="Username" required=true autocomplete="on" />
                        <input class="form-control" type="password" ref={password_ref}
                            placeholder="Password" required=true />
                        <button class="btn btn-block btn-lg btn-success" type="submit"
                            disabled={*form.mask}>{"Login"}</button>
                        <AlertBox error={(*form.error).clone()} />
                        <InfoBox info={state.info} />
                    </form>
                </div>
            </div>
        </div>
    }
}

#[function_component(DbLoginView)]
pub(crate) fn db_login_view() -> Html {
    let password_ref = use_node_ref();
    let keyfile_ref = use_node_ref();
    let Some((form, state)) = use_login_form() else {
        return html! {};
    };

    let onsubmit = {
        let form = form.clone();
        let password_ref = password_ref.clone();
        let keyfile_ref = keyfile_ref.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let password = input_value(&password_ref);
            let file = keyfile_ref
                .cast::<HtmlInputElement>()
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            let form = form.clone();
            yew::platform::spawn_local(async move {
                let key = match file {
                    Some(file) => {
                        match gloo::file::futures::read_as_bytes(&gloo::file::File::from(file))
                            .await
                        {
                            Ok(bytes) => BASE64.encode(bytes),
                            Err(err) => {
                                form.error.set(Some(format!("failed to read key file: {err}")));
                                return;
                            }
                        }
                    }
                    None => String::new(),
                };
                form.begin(
                    "db_login",
                    vec![("password", password), ("key", key)],
                );
            });
        })
    };

    html! {
        <div>
            <NavBar />
            <div class="container">
                <div class={classes!("vg-login", (*form.mask).then_some("loading-mask"))}>
                    <form class="vg-login-inner" {onsubmit}>
                        <h4>{"Vault Login"}</h4>
                        <input class="form-control" type="password" ref={password_ref}
                            placeholder="Master Password" />
                        <input class="input-group btn" type="file" ref={keyfile_ref} />
                        <button class="btn btn-block btn-lg btn-success" type="submit"
                            disabled={*form.mask}>{"Open"}</button>
                        <AlertBox error={(*form.error).clone()} />
                        <InfoBox info={state.info} />
                    </form>
                </div>
            </div>
        </div>
    }
}
