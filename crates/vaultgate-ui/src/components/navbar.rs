//! Top navigation bar: brand, search, idle-timer display, session menu.
//!
//! The timer interval lives here and is dropped on unmount, so no tick or
//! expiry can fire once the authenticated view is gone.

use std::rc::Rc;

use gloo_timers::callback::Interval;
use vaultgate_api_models::LogoutAction;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::{Route, handle_data_error, redirect_external};
use crate::core::auth::NavState;
use crate::core::request::{Channel, Outcome};
use crate::core::timer::{TimerTick, format_clock};
use crate::services::api::{ApiClient, Method};
use crate::services::ctx::ServicesCtx;

#[derive(Properties, PartialEq)]
pub(crate) struct NavBarProps {
    /// Render the search form (vault view only).
    #[prop_or_default]
    pub show_search: bool,
    #[prop_or_default]
    pub on_search: Option<Callback<String>>,
}

#[function_component(NavBar)]
pub(crate) fn nav_bar(props: &NavBarProps) -> Html {
    let services = use_context::<ServicesCtx>();
    let navigator = use_navigator();
    let term_ref = use_node_ref();

    let (Some(services), Some(navigator)) = (services, navigator) else {
        return html! {};
    };
    let display_name = services.client.display_name();

    let on_logout = {
        let client = services.client.clone();
        let navigator = navigator.clone();
        Callback::from(move |_: MouseEvent| {
            let client = client.clone();
            let navigator = navigator.clone();
            yew::platform::spawn_local(async move {
                let result = client
                    .fetch_data::<Option<LogoutAction>>(
                        Channel::Session,
                        Method::Post,
                        "logout",
                        None,
                    )
                    .await;
                match result {
                    Ok(action) => {
                        client.clear_session();
                        let url = action.and_then(|action| {
                            action.redirect_url().map(ToString::to_string)
                        });
                        match url {
                            // finish the SSO logout externally; terminal
                            Some(url) => redirect_external(&url),
                            None => navigator.replace(&Route::Splash),
                        }
                    }
                    Err(err) => handle_data_error(&err, &navigator),
                }
            });
        })
    };

    let on_close_vault = {
        let client = services.client.clone();
        let navigator = navigator.clone();
        Callback::from(move |_: MouseEvent| {
            close_vault(&client, &navigator, NavState::default());
        })
    };

    let on_time_up = {
        let client = services.client.clone();
        let navigator = navigator.clone();
        Callback::from(move |()| {
            close_vault(
                &client,
                &navigator,
                NavState::with_info("Vault session expired"),
            );
        })
    };

    let search = props.on_search.as_ref().filter(|_| props.show_search).map(|on_search| {
        let on_search = on_search.clone();
        let term_ref = term_ref.clone();
        let onsubmit = Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if let Some(input) = term_ref.cast::<HtmlInputElement>() {
                on_search.emit(input.value().trim().to_string());
            }
        });
        html! {
            <form class="navbar-form navbar-left" role="search" {onsubmit}>
                <div class="input-group">
                    <input type="search" class="form-control" placeholder="Search"
                        autocomplete="on" ref={term_ref.clone()} />
                    <div class="input-group-btn">
                        <button type="submit" class="btn btn-default">{"Search"}</button>
                    </div>
                </div>
            </form>
        }
    });

    let timer = (props.show_search && services.client.idle_timeout().is_some())
        .then(|| html! { <IdleTimer on_expire={on_time_up} /> });

    let menu = if display_name.is_some() {
        html! {
            <ul class="dropdown-menu">
                <li><a onclick={on_logout}>{"Logout"}</a></li>
                <li role="separator" class="divider"></li>
                <li><a onclick={on_close_vault}>{"Close Vault"}</a></li>
            </ul>
        }
    } else {
        html! {
            <ul class="dropdown-menu">
                <li><Link<Route> to={Route::Splash}>{"Login"}</Link<Route>></li>
            </ul>
        }
    };

    html! {
        <nav class="navbar navbar-default navbar-fixed-top">
            <div class="navbar-header">
                <Link<Route> classes="navbar-brand" to={Route::Splash}>{"Vaultgate"}</Link<Route>>
                {timer}
            </div>
            {search}
            <ul class="nav navbar-nav navbar-right">
                <li class="dropdown">
                    <details>
                        <summary>{display_name.unwrap_or_else(|| "Not logged in".to_string())}</summary>
                        {menu}
                    </details>
                </li>
            </ul>
        </nav>
    }
}

fn close_vault(client: &Rc<ApiClient>, navigator: &Navigator, state: NavState) {
    let client = client.clone();
    let navigator = navigator.clone();
    yew::platform::spawn_local(async move {
        let outcome = client
            .dispatch(Channel::Session, Method::Post, "close_db", None)
            .await;
        match outcome {
            Outcome::Aborted => {}
            // back to the splash probe so the proper login checks run
            Outcome::Success(_) => navigator.replace_with_state(&Route::Splash, state),
            Outcome::Unauthorized { .. } => navigator
                .replace_with_state(&Route::Splash, NavState::with_info("Session expired")),
            Outcome::OtherError { message, .. } => gloo::dialogs::alert(&message),
        }
    });
}

#[derive(Properties, PartialEq)]
struct IdleTimerProps {
    on_expire: Callback<()>,
}

#[function_component(IdleTimer)]
fn idle_timer(props: &IdleTimerProps) -> Html {
    let services = use_context::<ServicesCtx>();
    let remaining = use_state(|| 0u64);

    {
        let services = services.clone();
        let remaining = remaining.clone();
        let on_expire = props.on_expire.clone();
        use_effect_with_deps(
            move |_| {
                let timer = services.as_ref().map(|services| {
                    let client = services.client.clone();
                    let timer = client.timer();
                    timer.borrow_mut().set_period(client.idle_timeout());
                    remaining.set(timer.borrow().remaining());
                    timer
                });
                let ticker = timer.clone().map(|timer| {
                    Interval::new(1_000, move || {
                        let tick = timer.borrow_mut().tick();
                        remaining.set(timer.borrow().remaining());
                        if tick == TimerTick::Expired {
                            on_expire.emit(());
                        }
                    })
                });
                move || {
                    if let Some(timer) = timer {
                        timer.borrow_mut().stop();
                    }
                    drop(ticker);
                }
            },
            (),
        );
    }

    let Some(services) = services else {
        return html! {};
    };
    let on_restart = {
        let client = services.client.clone();
        Callback::from(move |_: MouseEvent| {
            client.timer().borrow_mut().restart(true);
        })
    };

    html! {
        <div class="navbar-text vg-timer">
            <span>{format_clock(*remaining)}</span>
            <button type="button" class="btn btn-secondary btn-xs" onclick={on_restart}
                title="Restart timer">{"\u{27f3}"}</button>
        </div>
    }
}
