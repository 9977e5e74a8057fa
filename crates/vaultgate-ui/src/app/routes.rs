//! Routing definitions for the Vaultgate UI.
use yew_router::prelude::*;

#[derive(Clone, Routable, PartialEq, Eq, Debug)]
pub(crate) enum Route {
    #[at("/")]
    Splash,
    #[at("/vault")]
    Vault,
    #[at("/user_login")]
    UserLogin,
    #[at("/backend_login")]
    BackendLogin,
    #[at("/db_login")]
    DbLogin,
    #[at("/callback_user_auth")]
    CallbackUserAuth,
    #[not_found]
    #[at("/404")]
    NotFound,
}
