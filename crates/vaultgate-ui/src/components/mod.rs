pub(crate) mod callback;
pub(crate) mod feedback;
pub(crate) mod login;
pub(crate) mod navbar;
pub(crate) mod splash;
pub(crate) mod vault;
