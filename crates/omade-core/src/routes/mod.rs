//! Route guarding and navigation.
//!
//! - `guard`: access predicates, login redirect encoding, permission check
//! - `Router`: in-process navigator applying the guard on every navigation
//! - `Navigator`: the seam the HTTP gateway redirects through

pub mod guard;
pub mod router;

pub use guard::{GuardDecision, GuardPolicy, RouteAccess, DEFAULT_LANDING, LOGIN_PATH};
pub use router::{Navigation, Route, RouteTable, Router};

/// Something that can report where the user is and send them elsewhere.
pub trait Navigator: Send + Sync {
    /// Path of the current location, without query
    fn current_path(&self) -> String;

    fn redirect(&self, location: &str);

    /// Send the user to the login route carrying the current path as the
    /// return target. Already on the login route: stay put.
    fn redirect_to_login(&self) {
        let path = self.current_path();
        if path == LOGIN_PATH {
            return;
        }
        self.redirect(&guard::login_redirect(&path));
    }
}
