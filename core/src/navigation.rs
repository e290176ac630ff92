//! Forced navigation to the login entry point.
//!
//! The adapter calls `Navigator::redirect_to_login` after evicting the stored
//! credentials on an authorization failure. `RouteWatch` is the stock
//! implementation: it publishes the current `Route` on a watch channel the
//! view layer follows.

use tokio::sync::watch;
use tracing::info;

pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Users,
    Login,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Users => "/",
            Route::Login => "/login",
        }
    }
}

#[derive(Debug)]
pub struct RouteWatch {
    route: watch::Sender<Route>,
}

impl RouteWatch {
    pub fn new(initial: Route) -> Self {
        let (route, _) = watch::channel(initial);
        Self { route }
    }

    pub fn current(&self) -> Route {
        *self.route.borrow()
    }

    pub fn navigate(&self, to: Route) {
        self.route.send_replace(to);
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.route.subscribe()
    }
}

impl Default for RouteWatch {
    fn default() -> Self {
        Self::new(Route::Users)
    }
}

impl Navigator for RouteWatch {
    fn redirect_to_login(&self) {
        info!(to = Route::Login.path(), "redirecting to login");
        self.navigate(Route::Login);
    }
}
