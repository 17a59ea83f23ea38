//! The v1 route table.

use std::sync::Arc;

use chrono::Duration;
use http::Method;
use moneyflow_auth::Authenticator;
use moneyflow_business::{ExpenseCore, FlowCore, FlowKind, IncomeCore, UserCore};
use moneyflow_core::roles;
use moneyflow_middleware::stages::standard;
use moneyflow_middleware::{
    operation, AuthenticateMiddleware, AuthorizeMiddleware, MetricsMiddleware, Middleware,
};
use moneyflow_router::RouteError;
use moneyflow_server::{App, ShutdownSignal};
use moneyflow_store::Transactor;

use crate::handlers::{FlowHandlers, UserHandlers};

/// Version segment every route is registered under.
pub const API_VERSION: &str = "v1";

/// Collaborators the routes are built from.
#[derive(Debug)]
pub struct ApiState<T: Transactor> {
    /// Storage shared by every business core.
    pub transactor: Arc<T>,
    /// Verifies bearer tokens.
    pub authenticator: Arc<Authenticator>,
    /// Request and error totals.
    pub metrics: MetricsMiddleware,
    /// Triggered when a handler reports a shutdown error.
    pub shutdown: ShutdownSignal,
    /// Lifetime of tokens issued by `GET /users/token`.
    pub token_ttl: Duration,
}

/// Builds the app with every v1 route registered behind the standard
/// chain (logging, errors, metrics, panics).
///
/// # Errors
///
/// Fails only if two routes overlap.
pub fn build_app<T: Transactor>(state: ApiState<T>) -> Result<App, RouteError> {
    let mut app = App::new(state.shutdown, standard(state.metrics));

    let authenticate: Arc<dyn Middleware> =
        Arc::new(AuthenticateMiddleware::new(Arc::clone(&state.authenticator)));
    let admin: Arc<dyn Middleware> = Arc::new(AuthorizeMiddleware::new(roles::ADMIN));
    let authed = [Arc::clone(&authenticate)];
    let admin_only = [authenticate, admin];

    let users = Arc::new(UserHandlers::new(
        UserCore::new(Arc::clone(&state.transactor)),
        state.authenticator,
        state.token_ttl,
    ));
    app.handle(
        Method::GET,
        API_VERSION,
        "/users/token",
        operation(Arc::clone(&users), UserHandlers::<T>::token),
        &[],
    )?;
    app.handle(
        Method::GET,
        API_VERSION,
        "/users/:page/:rows",
        operation(Arc::clone(&users), UserHandlers::<T>::query),
        &admin_only,
    )?;
    app.handle(
        Method::GET,
        API_VERSION,
        "/users/:id",
        operation(Arc::clone(&users), UserHandlers::<T>::query_by_id),
        &authed,
    )?;
    app.handle(
        Method::POST,
        API_VERSION,
        "/users",
        operation(Arc::clone(&users), UserHandlers::<T>::create),
        &admin_only,
    )?;
    app.handle(
        Method::PUT,
        API_VERSION,
        "/users/:id",
        operation(Arc::clone(&users), UserHandlers::<T>::update),
        &authed,
    )?;
    app.handle(
        Method::DELETE,
        API_VERSION,
        "/users/:id",
        operation(users, UserHandlers::<T>::delete),
        &authed,
    )?;

    let incomes: IncomeCore<T> = FlowCore::new(Arc::clone(&state.transactor));
    flow_routes(&mut app, "incomes", incomes, &authed, &admin_only)?;

    let expenses: ExpenseCore<T> = FlowCore::new(state.transactor);
    flow_routes(&mut app, "expenses", expenses, &authed, &admin_only)?;

    Ok(app)
}

fn flow_routes<T: Transactor, K: FlowKind>(
    app: &mut App,
    resource: &str,
    core: FlowCore<T, K>,
    authed: &[Arc<dyn Middleware>],
    admin_only: &[Arc<dyn Middleware>],
) -> Result<(), RouteError> {
    let handlers = Arc::new(FlowHandlers::new(core));
    let path = |suffix: &str| format!("/{resource}{suffix}");

    app.handle(
        Method::GET,
        API_VERSION,
        &path("/:page/:rows"),
        operation(Arc::clone(&handlers), FlowHandlers::<T, K>::query),
        admin_only,
    )?;
    app.handle(
        Method::GET,
        API_VERSION,
        &path("/:id"),
        operation(Arc::clone(&handlers), FlowHandlers::<T, K>::query_by_id),
        authed,
    )?;
    app.handle(
        Method::GET,
        API_VERSION,
        &path("/user/:user_id"),
        operation(Arc::clone(&handlers), FlowHandlers::<T, K>::query_by_user_id),
        authed,
    )?;
    app.handle(
        Method::POST,
        API_VERSION,
        &path(""),
        operation(Arc::clone(&handlers), FlowHandlers::<T, K>::create),
        authed,
    )?;
    app.handle(
        Method::PUT,
        API_VERSION,
        &path("/:id"),
        operation(Arc::clone(&handlers), FlowHandlers::<T, K>::update),
        authed,
    )?;
    app.handle(
        Method::DELETE,
        API_VERSION,
        &path("/:id"),
        operation(handlers, FlowHandlers::<T, K>::delete),
        authed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneyflow_auth::KeyStore;
    use moneyflow_store::MemoryDb;

    #[test]
    fn test_route_table() {
        let mut keys = KeyStore::new();
        keys.add_secret("k", b"0123456789abcdef0123456789abcdef");
        let app = build_app(ApiState {
            transactor: Arc::new(MemoryDb::new()),
            authenticator: Arc::new(Authenticator::new("k", keys, "moneyflow").unwrap()),
            metrics: MetricsMiddleware::new(),
            shutdown: ShutdownSignal::new(),
            token_ttl: Duration::hours(1),
        })
        .unwrap();
        assert_eq!(app.route_count(), 18);
    }
}
