//! Handler groups for the v1 resources.
//!
//! Each group holds its business core and exposes one method per route,
//! bound with [`operation`](moneyflow_middleware::operation). Every method
//! derives a request-scoped core tied to the request's cancellation token
//! before touching the store.

mod flows;
mod users;

pub use flows::FlowHandlers;
pub use users::UserHandlers;
