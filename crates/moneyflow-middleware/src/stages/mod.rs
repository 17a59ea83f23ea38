//! Standard interceptors.
//!
//! Global chain, outermost first:
//!
//! ```text
//! Logging → Errors → Metrics → Panics → [route interceptors] → Handler
//! ```
//!
//! Route interceptors are usually [`AuthenticateMiddleware`] optionally
//! followed by [`AuthorizeMiddleware`].

pub mod authenticate;
pub mod authorize;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod panics;

pub use authenticate::AuthenticateMiddleware;
pub use authorize::AuthorizeMiddleware;
pub use errors::ErrorsMiddleware;
pub use logging::LoggingMiddleware;
pub use metrics::{MetricsMiddleware, MetricsSnapshot};
pub use panics::PanicsMiddleware;

use crate::chain::Chain;

/// The global chain: logging, error classification, metrics and panic
/// recovery, in that order.
#[must_use]
pub fn standard(metrics: MetricsMiddleware) -> Chain {
    Chain::new()
        .with(LoggingMiddleware::new())
        .with(ErrorsMiddleware::new())
        .with(metrics)
        .with(PanicsMiddleware::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        assert_eq!(
            standard(MetricsMiddleware::new()).names(),
            vec!["logging", "errors", "metrics", "panics"]
        );
    }
}
