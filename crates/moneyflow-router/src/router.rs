//! High-level router API.

use http::Method;

use crate::error::RouteError;
use crate::method_router::Endpoint;
use crate::node::{parse_template, Captures, Node, Segment};
use crate::params::Params;
use crate::RouteMatch;

/// A radix tree router mapping `(method, template)` to a value.
///
/// Routes are registered once at startup; after that the router is only
/// read, so it can be shared across request tasks behind an `Arc` without
/// locking.
///
/// # Example
///
/// ```rust
/// use moneyflow_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(&Method::GET, "/v1/users/:page/:rows", "list").unwrap();
/// router.insert(&Method::GET, "/v1/users/:id", "get").unwrap();
///
/// let m = router.match_route(&Method::GET, "/v1/users/2/50").unwrap();
/// assert_eq!(*m.value, "list");
/// assert_eq!(m.params.get("rows"), Some("50"));
/// ```
///
/// # Route Priority
///
/// At every depth a static segment is preferred over a parameter, so
/// `/v1/incomes/user/:user_id` wins over `/v1/incomes/:id/:x` for
/// `/v1/incomes/user/42`. Two templates that would match exactly the same
/// paths for the same method are rejected by [`Router::insert`].
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers `value` for `method` on `template`.
    ///
    /// Templates use `:name` for parameter segments.
    pub fn insert(&mut self, method: &Method, template: &str, value: T) -> Result<(), RouteError> {
        let segments = parse_template(template)?;
        let param_names = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some((*name).to_string()),
                Segment::Static(_) => None,
            })
            .collect();

        let endpoint = Endpoint {
            template: template.to_string(),
            param_names,
            value,
        };
        self.root.insert(&segments, method, endpoint)?;
        self.route_count += 1;
        Ok(())
    }

    /// Matches a request method and path.
    ///
    /// Returns `None` when no template of that method matches every
    /// segment of the path, or when the path has an empty segment.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let segments = path_segments(path)?;
        let mut captures = Captures::new();
        let endpoint = self.root.find(&segments, method, &mut captures)?;

        let params = endpoint
            .param_names
            .iter()
            .zip(captures)
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect::<Params>();

        Some(RouteMatch::new(&endpoint.value, &endpoint.template, params))
    }

    /// Returns the methods registered for the path, if the path is known.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Option<Vec<Method>> {
        let segments = path_segments(path)?;
        self.root.methods_at(&segments).map(|m| m.allowed_methods())
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    /// Returns true if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

/// Splits a request path into segments. One leading and one trailing
/// slash are allowed; any other empty segment rejects the path.
fn path_segments(path: &str) -> Option<Vec<&str>> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Some(Vec::new());
    }
    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        None
    } else {
        Some(segments)
    }
}
