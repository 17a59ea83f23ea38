//! Per-path method table.

use http::Method;

use crate::error::RouteError;

/// A value registered for one method on one path shape.
///
/// The tree is shared between templates that differ only in parameter
/// names at different depths, so the names live here rather than on the
/// nodes.
#[derive(Debug, Clone)]
pub struct Endpoint<T> {
    /// Template the endpoint was registered with, e.g. `/users/:id`.
    pub template: String,
    /// Parameter names in the order they appear in the template.
    pub param_names: Vec<String>,
    /// The routed value.
    pub value: T,
}

/// Maps HTTP methods to endpoints for a single path shape.
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    get: Option<Endpoint<T>>,
    post: Option<Endpoint<T>>,
    put: Option<Endpoint<T>>,
    delete: Option<Endpoint<T>>,
    patch: Option<Endpoint<T>>,
    head: Option<Endpoint<T>>,
    options: Option<Endpoint<T>>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            head: None,
            options: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `endpoint` for `method`.
    ///
    /// Fails with [`RouteError::Conflict`] if the slot is taken, whatever
    /// parameter names the existing template used.
    pub fn insert(&mut self, method: &Method, endpoint: Endpoint<T>) -> Result<(), RouteError> {
        let slot = self
            .slot_mut(method)
            .ok_or_else(|| RouteError::UnsupportedMethod(method.clone()))?;

        if let Some(existing) = slot {
            return Err(RouteError::Conflict {
                method: method.clone(),
                existing: existing.template.clone(),
                template: endpoint.template,
            });
        }

        *slot = Some(endpoint);
        Ok(())
    }

    /// Returns the endpoint registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&Endpoint<T>> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            _ => None,
        }
    }

    /// Returns the methods with a registered endpoint.
    pub fn allowed_methods(&self) -> Vec<Method> {
        [
            (Method::GET, self.get.is_some()),
            (Method::POST, self.post.is_some()),
            (Method::PUT, self.put.is_some()),
            (Method::DELETE, self.delete.is_some()),
            (Method::PATCH, self.patch.is_some()),
            (Method::HEAD, self.head.is_some()),
            (Method::OPTIONS, self.options.is_some()),
        ]
        .into_iter()
        .filter_map(|(m, present)| present.then_some(m))
        .collect()
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<Endpoint<T>>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(template: &str, value: u32) -> Endpoint<u32> {
        Endpoint {
            template: template.to_string(),
            param_names: Vec::new(),
            value,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut methods = MethodRouter::new();
        methods.insert(&Method::GET, endpoint("/users", 1)).unwrap();
        methods.insert(&Method::POST, endpoint("/users", 2)).unwrap();

        assert_eq!(methods.get(&Method::GET).map(|e| e.value), Some(1));
        assert_eq!(methods.get(&Method::POST).map(|e| e.value), Some(2));
        assert!(methods.get(&Method::DELETE).is_none());
    }

    #[test]
    fn test_second_insert_for_same_method_conflicts() {
        let mut methods = MethodRouter::new();
        methods.insert(&Method::GET, endpoint("/users/:id", 1)).unwrap();

        let err = methods
            .insert(&Method::GET, endpoint("/users/:user_id", 2))
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::Conflict {
                method: Method::GET,
                existing: "/users/:id".to_string(),
                template: "/users/:user_id".to_string(),
            }
        );
    }

    #[test]
    fn test_unsupported_method() {
        let mut methods = MethodRouter::new();
        let err = methods
            .insert(&Method::CONNECT, endpoint("/tunnel", 1))
            .unwrap_err();
        assert_eq!(err, RouteError::UnsupportedMethod(Method::CONNECT));
    }

    #[test]
    fn test_allowed_methods() {
        let mut methods = MethodRouter::new();
        methods.insert(&Method::PUT, endpoint("/x", 1)).unwrap();
        methods.insert(&Method::GET, endpoint("/x", 2)).unwrap();
        assert_eq!(methods.allowed_methods(), vec![Method::GET, Method::PUT]);
    }
}
