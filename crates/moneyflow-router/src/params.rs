//! Path parameter storage.
//!
//! Parameters are kept in a small vector so the common case of one or
//! two bound segments (`/users/:id`, `/users/:page/:rows`) never allocates
//! the container itself.

use smallvec::SmallVec;

/// Maximum number of parameters stored inline.
const INLINE_PARAMS: usize = 4;

/// Named path parameters bound by a route match.
///
/// # Example
///
/// ```rust
/// use moneyflow_router::Params;
///
/// let mut params = Params::new();
/// params.push("page", "2");
/// params.push("rows", "20");
///
/// assert_eq!(params.get("page"), Some("2"));
/// assert_eq!(params.get("rows"), Some("20"));
/// assert_eq!(params.get("id"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if no parameter is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_new_is_empty() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_params_first_binding_wins() {
        let mut params = Params::new();
        params.push("id", "a");
        params.push("id", "b");
        assert_eq!(params.get("id"), Some("a"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_iter_preserves_order() {
        let params: Params = vec![
            ("page".to_string(), "1".to_string()),
            ("rows".to_string(), "10".to_string()),
        ]
        .into_iter()
        .collect();

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("page", "1"), ("rows", "10")]);
    }
}
