//! Radix tree nodes.
//!
//! One node per path segment. Parameter nodes are anonymous: the names
//! bound to them are stored on the [`Endpoint`] so that `/users/:id` and
//! `/users/:page/:rows` can share the first parameter node.

use http::Method;
use smallvec::SmallVec;

use crate::error::RouteError;
use crate::method_router::{Endpoint, MethodRouter};

/// Parameter values captured while walking the tree.
pub(crate) type Captures<'p> = SmallVec<[&'p str; 4]>;

/// A parsed template segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text that must match exactly.
    Static(&'a str),
    /// A `:name` segment bound to whatever the request carries there.
    Param(&'a str),
}

/// Splits a template such as `/incomes/user/:user_id` into segments.
pub fn parse_template(template: &str) -> Result<Vec<Segment<'_>>, RouteError> {
    let invalid = |reason| RouteError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };

    if !template.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    let mut segments = Vec::new();
    for raw in template.split('/').filter(|s| !s.is_empty()) {
        if let Some(name) = raw.strip_prefix(':') {
            if name.is_empty() {
                return Err(invalid("empty parameter name"));
            }
            if segments.contains(&Segment::Param(name)) {
                return Err(invalid("duplicate parameter name"));
            }
            segments.push(Segment::Param(name));
        } else if raw.starts_with('*') {
            return Err(invalid("wildcard segments are not supported"));
        } else {
            segments.push(Segment::Static(raw));
        }
    }
    Ok(segments)
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    segment: String,
    methods: Option<MethodRouter<T>>,
    /// Sorted by segment for binary search.
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("")
    }

    fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            methods: None,
            static_children: Vec::new(),
            param_child: None,
        }
    }

    /// Inserts an endpoint at the node reached by `segments`.
    pub fn insert(
        &mut self,
        segments: &[Segment<'_>],
        method: &Method,
        endpoint: Endpoint<T>,
    ) -> Result<(), RouteError> {
        let Some((first, remaining)) = segments.split_first() else {
            return self
                .methods
                .get_or_insert_with(MethodRouter::new)
                .insert(method, endpoint);
        };

        let child = match first {
            Segment::Static(text) => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(i) => &mut self.static_children[i],
                    Err(i) => {
                        self.static_children.insert(i, Node::new(*text));
                        &mut self.static_children[i]
                    }
                }
            }
            Segment::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new(":")))
                .as_mut(),
        };
        child.insert(remaining, method, endpoint)
    }

    /// Finds the endpoint for `method` at `segments`.
    ///
    /// Static children are tried before the parameter child at every
    /// depth; a branch that dead-ends (including one that has the path but
    /// not the method) is abandoned and its captures discarded.
    pub(crate) fn find<'a, 'p>(
        &'a self,
        segments: &[&'p str],
        method: &Method,
        captures: &mut Captures<'p>,
    ) -> Option<&'a Endpoint<T>> {
        let Some((first, remaining)) = segments.split_first() else {
            return self.methods.as_ref().and_then(|m| m.get(method));
        };

        if let Ok(i) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(first))
        {
            if let Some(found) = self.static_children[i].find(remaining, method, captures) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            let mark = captures.len();
            captures.push(*first);
            if let Some(found) = child.find(remaining, method, captures) {
                return Some(found);
            }
            captures.truncate(mark);
        }

        None
    }

    /// Returns the method table at `segments`, ignoring methods.
    pub(crate) fn methods_at(&self, segments: &[&str]) -> Option<&MethodRouter<T>> {
        let Some((first, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Ok(i) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(first))
        {
            if let Some(found) = self.static_children[i].methods_at(remaining) {
                return Some(found);
            }
        }
        self.param_child
            .as_ref()
            .and_then(|child| child.methods_at(remaining))
    }
}
