//! Route table capability and the default radix-tree implementation.
//!
//! [`App`](crate::App) only needs two things from a router: register a value
//! under a method + path pair, and find it again for an incoming request.
//! [`RouteTable`] is that capability; [`TreeRouter`] implements it with one
//! [`matchit`] tree per method.

use std::collections::HashMap;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::error::Error;

/// Route parameters captured from the path, by name.
pub type Params = HashMap<String, String>;

/// What [`App`](crate::App) requires of a router.
pub trait RouteTable<T>: Send + Sync + 'static {
    /// Registers `value` for `method` + `path`. Conflicting or malformed paths
    /// are rejected with [`Error::Route`].
    fn insert(&mut self, method: Method, path: &str, value: T) -> Result<(), Error>;

    /// Finds the value for `method` + `path` along with its parameters.
    fn at(&self, method: &Method, path: &str) -> Option<(&T, Params)>;

    /// Methods that have a route matching `path`. `HEAD` is included
    /// whenever `GET` is, since dispatch serves it from the `GET` handler.
    fn allowed(&self, path: &str) -> Vec<Method>;
}

/// Radix-tree router, one tree per HTTP method. O(path-length) lookup.
///
/// Path parameters use either `{name}` or `:name`; catch-alls use either
/// `{*rest}` or `*rest`. Both spellings register the same route.
///
/// Any segment starting with `:` or `*` is read as a parameter, so a literal
/// segment such as `/:colon` cannot be registered.
pub struct TreeRouter<T> {
    routes: HashMap<Method, MatchitRouter<T>>,
}

impl<T> TreeRouter<T> {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }
}

impl<T> Default for TreeRouter<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Send + Sync + 'static> RouteTable<T> for TreeRouter<T> {
    fn insert(&mut self, method: Method, path: &str, value: T) -> Result<(), Error> {
        self.routes
            .entry(method)
            .or_default()
            .insert(normalize(path), value)
            .map_err(|source| Error::Route { path: path.to_owned(), source })
    }

    fn at(&self, method: &Method, path: &str) -> Option<(&T, Params)> {
        let matched = self.routes.get(method)?.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value, params))
    }

    fn allowed(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.clone())
            .collect();
        if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
            methods.push(Method::HEAD);
        }
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}

/// Rewrites `:name` and `*name` segments into matchit's `{name}` / `{*name}`.
fn normalize(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if let Some(name) = seg.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = seg.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                seg.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colon_and_brace_params_are_equivalent() {
        assert_eq!(normalize("/items/:id"), "/items/{id}");
        assert_eq!(normalize("/files/*path"), "/files/{*path}");
        assert_eq!(normalize("/items/{id}/tags"), "/items/{id}/tags");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn colon_segment_is_always_a_param() {
        let mut router = TreeRouter::new();
        router.insert(Method::GET, "/:colon", ()).unwrap();

        let (_, params) = router.at(&Method::GET, "/anything").unwrap();
        assert_eq!(params.get("colon").map(String::as_str), Some("anything"));
    }

    #[test]
    fn lookup_extracts_params() {
        let mut router = TreeRouter::new();
        router.insert(Method::GET, "/items/:id/tags/{tag}", 1).unwrap();

        let (value, params) = router.at(&Method::GET, "/items/42/tags/red").unwrap();
        assert_eq!(*value, 1);
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("tag").map(String::as_str), Some("red"));
    }

    #[test]
    fn lookup_is_per_method() {
        let mut router = TreeRouter::new();
        router.insert(Method::GET, "/items", "list").unwrap();

        assert!(router.at(&Method::POST, "/items").is_none());
        assert!(router.at(&Method::GET, "/nothing").is_none());
    }

    #[test]
    fn conflicting_route_is_rejected() {
        let mut router = TreeRouter::new();
        router.insert(Method::GET, "/items/:id", 1).unwrap();

        let err = router.insert(Method::GET, "/items/{id}", 2).unwrap_err();
        assert!(matches!(err, Error::Route { ref path, .. } if path == "/items/{id}"));

        // Same path under another method is a different tree.
        router.insert(Method::DELETE, "/items/{id}", 3).unwrap();
    }

    #[test]
    fn allowed_lists_matching_methods_sorted() {
        let mut router = TreeRouter::new();
        router.insert(Method::PUT, "/items/:id", ()).unwrap();
        router.insert(Method::GET, "/items/:id", ()).unwrap();
        router.insert(Method::POST, "/items", ()).unwrap();

        assert_eq!(router.allowed("/items/9"), vec![Method::GET, Method::HEAD, Method::PUT]);
        assert_eq!(router.allowed("/items"), vec![Method::POST]);
        assert!(router.allowed("/other").is_empty());
    }
}
