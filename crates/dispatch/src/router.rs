//! The route registry: an exact `path -> method -> handler` table.
//!
//! Matching is plain string equality on the path and equality on the method. There is no
//! normalization of trailing slashes, case or query strings; the dispatcher hands in
//! `uri.path()`, which already has the query string stripped.

use crate::handler::BoxHandler;
use arc_swap::ArcSwap;
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type MethodTable = HashMap<Method, BoxHandler>;

#[derive(Clone, Default)]
struct RouteTable {
    routes: HashMap<String, MethodTable>,
}

/// Shared by every application bound to it. Registration swaps in a new table, lookups read
/// the current one without locking.
pub(crate) struct RouteRegistry {
    table: ArcSwap<RouteTable>,
}

impl RouteRegistry {
    pub(crate) fn new() -> Self {
        Self { table: ArcSwap::from_pointee(RouteTable::default()) }
    }

    /// Stores `handler` under `(path, method)`, returns `true` if a previous handler was replaced.
    pub(crate) fn register(&self, method: Method, path: String, handler: BoxHandler) -> bool {
        let mut replaced = false;
        self.table.rcu(|current| {
            let mut next = RouteTable::clone(current);
            replaced = next
                .routes
                .entry(path.clone())
                .or_default()
                .insert(method.clone(), Arc::clone(&handler))
                .is_some();
            next
        });
        replaced
    }

    pub(crate) fn lookup(&self, path: &str, method: &Method) -> Option<BoxHandler> {
        self.table.load().routes.get(path).and_then(|methods| methods.get(method)).map(Arc::clone)
    }

    /// All registered `(method, path)` pairs, sorted by path then method.
    pub(crate) fn routes(&self) -> Vec<(Method, String)> {
        let table = self.table.load();
        let mut routes = table
            .routes
            .iter()
            .flat_map(|(path, methods)| methods.keys().map(move |method| (method.clone(), path.clone())))
            .collect::<Vec<_>>();
        routes.sort_by(|(m1, p1), (m2, p2)| p1.cmp(p2).then_with(|| m1.as_str().cmp(m2.as_str())));
        routes
    }

    pub(crate) fn len(&self) -> usize {
        self.table.load().routes.values().map(HashMap::len).sum()
    }
}

impl fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes().iter().map(|(method, path)| format!("{method} {path}"))).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::RouteRegistry;
    use crate::handler::{BoxHandler, ErasedHandler, erase_handler, handler_fn};
    use crate::{Context, context::AnyState};
    use http::{Method, Request};
    use std::sync::Arc;

    fn text_handler(text: &'static str) -> BoxHandler {
        erase_handler::<(), _>(handler_fn(move |_ctx: Context| async move { text }))
    }

    async fn invoke(handler: &BoxHandler) -> Vec<u8> {
        let state: Arc<AnyState> = Arc::new(());
        let ctx = Context::new(Request::get("/").body(()).unwrap(), state);
        handler.call_erased(ctx).await.unwrap().body().as_bytes().to_vec()
    }

    #[test]
    fn lookup_is_exact() {
        let registry = RouteRegistry::new();
        registry.register(Method::GET, "/users".into(), text_handler("users"));

        assert!(registry.lookup("/users", &Method::GET).is_some());
        assert!(registry.lookup("/users", &Method::POST).is_none());
        assert!(registry.lookup("/users/", &Method::GET).is_none());
        assert!(registry.lookup("/Users", &Method::GET).is_none());
        assert!(registry.lookup("/users?page=1", &Method::GET).is_none());
        assert!(registry.lookup("/", &Method::GET).is_none());
    }

    #[test]
    fn method_extension_is_distinct() {
        let registry = RouteRegistry::new();
        let purge = Method::from_bytes(b"PURGE").unwrap();
        registry.register(purge.clone(), "/cache".into(), text_handler("purged"));

        assert!(registry.lookup("/cache", &purge).is_some());
        assert!(registry.lookup("/cache", &Method::from_bytes(b"purge").unwrap()).is_none());
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let registry = RouteRegistry::new();
        assert!(!registry.register(Method::GET, "/".into(), text_handler("first")));
        assert!(registry.register(Method::GET, "/".into(), text_handler("second")));
        assert_eq!(registry.len(), 1);

        let handler = registry.lookup("/", &Method::GET).unwrap();
        assert_eq!(invoke(&handler).await, b"second");
    }

    #[test]
    fn routes_are_sorted() {
        let registry = RouteRegistry::new();
        registry.register(Method::POST, "/b".into(), text_handler("b"));
        registry.register(Method::GET, "/b".into(), text_handler("b"));
        registry.register(Method::GET, "/a".into(), text_handler("a"));

        assert_eq!(
            registry.routes(),
            vec![(Method::GET, "/a".to_string()), (Method::GET, "/b".to_string()), (Method::POST, "/b".to_string())]
        );
        assert_eq!(format!("{registry:?}"), r#"["GET /a", "GET /b", "POST /b"]"#);
    }
}
