use http::{Method, Request};

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    method: Method,
    path: &'static str,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, method: Method, path: &'static str) -> Self {
        Self { name, group, method, path }
    }

    pub fn hit(name: &'static str, method: Method, path: &'static str) -> Self {
        Self::new(name, TestGroup::Hit, method, path)
    }

    pub fn miss(name: &'static str, method: Method, path: &'static str) -> Self {
        Self::new(name, TestGroup::Miss, method, path)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn request(&self) -> http::Result<Request<()>> {
        Request::builder().method(self.method.clone()).uri(self.path).body(())
    }
}

/// Whether the request of a case matches a registered route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestGroup {
    Hit,
    Miss,
}

/// `count` distinct route paths, `/route/0` to `/route/{count - 1}`.
pub fn route_paths(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("/route/{i}")).collect()
}
