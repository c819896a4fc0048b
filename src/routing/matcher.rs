//! Route matching module
//!
//! The route table is closed: exactly two registered paths, everything else
//! falls through to `Route::NotFound`.

use hyper::{Method, StatusCode};

pub const ROOT_PATH: &str = "/";
pub const API_TEST_PATH: &str = "/api/test";

/// A resolved application route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /`
    Welcome,
    /// `GET /api/test`
    ApiTest,
    /// Any unregistered method/path combination
    NotFound,
}

impl Route {
    /// Resolve a request to its route.
    ///
    /// Paths are compared exactly; `HEAD` is served wherever `GET` is.
    pub fn resolve(method: &Method, path: &str) -> Self {
        if *method != Method::GET && *method != Method::HEAD {
            return Self::NotFound;
        }

        match path {
            ROOT_PATH => Self::Welcome,
            API_TEST_PATH => Self::ApiTest,
            _ => Self::NotFound,
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            Self::Welcome | Self::ApiTest => StatusCode::OK,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_registered_paths() {
        assert_eq!(Route::resolve(&Method::GET, "/"), Route::Welcome);
        assert_eq!(Route::resolve(&Method::GET, "/api/test"), Route::ApiTest);
    }

    #[test]
    fn test_resolve_head_like_get() {
        assert_eq!(Route::resolve(&Method::HEAD, "/"), Route::Welcome);
        assert_eq!(Route::resolve(&Method::HEAD, "/api/test"), Route::ApiTest);
        assert_eq!(Route::resolve(&Method::HEAD, "/missing"), Route::NotFound);
    }

    #[test]
    fn test_resolve_exact_match_only() {
        for path in ["/nonexistent", "/api", "/api/test/", "/API/TEST", "//", "", "/api/tests"] {
            assert_eq!(
                Route::resolve(&Method::GET, path),
                Route::NotFound,
                "path {path:?} should not match"
            );
        }
    }

    #[test]
    fn test_resolve_other_methods_not_found() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::OPTIONS] {
            assert_eq!(Route::resolve(&method, "/"), Route::NotFound);
            assert_eq!(Route::resolve(&method, "/api/test"), Route::NotFound);
        }
    }

    #[test]
    fn test_status() {
        assert_eq!(Route::Welcome.status(), StatusCode::OK);
        assert_eq!(Route::ApiTest.status(), StatusCode::OK);
        assert_eq!(Route::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
