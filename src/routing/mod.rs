//! Routing module
//!
//! Maps a request's method and path onto the fixed set of application routes.

mod matcher;

pub use matcher::{Route, API_TEST_PATH, ROOT_PATH};
