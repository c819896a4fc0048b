//! Request handler module
//!
//! Turns a resolved route into the service's fixed responses.

pub mod router;

pub use router::{build_route_response, handle_request, API_TEST_MESSAGE, WELCOME_TEXT};
