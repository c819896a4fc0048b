//! HTTP protocol layer module
//!
//! Response payloads and builders, decoupled from routing.

pub mod response;

pub use response::{
    build_json_response, build_not_found_response, build_text_response, ApiError, ApiMessage,
    HttpResponse,
};
