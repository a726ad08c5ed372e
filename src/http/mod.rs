//! Request and response envelopes for the portal API.

mod request;
mod response;

pub use request::{
    ApiRequest, Credential, Method, PreparedRequest, RequestBody, API_KEY_HEADER,
    AUTHORIZATION_HEADER,
};
pub use response::{ApiResponse, RequestSummary, StatusCode};
