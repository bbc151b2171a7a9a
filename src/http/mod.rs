//! HTTP layer - the authenticated client and the transport it sends through.

/// Bearer-attaching client with 401 refresh handling
pub mod client;
/// Transport seam and the `reqwest` implementation
pub mod transport;

pub use client::ApiClient;
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport};
