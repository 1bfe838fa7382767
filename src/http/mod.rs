//! Request execution: the executor seam, the reqwest client, fixed headers
//! and the endpoint set.
mod client;
mod endpoints;
mod executor;
mod headers;
mod tally;

#[cfg(test)]
mod tests;

pub use client::ReqwestExecutor;
pub use endpoints::{EndpointSet, resolve_endpoint};
pub use executor::{RequestExecutor, RequestResult, execute_and_record};
pub use headers::build_headers;
pub use tally::{TransportErrorCount, TransportTally};
