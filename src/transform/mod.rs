/// Transform proxy
///
/// This module handles:
/// - Building backend requests in either wire shape (wire.rs)
/// - Sending them with a fixed timeout and mapping failures (client.rs)

pub mod client;
pub mod wire;

#[cfg(test)]
pub(crate) mod stub;

pub use client::TransformClient;
pub use wire::WireFormat;
