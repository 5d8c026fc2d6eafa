//! order-intake — chat-message order extraction and pricing service.

pub mod catalog;
pub mod channels;
pub mod config;
pub mod error;
pub mod extract;
pub mod media;
pub mod orders;
pub mod pipeline;
pub mod routes;
