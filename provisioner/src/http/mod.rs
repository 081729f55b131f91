//! Control-plane HTTP backend

pub mod client;
pub mod compute;
pub mod gateway;
pub mod identity;
