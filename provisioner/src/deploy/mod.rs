//! Provisioning pipeline and its stages

pub mod alias;
pub mod compute;
pub mod gateway;
pub mod identity;
pub mod module;
pub mod persist;
pub mod pipeline;
pub mod policies;
pub mod project;
pub mod stage;
pub mod validate;
