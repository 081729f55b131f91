//! Function Provisioner Library
//!
//! Creates a function, its execution role and an optional web API from a
//! local project directory, then records what was created.

pub mod cli;
pub mod cloud;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod retry;
pub mod storage;
pub mod utils;
