//! Core type definitions: requests, responses, task kinds and hints.

mod request;
mod response;

pub use request::{Hint, Priority, Request, TaskKind};
pub use response::Response;
