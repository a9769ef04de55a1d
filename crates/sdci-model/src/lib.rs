//! Public types shared by the sdci server, engine and client.

mod domain;
pub use domain::*;
