mod auth;
mod client;
mod config;
mod request;
mod response;

pub use auth::*;
pub use client::*;
pub use config::*;
pub use request::*;
pub use response::*;
