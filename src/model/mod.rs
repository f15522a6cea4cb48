mod types;
mod wire;

pub use types::*;
pub use wire::*;
