mod address;
mod params;
mod script;
mod scripthash;

pub use address::*;
pub use params::*;
pub use script::*;
pub use scripthash::*;
