mod economics;
mod history;
mod lookup;

pub use economics::*;
pub use history::*;
pub use lookup::*;
