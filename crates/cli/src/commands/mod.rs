pub mod analyze;
pub mod pack;
pub mod table;
pub mod tools;
pub mod util;

pub use analyze::*;
pub use pack::*;
pub use table::*;
pub use tools::*;
pub use util::*;
