pub mod catalog;
pub mod macros;
pub mod power;
pub mod series;
pub mod time;

pub use catalog::*;
pub use power::*;
pub use series::*;
pub use time::*;
