pub mod collapse;
pub mod types;

pub use collapse::*;
pub use types::*;
