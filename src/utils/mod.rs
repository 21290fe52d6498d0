pub mod jwt;
pub mod weighted;

pub use jwt::*;
pub use weighted::pick_weighted;
