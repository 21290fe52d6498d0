pub mod common;
pub mod event;
pub mod reward;
pub mod ticket;

pub use common::*;
pub use event::*;
pub use reward::*;
pub use ticket::*;
