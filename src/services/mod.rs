pub mod event_service;
pub mod reward_service;
pub mod spin_service;

pub use event_service::*;
pub use reward_service::*;
pub use spin_service::*;
