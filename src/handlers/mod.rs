pub mod admin;
pub mod event;
pub mod spin;

pub use admin::admin_config;
pub use event::event_config;
pub use spin::spin_config;
