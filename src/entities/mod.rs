pub mod events;
pub mod rewards;
pub mod spin_tickets;

pub use events as event_entity;
pub use rewards as reward_entity;
pub use spin_tickets as spin_ticket_entity;

pub use rewards::RewardKind;
pub use spin_tickets::{TicketState, TicketStatus};
