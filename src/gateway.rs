pub mod activity;
pub mod events;
