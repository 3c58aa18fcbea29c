pub mod events;
pub mod host;
pub mod request;
pub mod scheduler;
