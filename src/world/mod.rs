pub mod board;
pub mod cron;
pub mod position;
pub mod ring;
pub mod sandbox;
pub mod time;
