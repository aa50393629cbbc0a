pub mod config;
pub mod logging;

pub mod coordinator;
pub mod error;
pub mod event;
pub mod gate;
pub mod job;
pub mod policy;
pub mod scheduler;
pub mod tracker;
