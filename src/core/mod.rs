pub mod dashboard;
pub mod poller;
pub mod rate_tracker;
