pub mod job;
pub mod subscriber;
