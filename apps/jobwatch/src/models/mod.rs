pub mod job;
pub mod posting;
