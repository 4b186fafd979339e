pub mod grading;
pub mod hackathon;
pub mod shared;
pub mod submission;
pub mod team;
