pub mod grading;
pub mod hackathon;
pub mod submission;
pub mod team;
