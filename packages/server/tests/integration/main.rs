mod common;

mod grading;
mod submission;
mod team;
