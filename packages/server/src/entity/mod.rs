pub mod hackathon;
pub mod team;
pub mod user;
