pub mod hackathon;
pub mod jwt;
