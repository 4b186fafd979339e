pub mod hackathon_status;
pub mod membership;
pub mod team_status;

pub use hackathon_status::HackathonStatus;
pub use membership::{DisplayIdentity, MemberIdentity, MemberSource, resolve_display_names};
pub use team_status::TeamStatus;
