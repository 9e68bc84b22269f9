pub mod experience;
pub mod resume;
pub mod user;

pub use experience::{EmploymentType, ExperienceKind, ExperienceRef};
pub use resume::*;
pub use user::AuthContext;
