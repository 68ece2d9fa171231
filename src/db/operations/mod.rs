pub mod progress;
pub mod user;

pub use progress::{get_progress, record_progress_event};
pub use user::{
    create_user, find_user, find_user_by_email, update_profile, ProfileUpdate, UserRecord,
};
