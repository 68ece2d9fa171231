pub mod curriculum;
pub mod progress;
pub mod pronunciation;
