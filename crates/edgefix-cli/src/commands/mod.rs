//! CLI command implementations

pub mod doctor;
pub mod fix;
pub mod normalize;

pub use doctor::DoctorCommand;
pub use fix::FixCommand;
pub use normalize::NormalizeCommand;
