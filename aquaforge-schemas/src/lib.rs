pub mod file_formats;
pub mod production;
pub mod profile;
pub mod range;
pub mod reading;
pub mod violation;
