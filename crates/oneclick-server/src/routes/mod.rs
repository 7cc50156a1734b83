pub mod installer;
pub mod status;
