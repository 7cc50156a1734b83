pub mod config;
pub mod error;
pub mod guard;
pub mod io;
pub mod paths;
pub mod service;
pub mod strategy;
pub mod wizard;

pub use config::{CheckMethod, Config};
pub use error::{InstallerError, Result};
pub use service::{Diagnosis, InstallationInfo, InstallationService};
