pub mod app;

pub use app::{ComplianceFormApp, PersistedDesktopSettings, StartupConfig};
