pub mod catalog;
pub mod cli;
pub mod display;
pub mod error;
pub mod git;
pub mod handlers;
pub mod runner;
pub mod sarif;
pub mod telemetry;

pub use catalog::{Catalog, ScannerDescriptor};
pub use cli::{Cli, Command, ScanArgs, ScannersArgs};
pub use display::SeverityFormat;
pub use error::{DragnetError, Result};
pub use sarif::{Finding, Level, SarifDocument, Summary};
