//! `scanners` command: list the catalog.

use super::{EXIT_USAGE, load_catalog};
use crate::cli::ScannersArgs;
use std::process::ExitCode;

pub fn handle_scanners(args: &ScannersArgs) -> ExitCode {
    let catalog = match load_catalog(args.catalog.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    for scanner in &catalog.scanners {
        let default_tag = if scanner.default { "(default) " } else { "" };
        println!(
            "{}: {} [{}] - {}{}",
            scanner.name,
            scanner.title,
            scanner.categories.join(","),
            default_tag,
            scanner.description
        );
    }
    ExitCode::SUCCESS
}
