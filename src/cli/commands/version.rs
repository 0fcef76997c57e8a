//! Version information display
//!
//! Prints the package version and the radar platform it targets.

use serde_json::json;

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::config::PLATFORM;

/// Print version information.
pub fn run(args: &VersionArgs) {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match args.format {
        OutputFormat::Human => {
            println!("{name} {version} (platform: {PLATFORM})");
        }
        OutputFormat::Json => {
            println!(
                "{}",
                json!({"name": name, "version": version, "platform": PLATFORM})
            );
        }
    }
}
