//! `generate` command
//!
//! Writes the generated setup statements (or the object graph as JSON) to
//! stdout or a file.

use crate::cli::args::{GenerateArgs, GenerateFormat};
use crate::cli::commands::build;
use crate::config::ConfigLoader;
use crate::error::CodegenError;

/// Generate setup code for one configuration.
///
/// # Errors
///
/// Returns a config or binding error if the file is invalid, or an I/O
/// error if the output cannot be written.
pub fn run(args: &GenerateArgs) -> Result<(), CodegenError> {
    let loader = ConfigLoader::with_defaults();
    let (_, generated) = build(&loader, &args.file)?;

    let rendered = match args.format {
        GenerateFormat::Cpp => generated.render_cpp(),
        GenerateFormat::Json => {
            let mut json = generated.to_json()?;
            json.push('\n');
            json
        }
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            tracing::info!(output = %path.display(), "generated code written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
