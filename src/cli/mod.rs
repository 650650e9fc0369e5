//! Command line interface for yass_build.
//!
//! Parses flags into a [`BuildConfig`](crate::config::BuildConfig), runs the
//! pipeline and summarizes the archives it produced.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::report::{LogReporter, Reporter};
use std::sync::Arc;

/// Main CLI entry point
pub fn run() -> Result<i32> {
    let args = Args::parse_args();
    let quiet = args.quiet;
    let config = args.into_config()?;

    let output = OutputManager::new();
    let reporter: Arc<dyn Reporter> = if quiet {
        Arc::new(LogReporter)
    } else {
        Arc::new(output.clone())
    };

    let pipeline = Pipeline::new(&config, reporter);
    let manifest = pipeline.run()?;

    if !quiet {
        for (archive, files) in &manifest {
            let _ = output.success(archive);
            for file in files {
                let _ = output.indent(file);
            }
        }
        let _ = output.success(&format!(
            "Build finished in {}",
            pipeline.build_dir().display()
        ));
    }
    Ok(0)
}
