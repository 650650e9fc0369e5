//! yass_build - build and package yass for one target.
//!
//! Configures, builds, post-processes and archives the application, exiting
//! with a non-zero status on the first fatal error.

use std::process;
use yass_build::cli;
use yass_build::cli::OutputManager;

fn main() {
    env_logger::init();

    match cli::run() {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new();
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                let _ = output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    let _ = output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
