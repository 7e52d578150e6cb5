//! triage-analyze - run the inspection tool sequence on one file
//!
//! Writes the same `<sha256>.json` bundle and `completed` marker the service
//! produces, without a job store or an HTTP server.

mod cli;

use cli::CliApp;

#[tokio::main]
async fn main() {
    let exit_code = match CliApp::new().run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            cli::exit_codes::INTERNAL_ERROR
        }
    };

    std::process::exit(exit_code);
}
