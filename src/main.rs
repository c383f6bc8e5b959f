//! Brutus CLI: enqueue documents under PATH, then work the shared queue.

use anyhow::Result;
use brutus::engine::arg_parser::Cli;
use brutus::engine::handle_run;
use clap::Parser;
use clap::error::ErrorKind;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };
    let summary = handle_run(&cli)?;
    log::info!(
        "Run finished: {} worker(s), {} passcode(s) found",
        summary.workers.len(),
        summary.passcodes_found()
    );
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
