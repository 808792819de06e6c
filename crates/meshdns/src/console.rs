//! Colored console rendering of the decision protocol.
//!
//! One line per decision, fixed tokens, for human operators. Not a stable
//! machine format.

use colored::Colorize;
use meshdns_core::report::{SyncEvent, SyncReporter};

/// Banner naming the active source mode
pub fn banner(mode: &str) {
    println!(
        "{} {} {}\n",
        "running in".blue(),
        mode.red(),
        "mode".blue()
    );
}

/// Reporter printing the FOUND/ADDING/... protocol to stdout
pub struct ConsoleReporter;

impl SyncReporter for ConsoleReporter {
    fn report(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::AdditionPhase => {
                println!("{}", "Adding new devices:".blue());
            }
            SyncEvent::CleanupPhase => {
                println!("\n{}", "Cleaning up old records:".blue());
            }
            SyncEvent::Found { fqdn, address } => {
                println!("[{}]: {} -> {}", "FOUND".green(), fqdn, address);
            }
            SyncEvent::Adding { fqdn, address } => {
                println!("[{}]: {} -> {}", "ADDING".yellow(), fqdn, address);
            }
            SyncEvent::Skipping {
                name,
                address,
                reason,
            } => {
                println!("[{}]: {} -> {} ({})", "SKIPPING".red(), name, address, reason);
            }
            SyncEvent::InUse { fqdn, address } => {
                println!("[{}]: {} -> {}", "IN USE".green(), fqdn, address);
            }
            SyncEvent::Deleting { fqdn, address } => {
                println!("[{}]: {} -> {}", "DELETING".yellow(), fqdn, address);
            }
            SyncEvent::SkipDelete { fqdn, address } => {
                println!(
                    "[{}]: {} -> {} (IP does not belong to a mesh device, please remove manually)",
                    "SKIP DELETE".red(),
                    fqdn,
                    address
                );
            }
        }
    }
}
