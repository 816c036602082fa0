//! Height command implementation.

use chaincache_rpc::{DaemonClient, HttpClient};

/// Runs the height command.
pub fn run<C: HttpClient>(daemon: &DaemonClient<C>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", daemon.get_height()?);
    Ok(())
}
