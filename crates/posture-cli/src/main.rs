//! posturescan - host and domain security-posture scanner
//!
//! Flags local privilege-escalation vectors and probes lateral-movement
//! reachability across a host list.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    posture_cli::run().await
}
