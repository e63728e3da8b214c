//! `posturescan lateral` - lateral-movement reachability sweep.

use anyhow::Result;
use colored::Colorize;
use posture_lateral::{NetworkChecks, ProbeConfig, Sweep, SweepOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use super::Context;
use crate::cli::args::LateralArgs;
use crate::hosts;
use crate::output;
use crate::report::{LateralSummary, Summary};

pub async fn execute(ctx: Context, args: LateralArgs) -> Result<()> {
    let hosts = resolve_hosts(&args)?;
    if hosts.is_empty() {
        anyhow::bail!(
            "No hosts to probe.\n\n\
             Provide one of:\n  \
             --hosts dc01,ws02\n  \
             --hosts-file hosts.txt\n  \
             --computers computers.csv"
        );
    }

    let outcome = sweep(&ctx, &args, &hosts).await;
    output::print_reachability(&outcome.results, outcome.cancelled, ctx.output_format)?;

    if let Some(sink) = ctx.report_sink()? {
        sink.write_reachability(&outcome.results)?;
        sink.write_summary(&Summary {
            lateral: Some(LateralSummary::new(&outcome.results, outcome.cancelled)),
            ..Summary::new()
        })?;
        ctx.announce_report(&sink);
    }

    if outcome.cancelled && ctx.output_format == output::OutputFormat::Pretty {
        println!("{}", "Sweep was interrupted.".yellow());
    }
    Ok(())
}

/// Host list from the command-line sources.
pub fn resolve_hosts(args: &LateralArgs) -> Result<Vec<String>> {
    hosts::resolve(
        args.hosts.hosts.as_deref(),
        args.hosts.hosts_file.as_deref(),
        args.hosts.computers.as_deref(),
    )
}

/// Probe configuration: config file values overridden by flags.
pub fn probe_config(ctx: &Context, args: &LateralArgs) -> ProbeConfig {
    let mut config = ctx.config.probe.to_probe_config();
    if let Some(concurrency) = args.concurrency {
        config = config.concurrency(concurrency);
    }
    if let Some(ms) = args.ping_timeout_ms {
        config = config.ping_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.timeout_ms {
        config = config.step_timeout(Duration::from_millis(ms));
    }
    if let Some(share) = &args.admin_share {
        config = config.admin_share(share.clone());
    }
    config
}

/// Run the sweep, stopping early on Ctrl-C.
pub async fn sweep(ctx: &Context, args: &LateralArgs, hosts: &[String]) -> SweepOutcome {
    let config = probe_config(ctx, args);
    let checks = Arc::new(NetworkChecks::from_config(&config));
    let sweep = Sweep::new(checks, config);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, abandoning unfinished hosts");
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = sweep.probe_all_until(hosts, cancel_rx).await;
    interrupt.abort();

    info!(
        hosts = outcome.results.len(),
        cancelled = outcome.cancelled,
        "reachability sweep complete"
    );
    outcome
}
