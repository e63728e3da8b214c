//! `posturescan privesc` - local privilege-escalation detection.

use anyhow::{Context as _, Result};
use posture_privesc::adapters::{SnapshotSource, SystemSources};
use posture_privesc::{DetectionReport, Detector, PrincipalMatcher};
use std::sync::Arc;
use tracing::info;

use super::Context;
use crate::cli::args::PrivescArgs;
use crate::output;
use crate::report::{PrivescSummary, Summary};

pub async fn execute(ctx: Context, args: PrivescArgs) -> Result<()> {
    let report = detect(&ctx, &args).await?;
    output::print_detection(&report, ctx.output_format)?;

    if let Some(sink) = ctx.report_sink()? {
        sink.write_detection(&report)?;
        sink.write_summary(&Summary {
            privesc: Some(PrivescSummary::from(&report)),
            ..Summary::new()
        })?;
        ctx.announce_report(&sink);
    }

    Ok(())
}

/// Build the detector from the snapshot or live sources and run it.
pub async fn detect(ctx: &Context, args: &PrivescArgs) -> Result<DetectionReport> {
    let settings = &ctx.config.privesc;
    let principals = if args.principals.is_empty() {
        settings.principals()
    } else {
        PrincipalMatcher::new(&args.principals)
    };

    let detector = match &args.snapshot {
        Some(path) => {
            let snapshot = SnapshotSource::load(path)
                .await
                .with_context(|| format!("loading snapshot {}", path.display()))?;
            info!(
                snapshot = %path.display(),
                host = snapshot.host.as_deref().unwrap_or("unknown"),
                "evaluating snapshot"
            );
            Detector::from_sources(Arc::new(snapshot))
        }
        None => {
            info!("evaluating local system");
            Detector::from_sources(Arc::new(SystemSources::with_timeout(
                settings.command_timeout(),
            )))
        }
    };

    let report = detector
        .principals(principals)
        .concurrency(settings.acl_concurrency.max(1))
        .run()
        .await?;

    Ok(report)
}
