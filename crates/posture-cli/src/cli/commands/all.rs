//! `posturescan all` - detector and reachability sweep in one run.

use anyhow::Result;
use tracing::warn;

use super::{lateral, privesc, Context};
use crate::cli::args::AllArgs;
use crate::output::{self, CombinedView, OutputFormat};
use crate::report::{LateralSummary, PrivescSummary, Summary};

pub async fn execute(ctx: Context, args: AllArgs) -> Result<()> {
    let hosts = lateral::resolve_hosts(&args.lateral)?;
    // Machine formats are printed once at the end as a single document
    let streaming = matches!(ctx.output_format, OutputFormat::Pretty | OutputFormat::Csv);

    let report = privesc::detect(&ctx, &args.privesc).await?;
    if streaming {
        output::print_detection(&report, ctx.output_format)?;
    }

    let outcome = if hosts.is_empty() {
        warn!("no hosts given, skipping lateral-movement sweep");
        None
    } else {
        let outcome = lateral::sweep(&ctx, &args.lateral, &hosts).await;
        if streaming {
            println!();
            output::print_reachability(&outcome.results, outcome.cancelled, ctx.output_format)?;
        }
        Some(outcome)
    };

    if !streaming {
        let view = CombinedView::new(
            &report,
            outcome.as_ref().map(|o| (o.results.as_slice(), o.cancelled)),
        );
        output::print_combined(&view, ctx.output_format)?;
    }

    if let Some(sink) = ctx.report_sink()? {
        sink.write_detection(&report)?;
        if let Some(outcome) = &outcome {
            sink.write_reachability(&outcome.results)?;
        }
        sink.write_summary(&Summary {
            privesc: Some(PrivescSummary::from(&report)),
            lateral: outcome
                .as_ref()
                .map(|o| LateralSummary::new(&o.results, o.cancelled)),
            ..Summary::new()
        })?;
        ctx.announce_report(&sink);
    }

    Ok(())
}
