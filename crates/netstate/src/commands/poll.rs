//! `netstate poll`: snapshot every target and render the results.

use owo_colors::OwoColorize;

use netstate_core::poll_all;

use crate::cli::{GlobalOpts, PollArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: PollArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let plan = config::build_poll_plan(&args.targets, global, cfg)?;
    let format = config::output_format(global, cfg);
    let total = plan.devices.len();

    tracing::debug!(targets = total, concurrency = plan.concurrency, "polling");
    let outcomes = poll_all(plan.devices, plan.concurrency).await;

    let snapshots: Vec<_> = outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect();
    let color = output::should_color(global.color);
    output::print_output(&output::render_snapshots(format, &snapshots, color)?, global.quiet);

    let mut failures = Vec::new();
    for outcome in outcomes {
        if let Err(err) = outcome.result {
            if color {
                eprintln!("{} {}: {err}", "error:".red().bold(), outcome.target);
            } else {
                eprintln!("error: {}: {err}", outcome.target);
            }
            failures.push(err);
        }
    }

    match failures.len() {
        0 => Ok(()),
        // Nothing succeeded: report the first failure with its own exit code.
        n if n == total => Err(CliError::from(failures.swap_remove(0))),
        failed => Err(CliError::PartialFailure { failed, total }),
    }
}
