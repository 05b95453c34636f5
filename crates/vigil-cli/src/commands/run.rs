use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vigil_core::clock::{Clock, SystemClock};
use vigil_monitor::{Monitor, MonitorStateStore};
use vigil_vcs::{ChangeDetector, GitSource};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `vigil run`.
pub async fn handle(args: &RunArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let repo_path = ctx.repo_path();
    let source = GitSource::discover(&repo_path)
        .with_context(|| format!("cannot watch {}", repo_path.display()))?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let detector = ChangeDetector::new(Arc::new(source), Arc::clone(&clock));
    let mut monitor = Monitor::new(
        Arc::clone(&ctx.queue),
        detector,
        clock,
        &ctx.config.monitor,
    );
    if ctx.config.monitor.persist_state {
        let state_path = ctx.config.queue.state_path(&ctx.project_root);
        monitor = monitor.with_state_store(MonitorStateStore::new(state_path))?;
    }

    if args.once {
        let report = monitor.tick()?;
        return output(&report, flags.format);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing current tick");
            on_signal.cancel();
        }
    });

    info!(repo = %repo_path.display(), "watching repository");
    monitor.run(cancel).await?;
    Ok(())
}
