//! Run orchestration: resolve, provision, copy in, supervise, sync back.
//!
//! A run is a strictly forward walk through [`Phase`]. Each step either
//! advances to the next phase or fails the run with an [`Outcome`] whose
//! kind is fixed at the point of detection. Sync-back happens only after
//! the session watch fires, and at most once per run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ramstage_core::{plan::resolve_plan_at, Outcome, Phase, Settings, StagingPlan};
use ramstage_sync::{copy_in, sync_back, ReconciliationResult};

use crate::error::{io_err, SessionError};
use crate::presenter::{spawn_presentation, EventSender, Presenter};
use crate::session::{self, WatchRegistry};
use crate::volume;

/// Mutable state of one run.
pub struct RunContext {
    pub settings: Settings,
    pub home: PathBuf,
    plan: Option<StagingPlan>,
    phase: Phase,
    events: EventSender,
    watches: WatchRegistry,
}

impl RunContext {
    pub fn new(settings: Settings, home: PathBuf, events: EventSender) -> Self {
        Self {
            settings,
            home,
            plan: None,
            phase: Phase::Idle,
            events,
            watches: WatchRegistry::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The plan fixed during `Resolving`; `None` before that.
    pub fn plan(&self) -> Option<&StagingPlan> {
        self.plan.as_ref()
    }

    /// Move to `to`, announcing it to the presentation task.
    pub fn advance(&mut self, to: Phase) -> Result<(), SessionError> {
        if !self.phase.can_advance_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!(from = %self.phase, %to, "phase transition");
        self.phase = to;
        self.events.phase(to);
        Ok(())
    }
}

/// Build a runtime and drive one full run to its outcome.
pub fn start_blocking(
    settings: Settings,
    home: &Path,
    presenter: Arc<dyn Presenter>,
) -> Result<Outcome, SessionError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    Ok(runtime.block_on(run(settings, home.to_path_buf(), presenter)))
}

/// Drive one run. Every failure is folded into the returned [`Outcome`].
pub async fn run(settings: Settings, home: PathBuf, presenter: Arc<dyn Presenter>) -> Outcome {
    let (events, presentation) = spawn_presentation(presenter);
    let mut ctx = RunContext::new(settings, home, events.clone());

    let outcome = match drive(&mut ctx).await {
        Ok(result) => Outcome::completed(format!(
            "profile synced back to {}",
            result.destination.display()
        )),
        Err(err) => {
            let failed_in = ctx.phase();
            let outcome = Outcome::new(err.outcome_kind(failed_in), err.detail());
            tracing::error!(
                phase = %failed_in,
                kind = %outcome.kind,
                error = %err,
                "run failed",
            );
            if let Err(err) = ctx.advance(Phase::Failed) {
                tracing::warn!(error = %err, "could not mark run as failed");
            }
            outcome
        }
    };

    events.outcome(outcome.clone());
    drop(ctx);
    drop(events);
    if let Err(err) = presentation.await {
        tracing::warn!(error = %err, "presentation task join failure");
    }
    outcome
}

async fn drive(ctx: &mut RunContext) -> Result<ReconciliationResult, SessionError> {
    ctx.advance(Phase::Resolving)?;
    let plan = resolve_plan(&ctx.settings, &ctx.home).await?;
    tracing::info!(
        source = %plan.source_path.display(),
        size_bytes = plan.source_size_bytes,
        capacity_mb = plan.capacity_mb(),
        mount_point = %plan.mount_point.display(),
        "staging plan ready",
    );
    ctx.plan = Some(plan.clone());

    ctx.advance(Phase::Provisioning)?;
    volume::ensure(&ctx.settings.tools, &ctx.settings.filesystem, &plan).await?;

    ctx.advance(Phase::CopyingIn)?;
    let staged = plan.staged_path();
    let summary = copy_in(
        &ctx.settings.tools.rsync,
        &plan.source_path,
        &staged,
        plan.source_size_bytes,
        &ctx.events,
    )
    .await?;
    tracing::info!(
        total_bytes = summary.total_bytes,
        reported_bytes = summary.reported_bytes,
        "profile staged",
    );

    let session = session::launch(
        &ctx.settings.app_path,
        &ctx.settings.profile_flag,
        &staged,
        &ctx.watches,
    )?;
    ctx.advance(Phase::SessionActive)?;

    let pid = session.pid;
    let exit = session.wait().await;
    if exit.is_clean() {
        tracing::info!(pid, %exit, "session ended");
    } else {
        tracing::warn!(pid, %exit, "session ended abnormally; syncing back anyway");
    }

    ctx.advance(Phase::SyncingBack)?;
    let result = sync_back(
        &ctx.settings.tools.rsync,
        &staged,
        &plan.source_path,
        &ctx.settings.excludes,
    )
    .await?;

    ctx.advance(Phase::Completed)?;
    Ok(result)
}

/// Resolve and size the profile off the async workers.
pub async fn resolve_plan(settings: &Settings, home: &Path) -> Result<StagingPlan, SessionError> {
    let settings = settings.clone();
    let home = home.to_path_buf();
    tokio::task::spawn_blocking(move || resolve_plan_at(&settings, &home))
        .await
        .map_err(|_| SessionError::ChannelClosed("profile resolution task"))?
        .map_err(SessionError::from)
}

/// Reconcile a staged copy left behind by an interrupted run.
pub async fn recover(
    settings: &Settings,
    plan: &StagingPlan,
) -> Result<ReconciliationResult, SessionError> {
    let staged = plan.staged_path();
    tracing::info!(
        staged = %staged.display(),
        original = %plan.source_path.display(),
        "manual sync-back",
    );
    Ok(sync_back(&settings.tools.rsync, &staged, &plan.source_path, &settings.excludes).await?)
}

/// Blocking wrapper around [`recover`].
pub fn recover_blocking(
    settings: &Settings,
    plan: &StagingPlan,
) -> Result<ReconciliationResult, SessionError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(recover(settings, plan))
}
