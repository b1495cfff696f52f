use std::io::{self, Write};

use anyhow::{Context, anyhow};
use taskforge_shared::TaskDto;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::api::TaskApi;
use crate::cli::Command;
use crate::dashboard::{Dashboard, DashboardState, SubmitOutcome};
use crate::error::format_error;
use crate::render::Renderer;

#[tracing::instrument(skip(api, renderer))]
pub async fn dispatch<A: TaskApi>(
    api: A,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match command {
        Command::Show => show(api, renderer, &mut out).await,
        Command::Stats => stats(api, renderer, &mut out).await,
        Command::Add { done, title } => {
            let title = title.join(" ");
            add(api, renderer, &mut out, &title, done).await.map(|task| {
                info!(id = task.id, "added task");
            })
        }
        Command::Interactive => {
            let input = BufReader::new(tokio::io::stdin());
            interactive(api, renderer, input, io::stdout()).await.map(|state| {
                debug!(tasks = state.tasks.len(), "interactive session ended");
            })
        }
    }
}

async fn load<A: TaskApi>(api: A) -> (Dashboard<A>, DashboardState) {
    let mut dashboard = Dashboard::new(api);
    dashboard.mount();
    let state = dashboard.wait_until_loaded().await;
    (dashboard, state)
}

fn fail_on_load_error(state: &DashboardState) -> anyhow::Result<()> {
    match &state.load_error {
        Some(err) => Err(anyhow!(format_error(Some(err)))),
        None => Ok(()),
    }
}

pub async fn show<A: TaskApi, W: Write>(
    api: A,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    let (mut dashboard, state) = load(api).await;
    dashboard.teardown();

    renderer.print_dashboard(&mut *out, &state)?;
    fail_on_load_error(&state)
}

pub async fn stats<A: TaskApi, W: Write>(
    api: A,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    let (mut dashboard, state) = load(api).await;
    dashboard.teardown();

    fail_on_load_error(&state)?;
    renderer.print_stats(&mut *out, state.stats())
}

pub async fn add<A: TaskApi, W: Write>(
    api: A,
    renderer: &Renderer,
    out: &mut W,
    title: &str,
    done: bool,
) -> anyhow::Result<TaskDto> {
    let (mut dashboard, loaded) = load(api).await;
    if let Some(err) = &loaded.load_error {
        warn!(error = %err, "task list unavailable; submitting anyway");
    }

    dashboard.set_title(title);
    dashboard.set_completed(done);
    let outcome = dashboard.submit().await;
    let state = dashboard.snapshot();
    dashboard.teardown();

    renderer.print_dashboard(&mut *out, &state)?;
    match outcome {
        SubmitOutcome::Created(task) => Ok(task),
        SubmitOutcome::Invalid(err) | SubmitOutcome::Failed(err) => {
            Err(anyhow!(format_error(Some(&err))))
        }
        SubmitOutcome::Busy => Err(anyhow!("a submission is already in progress")),
        SubmitOutcome::Discarded => Err(anyhow!("dashboard closed before the task was saved")),
    }
}

/// Line-oriented session: each line is submitted as a title, `/done`
/// toggles the completion flag and `/quit` ends the session. The dashboard
/// is written to `out` on every state change.
pub async fn interactive<A, R, W>(
    api: A,
    renderer: &Renderer,
    input: R,
    out: W,
) -> anyhow::Result<DashboardState>
where
    A: TaskApi,
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let mut dashboard = Dashboard::new(api);

    let mut changes = dashboard.subscribe();
    let closed = dashboard.cancel_token();
    let painter = renderer.clone();
    let repaint = tokio::spawn(async move {
        let mut out = out;
        loop {
            let state = changes.borrow_and_update().clone();
            if let Err(err) = painter.print_dashboard(&mut out, &state) {
                warn!(error = %err, "failed to render dashboard");
                break;
            }
            // Pending changes are painted before the close is noticed.
            tokio::select! {
                biased;
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = closed.cancelled() => break,
            }
        }
    });

    dashboard.mount();
    let loaded = dashboard.wait_until_loaded().await;
    if let Some(err) = &loaded.load_error {
        warn!(error = %err, "task list unavailable; new tasks will still be submitted");
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/done" => {
                let completed = !dashboard.snapshot().form.completed;
                dashboard.set_completed(completed);
            }
            _ => {
                dashboard.set_title(line.as_str());
                let outcome = dashboard.submit().await;
                debug!(?outcome, "submission finished");
            }
        }
    }

    let state = dashboard.snapshot();
    dashboard.teardown();
    repaint.await.context("dashboard repaint task failed")?;
    Ok(state)
}
