// ABOUTME: The end-to-end backup state machine: wake, wait, trigger, monitor, shutdown
// ABOUTME: Owns every timing budget; each step blocks before the next begins

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, TimeZone};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::remote::{ReplicationTask, SystemApi, TaskStatus};
use crate::wol::WakeSignal;

use super::outcome::RunOutcome;

/// Timing policy for one run. Every field comes from configuration; nothing
/// here is hardcoded into the steps below.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Pause between sending the wake packet and the first readiness probe.
    pub warmup_delay: Duration,
    /// Interval between destination readiness probes.
    pub ready_poll_interval: Duration,
    /// Budget for the destination to become ready after the wake signal.
    pub ready_timeout: Duration,
    /// Interval between replication status observation rounds.
    pub monitor_interval: Duration,
    /// Budget for all triggered tasks to reach a terminal state.
    pub monitor_timeout: Duration,
}

/// Drives one backup run start to finish and returns its terminal outcome.
///
/// Steps run strictly in sequence; the first failing step short-circuits
/// with its outcome, and remote side effects already issued stay in place.
pub async fn run_backup<S, D, W>(
    source: &S,
    destination: &D,
    wake: &W,
    task_names: &[String],
    timing: &Timing,
) -> RunOutcome
where
    S: SystemApi,
    D: SystemApi,
    W: WakeSignal,
{
    if !source.is_system_ready().await {
        return RunOutcome::source_not_ready();
    }
    info!("source system ready");

    let tasks = match source.list_replication_tasks(task_names).await {
        Ok(tasks) => tasks,
        Err(err) => return RunOutcome::discovery_failed(&err),
    };

    if let Err(err) = wake.send_wake().await {
        return RunOutcome::wake_failed(&err);
    }
    info!(delay = ?timing.warmup_delay, "waiting for destination to boot");
    sleep(timing.warmup_delay).await;

    if !wait_for_destination(destination, timing).await {
        return RunOutcome::wake_timeout(timing.ready_timeout);
    }
    info!("destination system ready");

    let triggered = trigger_tasks(source, &tasks).await;
    let (status_lines, all_finished) = monitor_tasks(source, &triggered, timing).await;

    if !all_finished {
        warn!(
            total = triggered.len(),
            finished = status_lines.len(),
            "monitoring budget exhausted with unfinished tasks"
        );
        return RunOutcome::monitor_timeout(&status_lines);
    }

    match destination.shutdown_system().await {
        Ok(()) => RunOutcome::success(&status_lines),
        Err(err) => {
            warn!(error = %err, "destination shutdown request failed");
            RunOutcome::shutdown_failed(&status_lines)
        }
    }
}

/// Polls destination readiness until it answers or the budget runs out.
/// Failed probes are not fatal; only elapsed time is.
async fn wait_for_destination<D: SystemApi>(destination: &D, timing: &Timing) -> bool {
    let deadline = Instant::now() + timing.ready_timeout;
    while !destination.is_system_ready().await {
        if Instant::now() >= deadline {
            return false;
        }
        debug!(retry_in = ?timing.ready_poll_interval, "destination boot not ready");
        sleep(timing.ready_poll_interval).await;
    }
    true
}

/// Triggers every discovered task that is not already in flight.
///
/// The returned id list is final: a task whose trigger call failed stays in
/// it and is expected to surface through the monitoring timeout.
async fn trigger_tasks<S: SystemApi>(source: &S, discovered: &[ReplicationTask]) -> Vec<i64> {
    let mut triggered = Vec::new();
    for task in discovered {
        if task.last_state().is_in_flight() {
            info!(name = %task.name, "replication task already running or pending, skipped");
            continue;
        }
        info!(id = task.id, name = %task.name, "triggering replication task");
        triggered.push(task.id);
        if let Err(err) = source.trigger_replication_task(task.id).await {
            warn!(id = task.id, error = %err, "trigger request failed");
        }
    }
    triggered
}

/// Polls the triggered tasks until every one reaches a terminal state or the
/// monitoring budget runs out. Returns the collected status lines and
/// whether all tasks finished.
async fn monitor_tasks<S: SystemApi>(
    source: &S,
    triggered: &[i64],
    timing: &Timing,
) -> (Vec<String>, bool) {
    if triggered.is_empty() {
        info!("no replication tasks to monitor");
        return (Vec::new(), true);
    }

    // One interval of grace so the backend moves freshly triggered tasks out
    // of their previous state before the first observation.
    sleep(timing.monitor_interval).await;

    let deadline = Instant::now() + timing.monitor_timeout;
    let mut finished: HashSet<i64> = HashSet::new();
    let mut status_lines = Vec::new();

    loop {
        for &id in triggered {
            if finished.contains(&id) {
                continue;
            }
            let Some(task) = source.get_replication_task(id).await else {
                debug!(id, "task status not available yet");
                continue;
            };
            let Some(status) = task.state.as_ref() else {
                continue;
            };
            if status.state.is_terminal() {
                finished.insert(id);
                let line = status_line(&task.name, status);
                info!("{}", line);
                status_lines.push(line);
            }
        }

        info!(
            total = triggered.len(),
            finished = finished.len(),
            "monitoring replication tasks"
        );

        if finished.len() == triggered.len() {
            return (status_lines, true);
        }
        if Instant::now() >= deadline {
            return (status_lines, false);
        }
        sleep(timing.monitor_interval).await;
    }
}

/// Human-readable terminal-state line, e.g.
/// `Task tank_nightly: state=FINISHED, time=2024-11-02T03:10:05Z`.
///
/// The timestamp comes from the task's state-change field when the API
/// provided one, else from the local clock at observation time.
fn status_line(name: &str, status: &TaskStatus) -> String {
    let time = status
        .datetime
        .and_then(|d| Local.timestamp_millis_opt(d.millis).single())
        .unwrap_or_else(Local::now);
    format!(
        "Task {}: state={}, time={}",
        name,
        status.state,
        time.format("%FT%XZ")
    )
}
