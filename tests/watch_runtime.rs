// tests/watch_runtime.rs

mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use assetflow::engine::{
    CoreCommand, RuntimeEvent, TaskOutcome, TriggerQueue, TriggerReason, WatchCore, WatchRuntime,
};
use assetflow::types::TriggerWhileRunningBehaviour;
use assetflow_test_utils::FakeBackend;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

fn trigger(binding: &str) -> RuntimeEvent {
    RuntimeEvent::Triggered {
        binding: binding.to_string(),
        reason: TriggerReason::FileWatch,
    }
}

fn start(bindings: &[&str]) -> CoreCommand {
    CoreCommand::StartRun(bindings.iter().map(|b| b.to_string()).collect())
}

#[test]
fn idle_core_starts_immediately() {
    let mut core = WatchCore::new(TriggerWhileRunningBehaviour::Queue, 1);
    let step = core.step(trigger("less"));
    assert_eq!(step.commands, vec![start(&["less"])]);
    assert!(step.keep_running);
    assert!(core.is_running());
}

#[test]
fn queue_mode_coalesces_triggers_into_one_follow_up_run() {
    let mut core = WatchCore::new(TriggerWhileRunningBehaviour::Queue, 1);
    core.step(trigger("less"));

    assert!(core.step(trigger("scripts")).commands.is_empty());
    assert!(core.step(trigger("less")).commands.is_empty());
    assert!(core.step(trigger("scripts")).commands.is_empty());

    let next = core.on_run_finished(TaskOutcome::Succeeded);
    assert_eq!(next.commands, vec![start(&["less", "scripts"])]);

    let done = core.on_run_finished(TaskOutcome::Succeeded);
    assert!(done.commands.is_empty());
    assert!(!core.is_running());
    assert!(core.queue_is_empty());
}

#[test]
fn queue_length_bounds_separate_follow_up_runs() {
    let follow_ups = |queue_length: usize| {
        let mut core = WatchCore::new(TriggerWhileRunningBehaviour::Queue, queue_length);
        core.step(trigger("less"));
        for binding in ["scripts", "less", "scripts", "styles"] {
            assert!(core.step(trigger(binding)).commands.is_empty());
        }

        let mut runs = Vec::new();
        while let [CoreCommand::StartRun(bindings)] =
            core.on_run_finished(TaskOutcome::Succeeded).commands.as_slice()
        {
            runs.push(bindings.clone());
        }
        runs
    };

    assert_eq!(follow_ups(1), vec![vec!["less", "scripts", "styles"]]);
    assert_eq!(follow_ups(2), vec![vec!["scripts"], vec!["less", "styles"]]);
    assert_eq!(
        follow_ups(5),
        vec![vec!["scripts"], vec!["less"], vec!["styles"]]
    );
}

#[test]
fn cancel_mode_cancels_once_and_reruns_the_cancelled_bindings() {
    let mut core = WatchCore::new(TriggerWhileRunningBehaviour::Cancel, 1);
    core.step(trigger("less"));

    assert_eq!(core.step(trigger("scripts")).commands, vec![CoreCommand::CancelRun]);
    // Already cancelling.
    assert!(core.step(trigger("scripts")).commands.is_empty());

    let next = core.on_run_finished(TaskOutcome::Cancelled);
    assert_eq!(next.commands, vec![start(&["less", "scripts"])]);
}

#[test]
fn failed_runs_do_not_block_later_triggers() {
    let mut core = WatchCore::new(TriggerWhileRunningBehaviour::Queue, 1);
    core.step(trigger("less"));
    assert!(core.on_run_finished(TaskOutcome::Failed).commands.is_empty());

    let step = core.step(trigger("less"));
    assert_eq!(step.commands, vec![start(&["less"])]);
}

#[test]
fn shutdown_cancels_an_active_run() {
    let mut core = WatchCore::new(TriggerWhileRunningBehaviour::Queue, 1);
    let idle = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!idle.keep_running);
    assert!(idle.commands.is_empty());

    core.step(trigger("scripts"));
    let busy = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!busy.keep_running);
    assert_eq!(busy.commands, vec![CoreCommand::CancelRun]);
}

#[test]
fn trigger_queue_drains_sorted_and_deduplicated() {
    let mut queue = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 0);
    queue.record_trigger("scripts");
    queue.record_trigger("less");
    queue.record_trigger("scripts");
    assert!(!queue.is_empty());
    assert_eq!(queue.drain_pending(), vec!["less", "scripts"]);
    assert!(queue.is_empty());
    assert!(queue.drain_pending().is_empty());
}

#[test]
fn trigger_queue_hands_out_one_batch_at_a_time() {
    let mut queue = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 2);
    queue.record_trigger("scripts");
    queue.record_trigger("less");
    queue.record_trigger("scripts");
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.drain_pending(), vec!["scripts"]);
    assert_eq!(queue.drain_pending(), vec!["less"]);
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn runtime_queues_triggers_behind_the_active_run() -> TestResult {
    init_tracing();
    let backend = FakeBackend::new(Duration::from_millis(100));
    let (tx, rx) = mpsc::channel(16);
    let core = WatchCore::new(TriggerWhileRunningBehaviour::Queue, 1);
    let runtime = WatchRuntime::new(core, rx, backend.clone(), CancellationToken::new());
    let handle = tokio::spawn(runtime.run());

    tx.send(trigger("less")).await?;
    sleep(Duration::from_millis(10)).await;
    tx.send(trigger("scripts")).await?;
    sleep(Duration::from_millis(10)).await;
    tx.send(trigger("less")).await?;
    drop(tx);

    with_timeout(handle).await??;

    assert_eq!(
        backend.launches(),
        vec![vec!["less".to_string()], vec!["less".to_string(), "scripts".to_string()]]
    );
    assert_eq!(backend.outcomes(), vec![TaskOutcome::Succeeded, TaskOutcome::Succeeded]);
    assert_eq!(backend.max_active(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn runtime_in_cancel_mode_restarts_with_everything_stale() -> TestResult {
    let backend = FakeBackend::new(Duration::from_millis(100));
    let (tx, rx) = mpsc::channel(16);
    let core = WatchCore::new(TriggerWhileRunningBehaviour::Cancel, 1);
    let runtime = WatchRuntime::new(core, rx, backend.clone(), CancellationToken::new());
    let handle = tokio::spawn(runtime.run());

    tx.send(trigger("less")).await?;
    sleep(Duration::from_millis(10)).await;
    tx.send(trigger("scripts")).await?;
    drop(tx);

    with_timeout(handle).await??;

    assert_eq!(
        backend.launches(),
        vec![vec!["less".to_string()], vec!["less".to_string(), "scripts".to_string()]]
    );
    assert_eq!(backend.outcomes(), vec![TaskOutcome::Cancelled, TaskOutcome::Succeeded]);
    assert_eq!(backend.max_active(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_token_cancels_the_active_run_and_exits() -> TestResult {
    let backend = FakeBackend::new(Duration::from_secs(60));
    let (tx, rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let core = WatchCore::new(TriggerWhileRunningBehaviour::Queue, 1);
    let runtime = WatchRuntime::new(core, rx, backend.clone(), shutdown.clone());
    let handle = tokio::spawn(runtime.run());

    tx.send(trigger("scripts")).await?;
    sleep(Duration::from_millis(10)).await;
    shutdown.cancel();

    with_timeout(handle).await??;
    assert_eq!(backend.outcomes(), vec![TaskOutcome::Cancelled]);
    Ok(())
}
