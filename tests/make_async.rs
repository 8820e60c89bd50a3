mod common;

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use asyncflow::{AsyncFn, Completion, Fault, from_callback, make_async, map, parallel};
use common::TokioTimer;

#[derive(Debug, Clone, PartialEq)]
struct DiskError {
    code: i32,
    path: &'static str,
}

#[tokio::test]
async fn error_passes_through_unchanged() {
    let read = AsyncFn::new(|_: Option<()>| {
        Err::<String, _>(DiskError {
            code: 2,
            path: "text_for_test1.txt",
        })
    });

    let fault = read.call().await.expect_err("function returned an error");
    assert!(!fault.is_panic());
    assert_eq!(fault.as_failure().map(|e| e.code), Some(2));

    match fault {
        Fault::Failed(error) => assert_eq!(
            error,
            DiskError {
                code: 2,
                path: "text_for_test1.txt"
            },
            "Error should arrive as produced"
        ),
        other => panic!("Unexpected fault: {other:?}"),
    }
}

#[tokio::test]
async fn panic_is_reported_as_fault() {
    let explode = AsyncFn::new(|input: Option<u8>| -> Result<u8, String> {
        if input == Some(0) {
            panic!("division by zero");
        }
        Ok(input.unwrap_or(1))
    });

    let fault = explode
        .call_with(0)
        .await
        .expect_err("panic should be caught");
    assert!(fault.is_panic(), "Fault should be a panic");
    match &fault {
        Fault::Panicked(panic) => assert_eq!(panic.message(), Some("division by zero")),
        other => panic!("Unexpected fault: {other:?}"),
    }
    assert_eq!(fault.to_string(), "task panicked: division by zero");
    assert!(fault.as_failure().is_none(), "A panic carries no error value");

    let Fault::Panicked(panic) = fault else {
        unreachable!("checked above");
    };
    let payload = panic.into_payload();
    assert_eq!(
        payload.downcast_ref::<&str>(),
        Some(&"division by zero"),
        "Payload should be the value passed to panic!"
    );

    assert_eq!(
        explode.call_with(4).await.ok(),
        Some(4),
        "Adapter should stay usable after a panic"
    );
}

#[tokio::test(start_paused = true)]
async fn completes_after_delay_not_before() {
    let done = Arc::new(AtomicBool::new(false));
    let done_cl = Arc::clone(&done);
    let slow = make_async(|_: Option<()>| Ok::<_, ()>("ready"), Duration::from_millis(10))
        .with_timer(TokioTimer);
    assert_eq!(slow.delay(), Duration::from_millis(10));

    let handle = tokio::spawn(async move {
        let r = slow.call().await;
        done_cl.store(true, Ordering::SeqCst);
        r
    });

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(
        !done.load(Ordering::SeqCst),
        "Task should not complete before its delay"
    );

    let waited_from = tokio::time::Instant::now();
    let r = handle.await.unwrap();
    assert!(done.load(Ordering::SeqCst));
    assert!(
        waited_from.elapsed() <= Duration::from_millis(6),
        "Task should complete once its delay elapsed"
    );
    assert_eq!(r.ok(), Some("ready"));
}

#[tokio::test(start_paused = true)]
async fn invocations_are_independent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_cl = Arc::clone(&calls);
    let square = make_async(
        move |x: Option<u64>| {
            calls_cl.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(x.unwrap_or(0).pow(2))
        },
        Duration::from_millis(10),
    )
    .with_timer(TokioTimer);

    let start = tokio::time::Instant::now();
    let first = tokio::spawn(square.call_with(3));
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = tokio::spawn(square.clone().call_with(4));

    assert_eq!(first.await.unwrap().ok(), Some(9));
    let first_done = start.elapsed();
    assert_eq!(second.await.unwrap().ok(), Some(16));
    let second_done = start.elapsed();

    assert!(first_done < Duration::from_millis(15));
    assert!(
        second_done >= Duration::from_millis(15),
        "Each invocation should wait for its own delay"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn call_without_input_passes_none() {
    let describe = AsyncFn::new(|input: Option<&str>| {
        Ok::<_, ()>(match input {
            Some(text) => format!("got {text}"),
            None => "got nothing".to_string(),
        })
    });

    assert_eq!(describe.call().await.ok().as_deref(), Some("got nothing"));
    assert_eq!(
        describe.call_with("text").await.ok().as_deref(),
        Some("got text")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn default_timer_delays_on_any_runtime() {
    let delay = Duration::from_millis(30);
    let tick = make_async(|_: Option<()>| Ok::<_, ()>(1), delay);

    let start = std::time::Instant::now();
    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let tick = tick.clone();
            move || tick.call()
        })
        .collect();
    let mut result = None;
    parallel(tasks, |r| result = Some(r.ok())).await;

    assert_eq!(result, Some(Some(vec![1, 1, 1])));
    assert!(start.elapsed() >= delay, "Default timer should honour the delay");
}

#[test]
fn default_timer_keeps_short_delays_on_time() {
    let finished_at = Arc::new(Mutex::new(None));
    let start = Instant::now();

    // 120 slow inputs are queued ahead of a single fast one.
    let delays = (0..120).map(|_| 1000).chain([100u64]);
    let outcome = futures::executor::block_on(async {
        let mut result = None;
        map(
            delays,
            |ms| {
                let task = make_async(
                    move |_: Option<()>| Ok::<_, ()>(ms),
                    Duration::from_millis(ms),
                );
                let finished_at = Arc::clone(&finished_at);
                async move {
                    let outcome = task.call().await;
                    if ms == 100 {
                        *finished_at.lock().unwrap() = Some(start.elapsed());
                    }
                    outcome
                }
            },
            |r| result = Some(r.map(|values| values.len()).ok()),
        )
        .await;
        result
    });

    assert_eq!(outcome, Some(Some(121)));
    let short = finished_at
        .lock()
        .unwrap()
        .expect("fast task should have finished");
    assert!(short >= Duration::from_millis(100));
    assert!(
        short < Duration::from_millis(500),
        "Fast task should not wait behind slow ones, finished at {short:?}"
    );
}

#[tokio::test]
async fn callback_tasks_report_through_completion() {
    let ok = from_callback::<_, String>(|done: Completion<u32, String>| done.succeed(7)).await;
    assert_eq!(ok.ok(), Some(7));

    let failed = from_callback(|done: Completion<u32, String>| {
        std::thread::spawn(move || done.fail("disk full".to_string()));
    })
    .await;
    assert_eq!(
        failed.expect_err("should fail").into_failure().as_deref(),
        Some("disk full")
    );

    let abandoned = from_callback(|done: Completion<u32, String>| drop(done)).await;
    assert!(
        matches!(abandoned, Err(Fault::Abandoned)),
        "Dropped completion should abandon the task"
    );
}
