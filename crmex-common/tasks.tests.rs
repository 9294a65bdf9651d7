use super::*;

#[test]
fn wait_for_finished_task_test() {
    let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(1).build().unwrap();
    let task = runtime.spawn(async { 42 });

    wait_for_task(Some(task), "answer");
}

#[test]
fn wait_aborts_hanging_task_test() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .unwrap();
    let task = runtime.spawn(async { tokio::time::sleep(Duration::from_secs(60)).await });
    let probe = task.abort_handle();

    wait_for_task(Some(task), "sleeper");

    assert!(probe.is_finished());
}

#[test]
fn wait_for_nothing_test() {
    wait_for_task::<()>(None, "none");
}
