use std::time::Duration;
use tokio::task::JoinHandle;

#[cfg(test)]
#[path = "./tasks.tests.rs"]
mod tasks_tests;

/// Synchronously waits for task to end (e.g. after cancellation).\
/// **Note** that it must not be called from within the async runtime worker thread.
pub fn wait_for_task<T>(task: Option<JoinHandle<T>>, task_name: &str) {
    let Some(task) = task else {
        return;
    };

    let mut counter = 0;
    while !task.is_finished() {
        std::thread::sleep(Duration::from_millis(1));

        counter += 1;

        if counter == 500 {
            tracing::warn!("Task {task_name} did not finish in 500 milliseconds, aborting it.");
            task.abort();
        }

        if counter > 1_000 {
            tracing::error!("Failed to abort {task_name} task in 1 second for an unknown reason.");
            break;
        }
    }
}
