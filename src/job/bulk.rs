use futures_util::future::join_all;
use std::future::Future;
use tokio::sync::Semaphore;
use tracing::debug;

/// Run `tasks` concurrently, at most `limit` at a time, until all finish.
///
/// Results come back in the order the tasks were given.
pub async fn run_bounded<I, F, T>(limit: usize, tasks: I) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T>,
{
    let semaphore = Semaphore::new(limit.max(1));
    let semaphore = &semaphore;

    join_all(tasks.into_iter().enumerate().map(|(index, task)| async move {
        // never closed, so the permit is always granted
        let _permit = semaphore.acquire().await;
        debug!("Bulk task {} started", index);
        task.await
    }))
    .await
}
