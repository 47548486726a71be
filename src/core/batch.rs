use futures::{StreamExt, TryStreamExt, stream};
use std::future::Future;

/// Runs `op` over every item with at most `fanout` operations in flight.
///
/// No ordering across items. Returns after every operation finished, or with the
/// first error.
pub async fn run_batch<I, F, Fut, T, E>(items: I, fanout: usize, op: F) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    stream::iter(items)
        .map(op)
        .buffer_unordered(fanout.max(1))
        .try_collect()
        .await
}
