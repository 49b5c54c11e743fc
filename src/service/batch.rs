use futures::future::join_all;
use std::future::Future;

/// Drive every operation to completion, then succeed only if all succeeded.
///
/// Unlike `try_join_all`, a failure does not drop the operations still in
/// flight: each one runs to its end, and side effects of the ones that
/// succeeded are kept. The first error in input order is returned.
pub async fn settle_all<I, F, T, E>(operations: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    join_all(operations).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn every_operation_runs_even_after_a_failure() {
        let completed = AtomicUsize::new(0);
        let ops = (0..5).map(|i| {
            let completed = &completed;
            async move {
                tokio::task::yield_now().await;
                completed.fetch_add(1, Ordering::SeqCst);
                if i == 1 { Err(format!("op {i} failed")) } else { Ok(i) }
            }
        });

        let result = settle_all(ops).await;

        assert_eq!(result, Err("op 1 failed".to_string()));
        assert_eq!(completed.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn success_keeps_input_order() {
        let ops = (0..4).map(|i| async move { Ok::<_, ()>(i * 10) });
        assert_eq!(settle_all(ops).await, Ok(vec![0, 10, 20, 30]));
    }

    #[tokio::test]
    async fn empty_batch_succeeds() {
        let ops: Vec<std::future::Ready<Result<u8, ()>>> = Vec::new();
        assert_eq!(settle_all(ops).await, Ok(Vec::new()));
    }
}
