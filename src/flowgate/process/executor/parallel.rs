// SPDX-License-Identifier: MIT

//! Parallel fan-out with gather semantics

use std::future::Future;

use crate::sdk::error::{ProcessError, Result};

/// Run labelled futures concurrently and return their results in submission order.
///
/// Every member is joined before this returns, even when an earlier one has
/// already failed; the first failure in submission order is then reported.
pub async fn run_all<T, F>(thunks: Vec<(String, F)>) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let handles: Vec<_> = thunks
        .into_iter()
        .map(|(label, fut)| (label, tokio::spawn(fut)))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    let mut first_error = None;

    for (label, handle) in handles {
        match handle.await {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(e)) => {
                log::error!("Parallel member {} failed: {}", label, e);
                first_error.get_or_insert(e);
            }
            Err(join_err) => {
                log::error!("Parallel member {} did not complete: {}", label, join_err);
                first_error.get_or_insert(ProcessError::Join {
                    step: label,
                    message: join_err.to_string(),
                });
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn delayed(label: &str, ms: u64) -> (String, impl Future<Output = Result<String>>) {
        let value = label.to_string();
        (label.to_string(), async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(value)
        })
    }

    #[tokio::test]
    async fn test_results_keep_submission_order() {
        let results = run_all(vec![
            delayed("thunk1", 30),
            delayed("thunk2", 10),
            delayed("thunk3", 20),
        ])
        .await
        .unwrap();

        assert_eq!(results, vec!["thunk1", "thunk2", "thunk3"]);
    }

    #[tokio::test]
    async fn test_members_run_concurrently() {
        let start = std::time::Instant::now();
        let thunks: Vec<_> = (0..4).map(|i| delayed(&format!("t{}", i), 100)).collect();
        run_all(thunks).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_empty_group() {
        let thunks: Vec<(String, std::future::Ready<Result<u8>>)> = vec![];
        assert!(run_all(thunks).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_in_submission_order_after_join() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut thunks = Vec::new();
        for (label, ms, fail) in [("a", 40, false), ("b", 20, true), ("c", 5, true)] {
            let finished = finished.clone();
            thunks.push((label.to_string(), async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(ProcessError::step_failed(label, "boom"))
                } else {
                    Ok(label)
                }
            }));
        }

        let err = run_all(thunks).await.unwrap_err();
        assert_eq!(err.step(), Some("b"));
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panicking_member_becomes_join_error() {
        let thunks = vec![("bad".to_string(), async {
            if true {
                panic!("member panicked");
            }
            Ok::<u8, ProcessError>(1)
        })];
        let err = run_all(thunks).await.unwrap_err();
        assert!(matches!(err, ProcessError::Join { ref step, .. } if step == "bad"));
    }
}
