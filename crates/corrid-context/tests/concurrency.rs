use std::time::Duration;

use corrid_context::{TaskContext, current, scope, spawn, with_current};

fn correlation() -> Option<String> {
    with_current(|context| context.get("correlationId")).flatten()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_scopes_never_observe_each_other() -> anyhow::Result<()> {
    let mut handles = Vec::new();
    for index in 0..64 {
        let id = format!("task-{index}");
        handles.push(tokio::spawn(scope(
            TaskContext::with_entry("correlationId", id.clone()),
            async move {
                let mut seen = vec![correlation()];
                for step in 0..4_u64 {
                    tokio::time::sleep(Duration::from_millis(step % 2)).await;
                    tokio::task::yield_now().await;
                    seen.push(correlation());
                }
                (id, seen)
            },
        )));
    }

    for handle in handles {
        let (id, seen) = handle.await?;
        assert!(
            seen.iter().all(|value| value.as_deref() == Some(id.as_str())),
            "{id} observed {seen:?}"
        );
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn descendants_spawned_across_workers_share_one_context() -> anyhow::Result<()> {
    let root = TaskContext::with_entry("correlationId", "root");
    let observed = scope(root.clone(), async {
        let first = spawn(async {
            tokio::time::sleep(Duration::from_millis(2)).await;
            spawn(async { correlation() }).await
        });
        let second = spawn(async { current().map(|context| context.len()) });
        (first.await, second.await)
    })
    .await;

    let (first, second) = observed;
    assert_eq!(first??.as_deref(), Some("root"));
    assert_eq!(second?, Some(1));
    assert!(current().is_none());
    Ok(())
}
