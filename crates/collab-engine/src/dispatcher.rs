use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};

use collab_core::ids::BoardId;
use collab_core::messages::ToolCallBlock;
use collab_core::tools::{ToolError, ToolKind, ToolResult};
use collab_store::BoardStore;

use crate::commands::BoardCommand;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes one assistant turn's tool calls against the board.
///
/// Calls run concurrently, each on its own task. Results come back in call
/// order, one per call, and a failing call never affects its siblings.
#[derive(Clone)]
pub struct ToolDispatcher {
    store: Arc<dyn BoardStore>,
    tool_timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self {
            store,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Run every call and return their results aligned with `calls`.
    ///
    /// Tasks are detached: dropping this future (e.g. on a run deadline)
    /// leaves already-started calls running to completion.
    #[instrument(skip_all, fields(board_id = %board_id, calls = calls.len()))]
    pub async fn dispatch_all(&self, board_id: &BoardId, calls: &[ToolCallBlock]) -> Vec<ToolResult> {
        let handles: Vec<JoinHandle<ToolResult>> =
            calls.iter().map(|call| self.spawn_call(board_id, call)).collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(calls)
            .map(|(joined, call)| match joined {
                Ok(result) => result,
                Err(join_err) => {
                    error!(tool = %call.name, error = %join_err, "tool task failed");
                    ToolResult::error(call.id.clone(), "Tool execution failed")
                }
            })
            .collect()
    }

    fn spawn_call(&self, board_id: &BoardId, call: &ToolCallBlock) -> JoinHandle<ToolResult> {
        let store = Arc::clone(&self.store);
        let board_id = board_id.clone();
        let call = call.clone();
        let timeout = self.tool_timeout;
        tokio::spawn(async move { run_call(store, board_id, call, timeout).await })
    }
}

async fn run_call(
    store: Arc<dyn BoardStore>,
    board_id: BoardId,
    call: ToolCallBlock,
    timeout: Duration,
) -> ToolResult {
    let Some(kind) = ToolKind::from_name(&call.name) else {
        warn!(tool = %call.name, "unknown tool requested");
        return ToolResult::error(call.id, format!("Unknown tool: {}", call.name));
    };

    let start = Instant::now();
    let outcome = match BoardCommand::parse(kind, &call.arguments) {
        Err(e) => Err(e),
        Ok(command) => {
            let fut = AssertUnwindSafe(command.execute(store.as_ref(), &board_id)).catch_unwind();
            match tokio::time::timeout(timeout, fut).await {
                Ok(Ok(result)) => result,
                Ok(Err(panic)) => {
                    error!(tool = %kind, panic = %panic_message(&panic), "tool panicked during execution");
                    Err(ToolError::Panicked)
                }
                Err(_) => {
                    warn!(tool = %kind, timeout_secs = timeout.as_secs(), "tool timed out");
                    Err(ToolError::Timeout {
                        tool: call.name.clone(),
                        after: timeout,
                    })
                }
            }
        }
    };
    let duration = start.elapsed();

    match outcome {
        Ok(content) => {
            debug!(tool = %kind, duration_ms = duration.as_millis() as u64, "tool succeeded");
            ToolResult::ok(call.id, content).with_duration(duration)
        }
        Err(e) => {
            warn!(tool = %kind, tool_call_id = %call.id, error = %e, "tool failed");
            ToolResult::error(call.id, e.to_string()).with_duration(duration)
        }
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use collab_core::ids::{ObjectId, ToolCallId};
    use collab_store::{BoardObject, ObjectPatch, SqliteBoardStore, StoreError};
    use serde_json::{json, Value};

    /// Store whose inserts misbehave according to the object's text:
    /// `slow:<ms>` sleeps first, `fail` errors, `boom` panics.
    struct ScriptedStore {
        inner: SqliteBoardStore,
    }

    impl ScriptedStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: SqliteBoardStore::in_memory().unwrap(),
            })
        }
    }

    #[async_trait]
    impl BoardStore for ScriptedStore {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn insert_object(&self, object: BoardObject) -> Result<BoardObject, StoreError> {
            if let Some(ms) = object.text.strip_prefix("slow:") {
                let ms: u64 = ms.parse().unwrap();
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            match object.text.as_str() {
                "fail" => Err(StoreError::Database("disk full".into())),
                "boom" => panic!("store exploded"),
                _ => self.inner.insert_object(object).await,
            }
        }

        async fn update_object(
            &self,
            board_id: &BoardId,
            id: &ObjectId,
            patch: &ObjectPatch,
        ) -> Result<bool, StoreError> {
            self.inner.update_object(board_id, id, patch).await
        }

        async fn delete_objects(&self, board_id: &BoardId, ids: &[ObjectId]) -> Result<usize, StoreError> {
            self.inner.delete_objects(board_id, ids).await
        }

        async fn list_objects(&self, board_id: &BoardId) -> Result<Vec<BoardObject>, StoreError> {
            self.inner.list_objects(board_id).await
        }
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCallBlock {
        ToolCallBlock {
            id: ToolCallId::from_raw(id),
            name: name.into(),
            arguments,
        }
    }

    fn note(id: &str, text: &str) -> ToolCallBlock {
        call(id, "createStickyNote", json!({"text": text, "x": 0, "y": 0}))
    }

    fn board() -> BoardId {
        BoardId::from_raw("b1")
    }

    fn ids(results: &[ToolResult]) -> Vec<&str> {
        results.iter().map(|r| r.tool_call_id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn results_follow_call_order_not_completion_order() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        let calls = vec![note("a", "slow:300"), note("b", "slow:10"), note("c", "slow:100")];

        let results = dispatcher.dispatch_all(&board(), &calls).await;

        assert_eq!(ids(&results), vec!["a", "b", "c"]);
        assert!(results.iter().all(|r| !r.is_error));
        assert!(results[0].content.starts_with("Created sticky_note with ID: "));
    }

    #[tokio::test(start_paused = true)]
    async fn calls_run_concurrently() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        let calls = vec![note("a", "slow:1000"), note("b", "slow:1000"), note("c", "slow:1000")];

        let start = Instant::now();
        let results = dispatcher.dispatch_all(&board(), &calls).await;

        assert_eq!(results.len(), 3);
        assert!(start.elapsed() < Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_result_text() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        let calls = vec![call("x", "launchRocket", json!({})), note("y", "ok")];

        let results = dispatcher.dispatch_all(&board(), &calls).await;

        assert_eq!(results[0].content, "Unknown tool: launchRocket");
        assert!(results[0].is_error);
        assert!(!results[1].is_error);
    }

    #[tokio::test]
    async fn store_failure_is_isolated() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        let calls = vec![note("a", "fine"), note("b", "fail"), note("c", "also fine")];

        let results = dispatcher.dispatch_all(&board(), &calls).await;

        assert_eq!(ids(&results), vec!["a", "b", "c"]);
        assert!(!results[0].is_error);
        assert_eq!(
            results[1].content,
            "Failed to create sticky_note: database error: disk full"
        );
        assert!(results[1].is_error);
        assert!(!results[2].is_error);
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        let calls = vec![note("a", "boom"), note("b", "fine")];

        let results = dispatcher.dispatch_all(&board(), &calls).await;

        assert_eq!(results[0].content, "Internal error: tool crashed");
        assert!(!results[1].is_error);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new()).with_tool_timeout(Duration::from_secs(1));
        let calls = vec![note("a", "slow:5000"), note("b", "fine")];

        let results = dispatcher.dispatch_all(&board(), &calls).await;

        assert_eq!(results[0].content, "Tool createStickyNote timed out after 1s");
        assert!(results[0].is_error);
        assert!(!results[1].is_error);
    }

    #[tokio::test]
    async fn invalid_arguments_and_missing_objects() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        let calls = vec![
            call("a", "moveObject", json!({"x": 1})),
            call("b", "updateText", json!({"objectId": "ghost", "newText": "hi"})),
        ];

        let results = dispatcher.dispatch_all(&board(), &calls).await;

        assert!(results[0].content.starts_with("Invalid arguments for moveObject: "));
        assert_eq!(results[1].content, "Object ghost not found");
        assert!(results.iter().all(|r| r.is_error));
    }

    #[tokio::test]
    async fn empty_batch() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        assert!(dispatcher.dispatch_all(&board(), &[]).await.is_empty());
    }

    #[tokio::test]
    async fn board_state_sees_prior_batch() {
        let dispatcher = ToolDispatcher::new(ScriptedStore::new());
        dispatcher
            .dispatch_all(&board(), &[note("a", "first"), note("b", "second")])
            .await;

        let results = dispatcher
            .dispatch_all(&board(), &[call("s", "getBoardState", json!({}))])
            .await;

        assert!(results[0].content.starts_with("Board has 2 object(s):"), "{}", results[0].content);
    }

    #[test]
    fn panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&boxed), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&boxed), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&boxed), "unknown panic");
    }
}
