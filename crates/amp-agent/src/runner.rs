use serde_json::json;
use tracing::{info, warn};

use crate::context::AgentContext;
use crate::engine::{AgentEngine, AgentResult};
use crate::error::Result;

/// Run one turn and record its lifecycle on the context's logger.
///
/// Emits `run.started`, then `model.response` and `run.finished` on success
/// or `run.error` on failure. The error is returned unchanged.
pub async fn run_logged(
    engine: &dyn AgentEngine,
    ctx: &AgentContext,
    assistant_id: &str,
) -> Result<AgentResult> {
    ctx.logger.event(
        "run.started",
        Some(json!({ "assistantId": assistant_id, "engine": engine.id() })),
    );

    match engine.run_turn(ctx).await {
        Ok(result) => {
            ctx.logger
                .event("model.response", Some(json!({ "text": result.first_text() })));
            ctx.logger.event("run.finished", Some(json!({ "status": "ok" })));
            info!(engine = engine.id(), assistant = assistant_id, "run finished");
            Ok(result)
        }
        Err(e) => {
            ctx.logger
                .event("run.error", Some(json!({ "message": e.to_string() })));
            warn!(engine = engine.id(), error = %e, "run failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use amp_runlog::MemoryRunLogger;
    use amp_types::{ProjectId, RunId};
    use async_trait::async_trait;

    use super::*;
    use crate::engine::BasicEngine;
    use crate::error::AgentError;
    use crate::model::EchoModel;

    struct BrokenEngine;

    #[async_trait]
    impl AgentEngine for BrokenEngine {
        fn id(&self) -> &str {
            "engine.broken"
        }

        fn capabilities(&self) -> Vec<String> {
            Vec::new()
        }

        async fn run_turn(&self, _ctx: &AgentContext) -> Result<AgentResult> {
            Err(AgentError::Engine {
                engine: "engine.broken".into(),
                message: "boom".into(),
            })
        }
    }

    fn ctx(log: Arc<MemoryRunLogger>) -> AgentContext {
        AgentContext::new(
            ProjectId::from_raw("proj_00000001"),
            "ping",
            Arc::new(EchoModel),
            log,
        )
    }

    #[tokio::test]
    async fn successful_run_logs_lifecycle() {
        let log = Arc::new(MemoryRunLogger::new(RunId::from_raw("run_1"), None));
        let result = run_logged(&BasicEngine, &ctx(log.clone()), "asst_1").await.unwrap();

        assert_eq!(result.first_text(), "ECHO: ping");
        assert_eq!(
            log.kinds(),
            vec!["run.started", "model.called", "model.response", "run.finished"]
        );
        let events = log.events();
        assert_eq!(events[0].payload.as_ref().unwrap()["assistantId"], "asst_1");
        assert_eq!(events[2].payload.as_ref().unwrap()["text"], "ECHO: ping");
    }

    #[tokio::test]
    async fn failed_run_logs_error() {
        let log = Arc::new(MemoryRunLogger::new(RunId::from_raw("run_2"), None));
        let err = run_logged(&BrokenEngine, &ctx(log.clone()), "asst_1")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Engine { .. }));
        assert_eq!(log.kinds(), vec!["run.started", "run.error"]);
    }
}
