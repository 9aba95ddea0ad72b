//! Shared fixtures and fakes for unit tests.

use crate::generation::models::{GenerationRequest, SessionHandle};

pub mod fixtures {
    use super::*;

    /// A valid request with context and the default tone
    pub fn test_request() -> GenerationRequest {
        GenerationRequest::new("AI in hiring", Some("Recruiting team".into()), None)
    }

    /// A session with a fixed id, for assertions on metadata
    pub fn test_session() -> SessionHandle {
        SessionHandle {
            service_base_url: "http://adk".to_string(),
            app_name: "linkedin_post_agent".to_string(),
            user_id: "web_user".to_string(),
            session_id: "session_test".to_string(),
        }
    }
}

pub mod network {
    /// Base URL of a local port with nothing listening on it.
    pub async fn closed_port_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }
}

pub mod fake_runtime {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::agent_client::{AgentError, AgentRuntime, SessionCreation, UpstreamHealth};
    use crate::generation::models::SessionHandle;

    type Canned<T> = Result<T, (u16, String)>;

    fn answer<T: Clone>(canned: &Canned<T>) -> Result<T, AgentError> {
        canned.clone().map_err(|(status, body)| AgentError::Api { status, body })
    }

    /// In-process `AgentRuntime` answering from canned outcomes and
    /// recording every call it receives, in order.
    pub struct FakeRuntime {
        session: Canned<SessionCreation>,
        run: Canned<Value>,
        state: Canned<Value>,
        health: Canned<UpstreamHealth>,
        calls: Mutex<Vec<String>>,
    }

    impl Default for FakeRuntime {
        fn default() -> Self {
            Self {
                session: Ok(SessionCreation::Created),
                run: Ok(Value::Null),
                state: Err((404, "Session not found".to_string())),
                health: Ok(UpstreamHealth { status: 200 }),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeRuntime {
        pub fn with_session(mut self, outcome: SessionCreation) -> Self {
            self.session = Ok(outcome);
            self
        }

        pub fn with_session_error(mut self, status: u16, body: &str) -> Self {
            self.session = Err((status, body.to_string()));
            self
        }

        pub fn with_run(mut self, raw: Value) -> Self {
            self.run = Ok(raw);
            self
        }

        pub fn with_run_error(mut self, status: u16, body: &str) -> Self {
            self.run = Err((status, body.to_string()));
            self
        }

        pub fn with_state(mut self, state: Value) -> Self {
            self.state = Ok(state);
            self
        }

        pub fn with_health_error(mut self, status: u16, body: &str) -> Self {
            self.health = Err((status, body.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl AgentRuntime for FakeRuntime {
        async fn create_session(
            &self,
            session: &SessionHandle,
        ) -> Result<SessionCreation, AgentError> {
            self.record(format!("create_session {}", session.session_id));
            answer(&self.session)
        }

        async fn run(&self, session: &SessionHandle, instruction: &str) -> Result<Value, AgentError> {
            self.record(format!("run {} {}", session.session_id, instruction));
            answer(&self.run)
        }

        async fn session_state(&self, session: &SessionHandle) -> Result<Value, AgentError> {
            self.record(format!("session_state {}", session.session_id));
            answer(&self.state)
        }

        async fn health(&self) -> Result<UpstreamHealth, AgentError> {
            self.record("health".to_string());
            answer(&self.health)
        }

        fn base_url(&self) -> &str {
            "http://adk"
        }
    }
}
