//! Multi-agent workflows.
//!
//! [`WorkflowEngine`] stores workflow definitions and executes them in the
//! background, delegating each step to an agent built by the selector. Run
//! state lives in memory; a restart clears it.
//!
//! Supported modes: `sequential` pipes each step's output into the next,
//! `parallel` schedules steps in dependency waves. `conditional` and
//! `interactive` are accepted on the wire but currently execute
//! sequentially.

use crate::agents::{Agent, AgentSelector};
use crate::types::{AgentType, AppError, Result, RunConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

// ============= Workflow Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowMode {
    Sequential,
    Parallel,
    Conditional,
    Interactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowStep {
    /// Step name, unique within the workflow.
    pub name: String,
    /// Agent that executes this step.
    pub agent: AgentType,
    /// Extra instructions prepended to the step input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Names of steps whose output this step consumes.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub mode: WorkflowMode,
    pub steps: Vec<WorkflowStep>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub mode: WorkflowMode,
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepResult {
    pub step: String,
    pub agent: AgentType,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowRun {
    pub run_id: String,
    pub workflow_id: String,
    pub status: RunStatus,
    pub input: String,
    pub step_results: Vec<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

// ============= Engine =============

pub struct WorkflowEngine {
    selector: Arc<AgentSelector>,
    workflows: RwLock<HashMap<String, WorkflowDefinition>>,
    runs: Arc<RwLock<HashMap<String, WorkflowRun>>>,
}

impl WorkflowEngine {
    pub fn new(selector: Arc<AgentSelector>) -> Self {
        Self {
            selector,
            workflows: RwLock::new(HashMap::new()),
            runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a workflow definition after validating its steps.
    pub fn create_workflow(&self, request: CreateWorkflowRequest) -> Result<WorkflowDefinition> {
        if request.steps.is_empty() {
            return Err(AppError::InvalidInput(
                "A workflow needs at least one step".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for step in &request.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate step name '{}'",
                    step.name
                )));
            }
        }
        for step in &request.steps {
            for dep in &step.depends_on {
                if !request.steps.iter().any(|s| &s.name == dep) {
                    return Err(AppError::InvalidInput(format!(
                        "Step '{}' depends on unknown step '{}'",
                        step.name, dep
                    )));
                }
                if dep == &step.name {
                    return Err(AppError::InvalidInput(format!(
                        "Step '{}' depends on itself",
                        step.name
                    )));
                }
            }
        }
        // Sequential modes run steps in list order, so a dependency that
        // appears later would never feed its output into the dependent step.
        if !matches!(request.mode, WorkflowMode::Parallel) {
            for (idx, step) in request.steps.iter().enumerate() {
                for dep in &step.depends_on {
                    let dep_idx = request.steps.iter().position(|s| &s.name == dep);
                    if dep_idx.is_none_or(|d| d >= idx) {
                        return Err(AppError::InvalidInput(format!(
                            "Step '{}' depends on '{}', which must be listed before it in a sequential workflow",
                            step.name, dep
                        )));
                    }
                }
            }
        }

        let definition = WorkflowDefinition {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            description: request.description,
            mode: request.mode,
            steps: request.steps,
            created_at: Utc::now(),
        };

        self.workflows
            .write()
            .insert(definition.id.clone(), definition.clone());
        tracing::info!(workflow = %definition.id, name = %definition.name, "workflow created");

        Ok(definition)
    }

    pub fn list_workflows(&self) -> Vec<WorkflowDefinition> {
        let mut workflows: Vec<_> = self.workflows.read().values().cloned().collect();
        workflows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        workflows
    }

    pub fn get_workflow(&self, id: &str) -> Result<WorkflowDefinition> {
        self.workflows
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Workflow not found: {}", id)))
    }

    pub fn delete_workflow(&self, id: &str) -> Result<()> {
        self.workflows
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Workflow not found: {}", id)))
    }

    pub fn get_run(&self, run_id: &str) -> Result<WorkflowRun> {
        self.runs
            .read()
            .get(run_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Workflow run not found: {}", run_id)))
    }

    /// Start executing a workflow in the background.
    ///
    /// Returns the run record in `running` state immediately; callers poll
    /// [`get_run`](Self::get_run) for completion.
    pub fn execute(&self, workflow_id: &str, input: String) -> Result<WorkflowRun> {
        let definition = self.get_workflow(workflow_id)?;

        let run = WorkflowRun {
            run_id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            status: RunStatus::Running,
            input: input.clone(),
            step_results: Vec::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.runs.write().insert(run.run_id.clone(), run.clone());

        let selector = self.selector.clone();
        let runs = self.runs.clone();
        let run_id = run.run_id.clone();
        tokio::spawn(async move {
            let outcome = run_steps(&selector, &definition, &input).await;

            let mut runs = runs.write();
            if let Some(record) = runs.get_mut(&run_id) {
                record.finished_at = Some(Utc::now());
                match outcome {
                    Ok(results) => {
                        record.step_results = results;
                        record.status = RunStatus::Completed;
                    }
                    Err(e) => {
                        tracing::warn!(run = %run_id, error = %e, "workflow run failed");
                        record.error = Some(e.to_string());
                        record.status = RunStatus::Failed;
                    }
                }
            }
        });

        Ok(run)
    }
}

/// Execute all steps of a workflow and collect their outputs.
async fn run_steps(
    selector: &AgentSelector,
    definition: &WorkflowDefinition,
    input: &str,
) -> Result<Vec<StepResult>> {
    match definition.mode {
        WorkflowMode::Parallel => run_parallel(selector, definition, input).await,
        // Conditional and interactive execution degrade to sequential.
        WorkflowMode::Sequential | WorkflowMode::Conditional | WorkflowMode::Interactive => {
            run_sequential(selector, definition, input).await
        }
    }
}

async fn run_sequential(
    selector: &AgentSelector,
    definition: &WorkflowDefinition,
    input: &str,
) -> Result<Vec<StepResult>> {
    let mut results: Vec<StepResult> = Vec::with_capacity(definition.steps.len());
    let mut outputs: HashMap<String, String> = HashMap::new();

    for step in &definition.steps {
        let step_input = step_input(step, input, &outputs, results.last());
        let output = run_step(selector, step, &step_input).await?;
        outputs.insert(step.name.clone(), output.clone());
        results.push(StepResult {
            step: step.name.clone(),
            agent: step.agent,
            output,
        });
    }

    Ok(results)
}

/// Parallel mode: schedule steps in waves, a step runs once everything it
/// depends on has finished.
async fn run_parallel(
    selector: &AgentSelector,
    definition: &WorkflowDefinition,
    input: &str,
) -> Result<Vec<StepResult>> {
    let mut results: Vec<StepResult> = Vec::with_capacity(definition.steps.len());
    let mut outputs: HashMap<String, String> = HashMap::new();
    let mut pending: Vec<&WorkflowStep> = definition.steps.iter().collect();

    while !pending.is_empty() {
        let (ready, blocked): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|step| step.depends_on.iter().all(|dep| outputs.contains_key(dep)));

        if ready.is_empty() {
            // Remaining steps form a dependency cycle.
            let names: Vec<_> = blocked.iter().map(|s| s.name.as_str()).collect();
            return Err(AppError::InvalidInput(format!(
                "Workflow steps have circular dependencies: {}",
                names.join(", ")
            )));
        }

        let wave = join_all(ready.iter().copied().map(|step| {
            let step_input = step_input(step, input, &outputs, None);
            async move { (step, run_step(selector, step, &step_input).await) }
        }))
        .await;

        for (step, output) in wave {
            let output = output?;
            outputs.insert(step.name.clone(), output.clone());
            results.push(StepResult {
                step: step.name.clone(),
                agent: step.agent,
                output,
            });
        }

        pending = blocked;
    }

    Ok(results)
}

/// Assemble the prompt a step sees: its instructions, the outputs it
/// depends on, and the workflow input (or the previous step's output in a
/// plain sequential chain).
fn step_input(
    step: &WorkflowStep,
    input: &str,
    outputs: &HashMap<String, String>,
    previous: Option<&StepResult>,
) -> String {
    let mut parts = Vec::new();
    if let Some(instructions) = &step.instructions {
        parts.push(instructions.clone());
    }

    if step.depends_on.is_empty() {
        if let Some(prev) = previous {
            parts.push(format!("Previous step output:\n{}", prev.output));
        }
    } else {
        for dep in &step.depends_on {
            if let Some(output) = outputs.get(dep) {
                parts.push(format!("Output of '{}':\n{}", dep, output));
            }
        }
    }

    parts.push(format!("Task:\n{}", input));
    parts.join("\n\n")
}

async fn run_step(
    selector: &AgentSelector,
    step: &WorkflowStep,
    step_input: &str,
) -> Result<String> {
    tracing::debug!(step = %step.name, agent = %step.agent, "running workflow step");
    let config = RunConfig::with_model(selector.default_model());
    let agent = selector.select(step.agent, &config)?;
    agent.run(step_input, &config).await
}

// ============= Orchestrator Agent =============

const SYSTEM_PROMPT: &str = "\
You are an orchestrator coordinating a team of specialist agents: a web \
researcher, a finance analyst, a documentation assistant and a Telegram \
bot. Given a task, break it down, say which specialist handles each part \
and in what order, and combine their expected findings into a plan. For \
repeatable multi-step tasks, recommend defining a workflow.";

/// Conversational front for the workflow machinery.
pub struct OrchestratorAgent {
    llm: Arc<dyn crate::llm::LlmClient>,
}

impl OrchestratorAgent {
    pub fn new(llm: Arc<dyn crate::llm::LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Agent for OrchestratorAgent {
    async fn run(&self, input: &str, _config: &RunConfig) -> Result<String> {
        self.llm.generate_with_system(SYSTEM_PROMPT, input).await
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Orchestrator
    }

    fn name(&self) -> &'static str {
        "Orchestrator"
    }

    fn description(&self) -> &'static str {
        "Coordinates the other agents and plans multi-step work"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DatabaseSettings, LlmSettings, ServerSettings, Settings, TelegramSettings,
    };
    use crate::db::InMemoryVectorStore;
    use crate::llm::{LlmClient, LlmClientFactory, LlmResponse};

    struct EchoLlm;

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
        async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", prompt))
        }
        async fn generate_with_history(&self, _messages: &[(String, String)]) -> Result<String> {
            Ok("echo".to_string())
        }
        async fn generate_with_tools(
            &self,
            _system: &str,
            prompt: &str,
            _tools: &[crate::types::ToolDefinition],
        ) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: format!("echo: {}", prompt),
                tool_calls: vec![],
                finish_reason: "stop".to_string(),
            })
        }
        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct EchoFactory;

    impl LlmClientFactory for EchoFactory {
        fn client_for(&self, _model_id: &str) -> Arc<dyn LlmClient> {
            Arc::new(EchoLlm)
        }
    }

    fn test_engine() -> WorkflowEngine {
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseSettings {
                user: "ai".to_string(),
                password: "ai".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                database: "ai".to_string(),
            },
            llm: LlmSettings {
                openai_api_key: "sk-test".to_string(),
                openai_api_base: "https://api.openai.com/v1".to_string(),
                default_model: "gpt-4.1".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
            },
            telegram: TelegramSettings {
                bot_token: None,
                admin_chat_id: None,
            },
        };
        let selector = Arc::new(AgentSelector::with_llm_factory(
            Arc::new(EchoFactory),
            &settings,
            Arc::new(InMemoryVectorStore::new()),
        ));
        WorkflowEngine::new(selector)
    }

    fn step(name: &str, depends_on: &[&str]) -> WorkflowStep {
        WorkflowStep {
            name: name.to_string(),
            agent: AgentType::WebAgent,
            instructions: None,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    async fn wait_for_finish(engine: &WorkflowEngine, run_id: &str) -> WorkflowRun {
        for _ in 0..100 {
            let run = engine.get_run(run_id).unwrap();
            if run.status != RunStatus::Running {
                return run;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("workflow run did not finish");
    }

    #[test]
    fn test_create_rejects_empty_steps() {
        let engine = test_engine();
        let err = engine
            .create_workflow(CreateWorkflowRequest {
                name: "empty".to_string(),
                description: String::new(),
                mode: WorkflowMode::Sequential,
                steps: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_create_rejects_unknown_dependency() {
        let engine = test_engine();
        let err = engine
            .create_workflow(CreateWorkflowRequest {
                name: "bad".to_string(),
                description: String::new(),
                mode: WorkflowMode::Parallel,
                steps: vec![step("a", &["missing"])],
            })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_create_rejects_duplicate_step_names() {
        let engine = test_engine();
        let err = engine
            .create_workflow(CreateWorkflowRequest {
                name: "dup".to_string(),
                description: String::new(),
                mode: WorkflowMode::Sequential,
                steps: vec![step("a", &[]), step("a", &[])],
            })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_create_rejects_forward_dependency_in_sequential_mode() {
        let engine = test_engine();
        let err = engine
            .create_workflow(CreateWorkflowRequest {
                name: "forward".to_string(),
                description: String::new(),
                mode: WorkflowMode::Sequential,
                steps: vec![step("first", &["second"]), step("second", &[])],
            })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(err.to_string().contains("second"));
    }

    #[test]
    fn test_parallel_mode_accepts_forward_dependency() {
        let engine = test_engine();
        // Parallel scheduling orders by dependency, not list position.
        engine
            .create_workflow(CreateWorkflowRequest {
                name: "forward".to_string(),
                description: String::new(),
                mode: WorkflowMode::Parallel,
                steps: vec![step("first", &["second"]), step("second", &[])],
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_sequential_dependency_output_reaches_dependent_step() {
        let engine = test_engine();
        let workflow = engine
            .create_workflow(CreateWorkflowRequest {
                name: "dep-chain".to_string(),
                description: String::new(),
                mode: WorkflowMode::Sequential,
                steps: vec![step("gather", &[]), step("summarize", &["gather"])],
            })
            .unwrap();

        let run = engine.execute(&workflow.id, "hello".to_string()).unwrap();
        let finished = wait_for_finish(&engine, &run.run_id).await;
        assert_eq!(finished.status, RunStatus::Completed);
        assert!(finished.step_results[1].output.contains("Output of 'gather'"));
    }

    #[tokio::test]
    async fn test_sequential_run_completes_in_order() {
        let engine = test_engine();
        let workflow = engine
            .create_workflow(CreateWorkflowRequest {
                name: "chain".to_string(),
                description: String::new(),
                mode: WorkflowMode::Sequential,
                steps: vec![step("first", &[]), step("second", &[])],
            })
            .unwrap();

        let run = engine.execute(&workflow.id, "hello".to_string()).unwrap();
        assert_eq!(run.status, RunStatus::Running);

        let finished = wait_for_finish(&engine, &run.run_id).await;
        assert_eq!(finished.status, RunStatus::Completed);
        assert_eq!(finished.step_results.len(), 2);
        assert_eq!(finished.step_results[0].step, "first");
        // Second step sees the output of the first.
        assert!(finished.step_results[1].output.contains("Previous step output"));
    }

    #[tokio::test]
    async fn test_parallel_run_respects_dependencies() {
        let engine = test_engine();
        let workflow = engine
            .create_workflow(CreateWorkflowRequest {
                name: "fanin".to_string(),
                description: String::new(),
                mode: WorkflowMode::Parallel,
                steps: vec![step("a", &[]), step("b", &[]), step("merge", &["a", "b"])],
            })
            .unwrap();

        let run = engine.execute(&workflow.id, "go".to_string()).unwrap();
        let finished = wait_for_finish(&engine, &run.run_id).await;

        assert_eq!(finished.status, RunStatus::Completed);
        assert_eq!(finished.step_results.len(), 3);
        let merge = finished
            .step_results
            .iter()
            .find(|r| r.step == "merge")
            .unwrap();
        assert!(merge.output.contains("Output of 'a'"));
        assert!(merge.output.contains("Output of 'b'"));
    }

    #[tokio::test]
    async fn test_parallel_cycle_fails_run() {
        let engine = test_engine();
        let workflow = engine
            .create_workflow(CreateWorkflowRequest {
                name: "cycle".to_string(),
                description: String::new(),
                mode: WorkflowMode::Parallel,
                steps: vec![step("a", &["b"]), step("b", &["a"])],
            })
            .unwrap();

        let run = engine.execute(&workflow.id, "go".to_string()).unwrap();
        let finished = wait_for_finish(&engine, &run.run_id).await;
        assert_eq!(finished.status, RunStatus::Failed);
        assert!(finished.error.is_some());
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let engine = test_engine();
        let workflow = engine
            .create_workflow(CreateWorkflowRequest {
                name: "gone".to_string(),
                description: String::new(),
                mode: WorkflowMode::Sequential,
                steps: vec![step("a", &[])],
            })
            .unwrap();

        engine.delete_workflow(&workflow.id).unwrap();
        assert!(matches!(
            engine.get_workflow(&workflow.id),
            Err(AppError::NotFound(_))
        ));
    }
}
