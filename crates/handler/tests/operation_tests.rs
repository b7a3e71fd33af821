use async_trait::async_trait;
use bridge_core::{
    CancelToken, ExecContext, Handler, MemoryReporter, Operation, OperationRunner, OutputSink,
    Properties, PropertyKey, RecordLevel,
};
use compose::{ComposeBackend, ComposeError, ContainerInfo, Project};
use handler::{
    CommandDefinition, CommandHandler, CommandSet, MonitorHandler, ProjectSchema, COMMAND_GET,
    COMMAND_LIST, MONITOR_LOGS, MONITOR_PS,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CANCEL: PropertyKey<CancelToken> = PropertyKey::new("compose.cancel");
const DETACH: PropertyKey<bool> = PropertyKey::new("compose.detach");
const OUTPUT: PropertyKey<OutputSink> = PropertyKey::new("compose.output");
const PROJECT_NAME: PropertyKey<String> = PropertyKey::new("compose.project.name");
const COMMAND_KEY: PropertyKey<String> = PropertyKey::new("command.key");
const COMMAND_KEYS: PropertyKey<Vec<String>> = PropertyKey::new("command.keys");
const COMMAND_DEFINITION: PropertyKey<serde_json::Value> = PropertyKey::new("command.definition");

/// What the fake backend does when asked for logs.
#[derive(Clone)]
enum LogsBehavior {
    Lines(Vec<String>),
    Fail(String),
    BlockUntilCancelled,
}

/// In-memory backend recording every call it receives.
struct FakeBackend {
    logs_calls: AtomicUsize,
    ps_calls: AtomicUsize,
    follow: Mutex<Vec<bool>>,
    logs: LogsBehavior,
    ps: Result<Vec<ContainerInfo>, String>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            logs_calls: AtomicUsize::new(0),
            ps_calls: AtomicUsize::new(0),
            follow: Mutex::new(Vec::new()),
            logs: LogsBehavior::Lines(vec!["web-1  | ready".to_string()]),
            ps: Ok(Vec::new()),
        }
    }

    fn with_logs(mut self, logs: LogsBehavior) -> Self {
        self.logs = logs;
        self
    }

    fn with_containers(mut self, infos: Vec<ContainerInfo>) -> Self {
        self.ps = Ok(infos);
        self
    }

    fn with_ps_error(mut self, message: &str) -> Self {
        self.ps = Err(message.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.logs_calls.load(Ordering::SeqCst) + self.ps_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComposeBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn logs(
        &self,
        _project: &Project,
        cancel: &CancelToken,
        follow: bool,
        sink: &OutputSink,
    ) -> compose::Result<()> {
        self.logs_calls.fetch_add(1, Ordering::SeqCst);
        self.follow.lock().unwrap().push(follow);

        match &self.logs {
            LogsBehavior::Lines(lines) => {
                for line in lines {
                    sink.write_line(line)?;
                }
                Ok(())
            }
            LogsBehavior::Fail(message) => Err(ComposeError::CommandFailed(message.clone())),
            LogsBehavior::BlockUntilCancelled => {
                cancel.cancelled().await;
                Err(ComposeError::Cancelled)
            }
        }
    }

    async fn ps(
        &self,
        _project: &Project,
        cancel: &CancelToken,
    ) -> compose::Result<Vec<ContainerInfo>> {
        self.ps_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(ComposeError::Cancelled);
        }
        self.ps.clone().map_err(ComposeError::CommandFailed)
    }
}

fn schema() -> ProjectSchema {
    ProjectSchema::new("shop", vec!["docker-compose.yml".to_string()])
}

fn container(index: usize) -> ContainerInfo {
    ContainerInfo::new()
        .with("ID", format!("c{}", index))
        .with("Name", format!("shop-web-{}", index))
        .with("State", "running")
        .with("Image", "nginx:1.27")
}

fn operation(backend: &Arc<FakeBackend>, id: &str) -> Arc<dyn Operation> {
    let backend: Arc<dyn ComposeBackend> = backend.clone();
    let mut ops = MonitorHandler::new(backend.clone(), schema()).operations();
    let commands = CommandSet::new()
        .with(
            "shell",
            CommandDefinition::new("app", vec!["bash".to_string()])
                .with_description("Open a shell"),
        )
        .with(
            "migrate",
            CommandDefinition::new("app", vec!["bin/migrate".to_string()]),
        );
    ops.merge(CommandHandler::new(backend, schema(), Arc::new(commands)).operations());
    ops.get(id).expect("operation registered")
}

/// Schema defaults merged with the caller's values, as the runner does.
fn bound(op: &Arc<dyn Operation>, values: Properties) -> Properties {
    let mut props = op.properties();
    props.merge(values);
    props
}

fn context() -> (ExecContext, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    (ExecContext::new(reporter.clone()), reporter)
}

mod logs {
    use super::*;

    fn values(cancel: &CancelToken, detach: bool) -> Properties {
        Properties::new()
            .with(CANCEL.bind(cancel.clone()))
            .with(DETACH.bind(detach))
    }

    #[tokio::test]
    async fn test_missing_cancel_fails_without_backend_call() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = bound(&op, Properties::new().with(DETACH.bind(true)));
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert!(result.is_finished());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].is_missing_property());
        assert!(result.errors()[0].to_string().contains("compose.cancel"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_detach_and_cancel_are_both_reported() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = op.properties();
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert_eq!(result.errors().len(), 2);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_detach_false_follows() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = bound(&op, values(&CancelToken::new(), false));
        let result = op.exec(&mut props, &ctx).await;

        assert!(result.success());
        assert!(result.is_finished());
        assert_eq!(*backend.follow.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_detach_true_does_not_follow() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = bound(&op, values(&CancelToken::new(), true));
        let result = op.exec(&mut props, &ctx).await;

        assert!(result.success());
        assert_eq!(*backend.follow.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn test_output_is_bound_to_stdout() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = bound(&op, values(&CancelToken::new(), true));
        assert!(props.value(&OUTPUT).unwrap().is_none());

        op.exec(&mut props, &ctx).await;

        let sink = props.require(&OUTPUT).unwrap();
        assert!(sink.is_stdout());
    }

    #[tokio::test]
    async fn test_output_stays_unbound_when_checks_fail() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = bound(&op, Properties::new().with(DETACH.bind(false)));
        op.exec(&mut props, &ctx).await;

        assert!(props.value(&OUTPUT).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backend_error_is_wrapped() {
        let backend = Arc::new(
            FakeBackend::new().with_logs(LogsBehavior::Fail("daemon unreachable".to_string())),
        );
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = bound(&op, values(&CancelToken::new(), true));
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert!(result.is_finished());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].is_backend());
        let message = result.errors()[0].to_string();
        assert!(message.starts_with("Could not attach to the project for logs"));
        assert!(message.contains("daemon unreachable"));
    }

    #[tokio::test]
    async fn test_cancellation_stops_following_stream() {
        let backend = Arc::new(FakeBackend::new().with_logs(LogsBehavior::BlockUntilCancelled));
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let mut props = bound(&op, values(&cancel, false));
        let result = tokio::time::timeout(Duration::from_secs(5), op.exec(&mut props, &ctx))
            .await
            .expect("logs returned after cancellation");

        assert!(result.success());
        assert!(result.is_finished());
        assert!(result.was_cancelled());
        assert_eq!(*backend.follow.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_invalid_project_name_fails_without_backend_call() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_LOGS);
        let (ctx, _) = context();

        let mut props = bound(
            &op,
            values(&CancelToken::new(), true).with(PROJECT_NAME.bind("Not Valid".to_string())),
        );
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert!(result.errors()[0].to_string().contains("Could not resolve project"));
        assert_eq!(backend.calls(), 0);
    }
}

mod ps {
    use super::*;

    fn values(cancel: &CancelToken) -> Properties {
        Properties::new().with(CANCEL.bind(cancel.clone()))
    }

    #[tokio::test]
    async fn test_missing_cancel_fails_without_backend_call() {
        let backend = Arc::new(FakeBackend::new().with_containers(vec![container(0)]));
        let op = operation(&backend, MONITOR_PS);
        let (ctx, reporter) = context();

        let mut props = op.properties();
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert!(result.is_finished());
        assert!(result.errors()[0].is_missing_property());
        assert_eq!(backend.calls(), 0);
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_no_containers_reports_notice() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, MONITOR_PS);
        let (ctx, reporter) = context();

        let mut props = bound(&op, values(&CancelToken::new()));
        let result = op.exec(&mut props, &ctx).await;

        assert!(result.success());
        assert!(result.is_finished());
        assert!(result.errors().is_empty());
        assert_eq!(reporter.messages(), vec!["No running containers found."]);
    }

    #[tokio::test]
    async fn test_one_record_per_container_in_order() {
        let infos: Vec<ContainerInfo> = (0..3).map(container).collect();
        let backend = Arc::new(FakeBackend::new().with_containers(infos));
        let op = operation(&backend, MONITOR_PS);
        let (ctx, reporter) = context();

        let mut props = bound(&op, values(&CancelToken::new()));
        let result = op.exec(&mut props, &ctx).await;

        assert!(result.success());
        let records = reporter.records();
        assert_eq!(records.len(), 3);

        for (index, record) in records.iter().enumerate() {
            assert_eq!(record.message, "Compose info");
            assert_eq!(record.level, RecordLevel::Info);
            assert_eq!(record.get("index").unwrap(), index);
            assert_eq!(record.get("id").unwrap(), &format!("c{}", index));
            assert_eq!(record.get("name").unwrap(), &format!("shop-web-{}", index));
            assert_eq!(record.get("state").unwrap(), "running");
            assert_eq!(record.get("info").unwrap()["Image"], "nginx:1.27");
        }
    }

    #[tokio::test]
    async fn test_missing_info_keys_are_null() {
        let info = ContainerInfo::new().with("ID", "c0");
        let backend = Arc::new(FakeBackend::new().with_containers(vec![info]));
        let op = operation(&backend, MONITOR_PS);
        let (ctx, reporter) = context();

        let mut props = bound(&op, values(&CancelToken::new()));
        op.exec(&mut props, &ctx).await;

        let records = reporter.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].get("name").unwrap().is_null());
        assert!(records[0].get("state").unwrap().is_null());
    }

    #[tokio::test]
    async fn test_backend_error_fails_without_notice() {
        let backend = Arc::new(FakeBackend::new().with_ps_error("permission denied"));
        let op = operation(&backend, MONITOR_PS);
        let (ctx, reporter) = context();

        let mut props = bound(&op, values(&CancelToken::new()));
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert!(result.is_finished());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].is_backend());
        assert!(result.errors()[0].to_string().contains("permission denied"));
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_listing() {
        let backend = Arc::new(FakeBackend::new().with_containers(vec![container(0)]));
        let op = operation(&backend, MONITOR_PS);
        let (ctx, reporter) = context();
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut props = bound(&op, values(&cancel));
        let result = op.exec(&mut props, &ctx).await;

        assert!(result.success());
        assert!(result.was_cancelled());
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_runner_drives_ps_to_finished() {
        let backend = Arc::new(FakeBackend::new().with_containers(vec![container(0)]));
        let op = operation(&backend, MONITOR_PS);
        let reporter = Arc::new(MemoryReporter::new());
        let runner = OperationRunner::new(reporter.clone());

        let invocation = runner.run(op.as_ref(), values(&CancelToken::new())).await;

        assert!(invocation.result.success());
        assert!(invocation.result.is_finished());
        assert_eq!(reporter.len(), 1);
        assert_eq!(backend.ps_calls.load(Ordering::SeqCst), 1);
    }
}

mod commands {
    use super::*;

    fn values() -> Properties {
        Properties::new().with(CANCEL.bind(CancelToken::new()))
    }

    #[tokio::test]
    async fn test_list_sets_sorted_keys() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, COMMAND_LIST);
        let (ctx, reporter) = context();

        let mut props = bound(&op, values());
        let result = op.exec(&mut props, &ctx).await;

        assert!(result.success());
        assert!(result.is_finished());
        assert_eq!(props.require(&COMMAND_KEYS).unwrap(), vec!["migrate", "shell"]);

        let records = reporter.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("key").unwrap(), "shell");
        assert_eq!(records[1].get("description").unwrap(), "Open a shell");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_binds_definition() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, COMMAND_GET);
        let (ctx, _) = context();

        let mut props = bound(&op, values().with(COMMAND_KEY.bind("shell".to_string())));
        let result = op.exec(&mut props, &ctx).await;

        assert!(result.success());
        let definition = props.require(&COMMAND_DEFINITION).unwrap();
        assert_eq!(definition["service"], "app");
        assert_eq!(definition["exec"][0], "bash");
    }

    #[tokio::test]
    async fn test_get_unknown_key_fails() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, COMMAND_GET);
        let (ctx, reporter) = context();

        let mut props = bound(&op, values().with(COMMAND_KEY.bind("deploy".to_string())));
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert!(result.is_finished());
        assert!(result.errors()[0].to_string().contains("deploy"));
        assert!(props.value(&COMMAND_DEFINITION).unwrap().is_none());
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_key_fails() {
        let backend = Arc::new(FakeBackend::new());
        let op = operation(&backend, COMMAND_GET);
        let (ctx, _) = context();

        let mut props = bound(&op, values());
        let result = op.exec(&mut props, &ctx).await;

        assert!(!result.success());
        assert!(result.errors()[0].is_missing_property());
    }
}
