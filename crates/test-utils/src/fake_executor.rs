use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use guardian::exec::{CommandExecutor, CommandResult};
use guardian::pipeline::CommandSpec;

/// How the fake should answer for a given command.
#[derive(Debug, Clone)]
pub enum Script {
    Exit(i32),
    ExitWithOutput {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// As if the program were not installed.
    SpawnError,
    TimedOut,
}

type RunHook = Box<dyn FnMut(&CommandSpec) + Send>;

/// A fake executor that:
/// - records the argv of every command it is asked to run
/// - answers with a scripted result, looked up by label then by program,
///   defaulting to exit 0
/// - never spawns a process.
pub struct FakeExecutor {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    scripts: HashMap<String, Script>,
    on_run: Option<RunHook>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            scripts: HashMap::new(),
            on_run: None,
        }
    }

    /// Shared handle to the recorded argv list.
    pub fn calls(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.calls)
    }

    /// `key` is a command label or a program name.
    pub fn script(mut self, key: &str, script: Script) -> Self {
        self.scripts.insert(key.to_string(), script);
        self
    }

    pub fn missing_program(self, program: &str) -> Self {
        self.script(program, Script::SpawnError)
    }

    /// Called synchronously before each command is answered.
    pub fn on_run(mut self, hook: impl FnMut(&CommandSpec) + Send + 'static) -> Self {
        self.on_run = Some(Box::new(hook));
        self
    }

    fn answer(&self, spec: &CommandSpec) -> CommandResult {
        let script = self
            .scripts
            .get(&spec.label)
            .or_else(|| spec.program().and_then(|p| self.scripts.get(p)))
            .cloned()
            .unwrap_or(Script::Exit(0));

        let elapsed = Duration::from_millis(1);
        match script {
            Script::Exit(code) => {
                CommandResult::from_exit(spec, Some(code), String::new(), String::new(), elapsed)
            }
            Script::ExitWithOutput {
                code,
                stdout,
                stderr,
            } => CommandResult::from_exit(spec, Some(code), stdout, stderr, elapsed),
            Script::SpawnError => CommandResult::spawn_failure(
                spec,
                format!("command not found: {}", spec.program().unwrap_or_default()),
                elapsed,
            ),
            Script::TimedOut => CommandResult::timeout(spec, elapsed),
        }
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for FakeExecutor {
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>> {
        self.calls.lock().unwrap().push(spec.argv.clone());
        if let Some(hook) = self.on_run.as_mut() {
            hook(spec);
        }
        let result = self.answer(spec);

        Box::pin(async move {
            tokio::task::yield_now().await;
            result
        })
    }
}
