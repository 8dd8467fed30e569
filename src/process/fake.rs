//! Scripted process runner for testing

use super::{CommandOutput, ProcessRunner};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A single scripted response, matched by substring against the rendered
/// command line (`program arg1 arg2 ...`).
struct Rule {
    pattern: String,
    output: CommandOutput,
    once: bool,
}

/// Test implementation of `ProcessRunner` replaying scripted responses
///
/// Rules are matched in registration order; the first rule whose pattern is
/// a substring of the rendered command line wins. Unmatched commands
/// succeed with empty output, so tests only script what they assert on.
/// Every invocation is recorded for later inspection.
///
/// # Example
/// ```
/// use repofleet::process::{FakeRunner, ProcessRunner, argv};
///
/// let runner = FakeRunner::new()
///     .on("rev-parse", 0, "abc123\n", "");
/// let out = runner
///     .run("git", &argv(&["rev-parse", "main"]), None)
///     .unwrap();
/// assert_eq!(out.stdout_trimmed(), "abc123");
/// ```
#[derive(Clone)]
pub struct FakeRunner {
    rules: Arc<Mutex<Vec<Rule>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    /// Create a runner with no scripted rules
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a response for command lines containing `pattern` (builder pattern)
    #[must_use]
    pub fn on(self, pattern: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.push_rule(pattern, code, stdout, stderr, false);
        self
    }

    /// Script a response that is consumed by its first match, letting later
    /// invocations of the same command fall through to other rules
    #[must_use]
    pub fn on_once(self, pattern: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.push_rule(pattern, code, stdout, stderr, true);
        self
    }

    fn push_rule(&self, pattern: &str, code: i32, stdout: &str, stderr: &str, once: bool) {
        self.rules.lock().expect("fake runner poisoned").push(Rule {
            pattern: pattern.to_owned(),
            output: CommandOutput {
                stdout: stdout.to_owned(),
                stderr: stderr.to_owned(),
                code,
            },
            once,
        });
    }

    /// All command lines run so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("fake runner poisoned").clone()
    }

    /// Whether any recorded command line contains `pattern`
    #[must_use]
    pub fn ran(&self, pattern: &str) -> bool {
        self.calls().iter().any(|call| call.contains(pattern))
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, program: &str, args: &[String], _cwd: Option<&Path>) -> io::Result<CommandOutput> {
        let rendered = format!("{} {}", program, args.join(" "));
        self.calls
            .lock()
            .expect("fake runner poisoned")
            .push(rendered.clone());

        let mut rules = self.rules.lock().expect("fake runner poisoned");
        if let Some(index) = rules.iter().position(|rule| rendered.contains(&rule.pattern)) {
            let output = rules[index].output.clone();
            if rules[index].once {
                rules.remove(index);
            }
            return Ok(output);
        }

        Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            code: 0,
        })
    }
}
