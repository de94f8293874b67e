//! Task failure reporting demonstration.
//!
//! This example runs a `divider` task on a toy worker and shows the notice
//! faultline produces when it divides by zero.
//!
//! Run with: `cargo run --example task_flow`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use faultline::task::{
    TaskDescriptor, TaskExtension, TaskFailure, TaskHost, TaskInvocation, TaskSignals,
};
use faultline::{ContextGenerators, ContextMap, Fault, MemoryTransport};
use serde_json::{json, Value};

/// Simulates a worker that runs tasks inline
struct InlineWorker {
    signals: TaskSignals,
    current: Mutex<Option<TaskInvocation>>,
}

impl InlineWorker {
    fn apply(
        &self,
        invocation: TaskInvocation,
        body: fn(&TaskInvocation) -> Result<Value, Fault>,
    ) -> Result<Option<Value>, faultline::Error> {
        *self.current.lock().unwrap() = Some(invocation.clone());
        let outcome = self.signals.task_prerun.send(&invocation).and_then(|()| {
            match body(&invocation) {
                Ok(value) => Ok(Some(value)),
                Err(fault) => {
                    let failure = TaskFailure::new(&invocation, fault);
                    self.signals.task_failure.send(&failure).map(|()| None)
                }
            }
        });
        let postrun = self.signals.task_postrun.send(&invocation);
        *self.current.lock().unwrap() = None;

        postrun?;
        outcome
    }
}

impl TaskHost for InlineWorker {
    fn signals(&self) -> &TaskSignals {
        &self.signals
    }

    fn current_task(&self) -> Option<TaskInvocation> {
        self.current.lock().unwrap().clone()
    }
}

fn divide(invocation: &TaskInvocation) -> Result<Value, Fault> {
    let x = invocation.args().first().and_then(Value::as_i64).unwrap_or(0);
    let y = invocation.kwargs().get("y").and_then(Value::as_i64).unwrap_or(0);
    if y == 0 {
        return Err(Fault::new("ZeroDivisionError", "division by zero"));
    }
    Ok(json!(x / y))
}

fn invocation(id: &str, x: i64, y: i64) -> TaskInvocation {
    let task = TaskDescriptor::new("demo.tasks", "divide").named("divider");
    let mut kwargs = ContextMap::new();
    kwargs.insert("y".to_string(), json!(y));
    TaskInvocation::new(task, id)
        .with_args(vec![json!(x)])
        .with_kwargs(kwargs)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();
    println!("=== Task Flow Example ===");

    let worker = Arc::new(InlineWorker {
        signals: TaskSignals::new(),
        current: Mutex::new(None),
    });
    let transport = Arc::new(MemoryTransport::new());

    let mut config = HashMap::new();
    config.insert("FAULTLINE_API_KEY".to_string(), "demo-key".to_string());
    let mut extension = TaskExtension::new(worker.clone(), transport.clone());
    extension.install(
        &config,
        ContextGenerators::new().with("queue", || Ok("default")),
        true,
    );
    println!("1. ✓ Installed on worker");

    println!("\n--- Scenario 1: divider(6, y=2) ---");
    match worker.apply(invocation("task-1", 6, 2), divide)? {
        Some(result) => println!("✓ Result: {}", result),
        None => println!("✗ Task failed"),
    }

    println!("\n--- Scenario 2: divider(1, y=0) ---");
    match worker.apply(invocation("task-2", 1, 0), divide)? {
        Some(result) => println!("Unexpected result: {}", result),
        None => println!("✓ Expected failure, reported"),
    }

    println!("\n--- Reported notices: {} ---", transport.len());
    for notice in transport.notices() {
        println!("{}", serde_json::to_string_pretty(&notice)?);
    }

    Ok(())
}
