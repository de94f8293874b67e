//! Minimal web and task hosts used by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use faultline::task::{TaskFailure, TaskHost, TaskInvocation, TaskSignals};
use faultline::web::{RequestState, ViewMeta, WebHost, WebSignals};
use faultline::{Error, Fault};
use serde_json::Value;

pub const USER_AGENT: &str = "faultline-test/0.1";

pub fn division_by_zero() -> Fault {
    Fault::new("ZeroDivisionError", "division by zero")
}

pub fn api_key_config(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut config: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    config
        .entry("FAULTLINE_API_KEY".to_string())
        .or_insert_with(|| "abcd".to_string());
    config
}

/// Headers every test request carries unless overridden.
pub fn default_headers() -> BTreeMap<String, String> {
    [
        ("Content-Length", "0"),
        ("Content-Type", ""),
        ("Host", "localhost"),
        ("User-Agent", USER_AGENT),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

type Handler = Box<dyn Fn(&mut RequestState) -> Result<String, Fault> + Send + Sync>;

struct Route {
    view: ViewMeta,
    handler: Handler,
}

/// A request to dispatch through [`TestWebApp`].
pub struct TestRequest {
    target: String,
    form: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl TestRequest {
    pub fn get(target: &str) -> Self {
        Self {
            target: target.to_string(),
            form: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn form(mut self, key: &str, value: &str) -> Self {
        self.form.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Routes requests by path and fires the web signals the way a framework would.
///
/// Each dispatching thread has its own current request.
pub struct TestWebApp {
    signals: WebSignals,
    routes: BTreeMap<String, Route>,
    current: Mutex<HashMap<ThreadId, RequestState>>,
}

impl TestWebApp {
    pub fn new() -> Self {
        Self {
            signals: WebSignals::new(),
            routes: BTreeMap::new(),
            current: Mutex::new(HashMap::new()),
        }
    }

    pub fn route<F>(mut self, path: &str, view: ViewMeta, handler: F) -> Self
    where
        F: Fn(&mut RequestState) -> Result<String, Fault> + Send + Sync + 'static,
    {
        self.routes.insert(
            path.to_string(),
            Route {
                view,
                handler: Box::new(handler),
            },
        );
        self
    }

    /// Returns the response status, or the error a signal listener raised.
    pub fn dispatch(&self, request: TestRequest) -> Result<u16, Error> {
        let (path, query) = match request.target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (request.target.as_str(), ""),
        };
        let Some(route) = self.routes.get(path) else {
            return Ok(404);
        };

        let mut state = RequestState::new(format!("http://localhost{}", request.target));
        state.set_view(route.view.clone());
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            state.add_query_param(key, value);
        }

        let body: Vec<String> = request
            .form
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        let body = body.join("&");
        for (name, value) in default_headers() {
            state.add_header(name, value);
        }
        if !request.form.is_empty() {
            state.add_header("Content-Length", body.len().to_string());
            state.add_header("Content-Type", "application/x-www-form-urlencoded");
        }
        for (key, value) in &request.form {
            state.add_form_field(key.as_str(), value.as_str());
        }
        for (name, value) in &request.headers {
            state.add_header(name.as_str(), value.as_str());
        }

        self.set_current(Some(state.clone()));
        let outcome = self.signals.request_started.send(&state).and_then(|()| {
            let result = (route.handler)(&mut state);
            self.set_current(Some(state.clone()));
            match result {
                Ok(_) => Ok(200),
                Err(fault) => {
                    self.signals.got_request_exception.send(&fault)?;
                    Ok(500)
                }
            }
        });
        let teardown = self.signals.request_tearing_down.send(&state);
        self.set_current(None);

        let status = outcome?;
        teardown?;
        Ok(status)
    }

    fn set_current(&self, state: Option<RequestState>) {
        let mut current = self.current.lock().unwrap();
        match state {
            Some(state) => current.insert(thread::current().id(), state),
            None => current.remove(&thread::current().id()),
        };
    }
}

impl WebHost for TestWebApp {
    fn signals(&self) -> &WebSignals {
        &self.signals
    }

    fn current_request(&self) -> Option<RequestState> {
        self.current.lock().unwrap().get(&thread::current().id()).cloned()
    }
}

/// Runs task bodies eagerly and fires the task signals the way a worker would.
///
/// Tasks applied from different threads run concurrently.
pub struct TestWorker {
    signals: TaskSignals,
    current: Mutex<HashMap<ThreadId, TaskInvocation>>,
}

impl TestWorker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            signals: TaskSignals::new(),
            current: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the task's result (`None` if it failed), or a listener error.
    pub fn apply<F>(&self, invocation: TaskInvocation, body: F) -> Result<Option<Value>, Error>
    where
        F: FnOnce(&TaskInvocation) -> Result<Value, Fault>,
    {
        let thread = thread::current().id();
        self.current.lock().unwrap().insert(thread, invocation.clone());

        let outcome = self.signals.task_prerun.send(&invocation).and_then(|()| {
            match body(&invocation) {
                Ok(value) => Ok(Some(value)),
                Err(fault) => {
                    let failure = TaskFailure::new(&invocation, fault);
                    self.signals.task_failure.send(&failure)?;
                    Ok(None)
                }
            }
        });
        let postrun = self.signals.task_postrun.send(&invocation);
        self.current.lock().unwrap().remove(&thread);

        let result = outcome?;
        postrun?;
        Ok(result)
    }
}

impl TaskHost for TestWorker {
    fn signals(&self) -> &TaskSignals {
        &self.signals
    }

    fn current_task(&self) -> Option<TaskInvocation> {
        self.current.lock().unwrap().get(&thread::current().id()).cloned()
    }
}

/// Context generator recording which thread built the context.
pub fn thread_tag() -> Result<Value, faultline::GeneratorError> {
    Ok(Value::String(format!("{:?}", thread::current().id())))
}

pub fn current_thread_tag() -> String {
    format!("{:?}", thread::current().id())
}
