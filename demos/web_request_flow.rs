//! Web request flow demonstration.
//!
//! This example shows how a web framework hooks into faultline:
//! 1. Expose lifecycle signals and the in-flight request
//! 2. Install the extension with context generators
//! 3. Dispatch requests, one plain route and one under a blueprint
//! 4. Inspect the notices the failing handlers produced
//!
//! Run with: `cargo run --example web_request_flow`

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use faultline::web::{RequestState, ViewMeta, WebExtension, WebHost, WebSignals};
use faultline::{ContextGenerators, Fault, MemoryTransport};

type Handler = fn(&RequestState) -> Result<String, Fault>;

/// Simulates a tiny framework that routes by path
struct MiniApp {
    signals: WebSignals,
    routes: BTreeMap<&'static str, (ViewMeta, Handler)>,
    current: Mutex<Option<RequestState>>,
}

impl MiniApp {
    fn new() -> Self {
        let mut routes: BTreeMap<&'static str, (ViewMeta, Handler)> = BTreeMap::new();
        routes.insert(
            "/error",
            (ViewMeta::function("demo.views", "error"), divide_by_zero as Handler),
        );
        routes.insert(
            "/blueprint/error",
            (
                ViewMeta::function("demo.admin", "error").in_blueprint("admin"),
                divide_by_zero as Handler,
            ),
        );
        Self {
            signals: WebSignals::new(),
            routes,
            current: Mutex::new(None),
        }
    }

    /// Simulates dispatching `GET <target>` with an optional form body
    fn dispatch(&self, target: &str, form: &[(&str, &str)]) -> Result<u16, faultline::Error> {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let Some((view, handler)) = self.routes.get(path) else {
            return Ok(404);
        };

        let mut request = RequestState::new(format!("http://localhost{}", target));
        request.set_view(view.clone());
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            request.add_query_param(key, value);
        }
        for (key, value) in form {
            request.add_form_field(*key, *value);
        }
        request.add_header("Host", "localhost");
        request.add_header("Authorization", "Bearer demo-token");
        request.set_session_value("user_id", 7);

        *self.current.lock().unwrap() = Some(request.clone());
        let outcome = self.signals.request_started.send(&request).and_then(|()| {
            match handler(&request) {
                Ok(_) => Ok(200),
                Err(fault) => self.signals.got_request_exception.send(&fault).map(|()| 500),
            }
        });
        let teardown = self.signals.request_tearing_down.send(&request);
        *self.current.lock().unwrap() = None;

        teardown?;
        outcome
    }
}

impl WebHost for MiniApp {
    fn signals(&self) -> &WebSignals {
        &self.signals
    }

    fn current_request(&self) -> Option<RequestState> {
        self.current.lock().unwrap().clone()
    }
}

fn divide_by_zero(_request: &RequestState) -> Result<String, Fault> {
    Err(Fault::new("ZeroDivisionError", "division by zero")
        .with_cause("denominator came from the query string"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();
    println!("=== Web Request Flow Example ===");

    // Step 1: The framework exposes its signals
    let app = Arc::new(MiniApp::new());
    let transport = Arc::new(MemoryTransport::new());
    println!("1. Created app with {} routes", app.routes.len());

    // Step 2: Install error reporting
    let mut config = BTreeMap::new();
    config.insert("FAULTLINE_API_KEY".to_string(), "demo-key".to_string());
    config.insert("FAULTLINE_ENVIRONMENT".to_string(), "demo".to_string());
    let mut extension = WebExtension::new(app.clone(), transport.clone());
    let generators = ContextGenerators::new().with("ringbearer", || Ok("frodo"));
    let client = extension.install(&config, generators, true);
    println!("2. ✓ Installed (environment: {:?})", client.environment());

    // Step 3: Dispatch failing requests
    println!("\n--- Plain route ---");
    let status = app.dispatch("/error?a=1&b=2&b=3", &[("password", "hunter2")])?;
    println!("3. GET /error → {}", status);

    println!("\n--- Blueprint route ---");
    let status = app.dispatch("/blueprint/error", &[])?;
    println!("3. GET /blueprint/error → {}", status);

    // Step 4: Inspect what was reported
    println!("\n--- Reported notices ---");
    for notice in transport.notices() {
        println!(
            "  {} in {} ({})",
            notice.error, notice.request.component, notice.request.action
        );
        println!("{}", serde_json::to_string_pretty(&notice)?);
    }

    extension.teardown();
    println!("\n=== Key Takeaways ===");
    println!("1. Generators run at request start, context clears at teardown");
    println!("2. Filtered params and session values read [FILTERED]");
    println!("3. Authorization headers never leave the process");
    println!("4. Blueprint routes report a qualified action");
    Ok(())
}
