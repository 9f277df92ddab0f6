//! Tests for the compiler phase pipeline and the built-in extensions

use std::sync::{Arc, Mutex};

use autowire_application::{
    ClassSkeleton, Compiler, CompilerContext, DiExtension, Expr, Extension, SearchExtension,
    ServicesExtension,
};
use autowire_domain::Result;
use serde_json::json;

use crate::fixtures::builder;

fn compiler() -> Compiler {
    let mut compiler = Compiler::new(builder());
    compiler
        .add_extension("services", ServicesExtension::new())
        .expect("services")
        .add_extension("di", DiExtension::new())
        .expect("di")
        .add_extension("search", SearchExtension::new())
        .expect("search");
    compiler
}

#[test]
fn test_services_from_configuration() {
    let mut compiler = compiler();
    compiler
        .add_config(json!({
            "parameters": { "mail": { "host": "smtp.local" } },
            "services": {
                "logger": "Logger",
                "app": { "factory": "App", "tags": ["run"] },
                "mailer": { "factory": "Mailer", "arguments": { "host": "%mail.host%" }, "setup": ["set_logger"] },
                "log": { "alias": "logger" }
            }
        }))
        .expect("config");

    let container = compiler.compile().expect("compile");
    assert_eq!(
        container.methods.keys().cloned().collect::<Vec<_>>(),
        vec!["app", "logger", "mailer"]
    );
    assert_eq!(container.metadata.aliases.get("log").map(String::as_str), Some("logger"));
    assert_eq!(container.initialize, vec![Expr::service("app")]);

    let mailer = &container.methods["mailer"];
    assert_eq!(
        mailer.create,
        Expr::Construct {
            class: "Mailer".to_string(),
            args: vec![Expr::literal("smtp.local"), Expr::literal(25)],
        }
    );
    assert_eq!(mailer.setup[0].args, vec![Expr::service("logger")]);
}

#[test]
fn test_unknown_section_is_suggested() {
    let mut compiler = compiler();
    compiler.add_config(json!({ "servics": {} })).expect("config");
    let error = compiler.compile().expect_err("unknown section");
    assert_eq!(
        error.to_string(),
        "Configuration error: Found section 'servics' in configuration, but corresponding extension is missing. Did you mean 'services'?"
    );
}

#[test]
fn test_extension_names_are_unique_and_not_reserved() {
    let mut compiler = compiler();
    assert!(compiler.add_extension("services", ServicesExtension::new()).is_err());
    assert!(compiler.add_extension("parameters", DiExtension::new()).is_err());
}

#[test]
fn test_errors_name_extension_and_service() {
    let mut compiler = compiler();
    compiler
        .add_config(json!({ "services": { "app": { "factory": "App", "tgas": [] } } }))
        .expect("config");
    let error = compiler.compile().expect_err("unknown key");
    let message = error.to_string();
    assert!(message.starts_with("Extension 'services': Service 'app': "), "{message}");
    assert!(message.contains("Did you mean 'tags'?"), "{message}");
}

#[test]
fn test_search_registers_matching_classes() {
    let mut compiler = compiler();
    compiler
        .add_config(json!({
            "services": { "memory": "MemoryCache" },
            "search": { "caches": { "implements": ["Cache"], "tags": ["cache"] } }
        }))
        .expect("config");

    let container = compiler.compile().expect("compile");
    assert!(container.methods.contains_key("search.caches.RedisCache"));
    assert!(
        !container.methods.contains_key("search.caches.MemoryCache"),
        "already registered classes are skipped"
    );
    assert_eq!(
        container.metadata.tags["cache"].keys().cloned().collect::<Vec<_>>(),
        vec!["search.caches.RedisCache"]
    );
}

#[test]
fn test_eager_services_must_exist() {
    let mut compiler = compiler();
    compiler.add_config(json!({ "di": { "eager": ["ghost"] } })).expect("config");
    let error = compiler.compile().expect_err("missing eager service");
    assert!(error.to_string().contains("Service 'ghost' not found."), "{error}");
}

/// Records the phases it takes part in
struct Recorder {
    phases: Arc<Mutex<Vec<String>>>,
}

impl Extension for Recorder {
    fn load_configuration(&mut self, context: &mut CompilerContext<'_>) -> Result<()> {
        self.record("load");
        let name = context.prefix("logger");
        context.builder_mut().register(name, "Logger");
        Ok(())
    }

    fn before_compile(&mut self, context: &mut CompilerContext<'_>) -> Result<()> {
        self.record(&format!("before:{}", context.builder().find_by_type("Logger").join(",")));
        Ok(())
    }

    fn after_compile(&mut self, skeleton: &mut ClassSkeleton<'_>) -> Result<()> {
        self.record(&format!("after:{}", skeleton.services().join(",")));
        skeleton.add_initializer(Expr::service("recorder.logger"));
        Ok(())
    }
}

impl Recorder {
    fn record(&self, phase: &str) {
        if let Ok(mut phases) = self.phases.lock() {
            phases.push(phase.to_string());
        }
    }
}

#[test]
fn test_phases_run_in_order() {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let mut compiler = Compiler::new(builder());
    compiler
        .add_extension("recorder", Recorder { phases: Arc::clone(&phases) })
        .expect("recorder");

    let container = compiler.compile().expect("compile");
    assert_eq!(container.initialize, vec![Expr::service("recorder.logger")]);
    let phases = phases.lock().expect("lock").clone();
    assert_eq!(
        phases,
        vec!["load", "before:recorder.logger", "after:recorder.logger"]
    );
}

#[test]
fn test_di_debug_becomes_a_parameter() {
    let mut debug = compiler();
    debug.add_config(json!({ "di": { "debug": true } })).expect("config");
    let container = debug.compile().expect("compile");
    assert_eq!(container.parameters.get("debug").ok(), Some(&json!(true)));

    let mut explicit = compiler();
    explicit
        .add_config(json!({ "parameters": { "debug": "verbose" }, "di": { "debug": true } }))
        .expect("config");
    let container = explicit.compile().expect("compile");
    assert_eq!(container.parameters.get("debug").ok(), Some(&json!("verbose")));
}
