//! Rust source rendering of a generated container
//!
//! The rendered module declares one `create_service_*` function per service
//! and a `container()` function assembling the plan, so a build script can
//! compile the container ahead of time and `include!` it:
//!
//! ```text
//! include!(concat!(env!("OUT_DIR"), "/container.rs"));
//! let plan = generated_container::container()?;
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;

use autowire_domain::error::Result;
use heck::ToSnakeCase;
use serde_json::Value;

use super::plan::{Expr, GeneratedContainer, ServiceMethod, SetupStep};

const INDENT: &str = "    ";

/// Render the container as a Rust module
pub fn render(container: &GeneratedContainer) -> Result<String> {
    let mut out = String::new();
    let module = container.class_name.to_snake_case();

    line(&mut out, 0, "// @generated by autowire. Do not edit.");
    line(&mut out, 0, "");
    line(&mut out, 0, &format!("/// Compiled container `{}`", container.class_name));
    line(&mut out, 0, "#[allow(clippy::all, unused_imports)]");
    line(&mut out, 0, &format!("pub mod {module} {{"));
    line(&mut out, 1, "use std::collections::BTreeMap;");
    line(&mut out, 0, "");
    line(&mut out, 1, "use autowire::generator::{ContainerMetadata, Expr, GeneratedContainer, ServiceMethod, SetupStep};");
    line(&mut out, 1, "use autowire::{Parameters, Result, WiringTable};");
    line(&mut out, 1, "use autowire::serde_json::json;");

    for method in container.methods.values() {
        line(&mut out, 0, "");
        render_method(&mut out, method);
    }

    line(&mut out, 0, "");
    line(&mut out, 1, "/// Assemble the container plan");
    line(&mut out, 1, "pub fn container() -> Result<GeneratedContainer> {");
    line(&mut out, 2, "let mut wiring = WiringTable::new();");
    for (type_name, entry) in container.metadata.wiring.types() {
        for service in &entry.autowired {
            line(&mut out, 2, &format!("wiring.add({type_name:?}, {service:?}, true);"));
        }
        for service in &entry.other {
            line(&mut out, 2, &format!("wiring.add({type_name:?}, {service:?}, false);"));
        }
    }
    line(&mut out, 2, "Ok(GeneratedContainer {");
    line(&mut out, 3, &format!("class_name: {:?}.to_string(),", container.class_name));
    line(
        &mut out,
        3,
        &format!("parameters: Parameters::from_value({})?,", json(&container.parameters.to_value())),
    );
    line(&mut out, 3, "methods: BTreeMap::from([");
    for (service, method) in &container.methods {
        line(&mut out, 4, &format!("({service:?}.to_string(), {}()),", method.name));
    }
    line(&mut out, 3, "]),");
    line(&mut out, 3, "metadata: ContainerMetadata {");
    line(&mut out, 4, &format!("types: {},", string_map(&container.metadata.types)));
    line(&mut out, 4, "tags: BTreeMap::from([");
    for (tag, services) in &container.metadata.tags {
        let mut entries = Vec::with_capacity(services.len());
        for (service, value) in services {
            entries.push(format!("({service:?}.to_string(), {})", json(value)));
        }
        line(
            &mut out,
            5,
            &format!("({tag:?}.to_string(), BTreeMap::from([{}])),", entries.join(", ")),
        );
    }
    line(&mut out, 4, "]),");
    line(&mut out, 4, "wiring,");
    line(&mut out, 4, &format!("aliases: {},", string_map(&container.metadata.aliases)));
    line(&mut out, 3, "},");
    line(&mut out, 3, "initialize: vec![");
    for statement in &container.initialize {
        line(&mut out, 4, &format!("{},", expr(statement)));
    }
    line(&mut out, 3, "],");
    line(&mut out, 2, "})");
    line(&mut out, 1, "}");
    line(&mut out, 0, "}");
    Ok(out)
}

fn render_method(out: &mut String, method: &ServiceMethod) {
    line(out, 1, &format!("/// Service `{}` of type `{}`", method.service, method.type_name));
    line(out, 1, &format!("pub fn {}() -> ServiceMethod {{", method.name));
    line(out, 2, "ServiceMethod {");
    line(out, 3, &format!("name: {:?}.to_string(),", method.name));
    line(out, 3, &format!("service: {:?}.to_string(),", method.service));
    line(out, 3, &format!("type_name: {:?}.to_string(),", method.type_name));
    line(out, 3, &format!("class: {:?}.to_string(),", method.class));
    line(out, 3, &format!("shared: {},", method.shared));
    line(out, 3, &format!("create: {},", expr(&method.create)));
    line(out, 3, "setup: vec![");
    for step in &method.setup {
        line(out, 4, &format!("{},", setup_step(step)));
    }
    line(out, 3, "],");
    line(out, 2, "}");
    line(out, 1, "}");
}

fn setup_step(step: &SetupStep) -> String {
    format!(
        "SetupStep {{ class: {:?}.to_string(), method: {:?}.to_string(), args: {} }}",
        step.class,
        step.method,
        exprs(&step.args)
    )
}

fn expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal { value } => format!("Expr::Literal {{ value: {} }}", json(value)),
        Expr::Service { name } => format!("Expr::Service {{ name: {name:?}.to_string() }}"),
        Expr::Container => "Expr::Container".to_string(),
        Expr::Construct { class, args } => format!(
            "Expr::Construct {{ class: {class:?}.to_string(), args: {} }}",
            exprs(args)
        ),
        Expr::StaticCall { class, method, args } => format!(
            "Expr::StaticCall {{ class: {class:?}.to_string(), method: {method:?}.to_string(), args: {} }}",
            exprs(args)
        ),
        Expr::FunctionCall { function, args } => format!(
            "Expr::FunctionCall {{ function: {function:?}.to_string(), args: {} }}",
            exprs(args)
        ),
        Expr::MethodCall {
            service,
            class,
            method,
            args,
        } => format!(
            "Expr::MethodCall {{ service: {service:?}.to_string(), class: {class:?}.to_string(), method: {method:?}.to_string(), args: {} }}",
            exprs(args)
        ),
        Expr::List { items } => format!("Expr::List {{ items: {} }}", exprs(items)),
    }
}

fn exprs(items: &[Expr]) -> String {
    let rendered: Vec<String> = items.iter().map(expr).collect();
    format!("vec![{}]", rendered.join(", "))
}

fn json(value: &Value) -> String {
    let mut out = String::new();
    json_tokens(&mut out, value);
    format!("json!({out})")
}

/// `json!` input for a value, strings and keys as Rust literals
fn json_tokens(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&number.to_string()),
        // Debug output of a str is a valid Rust string literal
        Value::String(text) => {
            let _ = write!(out, "{text:?}");
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                json_tokens(out, item);
            }
            out.push(']');
        }
        Value::Object(entries) => {
            out.push('{');
            for (index, (key, item)) in entries.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{key:?}: ");
                json_tokens(out, item);
            }
            out.push('}');
        }
    }
}

fn string_map(map: &BTreeMap<String, String>) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("({k:?}.to_string(), {v:?}.to_string())"))
        .collect();
    format!("BTreeMap::from([{}])", entries.join(", "))
}

fn line(out: &mut String, depth: usize, text: &str) {
    if text.is_empty() {
        out.push('\n');
        return;
    }
    // Writing to a String cannot fail
    let _ = writeln!(out, "{}{text}", INDENT.repeat(depth));
}
