//! `services` extension - service definitions declared in configuration
//!
//! ```text
//! services:
//!   logger: Logger                       # factory shorthand
//!   db: "@connections::primary"          # method on another service
//!   mailer:
//!     factory: Mailer
//!     arguments: { host: "%mail.host%" }
//!     setup: [ { method: set_logger, arguments: ["@logger"] } ]
//!     tags: [ run ]
//!   storage: { implement: Storage, type: LocalStorage }
//!   database: { alias: db }
//! ```
//!
//! A list instead of a map declares anonymous services named
//! `services.01`, `services.02`, ...

use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::parameters::json_kind;
use autowire_domain::value_objects::suggestion;
use autowire_domain::{Argument, Arguments, Reference, ServiceDefinition, SetupCall, Statement};
use serde_json::{Map, Value};
use tracing::debug;

use crate::builder::ContainerBuilder;
use crate::extension::{CompilerContext, Extension};
use crate::schema::Schema;

const KEYS: [&str; 9] = [
    "alias",
    "arguments",
    "autowired",
    "factory",
    "implement",
    "setup",
    "shared",
    "tags",
    "type",
];

/// Registers services from its configuration section
#[derive(Debug, Default)]
pub struct ServicesExtension;

impl ServicesExtension {
    /// Create the extension
    pub fn new() -> Self {
        Self
    }
}

impl Extension for ServicesExtension {
    fn config_schema(&self) -> Schema {
        Schema::AnyOf(vec![Schema::map(Schema::Any), Schema::list(Schema::Any)])
    }

    fn load_configuration(&mut self, context: &mut CompilerContext<'_>) -> Result<()> {
        let entries: Vec<(String, Value)> = match context.config() {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, v)| (context.prefix(&format!("{:02}", index + 1)), v.clone()))
                .collect(),
            _ => Vec::new(),
        };

        for (name, value) in entries {
            debug!(service = %name, "Loading service definition");
            load_definition(context.builder_mut(), &name, &value)
                .map_err(|error| error.in_context(format!("Service '{name}'")))?;
        }
        Ok(())
    }
}

/// Add or alter one service from its configuration value
pub fn load_definition(builder: &mut ContainerBuilder, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::String(_) | Value::Object(_) if is_statement_object(value) => {
            let factory = parse_statement(value)?;
            definition_for(builder, name)?.set_factory(factory);
            Ok(())
        }
        Value::Object(map) => load_structured(builder, name, map),
        other => Err(Error::configuration(format!(
            "Service definition must be a string or a map, {} given",
            json_kind(other)
        ))),
    }
}

fn is_statement_object(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(map) => map.contains_key("factory") && map.keys().all(|k| k == "factory" || k == "arguments"),
        _ => false,
    }
}

fn definition_for<'b>(builder: &'b mut ContainerBuilder, name: &str) -> Result<&'b mut ServiceDefinition> {
    if builder.get_definition(name).is_ok() {
        builder.get_definition_mut(name)
    } else {
        builder.add_definition(name)
    }
}

fn load_structured(builder: &mut ContainerBuilder, name: &str, map: &Map<String, Value>) -> Result<()> {
    if let Some(unknown) = map.keys().find(|key| !KEYS.contains(&key.as_str())) {
        let hint = suggestion::hint(KEYS, unknown);
        return Err(Error::configuration(format!(
            "Unknown key '{unknown}' in definition.{}",
            hint.map(|h| format!(" {h}")).unwrap_or_default()
        )));
    }

    if let Some(target) = map.get("alias") {
        if map.len() > 1 {
            return Err(Error::configuration("An alias cannot declare anything else."));
        }
        let target = target
            .as_str()
            .map(|t| t.trim_start_matches('@'))
            .ok_or_else(|| Error::configuration("Alias target must be a service name."))?;
        return builder.add_alias(name, target);
    }

    if let Some(interface) = map.get("implement") {
        let interface = interface
            .as_str()
            .ok_or_else(|| Error::configuration("'implement' must name an interface."))?;
        let binding = builder.add_interface_definition(name)?;
        binding.set_interface(interface);
        if let Some(tags) = map.get("tags") {
            for (tag, attributes) in parse_tags(tags)? {
                binding.add_tag(tag, attributes);
            }
        }
        if let Some(autowired) = map.get("autowired") {
            binding.set_autowired(parse_bool("autowired", autowired)?);
        }
        return apply(binding.result_mut(), map, false);
    }

    apply(definition_for(builder, name)?, map, true)
}

fn apply(definition: &mut ServiceDefinition, map: &Map<String, Value>, with_flags: bool) -> Result<()> {
    if let Some(type_name) = map.get("type") {
        let type_name = type_name
            .as_str()
            .ok_or_else(|| Error::configuration("'type' must be a type name."))?;
        definition.set_type(type_name);
    }
    if let Some(factory) = map.get("factory") {
        definition.set_factory(parse_statement(factory)?);
    }
    if let Some(arguments) = map.get("arguments") {
        definition.set_arguments(parse_arguments(arguments)?);
    }
    if let Some(setup) = map.get("setup") {
        definition.set_setup(parse_setup(setup)?);
    }
    if !with_flags {
        return Ok(());
    }
    if let Some(tags) = map.get("tags") {
        for (tag, attributes) in parse_tags(tags)? {
            definition.add_tag(tag, attributes);
        }
    }
    if let Some(autowired) = map.get("autowired") {
        definition.set_autowired(parse_bool("autowired", autowired)?);
    }
    if let Some(shared) = map.get("shared") {
        definition.set_shared(parse_bool("shared", shared)?);
    }
    Ok(())
}

/// Parse `"Class"`, `"Class::method"`, `"@service::method"` or
/// `{ factory: ..., arguments: ... }`
pub fn parse_statement(value: &Value) -> Result<Statement> {
    match value {
        Value::String(text) if !text.is_empty() => Ok(Statement::from(text.as_str())),
        Value::Object(map) => {
            let factory = map
                .get("factory")
                .ok_or_else(|| Error::configuration("Inline statement needs a 'factory'."))?;
            let mut statement = parse_statement(factory)?;
            if let Some(arguments) = map.get("arguments") {
                statement.arguments = parse_arguments(arguments)?;
            }
            Ok(statement)
        }
        other => Err(Error::configuration(format!(
            "Factory must be a non-empty string or a statement, {} given",
            json_kind(other)
        ))),
    }
}

/// Parse a list (positional) or map (named) of arguments
pub fn parse_arguments(value: &Value) -> Result<Arguments> {
    match value {
        Value::Null => Ok(Arguments::new()),
        Value::Array(items) => items
            .iter()
            .map(parse_argument)
            .collect::<Result<Vec<_>>>()
            .map(Arguments::positional),
        Value::Object(map) => {
            let mut arguments = Arguments::new();
            for (name, item) in map {
                arguments.named.insert(name.clone(), parse_argument(item)?);
            }
            Ok(arguments)
        }
        other => Err(Error::configuration(format!(
            "Arguments must be a list or a map, {} given",
            json_kind(other)
        ))),
    }
}

/// Parse one argument: `"@ref"`, an inline statement, a list or a literal
pub fn parse_argument(value: &Value) -> Result<Argument> {
    match value {
        Value::String(text) => Ok(Reference::parse(text)
            .map(Argument::Reference)
            .unwrap_or_else(|| Argument::Value(value.clone()))),
        Value::Object(map) if map.contains_key("factory") => parse_statement(value).map(Argument::from),
        Value::Array(items) => items
            .iter()
            .map(parse_argument)
            .collect::<Result<Vec<_>>>()
            .map(Argument::List),
        other => Ok(Argument::Value(other.clone())),
    }
}

fn parse_setup(value: &Value) -> Result<Vec<SetupCall>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::configuration("'setup' must be a list."))?;
    items
        .iter()
        .map(|item| match item {
            Value::String(method) => Ok(SetupCall::new(method.as_str())),
            Value::Object(map) => {
                let method = map
                    .get("method")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::configuration("Setup call needs a 'method'."))?;
                let mut call = SetupCall::new(method);
                if let Some(arguments) = map.get("arguments") {
                    call.arguments = parse_arguments(arguments)?;
                }
                Ok(call)
            }
            other => Err(Error::configuration(format!(
                "Setup call must be a method name or a map, {} given",
                json_kind(other)
            ))),
        })
        .collect()
}

fn parse_tags(value: &Value) -> Result<Vec<(String, Value)>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|tag| (tag.to_string(), Value::Bool(true)))
                    .ok_or_else(|| Error::configuration("Tag names must be strings."))
            })
            .collect(),
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        other => Err(Error::configuration(format!(
            "'tags' must be a list or a map, {} given",
            json_kind(other)
        ))),
    }
}

fn parse_bool(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::configuration(format!("'{key}' must be a bool, {} given", json_kind(value))))
}
