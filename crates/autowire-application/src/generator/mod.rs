//! Code Generator - from the compiled registry to the generated container
//!
//! Every resolved definition becomes one [`ServiceMethod`] whose body is an
//! [`Expr`] tree. References to other services become container getter
//! calls, so sharing and cycle detection stay with the runtime container.
//!
//! | Definition | Expression |
//! |------------|------------|
//! | `Class(c)` | [`Expr::Construct`] |
//! | `Class::method` | [`Expr::StaticCall`] |
//! | `function` | [`Expr::FunctionCall`] |
//! | `@service::method` | [`Expr::MethodCall`] |
//! | `@service` | [`Expr::Service`] |
//!
//! Output is deterministic: services, tags and parameters are emitted in a
//! stable order, so compiling the same input twice renders byte-identical
//! source.

pub mod plan;
pub mod render;

use std::collections::BTreeMap;

use autowire_domain::constants::SERVICE_METHOD_PREFIX;
use autowire_domain::error::{Error, Result};
use autowire_domain::{Argument, Entity, Reference, ServiceDefinition, Statement, TypeCatalog};
use heck::ToSnakeCase;
use tracing::debug;

pub use plan::{ContainerMetadata, Expr, GeneratedContainer, ServiceMethod, SetupStep};
pub use render::render;

use crate::registry::CompiledRegistry;

/// Translates a compiled registry into a [`GeneratedContainer`]
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    class_name: String,
}

impl CodeGenerator {
    /// Create a generator for a container named `class_name`
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    /// Generate the container
    pub fn generate(&self, registry: &CompiledRegistry) -> Result<GeneratedContainer> {
        let catalog = registry.catalog();
        let mut methods = BTreeMap::new();
        let mut taken: BTreeMap<String, String> = BTreeMap::new();

        for (service, definition) in registry.definitions() {
            let name = method_name(service);
            if let Some(other) = taken.insert(name.clone(), service.clone()) {
                return Err(Error::configuration(format!(
                    "Services '{other}' and '{service}' both map to generated method {name}()."
                )));
            }
            let method = generate_method(catalog, registry, service, &name, definition)?;
            methods.insert(service.clone(), method);
        }

        debug!(class = %self.class_name, methods = methods.len(), "Container generated");
        Ok(GeneratedContainer {
            class_name: self.class_name.clone(),
            parameters: registry.parameters().clone(),
            methods,
            metadata: ContainerMetadata {
                types: registry.types(),
                tags: registry.tags(),
                wiring: registry.wiring().clone(),
                aliases: registry.aliases().clone(),
            },
            initialize: Vec::new(),
        })
    }
}

/// Generated method name of a service (`create_service_<snake_case>`)
pub fn method_name(service: &str) -> String {
    let sanitized: String = service
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let snake = sanitized.to_snake_case();
    if snake.is_empty() {
        SERVICE_METHOD_PREFIX.trim_end_matches('_').to_string()
    } else {
        format!("{SERVICE_METHOD_PREFIX}{snake}")
    }
}

fn generate_method(
    catalog: &TypeCatalog,
    registry: &CompiledRegistry,
    service: &str,
    name: &str,
    definition: &ServiceDefinition,
) -> Result<ServiceMethod> {
    let factory = definition
        .factory()
        .ok_or_else(|| Error::service_creation(service, "Unable to generate a factory: none was resolved."))?;
    let type_name = definition
        .type_name()
        .ok_or_else(|| Error::service_creation(service, "Unable to generate a factory: type is unknown."))?;

    let translator = Translator {
        catalog,
        registry,
        service,
    };
    let (create, class) = translator.statement(factory)?;

    let mut setup = Vec::with_capacity(definition.setup().len());
    for call in definition.setup() {
        let declaring = catalog
            .ancestors(&class)
            .into_iter()
            .find(|ancestor| catalog.get(ancestor).is_some_and(|info| info.setter_fn(&call.method).is_some()))
            .ok_or_else(|| {
                Error::service_creation(service, format!("Setup method {class}::{}() is not declared.", call.method))
            })?;
        let args = call
            .arguments
            .positional
            .iter()
            .map(|arg| translator.argument(arg))
            .collect::<Result<Vec<_>>>()?;
        setup.push(SetupStep {
            class: declaring,
            method: call.method.clone(),
            args,
        });
    }

    Ok(ServiceMethod {
        name: name.to_string(),
        service: service.to_string(),
        type_name: type_name.to_string(),
        class,
        shared: definition.is_shared(),
        create,
        setup,
    })
}

/// Turns resolved statements of one service into expressions
struct Translator<'a> {
    catalog: &'a TypeCatalog,
    registry: &'a CompiledRegistry,
    service: &'a str,
}

impl Translator<'_> {
    /// Expression for a statement together with the class it yields
    fn statement(&self, statement: &Statement) -> Result<(Expr, String)> {
        let args = || {
            statement
                .arguments
                .positional
                .iter()
                .map(|arg| self.argument(arg))
                .collect::<Result<Vec<_>>>()
        };

        match &statement.entity {
            Entity::Class(class) => {
                self.catalog
                    .get(class)
                    .and_then(|info| info.constructor_fn())
                    .ok_or_else(|| self.unresolvable(&statement.entity))?;
                Ok((
                    Expr::Construct {
                        class: class.clone(),
                        args: args()?,
                    },
                    class.clone(),
                ))
            }
            Entity::StaticMethod { class, method } => {
                let factory = self
                    .catalog
                    .get(class)
                    .and_then(|info| info.factory_fn(method))
                    .ok_or_else(|| self.unresolvable(&statement.entity))?;
                Ok((
                    Expr::StaticCall {
                        class: class.clone(),
                        method: method.clone(),
                        args: args()?,
                    },
                    factory.returns.clone(),
                ))
            }
            Entity::Function(function) => {
                let callable = self
                    .catalog
                    .function(function)
                    .ok_or_else(|| self.unresolvable(&statement.entity))?;
                Ok((
                    Expr::FunctionCall {
                        function: function.clone(),
                        args: args()?,
                    },
                    callable.returns.clone(),
                ))
            }
            Entity::ServiceMethod {
                service: Reference::Service(receiver),
                method,
            } => {
                let receiver_type = self
                    .registry
                    .definition(receiver)
                    .and_then(ServiceDefinition::type_name)
                    .ok_or_else(|| self.unresolvable(&statement.entity))?;
                let (class, found) = self
                    .catalog
                    .ancestors(receiver_type)
                    .into_iter()
                    .find_map(|ancestor| {
                        let found = self.catalog.get(&ancestor)?.method_fn(method)?;
                        Some((ancestor, found))
                    })
                    .ok_or_else(|| self.unresolvable(&statement.entity))?;
                Ok((
                    Expr::MethodCall {
                        service: receiver.clone(),
                        class,
                        method: method.clone(),
                        args: args()?,
                    },
                    found.returns.clone(),
                ))
            }
            Entity::Reference(Reference::Service(target)) => {
                let target_type = self
                    .registry
                    .definition(target)
                    .and_then(ServiceDefinition::type_name)
                    .ok_or_else(|| self.unresolvable(&statement.entity))?;
                Ok((Expr::service(target.as_str()), target_type.to_string()))
            }
            other => Err(self.unresolvable(other)),
        }
    }

    fn argument(&self, argument: &Argument) -> Result<Expr> {
        match argument {
            Argument::Value(value) => Ok(Expr::literal(value.clone())),
            Argument::Reference(Reference::Service(name)) => Ok(Expr::service(name.as_str())),
            Argument::Reference(Reference::Container) => Ok(Expr::Container),
            Argument::Reference(Reference::This) => Err(Error::configuration(format!(
                "Service '{}' cannot receive itself (@self) as a setup argument.",
                self.service
            ))),
            Argument::Reference(reference) => Err(Error::service_creation(
                self.service,
                format!("Unresolved reference {reference:?} in generated code."),
            )),
            Argument::Statement(statement) => self.statement(statement).map(|(expr, _)| expr),
            Argument::List(items) => items
                .iter()
                .map(|item| self.argument(item))
                .collect::<Result<Vec<_>>>()
                .map(|items| Expr::List { items }),
        }
    }

    fn unresolvable(&self, entity: &Entity) -> Error {
        Error::service_creation(
            self.service,
            format!("Unable to generate a factory for {}.", entity.describe()),
        )
    }
}
