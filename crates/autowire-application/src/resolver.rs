//! Resolver - type inference and definition completion
//!
//! Two jobs, both read-only over a [`ContainerBuilder`]:
//!
//! 1. **Type inference** feeds the wiring graph. A service's type is its
//!    declared type, or else the return type of its factory entity.
//! 2. **Completion** turns every definition into its frozen form: the
//!    factory entity is normalised, references point at canonical names,
//!    parameters are expanded and every declared parameter receives exactly
//!    one positional argument.
//!
//! | Entity | Normalised to | Type |
//! |--------|---------------|------|
//! | `Class("")` | `Class(<declared type>)` | the class |
//! | `Class(f)` where `f` is a catalog function | `Function(f)` | declared return |
//! | `Class::method` | static factory | declared return |
//! | `@service::method` | method on the canonical service | declared return |
//! | `@name` | canonical service, or the autowired service of type `name` | the service's type |

use std::collections::BTreeMap;
use std::sync::Arc;

use autowire_domain::catalog::{ClassKind, Method, Parameter, Setter};
use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::suggestion;
use autowire_domain::{
    Argument, Arguments, Callable, Entity, InterfaceDefinition, Parameters, Reference, ServiceDefinition,
    SetupCall, Statement, TypeCatalog, WiringTable,
};
use serde_json::Value;
use tracing::trace;

use crate::autowiring::{Resolved, TypeLookup, autowire_arguments};
use crate::builder::ContainerBuilder;
use crate::registry::CompiledRegistry;

impl TypeLookup for ContainerBuilder {
    fn resolve_type(&self, type_name: &str) -> Result<String> {
        self.resolve_by_type(type_name)
    }

    fn autowired_of(&self, type_name: &str) -> Vec<String> {
        self.find_autowired(type_name)
    }
}

/// Where an argument appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Factory arguments, evaluated before the service exists
    Factory,
    /// Setup arguments, evaluated on the constructed service
    Setup,
}

/// Per-definition completion state
struct Scope<'s> {
    current: &'s str,
    position: Position,
    parameters: &'s Parameters,
}

/// Read-only resolver over a builder
pub struct Resolver<'a> {
    builder: &'a ContainerBuilder,
    catalog: &'a TypeCatalog,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the builder's current definitions
    pub fn new(builder: &'a ContainerBuilder) -> Self {
        Self {
            builder,
            catalog: builder.catalog().as_ref(),
        }
    }

    // ========================================================================
    // Type inference
    // ========================================================================

    /// Index every service whose type can be inferred under that type and
    /// all of its ancestors
    ///
    /// Services whose type cannot be inferred yet are left out; completion
    /// reports them.
    pub fn build_wiring(&self) -> WiringTable {
        let mut wiring = WiringTable::new();
        for (name, definition) in self.builder.definition_map() {
            match self.service_type(name) {
                Ok(type_name) => self.index(&mut wiring, name, &type_name, definition.is_autowired()),
                Err(error) => trace!(service = %name, error = %error, "Type not inferred"),
            }
        }
        for (name, definition) in self.builder.interface_map() {
            match self.service_type(name) {
                Ok(type_name) => self.index(&mut wiring, name, &type_name, definition.is_autowired()),
                Err(error) => trace!(service = %name, error = %error, "Type not inferred"),
            }
        }
        wiring
    }

    fn index(&self, wiring: &mut WiringTable, service: &str, type_name: &str, autowired: bool) {
        for ancestor in self.catalog.ancestors(type_name) {
            wiring.add(&ancestor, service, autowired);
        }
    }

    /// Type of a service (or alias)
    pub fn service_type(&self, name: &str) -> Result<String> {
        self.service_type_in(name, &mut Vec::new())
    }

    fn service_type_in(&self, name: &str, chain: &mut Vec<String>) -> Result<String> {
        let name = self.builder.resolve_alias(name);
        if chain.iter().any(|seen| seen == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(Error::circular_reference(cycle));
        }
        chain.push(name.to_string());
        let result = if let Some(definition) = self.builder.definition_map().get(name) {
            self.definition_type(definition, chain)
        } else if let Some(binding) = self.builder.interface_map().get(name) {
            self.interface_type(binding, chain)
        } else {
            Err(self.builder.missing_service(name))
        };
        chain.pop();
        result
    }

    fn definition_type(&self, definition: &ServiceDefinition, chain: &mut Vec<String>) -> Result<String> {
        if let Some(declared) = definition.type_name() {
            return Ok(declared.to_string());
        }
        match definition.factory() {
            Some(factory) => self.entity_type(&factory.entity, definition.name(), chain),
            None => Err(Error::service_creation(
                definition.name(),
                "Neither a factory nor a type was declared.",
            )),
        }
    }

    fn interface_type(&self, binding: &InterfaceDefinition, chain: &mut Vec<String>) -> Result<String> {
        let interface = binding.interface().ok_or_else(|| {
            Error::configuration(format!(
                "Interface definition '{}' does not name an interface.",
                binding.name()
            ))
        })?;
        let result = binding.result();
        if result.factory().is_some() || result.type_name().is_some() {
            return self.definition_type(result, chain);
        }

        let implementors: Vec<&str> = self
            .catalog
            .type_names()
            .filter(|name| *name != interface)
            .filter(|name| self.catalog.get(name).is_some_and(|info| info.is_instantiable()))
            .filter(|name| self.catalog.is_a(name, interface))
            .collect();
        match implementors.as_slice() {
            [single] => Ok((*single).to_string()),
            [] => Err(Error::service_creation(
                binding.name(),
                format!("No instantiable type implements {interface}."),
            )),
            many => Err(Error::service_creation(
                binding.name(),
                format!(
                    "Multiple types implement {interface}: {}. Declare the result type.",
                    many.join(", ")
                ),
            )),
        }
    }

    fn entity_type(&self, entity: &Entity, current: &str, chain: &mut Vec<String>) -> Result<String> {
        match entity {
            Entity::Class(class) if class.is_empty() => Err(Error::service_creation(
                current,
                "Neither a factory nor a type was declared.",
            )),
            Entity::Class(class) => {
                if self.catalog.contains(class) {
                    Ok(class.clone())
                } else if let Some(function) = self.catalog.function(class) {
                    Ok(function.returns.clone())
                } else {
                    Err(self.unknown_class(class))
                }
            }
            Entity::StaticMethod { class, method } => self
                .static_factory(current, class, method)
                .map(|factory| factory.returns.clone()),
            Entity::Function(function) => self
                .function(current, function)
                .map(|function| function.returns.clone()),
            Entity::ServiceMethod { service, method } => {
                let receiver = self.reference_type(service, current, chain)?;
                self.instance_method(current, &receiver, method)
                    .map(|found| found.returns.clone())
            }
            Entity::Reference(reference) => self.reference_type(reference, current, chain),
        }
    }

    fn reference_type(&self, reference: &Reference, current: &str, chain: &mut Vec<String>) -> Result<String> {
        match reference {
            Reference::Service(name) if self.builder.has_definition(name) => {
                self.service_type_in(name, chain)
            }
            Reference::Service(name) if self.catalog.contains(name) => Ok(name.clone()),
            Reference::Service(name) => Err(self.builder.missing_service(name)),
            Reference::Type(type_name) => Ok(type_name.clone()),
            Reference::This | Reference::Container => Err(Error::service_creation(
                current,
                "Only services can be used as a factory.",
            )),
        }
    }

    // ========================================================================
    // Catalog lookups
    // ========================================================================

    fn unknown_class(&self, class: &str) -> Error {
        let candidates = self.catalog.type_names().chain(self.catalog.function_names());
        match suggestion::hint(candidates, class) {
            Some(hint) => Error::configuration(format!("Type '{class}' not found in the type catalog. {hint}")),
            None => Error::type_not_found(class),
        }
    }

    fn static_factory(&self, current: &str, class: &str, method: &str) -> Result<&'a Callable> {
        let info = self.catalog.get(class).ok_or_else(|| self.unknown_class(class))?;
        info.factory_fn(method).ok_or_else(|| {
            Error::service_creation(current, format!("Static factory {class}::{method}() is not declared."))
        })
    }

    fn function(&self, current: &str, function: &str) -> Result<&'a Callable> {
        self.catalog.function(function).ok_or_else(|| {
            let hint = suggestion::hint(self.catalog.function_names(), function);
            Error::service_creation(
                current,
                format!(
                    "Function {function}() is not declared.{}",
                    hint.map(|h| format!(" {h}")).unwrap_or_default()
                ),
            )
        })
    }

    fn instance_method(&self, current: &str, class: &str, method: &str) -> Result<&'a Method> {
        self.catalog
            .ancestors(class)
            .iter()
            .find_map(|ancestor| self.catalog.get(ancestor)?.method_fn(method))
            .ok_or_else(|| {
                Error::service_creation(current, format!("Method {class}::{method}() is not declared."))
            })
    }

    fn setter(&self, current: &str, class: &str, method: &str) -> Result<&'a Setter> {
        self.catalog
            .ancestors(class)
            .iter()
            .find_map(|ancestor| self.catalog.get(ancestor)?.setter_fn(method))
            .ok_or_else(|| {
                Error::service_creation(
                    current,
                    format!("Setup method {class}::{method}() is not declared."),
                )
            })
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Complete every definition and produce the frozen registry
    pub fn complete(&self) -> Result<CompiledRegistry> {
        let parameters = self.builder.parameters().resolved()?;
        let wiring = self.builder.wiring().clone();

        let mut aliases = BTreeMap::new();
        for alias in self.builder.aliases().keys() {
            let target = self.builder.resolve_alias(alias);
            if !self.builder.has_definition(target) {
                return Err(self
                    .builder
                    .missing_service(target)
                    .in_context(format!("Alias '{alias}'")));
            }
            aliases.insert(alias.clone(), target.to_string());
        }

        let mut definitions = BTreeMap::new();
        for (name, definition) in self.builder.definition_map() {
            let completed = self
                .complete_definition(definition, &parameters)
                .map_err(|error| within(name, error))?;
            definitions.insert(name.clone(), completed);
        }
        for (name, binding) in self.builder.interface_map() {
            let completed = self
                .complete_interface(binding, &parameters)
                .map_err(|error| within(name, error))?;
            definitions.insert(name.clone(), completed);
        }

        Ok(CompiledRegistry::new(
            Arc::clone(self.builder.catalog()),
            definitions,
            aliases,
            parameters,
            wiring,
        ))
    }

    fn complete_interface(&self, binding: &InterfaceDefinition, parameters: &Parameters) -> Result<ServiceDefinition> {
        let concrete = self.service_type(binding.name())?;
        let interface = binding.interface().unwrap_or_default();
        if !self.catalog.is_a(&concrete, interface) {
            return Err(Error::service_creation(
                binding.name(),
                format!("{concrete} does not implement {interface}."),
            ));
        }
        let mut service = binding.clone().into_service(&concrete);
        if service.factory().is_none() {
            service.set_factory(Statement::class(concrete.as_str()));
        }
        self.complete_definition(&service, parameters)
    }

    fn complete_definition(&self, definition: &ServiceDefinition, parameters: &Parameters) -> Result<ServiceDefinition> {
        let name = definition.name();
        let declared = definition.type_name();
        let factory = match (definition.factory(), declared) {
            (Some(factory), Some(declared)) if matches!(&factory.entity, Entity::Class(c) if c.is_empty()) => {
                Statement {
                    entity: Entity::Class(declared.to_string()),
                    arguments: factory.arguments.clone(),
                }
            }
            (Some(factory), _) => factory.clone(),
            (None, Some(declared)) => Statement::class(declared),
            (None, None) => {
                return Err(Error::service_creation(
                    name,
                    "Neither a factory nor a type was declared.",
                ));
            }
        };

        let factory_scope = Scope {
            current: name,
            position: Position::Factory,
            parameters,
        };
        let (factory, factory_type) = self.complete_statement(&factory, &factory_scope)?;

        let type_name = match declared {
            Some(declared) if !self.catalog.is_a(&factory_type, declared) => {
                return Err(Error::service_creation(
                    name,
                    format!(
                        "Factory {} returns {factory_type}, which is not compatible with declared type {declared}.",
                        factory.entity.describe()
                    ),
                ));
            }
            Some(declared) => declared.to_string(),
            None => factory_type.clone(),
        };

        let setup_scope = Scope {
            current: name,
            position: Position::Setup,
            parameters,
        };
        let mut setup = Vec::with_capacity(definition.setup().len());
        for call in definition.setup() {
            let setter = self.setter(name, &factory_type, &call.method)?;
            let owner = format!("{factory_type}::{}()", call.method);
            let arguments = self.complete_arguments(&owner, &setter.params, &call.arguments, &setup_scope)?;
            setup.push(SetupCall {
                method: call.method.clone(),
                arguments: Arguments::positional(arguments),
            });
        }

        let mut completed = definition.clone();
        completed
            .set_factory(factory)
            .set_type(type_name)
            .set_setup(setup);
        Ok(completed)
    }

    /// Normalise and complete one call, returning it with its result type
    fn complete_statement(&self, statement: &Statement, scope: &Scope<'_>) -> Result<(Statement, String)> {
        let current = scope.current;
        match &statement.entity {
            Entity::Class(class) if class.is_empty() => Err(Error::service_creation(
                current,
                "A class or factory is required.",
            )),
            Entity::Class(class) => {
                if let Some(info) = self.catalog.get(class) {
                    let reason = match info.kind() {
                        ClassKind::Class => None,
                        ClassKind::Abstract => Some("it is abstract"),
                        ClassKind::Interface => Some("it is an interface"),
                    };
                    if let Some(reason) = reason {
                        return Err(Error::not_instantiable(class.as_str(), reason));
                    }
                    let constructor = info
                        .constructor_fn()
                        .ok_or_else(|| Error::not_instantiable(class.as_str(), "no constructor is declared"))?;
                    let owner = format!("{class}::new()");
                    let arguments = self.complete_arguments(&owner, &constructor.params, &statement.arguments, scope)?;
                    Ok((
                        Statement {
                            entity: Entity::Class(class.clone()),
                            arguments: Arguments::positional(arguments),
                        },
                        class.clone(),
                    ))
                } else if self.catalog.function(class).is_some() {
                    let normalised = Statement {
                        entity: Entity::Function(class.clone()),
                        arguments: statement.arguments.clone(),
                    };
                    self.complete_statement(&normalised, scope)
                } else {
                    Err(self.unknown_class(class))
                }
            }
            Entity::StaticMethod { class, method } => {
                let factory = self.static_factory(current, class, method)?;
                let owner = format!("{class}::{method}()");
                let arguments = self.complete_arguments(&owner, &factory.params, &statement.arguments, scope)?;
                Ok((
                    Statement {
                        entity: statement.entity.clone(),
                        arguments: Arguments::positional(arguments),
                    },
                    factory.returns.clone(),
                ))
            }
            Entity::Function(function) => {
                let callable = self.function(current, function)?;
                let owner = format!("{function}()");
                let arguments = self.complete_arguments(&owner, &callable.params, &statement.arguments, scope)?;
                Ok((
                    Statement {
                        entity: statement.entity.clone(),
                        arguments: Arguments::positional(arguments),
                    },
                    callable.returns.clone(),
                ))
            }
            Entity::ServiceMethod { service, method } => {
                let receiver = match self.normalize_reference(service, scope)? {
                    Reference::Service(name) => name,
                    _ => {
                        return Err(Error::service_creation(
                            current,
                            format!("Methods can only be called on services, {} given.", statement.entity.describe()),
                        ));
                    }
                };
                let receiver_type = self.service_type(&receiver)?;
                let found = self.instance_method(current, &receiver_type, method)?;
                let owner = format!("{receiver_type}::{method}()");
                let arguments = self.complete_arguments(&owner, &found.params, &statement.arguments, scope)?;
                Ok((
                    Statement {
                        entity: Entity::ServiceMethod {
                            service: Reference::Service(receiver),
                            method: method.clone(),
                        },
                        arguments: Arguments::positional(arguments),
                    },
                    found.returns.clone(),
                ))
            }
            Entity::Reference(reference) => {
                if !statement.arguments.is_empty() {
                    return Err(Error::service_creation(
                        current,
                        format!("Reference {} does not accept arguments.", statement.entity.describe()),
                    ));
                }
                match self.normalize_reference(reference, scope)? {
                    Reference::Service(target) => {
                        let target_type = self.service_type(&target)?;
                        Ok((Statement::reference(Reference::Service(target)), target_type))
                    }
                    _ => Err(Error::service_creation(
                        current,
                        format!("{} cannot be used as a factory.", statement.entity.describe()),
                    )),
                }
            }
        }
    }

    /// Canonical form of a reference: a service name, `@self` or `@container`
    fn normalize_reference(&self, reference: &Reference, scope: &Scope<'_>) -> Result<Reference> {
        match reference {
            Reference::Service(name) => {
                let canonical = self.builder.resolve_alias(name);
                if canonical == scope.current && scope.position == Position::Setup {
                    Ok(Reference::This)
                } else if self.builder.has_definition(canonical) {
                    Ok(Reference::Service(canonical.to_string()))
                } else if self.catalog.contains(name) || self.builder.wiring().entry(name).is_some() {
                    self.builder.resolve_type(name).map(Reference::Service)
                } else {
                    Err(self.builder.missing_service(name))
                }
            }
            Reference::Type(type_name) => self.builder.resolve_type(type_name).map(Reference::Service),
            Reference::This if scope.position == Position::Setup => Ok(Reference::This),
            Reference::This => Err(Error::service_creation(
                scope.current,
                "@self cannot be used before the service is created.",
            )),
            Reference::Container => Ok(Reference::Container),
        }
    }

    fn complete_arguments(
        &self,
        owner: &str,
        params: &[Parameter],
        supplied: &Arguments,
        scope: &Scope<'_>,
    ) -> Result<Vec<Argument>> {
        let resolved = autowire_arguments(
            owner,
            params,
            supplied.positional.clone(),
            supplied.named.clone(),
            self.builder,
        )?;
        resolved
            .into_iter()
            .map(|value| match value {
                Resolved::Supplied(argument) => self.complete_argument(argument, scope),
                Resolved::Service(name) => Ok(Argument::Reference(Reference::Service(name))),
                Resolved::Services(names) => Ok(Argument::List(
                    names
                        .into_iter()
                        .map(|name| Argument::Reference(Reference::Service(name)))
                        .collect(),
                )),
                Resolved::Default(value) => Ok(Argument::Value(value)),
                Resolved::Null => Ok(Argument::Value(Value::Null)),
                Resolved::Container => Ok(Argument::Reference(Reference::Container)),
            })
            .collect()
    }

    fn complete_argument(&self, argument: Argument, scope: &Scope<'_>) -> Result<Argument> {
        match argument {
            Argument::Value(value) => scope.parameters.expand(&value).map(Argument::Value),
            Argument::Reference(reference) => self.normalize_reference(&reference, scope).map(Argument::Reference),
            Argument::Statement(statement) => self
                .complete_statement(&statement, scope)
                .map(|(completed, _)| Argument::from(completed)),
            Argument::List(items) => items
                .into_iter()
                .map(|item| self.complete_argument(item, scope))
                .collect::<Result<Vec<_>>>()
                .map(Argument::List),
        }
    }
}

/// Attach the service name unless the error already carries it
fn within(service: &str, error: Error) -> Error {
    match &error {
        Error::ServiceCreation { service: failed, .. } if failed == service => error,
        _ => error.in_context(format!("Service '{service}'")),
    }
}
