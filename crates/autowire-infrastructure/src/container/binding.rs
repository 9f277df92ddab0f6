//! Binding - the generated plan joined with catalog invokers
//!
//! The plan names classes, factories and methods; the catalog holds the
//! closures that perform them. Binding happens once when the container is
//! created, so a plan that no longer matches the catalog (a stale cached
//! artifact) fails at boot instead of on first use, and resolving a
//! service never searches the catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use autowire_application::generator::{Expr, GeneratedContainer, ServiceMethod};
use autowire_domain::catalog::{CastTable, Invoker, MethodFn, Object, SetterFn};
use autowire_domain::error::{Error, Result};
use autowire_domain::{ArgValue, Args, Instance, Parameter, TypeCatalog};
use serde_json::Value;

use crate::container::Container;

/// An expression with its invoker attached
pub(crate) enum Bound {
    Literal(Value),
    Service(String),
    Container,
    Call {
        label: String,
        class: String,
        params: Vec<String>,
        invoke: Invoker,
        casts: Arc<CastTable>,
        args: Vec<Bound>,
    },
    Method {
        label: String,
        receiver: String,
        class: String,
        params: Vec<String>,
        invoke: MethodFn,
        casts: Arc<CastTable>,
        args: Vec<Bound>,
    },
    List(Vec<Bound>),
}

/// A setter call with its invoker attached
pub(crate) struct BoundSetup {
    label: String,
    params: Vec<String>,
    invoke: SetterFn,
    args: Vec<Bound>,
}

/// One service ready to be created
pub(crate) struct BoundService {
    pub(crate) shared: bool,
    pub(crate) create: Bound,
    pub(crate) setup: Vec<BoundSetup>,
}

/// What a factory expression yields
pub(crate) enum Produced {
    /// A new object, setters may still run against it
    Owned {
        object: Object,
        class: String,
        casts: Arc<CastTable>,
    },
    /// An existing service
    Shared(Instance),
}

impl Produced {
    pub(crate) fn into_instance(self) -> Instance {
        match self {
            Self::Owned { object, class, casts } => Instance::from_object(class, object, casts),
            Self::Shared(instance) => instance,
        }
    }
}

// ============================================================================
// Binding
// ============================================================================

/// Bind every factory method of the plan
pub(crate) fn bind_services(
    plan: &GeneratedContainer,
    catalog: &TypeCatalog,
) -> Result<BTreeMap<String, BoundService>> {
    let binder = Binder { catalog };
    plan.methods
        .iter()
        .map(|(name, method)| {
            binder
                .service(method)
                .map(|bound| (name.clone(), bound))
                .map_err(|error| error.in_context(format!("Service '{name}'")))
        })
        .collect()
}

/// Bind the initialization statements of the plan
pub(crate) fn bind_initializers(plan: &GeneratedContainer, catalog: &TypeCatalog) -> Result<Vec<Bound>> {
    let binder = Binder { catalog };
    plan.initialize
        .iter()
        .map(|expr| binder.expr(expr))
        .collect::<Result<_>>()
        .map_err(|error| error.in_context(format!("Container {}", plan.class_name)))
}

struct Binder<'a> {
    catalog: &'a TypeCatalog,
}

impl Binder<'_> {
    fn service(&self, method: &ServiceMethod) -> Result<BoundService> {
        let setup = method
            .setup
            .iter()
            .map(|step| {
                let label = format!("{}::{}()", step.class, step.method);
                let setter = self
                    .catalog
                    .get(&step.class)
                    .and_then(|info| info.setter_fn(&step.method))
                    .ok_or_else(|| undeclared(&label))?;
                Ok(BoundSetup {
                    params: names(&label, &setter.params, &step.args)?,
                    invoke: Arc::clone(&setter.invoke),
                    args: self.exprs(&step.args)?,
                    label,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BoundService {
            shared: method.shared,
            create: self.expr(&method.create)?,
            setup,
        })
    }

    fn expr(&self, expr: &Expr) -> Result<Bound> {
        Ok(match expr {
            Expr::Literal { value } => Bound::Literal(value.clone()),
            Expr::Service { name } => Bound::Service(name.clone()),
            Expr::Container => Bound::Container,
            Expr::List { items } => Bound::List(self.exprs(items)?),
            Expr::Construct { class, args } => {
                let label = format!("{class}::new()");
                let constructor = self
                    .catalog
                    .get(class)
                    .and_then(|info| info.constructor_fn())
                    .ok_or_else(|| undeclared(&label))?;
                self.call(label, class, &constructor.params, &constructor.invoke, args)?
            }
            Expr::StaticCall { class, method, args } => {
                let label = format!("{class}::{method}()");
                let factory = self
                    .catalog
                    .get(class)
                    .and_then(|info| info.factory_fn(method))
                    .ok_or_else(|| undeclared(&label))?;
                self.call(label, &factory.returns, &factory.params, &factory.invoke, args)?
            }
            Expr::FunctionCall { function, args } => {
                let label = format!("{function}()");
                let callable = self.catalog.function(function).ok_or_else(|| undeclared(&label))?;
                self.call(label, &callable.returns, &callable.params, &callable.invoke, args)?
            }
            Expr::MethodCall {
                service,
                class,
                method,
                args,
            } => {
                let label = format!("{class}::{method}()");
                let found = self
                    .catalog
                    .get(class)
                    .and_then(|info| info.method_fn(method))
                    .ok_or_else(|| undeclared(&label))?;
                Bound::Method {
                    params: names(&label, &found.params, args)?,
                    receiver: service.clone(),
                    class: found.returns.clone(),
                    invoke: Arc::clone(&found.invoke),
                    casts: Arc::new(self.catalog.casts_of(&found.returns)),
                    args: self.exprs(args)?,
                    label,
                }
            }
        })
    }

    fn call(&self, label: String, class: &str, params: &[Parameter], invoke: &Invoker, args: &[Expr]) -> Result<Bound> {
        Ok(Bound::Call {
            params: names(&label, params, args)?,
            class: class.to_string(),
            invoke: Arc::clone(invoke),
            casts: Arc::new(self.catalog.casts_of(class)),
            args: self.exprs(args)?,
            label,
        })
    }

    fn exprs(&self, exprs: &[Expr]) -> Result<Vec<Bound>> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }
}

fn names(label: &str, params: &[Parameter], args: &[Expr]) -> Result<Vec<String>> {
    if params.len() != args.len() {
        return Err(Error::invalid_state(format!(
            "{label} declares {} parameter(s) but the compiled container passes {}. Recompile the container.",
            params.len(),
            args.len()
        )));
    }
    Ok(params.iter().map(|param| param.name.clone()).collect())
}

fn undeclared(label: &str) -> Error {
    Error::invalid_state(format!(
        "{label} is not declared in the type catalog. Recompile the container."
    ))
}

// ============================================================================
// Evaluation
// ============================================================================

impl Bound {
    /// Evaluate as an argument value
    pub(crate) fn value(&self, container: &Container, service: &str) -> Result<ArgValue> {
        match self {
            Self::Literal(value) => Ok(ArgValue::Value(value.clone())),
            Self::Service(name) => container.get(name).map(ArgValue::Service),
            Self::Container => Ok(ArgValue::Locator(Arc::new(container.clone()))),
            Self::List(items) => items
                .iter()
                .map(|item| item.value(container, service))
                .collect::<Result<Vec<_>>>()
                .map(ArgValue::List),
            Self::Call { .. } | Self::Method { .. } => self
                .produce(container, service)
                .map(|produced| ArgValue::Service(produced.into_instance())),
        }
    }

    /// Evaluate as a factory
    pub(crate) fn produce(&self, container: &Container, service: &str) -> Result<Produced> {
        match self {
            Self::Call {
                label,
                class,
                params,
                invoke,
                casts,
                args,
            } => {
                let args = arguments(params, args, container, service)?;
                let object = invoke(&args).map_err(|error| failed(service, label, error))?;
                Ok(Produced::Owned {
                    object,
                    class: class.clone(),
                    casts: Arc::clone(casts),
                })
            }
            Self::Method {
                label,
                receiver,
                class,
                params,
                invoke,
                casts,
                args,
            } => {
                let target = container.get(receiver)?;
                let args = arguments(params, args, container, service)?;
                let object = invoke(&target, &args).map_err(|error| failed(service, label, error))?;
                Ok(Produced::Owned {
                    object,
                    class: class.clone(),
                    casts: Arc::clone(casts),
                })
            }
            Self::Service(name) => container.get(name).map(Produced::Shared),
            Self::Literal(_) | Self::Container | Self::List(_) => Err(Error::service_creation(
                service,
                "The factory does not create an object.",
            )),
        }
    }
}

impl BoundSetup {
    /// Run the setter against a freshly created object
    pub(crate) fn apply(&self, object: &mut Object, container: &Container, service: &str) -> Result<()> {
        let args = arguments(&self.params, &self.args, container, service)?;
        (self.invoke)(object.as_mut(), &args).map_err(|error| failed(service, &self.label, error))
    }
}

fn arguments(params: &[String], args: &[Bound], container: &Container, service: &str) -> Result<Args> {
    let mut resolved = Args::new();
    for (name, arg) in params.iter().zip(args) {
        resolved.push(name.as_str(), arg.value(container, service)?);
    }
    Ok(resolved)
}

fn failed(service: &str, label: &str, error: Error) -> Error {
    error.in_context(format!("Service '{service}': {label}"))
}
