//! Runtime Container - lazy, shared service instances
//!
//! ```text
//! get(name) ──► alias? ──► cached? ──yes──► instance
//!                             │ no
//!                             ▼
//!            cycle check (this thread) ──► per-name lock ──► cached again?
//!                                                                │ no
//!                                                                ▼
//!                         runtime binding / generated factory ──► setup calls
//!                                                                │
//!                                                  shared? ──► instance cache
//! ```
//!
//! The container is `Clone + Send + Sync`; clones share the instance cache.
//! Concurrent requests for different services build in parallel, requests
//! for the same shared service build it once. Scoped overrides are per
//! thread, see [`Container::run_scope`].

mod binding;
mod cycle;
mod scope;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use autowire_application::autowiring::{Resolved, TypeLookup, autowire_arguments};
use autowire_application::generator::{ContainerMetadata, GeneratedContainer};
use autowire_domain::catalog::ClassKind;
use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::{natural, suggestion};
use autowire_domain::{ArgValue, Args, Instance, Parameters, ServiceLocator, TypeCatalog};
use serde_json::Value;
use tracing::{debug, info, trace};

use binding::{Bound, BoundService, Produced};
use cycle::CreatingGuard;
use scope::ScopeGuard;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Builds a service added at runtime
pub type ServiceFactory = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// A service supplied at runtime
#[derive(Clone)]
pub enum ServiceSource {
    /// A ready instance
    Instance(Instance),
    /// A factory called on first use; its result is shared
    Factory(ServiceFactory),
}

impl ServiceSource {
    /// Wrap a factory closure
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }
}

impl From<Instance> for ServiceSource {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl fmt::Debug for ServiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(instance) => f.debug_tuple("Instance").field(instance).finish(),
            Self::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// Mutable part of the container
#[derive(Default)]
struct State {
    instances: BTreeMap<String, Instance>,
    sources: BTreeMap<String, ServiceSource>,
}

struct Inner {
    id: u64,
    class_name: String,
    catalog: Arc<TypeCatalog>,
    parameters: Parameters,
    metadata: ContainerMetadata,
    services: BTreeMap<String, BoundService>,
    initialize: Vec<Bound>,
    state: RwLock<State>,
    locks: Mutex<BTreeMap<String, Arc<Mutex<()>>>>,
}

/// The running container
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    /// Boot a generated container against the catalog it was compiled from
    ///
    /// Fails when the plan refers to classes, factories or setters the
    /// catalog does not declare. Initialization statements are not run,
    /// see [`Container::initialize`].
    pub fn new(plan: GeneratedContainer, catalog: Arc<TypeCatalog>) -> Result<Self> {
        let services = binding::bind_services(&plan, &catalog)?;
        let initialize = binding::bind_initializers(&plan, &catalog)?;
        debug!(class = %plan.class_name, services = services.len(), "Container bound");

        Ok(Self {
            inner: Arc::new(Inner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                class_name: plan.class_name,
                catalog,
                parameters: plan.parameters,
                metadata: plan.metadata,
                services,
                initialize,
                state: RwLock::new(State::default()),
                locks: Mutex::new(BTreeMap::new()),
            }),
        })
    }

    /// Name of the generated container
    pub fn class_name(&self) -> &str {
        &self.inner.class_name
    }

    /// The type catalog
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.inner.catalog
    }

    /// Types, tags, wiring and aliases recorded at compile time
    pub fn metadata(&self) -> &ContainerMetadata {
        &self.inner.metadata
    }

    /// Evaluate the initialization statements (eager services)
    pub fn initialize(&self) -> Result<()> {
        info!(
            class = %self.inner.class_name,
            statements = self.inner.initialize.len(),
            "Initializing container"
        );
        for statement in &self.inner.initialize {
            statement.value(self, &self.inner.class_name)?;
        }
        Ok(())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Compile-time parameters, already expanded
    pub fn parameters(&self) -> &Parameters {
        &self.inner.parameters
    }

    /// One parameter by dotted key
    pub fn parameter(&self, key: &str) -> Result<Value> {
        self.inner.parameters.get(key).cloned()
    }

    // ========================================================================
    // Services by name
    // ========================================================================

    /// Get a service, creating it on first use
    pub fn get(&self, name: &str) -> Result<Instance> {
        let name = self.canonical(name);
        if let Some(instance) = self.cached(name) {
            trace!(service = name, "Service from cache");
            return Ok(instance);
        }
        if !self.has(name) {
            return Err(self.missing_service(name));
        }
        if !self.is_shared(name) {
            return self.create_service(name);
        }

        let _creating = CreatingGuard::enter(self.inner.id, name)?;
        if scope::is_active(self.inner.id) {
            let instance = self.build(name)?;
            scope::store(self.inner.id, name, instance.clone());
            return Ok(instance);
        }

        // Cycles are only detected on the current thread. Two threads
        // entering a cycle from opposite ends (a -> b on one, b -> a on the
        // other) each hold the lock the other waits for and deadlock.
        let lock = self.lock_for(name);
        let _building = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = self.cached(name) {
            return Ok(instance);
        }

        let instance = self.build(name)?;
        self.write_state()
            .instances
            .insert(name.to_string(), instance.clone());
        Ok(instance)
    }

    /// Get a service downcast to its concrete type
    pub fn get_as<T: std::any::Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get(name)?.downcast::<T>()
    }

    /// Get a service cast to a trait object declared in the catalog
    pub fn get_interface<I: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<I>> {
        self.get(name)?.cast::<I>()
    }

    /// Create a new instance of a service, bypassing the instance cache
    pub fn create_service(&self, name: &str) -> Result<Instance> {
        let name = self.canonical(name);
        let _creating = CreatingGuard::enter(self.inner.id, name)?;
        self.build(name)
    }

    /// Whether a service (or alias) exists
    pub fn has(&self, name: &str) -> bool {
        let name = self.canonical(name);
        if self.inner.services.contains_key(name) || scope::lookup(self.inner.id, name).is_some() {
            return true;
        }
        let state = self.read_state();
        state.instances.contains_key(name) || state.sources.contains_key(name)
    }

    /// Whether a service has already been created and cached
    pub fn is_created(&self, name: &str) -> bool {
        let name = self.canonical(name);
        scope::instance(self.inner.id, name).is_some() || self.read_state().instances.contains_key(name)
    }

    /// Every service name, in natural order
    pub fn service_names(&self) -> Vec<String> {
        let scoped = scope::names(self.inner.id);
        let state = self.read_state();
        let names: BTreeSet<&String> = self
            .inner
            .services
            .keys()
            .chain(state.instances.keys())
            .chain(state.sources.keys())
            .chain(scoped.iter())
            .collect();
        let mut names: Vec<String> = names.into_iter().cloned().collect();
        natural::sort(&mut names);
        names
    }

    // ========================================================================
    // Services by type and tag
    // ========================================================================

    /// Get the single autowired service of a type
    pub fn get_by_type(&self, type_name: &str) -> Result<Instance> {
        let name = self.resolve_type(type_name)?;
        self.get(&name)
    }

    /// Like [`Container::get_by_type`], `None` when no service has the type
    ///
    /// Ambiguity is still an error.
    pub fn get_by_type_optional(&self, type_name: &str) -> Result<Option<Instance>> {
        match self.resolve_type(type_name) {
            Ok(name) => self.get(&name).map(Some),
            Err(error) if error.is_missing_service() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Get the single autowired service of a type, downcast
    pub fn get_by_type_as<T: std::any::Any + Send + Sync>(&self, type_name: &str) -> Result<Arc<T>> {
        self.get_by_type(type_name)?.downcast::<T>()
    }

    /// Names of every service of a type, autowired or not, in natural order
    pub fn find_by_type(&self, type_name: &str) -> Vec<String> {
        self.inner.metadata.wiring.all(type_name)
    }

    /// Services carrying a tag, with the tag attributes
    pub fn find_by_tag(&self, tag: &str) -> BTreeMap<String, Value> {
        self.inner.metadata.tags.get(tag).cloned().unwrap_or_default()
    }

    // ========================================================================
    // Runtime services
    // ========================================================================

    /// Register a service at runtime
    ///
    /// Fails when the service was already created. A ready instance is
    /// checked against the type the service was compiled with; a factory
    /// result is checked when it is built.
    pub fn add_service(&self, name: &str, source: impl Into<ServiceSource>) -> Result<()> {
        let name = self.canonical(name);
        let source = source.into();
        if let ServiceSource::Instance(instance) = &source {
            self.check_type(name, instance)?;
        }

        let mut state = self.write_state();
        if state.instances.contains_key(name) {
            return Err(Error::invalid_state(format!("Service '{name}' already exists.")));
        }
        match source {
            ServiceSource::Instance(instance) => {
                state.instances.insert(name.to_string(), instance);
            }
            factory @ ServiceSource::Factory(_) => {
                state.sources.insert(name.to_string(), factory);
            }
        }
        debug!(service = name, "Service added at runtime");
        Ok(())
    }

    /// Drop a created instance and any runtime registration
    ///
    /// A compiled service is created again on next use.
    pub fn remove_service(&self, name: &str) {
        let name = self.canonical(name);
        let mut state = self.write_state();
        state.instances.remove(name);
        state.sources.remove(name);
        debug!(service = name, "Service removed");
    }

    /// Run `f` with some services temporarily replaced
    ///
    /// The bindings, and every shared service created while `f` runs, are
    /// only visible to the calling thread and are dropped afterwards,
    /// whether `f` returns, fails or panics. Other threads keep seeing the
    /// shared instances.
    pub fn run_scope<N, R, F>(&self, bindings: impl IntoIterator<Item = (N, ServiceSource)>, f: F) -> Result<R>
    where
        N: AsRef<str>,
        F: FnOnce(&Container) -> R,
    {
        let bindings = bindings
            .into_iter()
            .map(|(name, source)| (self.canonical(name.as_ref()).to_string(), source))
            .collect();
        let _scope = ScopeGuard::enter(self, bindings)?;
        Ok(f(self))
    }

    // ========================================================================
    // Construction outside the registry
    // ========================================================================

    /// Resolve a service or type, or construct the class when nothing
    /// provides it or arguments are given
    pub fn make(&self, type_or_name: &str, args: &Args) -> Result<Instance> {
        if args.is_empty() {
            if self.has(type_or_name) {
                return self.get(type_or_name);
            }
            if let Some(instance) = self.get_by_type_optional(type_or_name)? {
                return Ok(instance);
            }
        }
        self.create_instance(type_or_name, args)
    }

    /// Construct a catalog class with autowired constructor arguments
    ///
    /// `args` supplies parameters by name; everything else is autowired.
    /// The instance is not registered.
    pub fn create_instance(&self, class: &str, args: &Args) -> Result<Instance> {
        let info = self
            .inner
            .catalog
            .get(class)
            .ok_or_else(|| Error::type_not_found(class))?;
        match info.kind() {
            ClassKind::Class => {}
            ClassKind::Abstract => return Err(Error::not_instantiable(class, "it is abstract")),
            ClassKind::Interface => return Err(Error::not_instantiable(class, "it is an interface")),
        }
        let constructor = info
            .constructor_fn()
            .ok_or_else(|| Error::not_instantiable(class, "no constructor is declared"))?;

        let owner = format!("{class}::new()");
        let named: BTreeMap<String, ArgValue> = args
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        let resolved = autowire_arguments(&owner, &constructor.params, Vec::new(), named, self)?;

        let mut call = Args::new();
        for (param, value) in constructor.params.iter().zip(resolved) {
            call.push(param.name.as_str(), self.argument(value)?);
        }
        let object = (constructor.invoke)(&call).map_err(|error| error.in_context(owner))?;
        trace!(class, "Instance created");
        Ok(Instance::from_object(
            class,
            object,
            Arc::new(self.inner.catalog.casts_of(class)),
        ))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.inner
            .metadata
            .aliases
            .get(name)
            .map_or(name, String::as_str)
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    fn cached(&self, name: &str) -> Option<Instance> {
        scope::instance(self.inner.id, name).or_else(|| self.read_state().instances.get(name).cloned())
    }

    fn is_shared(&self, name: &str) -> bool {
        self.inner.services.get(name).is_none_or(|service| service.shared)
            || scope::lookup(self.inner.id, name).is_some()
            || self.read_state().sources.contains_key(name)
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.inner.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check an instance against the type `name` was compiled with
    pub(crate) fn check_type(&self, name: &str, instance: &Instance) -> Result<()> {
        match self.inner.metadata.types.get(name) {
            Some(expected) if !self.inner.catalog.is_a(instance.class(), expected) => {
                Err(Error::type_mismatch(name, expected.as_str(), instance.class()))
            }
            _ => Ok(()),
        }
    }

    fn build(&self, name: &str) -> Result<Instance> {
        let source = scope::lookup(self.inner.id, name).or_else(|| self.read_state().sources.get(name).cloned());
        let instance = match source {
            Some(ServiceSource::Instance(instance)) => instance,
            Some(ServiceSource::Factory(factory)) => {
                debug!(service = name, "Creating runtime service");
                factory(self).map_err(|error| error.in_context(format!("Service '{name}'")))?
            }
            None => self.build_compiled(name)?,
        };
        self.check_type(name, &instance)?;
        Ok(instance)
    }

    fn build_compiled(&self, name: &str) -> Result<Instance> {
        let service = self
            .inner
            .services
            .get(name)
            .ok_or_else(|| self.missing_service(name))?;
        debug!(service = name, "Creating service");

        let produced = service.create.produce(self, name)?;
        if service.setup.is_empty() {
            return Ok(produced.into_instance());
        }
        match produced {
            Produced::Owned {
                mut object,
                class,
                casts,
            } => {
                for step in &service.setup {
                    step.apply(&mut object, self, name)?;
                }
                Ok(Instance::from_object(class, object, casts))
            }
            Produced::Shared(_) => Err(Error::service_creation(
                name,
                "Setup calls need a new object, but the factory returns an existing service.",
            )),
        }
    }

    fn missing_service(&self, name: &str) -> Error {
        let names = self.service_names();
        let candidates = names
            .iter()
            .map(String::as_str)
            .chain(self.inner.metadata.aliases.keys().map(String::as_str));
        match suggestion::hint(candidates, name) {
            Some(hint) => Error::service_not_found_with_hint(name, hint),
            None => Error::service_not_found(name),
        }
    }

    fn argument(&self, value: Resolved<ArgValue>) -> Result<ArgValue> {
        Ok(match value {
            Resolved::Supplied(value) => value,
            Resolved::Service(name) => ArgValue::Service(self.get(&name)?),
            Resolved::Services(names) => ArgValue::List(
                names
                    .iter()
                    .map(|name| self.get(name).map(ArgValue::Service))
                    .collect::<Result<_>>()?,
            ),
            Resolved::Default(value) => ArgValue::Value(value),
            Resolved::Null => ArgValue::Value(Value::Null),
            Resolved::Container => ArgValue::Locator(Arc::new(self.clone())),
        })
    }
}

impl TypeLookup for Container {
    fn resolve_type(&self, type_name: &str) -> Result<String> {
        let wiring = &self.inner.metadata.wiring;
        let exists = self.inner.catalog.contains(type_name) || wiring.entry(type_name).is_some();
        wiring.resolve(type_name, exists)
    }

    fn autowired_of(&self, type_name: &str) -> Vec<String> {
        self.inner.metadata.wiring.autowired(type_name).to_vec()
    }
}

impl ServiceLocator for Container {
    fn get(&self, name: &str) -> Result<Instance> {
        Container::get(self, name)
    }

    fn has(&self, name: &str) -> bool {
        Container::has(self, name)
    }

    fn get_by_type(&self, type_name: &str) -> Result<Instance> {
        Container::get_by_type(self, type_name)
    }

    fn find_by_type(&self, type_name: &str) -> Vec<String> {
        Container::find_by_type(self, type_name)
    }

    fn parameter(&self, key: &str) -> Result<Value> {
        Container::parameter(self, key)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("Container")
            .field("class_name", &self.inner.class_name)
            .field("services", &self.inner.services.keys().collect::<Vec<_>>())
            .field("created", &state.instances.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
