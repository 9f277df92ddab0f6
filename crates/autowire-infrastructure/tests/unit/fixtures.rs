//! Shared catalog and container helpers for the runtime tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use autowire_application::{Compiler, ContainerBuilder, DiExtension, ServicesExtension};
use autowire_domain::{ClassInfo, Parameter, ServiceLocator, TypeCatalog};
use autowire_infrastructure::Container;
use serde_json::{Value, json};

pub trait Log: Send + Sync {
    fn line(&self, message: &str) -> String;
}

pub struct Logger {
    pub prefix: String,
}

impl Log for Logger {
    fn line(&self, message: &str) -> String {
        format!("[{}] {message}", self.prefix)
    }
}

pub struct App {
    pub logger: Arc<dyn Log>,
}

pub struct Mailer {
    pub host: String,
    pub port: u16,
    pub logger: Option<Arc<dyn Log>>,
}

pub struct RedisCache;
pub struct MemoryCache;
pub struct Clock;
pub struct A;
pub struct B;

pub struct Request {
    pub path: String,
}

pub struct Handler {
    pub request: Arc<Request>,
}

pub struct Registry {
    pub locator: Arc<dyn ServiceLocator>,
}

pub struct Counted;

/// Catalog of the runtime tests; `built` counts `Counted` constructions
pub fn catalog_with_counter(built: Arc<AtomicUsize>) -> TypeCatalog {
    TypeCatalog::new()
        .with(ClassInfo::interface("LoggerInterface"))
        .with(
            ClassInfo::class("Logger")
                .implements_as::<Logger, dyn Log>("LoggerInterface", |logger| logger)
                .constructor(
                    vec![Parameter::value("prefix").with_default(json!("app"))],
                    |args| Ok(Logger { prefix: args.value("prefix")? }),
                ),
        )
        .with(ClassInfo::class("App").constructor(
            vec![Parameter::service("logger", "LoggerInterface")],
            |args| Ok(App { logger: args.interface::<dyn Log>("logger")? }),
        ))
        .with(
            ClassInfo::class("Mailer")
                .constructor(
                    vec![Parameter::value("host"), Parameter::value("port").with_default(json!(25))],
                    |args| {
                        Ok(Mailer {
                            host: args.value("host")?,
                            port: args.value("port")?,
                            logger: None,
                        })
                    },
                )
                .setter(
                    "set_logger",
                    vec![Parameter::service("logger", "LoggerInterface")],
                    |mailer: &mut Mailer, args| {
                        mailer.logger = Some(args.interface::<dyn Log>("logger")?);
                        Ok(())
                    },
                ),
        )
        .with(ClassInfo::interface("Cache"))
        .with(
            ClassInfo::class("RedisCache")
                .implements("Cache")
                .constructor(vec![], |_| Ok(RedisCache)),
        )
        .with(
            ClassInfo::class("MemoryCache")
                .implements("Cache")
                .constructor(vec![], |_| Ok(MemoryCache)),
        )
        .with(ClassInfo::class("Clock"))
        .with_function("system_clock", "Clock", vec![], |_| Ok(Clock))
        .with(ClassInfo::class("A").constructor(vec![Parameter::service("b", "B")], |args| {
            args.instance("b")?;
            Ok(A)
        }))
        .with(ClassInfo::class("B").constructor(vec![Parameter::service("a", "A")], |args| {
            args.instance("a")?;
            Ok(B)
        }))
        .with(ClassInfo::class("Request").constructor(
            vec![Parameter::value("path").with_default(json!("/"))],
            |args| Ok(Request { path: args.value("path")? }),
        ))
        .with(ClassInfo::class("Handler").constructor(
            vec![Parameter::service("request", "Request")],
            |args| Ok(Handler { request: args.service::<Request>("request")? }),
        ))
        .with(ClassInfo::class("Registry").constructor(
            vec![Parameter::container("container")],
            |args| Ok(Registry { locator: args.locator("container")? }),
        ))
        .with(ClassInfo::class("Counted").constructor(vec![], move |_| {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(Counted)
        }))
}

pub fn catalog() -> TypeCatalog {
    catalog_with_counter(Arc::new(AtomicUsize::new(0)))
}

/// Compile `config` with the `services` and `di` extensions
pub fn compile(catalog: &Arc<TypeCatalog>, config: Value) -> autowire_application::GeneratedContainer {
    let mut compiler = Compiler::new(ContainerBuilder::new(Arc::clone(catalog)));
    compiler
        .add_extension("services", ServicesExtension::new())
        .expect("services")
        .add_extension("di", DiExtension::new())
        .expect("di");
    compiler.add_config(config).expect("config");
    compiler.compile().expect("compile")
}

/// Compile and boot `config`
pub fn container(config: Value) -> Container {
    let catalog = Arc::new(catalog());
    let plan = compile(&catalog, config);
    Container::new(plan, catalog).expect("boot")
}

/// The usual application: a logger, an app and a mailer set up with the logger
pub fn app_config() -> Value {
    json!({
        "services": {
            "logger": "Logger",
            "app": "App",
            "mailer": {
                "factory": "Mailer",
                "arguments": { "host": "smtp.local" },
                "setup": ["set_logger"]
            },
            "log": { "alias": "logger" }
        }
    })
}
