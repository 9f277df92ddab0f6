//! Shared type catalog for the compile-phase tests

use std::sync::Arc;

use autowire_application::ContainerBuilder;
use autowire_domain::{ClassInfo, Parameter, TypeCatalog};
use serde_json::json;

pub struct Logger;
pub struct App;
pub struct RedisCache;
pub struct MemoryCache;
pub struct Mailer;
pub struct Connection;
pub struct Router;

/// A small application: a logger, an app depending on it, two caches
/// behind one interface, a mailer with setup and a connection factory
pub fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(ClassInfo::interface("LoggerInterface"))
        .with(
            ClassInfo::class("Logger")
                .implements("LoggerInterface")
                .constructor(vec![], |_| Ok(Logger)),
        )
        .with(
            ClassInfo::class("App").constructor(
                vec![Parameter::service("logger", "LoggerInterface")],
                |_| Ok(App),
            ),
        )
        .with(ClassInfo::interface("Cache"))
        .with(ClassInfo::abstract_class("BaseCache").implements("Cache"))
        .with(
            ClassInfo::class("RedisCache")
                .extends("BaseCache")
                .constructor(vec![Parameter::value("dsn").with_default(json!("redis://localhost"))], |_| {
                    Ok(RedisCache)
                }),
        )
        .with(
            ClassInfo::class("MemoryCache")
                .implements("Cache")
                .constructor(vec![], |_| Ok(MemoryCache)),
        )
        .with(
            ClassInfo::class("Mailer")
                .constructor(
                    vec![Parameter::value("host"), Parameter::value("port").with_default(json!(25))],
                    |_| Ok(Mailer),
                )
                .setter("set_logger", vec![Parameter::service("logger", "LoggerInterface")], |_: &mut Mailer, _| Ok(())),
        )
        .with(
            ClassInfo::class("Connection").factory("open", "Connection", vec![Parameter::value("dsn")], |_| {
                Ok(Connection)
            }),
        )
        .with(
            ClassInfo::class("Router")
                .constructor(vec![Parameter::services("caches", "Cache")], |_| Ok(Router)),
        )
}

pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new(Arc::new(catalog()))
}
