//! Tests for the type catalog, instances and argument access

use std::sync::Arc;

use autowire_domain::{ArgValue, Args, ClassInfo, Instance, Parameter, TypeCatalog};
use serde_json::json;

trait Notifier: Send + Sync {
    fn channel(&self) -> String;
}

struct Mailer {
    host: String,
}

impl Notifier for Mailer {
    fn channel(&self) -> String {
        format!("mail:{}", self.host)
    }
}

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(ClassInfo::interface("Notifier"))
        .with(
            ClassInfo::class("Mailer")
                .implements_as::<Mailer, dyn Notifier>("Notifier", |m| m)
                .constructor(vec![Parameter::value("host")], |args| {
                    Ok(Mailer {
                        host: args.value("host")?,
                    })
                }),
        )
        .with(ClassInfo::class("SmtpMailer").extends("Mailer"))
}

#[test]
fn test_constructor_invocation_and_interface_cast() {
    let catalog = catalog();
    let constructor = catalog
        .get("Mailer")
        .and_then(|info| info.constructor_fn())
        .expect("constructor");
    let object = (constructor.invoke)(&Args::new().with("host", ArgValue::Value(json!("smtp.local"))))
        .expect("constructed");

    let instance = Instance::from_object("Mailer", object, Arc::new(catalog.casts_of("Mailer")));
    let notifier = instance.cast::<dyn Notifier>().expect("cast");
    assert_eq!(notifier.channel(), "mail:smtp.local");
    assert!(instance.downcast::<Mailer>().is_ok());
}

#[test]
fn test_casts_are_inherited() {
    let catalog = catalog();
    assert!(catalog.casts_of("SmtpMailer").contains_key("Notifier"));
    assert!(catalog.is_a("SmtpMailer", "Notifier"));
}

#[test]
fn test_args_report_missing_and_mistyped_values() {
    let args = Args::new().with("port", ArgValue::Value(json!("not a number")));
    assert!(args.value::<u16>("port").is_err());
    let missing = args.value::<String>("host").expect_err("missing");
    assert!(missing.to_string().contains("'host'"), "{missing}");
}

#[test]
fn test_optional_service_accepts_null() {
    let args = Args::new().with("logger", ArgValue::Value(json!(null)));
    let logger = args.optional_service::<Mailer>("logger").expect("null is accepted");
    assert!(logger.is_none());
}
