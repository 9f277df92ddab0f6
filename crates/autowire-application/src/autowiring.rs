//! Autowiring - filling a parameter list from supplied arguments and types
//!
//! The same rules apply when the compile phase completes a factory call and
//! when the runtime container builds an arbitrary class on demand:
//!
//! | Parameter | Supplied by name or position | Otherwise |
//! |-----------|------------------------------|-----------|
//! | `Service(T)` | the supplied argument | the single autowired `T`, then default, then `null` |
//! | `Services(T)` | the supplied argument | every autowired `T` in natural order |
//! | `Value` | the supplied argument | default, then `null` |
//! | `Container` | the supplied argument | the container |
//!
//! Ambiguous lookups never fall back to a default: they are always
//! reported.

use std::collections::BTreeMap;

use autowire_domain::catalog::{Parameter, TypeHint};
use autowire_domain::error::{Error, Result};
use autowire_domain::value_objects::suggestion;
use serde_json::Value;

/// By-type lookups needed to autowire a parameter list
pub trait TypeLookup {
    /// The single autowired service of a type
    fn resolve_type(&self, type_name: &str) -> Result<String>;

    /// Every autowired service of a type, in natural order
    fn autowired_of(&self, type_name: &str) -> Vec<String>;
}

/// How one parameter receives its value
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<A> {
    /// An explicitly supplied argument
    Supplied(A),
    /// The named service
    Service(String),
    /// Every listed service
    Services(Vec<String>),
    /// The parameter's declared default
    Default(Value),
    /// `null`, for nullable parameters that could not be autowired
    Null,
    /// The container itself
    Container,
}

/// Fill `params` from supplied arguments, falling back to autowiring
///
/// `owner` names the callable in error messages (`"App::new()"`).
pub fn autowire_arguments<A, L>(
    owner: &str,
    params: &[Parameter],
    positional: Vec<A>,
    mut named: BTreeMap<String, A>,
    lookup: &L,
) -> Result<Vec<Resolved<A>>>
where
    L: TypeLookup + ?Sized,
{
    if positional.len() > params.len() {
        return Err(Error::configuration(format!(
            "{owner} accepts {} argument(s), {} given",
            params.len(),
            positional.len()
        )));
    }

    if let Some(unknown) = named.keys().find(|key| !params.iter().any(|p| &p.name == *key)) {
        let hint = suggestion::hint(params.iter().map(|p| p.name.as_str()), unknown);
        return Err(Error::configuration(format!(
            "Unknown parameter '{unknown}' of {owner}.{}",
            hint.map(|h| format!(" {h}")).unwrap_or_default()
        )));
    }

    let mut positional = positional.into_iter();
    let mut resolved = Vec::with_capacity(params.len());
    for param in params {
        let supplied = positional.next();
        let by_name = named.remove(&param.name);
        let value = match (supplied, by_name) {
            (Some(_), Some(_)) => {
                return Err(Error::configuration(format!(
                    "Parameter '{}' of {owner} is supplied both by position and by name",
                    param.name
                )));
            }
            (Some(argument), None) | (None, Some(argument)) => Resolved::Supplied(argument),
            (None, None) => autowire_parameter(owner, param, lookup)?,
        };
        resolved.push(value);
    }
    Ok(resolved)
}

fn autowire_parameter<A, L>(owner: &str, param: &Parameter, lookup: &L) -> Result<Resolved<A>>
where
    L: TypeLookup + ?Sized,
{
    match &param.hint {
        TypeHint::Service(type_name) => match lookup.resolve_type(type_name) {
            Ok(service) => Ok(Resolved::Service(service)),
            Err(error) if error.is_missing_service() => fallback(param).ok_or_else(|| {
                error.in_context(format!("Parameter '{}' in {owner}", param.name))
            }),
            Err(error) => Err(error.in_context(format!("Parameter '{}' in {owner}", param.name))),
        },
        TypeHint::Services(type_name) => Ok(Resolved::Services(lookup.autowired_of(type_name))),
        TypeHint::Value => fallback(param).ok_or_else(|| {
            Error::configuration(format!(
                "Parameter '{}' in {owner} has no type hint or default value, so its value must be specified.",
                param.name
            ))
        }),
        TypeHint::Container => Ok(Resolved::Container),
    }
}

fn fallback<A>(param: &Parameter) -> Option<Resolved<A>> {
    match (&param.default, param.nullable) {
        (Some(default), _) => Some(Resolved::Default(default.clone())),
        (None, true) => Some(Resolved::Null),
        (None, false) => None,
    }
}
