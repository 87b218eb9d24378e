//! Argument resolution for helper calls.
//!
//! Template engines call functions with positional values plus, optionally, a
//! trailing keyword-argument map. Helpers instead declare an ordered list of
//! parameter names. This module bridges the two.
//!
//! # Binding Rules
//!
//! 1. Keyword arguments are copied into a working map first.
//! 2. Positional values bind, in order, to the declared parameters that no
//!    keyword argument named. An explicit keyword argument always wins.
//! 3. Each declared parameter is read from the working map in order; missing
//!    ones are undefined.
//!
//! With parameters `[a, b]`, the call `f(1, a=9)` resolves to `a=9, b=1`.
//!
//! # URL Templating
//!
//! Parameters named `url` or `href` get two extra steps:
//!
//! - A root-relative value (`/users`) is prefixed with the base URL.
//! - Each `:name` placeholder is replaced by the working map entry `name`,
//!   and that entry is removed so it does not also surface as an extra
//!   attribute. Placeholders with no matching entry stay as written.

use std::collections::BTreeMap;

use minijinja::{Error, Value};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Parameter names that receive URL templating.
pub const URL_PARAMS: &[&str] = &["url", "href"];

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid"));

/// Raw call-site arguments of one helper invocation.
#[derive(Debug, Clone, Default)]
pub struct Invocation<'a> {
    /// Positional values, in call order.
    pub positional: &'a [Value],
    /// Keyword arguments.
    pub hash: BTreeMap<String, Value>,
}

impl<'a> Invocation<'a> {
    /// Splits engine call arguments into positional values and keyword arguments.
    ///
    /// Keyword arguments, when present, are always the last value.
    pub fn from_call(args: &'a [Value]) -> Result<Self, Error> {
        match args.split_last() {
            Some((last, positional)) if last.is_kwargs() => Ok(Self {
                positional,
                hash: read_hash(last)?,
            }),
            _ => Ok(Self {
                positional: args,
                hash: BTreeMap::new(),
            }),
        }
    }

    /// Builds an invocation from parts.
    pub fn new(positional: &'a [Value], hash: BTreeMap<String, Value>) -> Self {
        Self { positional, hash }
    }
}

fn read_hash(kwargs: &Value) -> Result<BTreeMap<String, Value>, Error> {
    let mut hash = BTreeMap::new();
    for key in kwargs.try_iter()? {
        let value = kwargs.get_item(&key)?;
        if let Some(name) = key.as_str() {
            hash.insert(name.to_string(), value);
        }
    }
    Ok(hash)
}

/// Arguments ready to hand to a helper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedArguments {
    /// One value per declared parameter, in declaration order.
    pub values: Vec<Value>,
    /// Named values that bound no parameter and were not consumed as URL
    /// placeholders.
    pub extra: BTreeMap<String, Value>,
}

/// Binds an invocation's arguments to declared parameter names.
pub fn resolve_arguments(
    params: &[String],
    invocation: &Invocation<'_>,
    base_url: Option<&str>,
) -> ResolvedArguments {
    let mut named = invocation.hash.clone();

    let unbound = params
        .iter()
        .filter(|name| !invocation.hash.contains_key(name.as_str()));
    for (name, value) in unbound.zip(invocation.positional) {
        named.insert(name.clone(), value.clone());
    }

    let mut values = Vec::with_capacity(params.len());
    for name in params {
        let value = named.get(name).cloned().unwrap_or(Value::UNDEFINED);
        values.push(normalize_param(name, value, &mut named, base_url));
    }

    let extra = named
        .into_iter()
        .filter(|(name, _)| !params.contains(name))
        .collect();

    ResolvedArguments { values, extra }
}

fn normalize_param(
    name: &str,
    value: Value,
    named: &mut BTreeMap<String, Value>,
    base_url: Option<&str>,
) -> Value {
    if !URL_PARAMS.contains(&name) {
        return value;
    }
    match value.as_str() {
        Some(url) => Value::from(normalize_url(url, named, base_url)),
        None => value,
    }
}

/// Applies base-URL prefixing and `:name` placeholder substitution.
///
/// Substituted names are removed from `named`.
pub fn normalize_url(
    url: &str,
    named: &mut BTreeMap<String, Value>,
    base_url: Option<&str>,
) -> String {
    let url = match base_url {
        Some(base) if !base.is_empty() && url.starts_with('/') => {
            format!("{}{}", base.trim_end_matches('/'), url)
        }
        _ => url.to_string(),
    };

    PLACEHOLDER
        .replace_all(&url, |caps: &Captures<'_>| {
            match named.remove(&caps[1]) {
                Some(value) if !value.is_undefined() && !value.is_none() => value.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
