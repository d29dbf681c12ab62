//! HTTP request-parameter binder.
//!
//! Fields are sourced from the JSON body by default, through the type's own `Deserialize` impl;
//! top-level body keys it does not consume are rejected. A field tagged `query:"name"`,
//! `header:"name"` or `path:"name"` is read from that part of the request instead and must also be
//! tagged `json:"-"` (and carry `#[serde(skip)]`) so the body cannot set it.
//!
//! ```text
//! #[derive(Bindable, Default, Deserialize)]
//! struct ListPets {
//!     #[serde(skip)]
//!     #[bind(tags(path = "owner", json = "-"))]
//!     owner: u64,
//!     #[serde(skip)]
//!     #[bind(tags(query = "limit", json = "-"))]
//!     limit: Option<u32>,
//!     #[serde(skip)]
//!     #[bind(tags(header = "X-Request-Id", json = "-"))]
//!     request_id: String,
//!     filter: Option<String>,
//! }
//! ```

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use http::header::{CONTENT_TYPE, HeaderMap};
use http::{Request, Uri};
use serde::de::DeserializeOwned;
use serde_ignored::Path;
use serde_json::Value;

use crate::assign::assign_to_field;
use crate::cache::Cache;
use crate::errors::{BodyError, DecodeError, ParameterError, TagError};
use crate::metadata::{Bindable, extract};
use crate::types::MetadataTable;
use crate::validate::Validate;

pub const QUERY_TAG: &str = "query";
pub const HEADER_TAG: &str = "header";
pub const PATH_TAG: &str = "path";
pub const JSON_TAG: &str = "json";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Request part a tagged field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    Query,
    Header,
    Path,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Query, Source::Header, Source::Path];

    pub fn tag(self) -> &'static str {
        match self {
            Source::Query => QUERY_TAG,
            Source::Header => HEADER_TAG,
            Source::Path => PATH_TAG,
        }
    }

    /// Query and header names match case-insensitively; path names match exactly.
    pub fn normalize(self, key: &str) -> String {
        match self {
            Source::Query | Source::Header => key.to_ascii_lowercase(),
            Source::Path => key.to_owned(),
        }
    }
}

/// Values of the path template segments, inserted into the request extensions by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Normalized lookup key → field name, per source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupKeys {
    by_source: BTreeMap<Source, BTreeMap<String, String>>,
}

impl LookupKeys {
    /// Field bound to `key` for `source`; `key` is normalized first.
    pub fn field_for(&self, source: Source, key: &str) -> Option<&str> {
        self.by_source
            .get(&source)
            .and_then(|keys| keys.get(&source.normalize(key)))
            .map(String::as_str)
    }

    /// `(normalized key, field name)` pairs for `source`.
    pub fn keys(&self, source: Source) -> impl Iterator<Item = (&str, &str)> {
        self.by_source
            .get(&source)
            .into_iter()
            .flatten()
            .map(|(key, field)| (key.as_str(), field.as_str()))
    }

    fn from_metadata(metadata: &MetadataTable) -> Result<Self, TagError> {
        let mut keys = LookupKeys::default();

        for descriptor in metadata.iter() {
            let mut sourced: Option<(Source, &str)> = None;
            for candidate in Source::ALL {
                let Some(key) = descriptor.tag(candidate.tag()) else {
                    continue;
                };
                if let Some((first, _)) = sourced {
                    return Err(TagError::MultipleSources {
                        field: descriptor.name.clone(),
                        first: first.tag(),
                        second: candidate.tag(),
                    });
                }
                sourced = Some((candidate, key));
            }

            let Some((source, key)) = sourced else {
                continue;
            };

            if key.is_empty() || key.chars().any(char::is_whitespace) {
                return Err(TagError::InvalidKey {
                    field: descriptor.name.clone(),
                    tag: source.tag(),
                    key: key.to_owned(),
                });
            }
            if descriptor.tag(JSON_TAG) != Some("-") {
                return Err(TagError::MissingJsonSkip {
                    field: descriptor.name.clone(),
                    tag: source.tag(),
                });
            }

            let normalized = source.normalize(key);
            let lookup = keys.by_source.entry(source).or_default();
            if let Some(existing) = lookup.get(&normalized) {
                return Err(TagError::DuplicateKey {
                    tag: source.tag(),
                    key: normalized,
                    first: existing.clone(),
                    second: descriptor.name.clone(),
                });
            }
            lookup.insert(normalized, descriptor.name.clone());
        }

        Ok(keys)
    }
}

static LOOKUP_CACHE: OnceLock<Cache<TypeId, Arc<LookupKeys>>> = OnceLock::new();

/// Extracts and validates the parameter tags of `T`. Successful results are cached per type.
pub fn lookup_keys<T: Bindable>() -> Result<Arc<LookupKeys>, TagError> {
    LOOKUP_CACHE.get_or_init(Cache::new).get_or_set(TypeId::of::<T>(), |_| {
        let keys = LookupKeys::from_metadata(&extract::<T>())?;
        Ok((Arc::new(keys), None))
    })
}

/// Builds a `T` from an HTTP request and validates it.
///
/// The JSON body (when the content type is `application/json`) is decoded first, then query,
/// header and path values are assigned, then [`Validate::validate`] runs.
///
/// # Panics
///
/// Panics with `tags are not correctly formatted` when the parameter tags of `T` are inconsistent.
pub fn decode<T, B>(request: &Request<B>) -> Result<T, DecodeError>
where
    T: Bindable + Default + DeserializeOwned + Validate,
    B: AsRef<[u8]>,
{
    let keys = tag_lookup_keys::<T>();

    let mut params = if is_json(request.headers()) {
        decode_body(request.body().as_ref()).map_err(DecodeError::Body)?
    } else {
        T::default()
    };

    bind_with_keys(&mut params, &keys, request)?;

    params.validate().map_err(DecodeError::Validation)?;
    Ok(params)
}

/// Assigns query, header and path values onto an existing `params`.
///
/// Stops at the first failure; fields assigned before it keep their new values.
///
/// # Panics
///
/// Same as [`decode`].
pub fn bind_sources<T, B>(params: &mut T, request: &Request<B>) -> Result<(), DecodeError>
where
    T: Bindable,
{
    bind_with_keys(params, &tag_lookup_keys::<T>(), request)
}

fn bind_with_keys<T: Bindable, B>(params: &mut T, keys: &LookupKeys, request: &Request<B>) -> Result<(), DecodeError> {
    decode_query(params, keys, request.uri()).map_err(DecodeError::Query)?;
    decode_headers(params, keys, request.headers()).map_err(DecodeError::Header)?;
    if let Some(path) = request.extensions().get::<PathParams>() {
        decode_path(params, keys, path).map_err(DecodeError::Path)?;
    }
    Ok(())
}

fn tag_lookup_keys<T: Bindable>() -> Arc<LookupKeys> {
    match lookup_keys::<T>() {
        Ok(keys) => keys,
        Err(err) => panic!("tags are not correctly formatted ({err})"),
    }
}

/// The whole header value must be `application/json`, ignoring case. Parameters such as
/// `; charset=utf-8` do not match.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(CONTENT_TYPE_JSON.as_bytes()))
}

/// Top-level keys that `T`'s `Deserialize` impl does not consume are rejected; nested composites
/// stay permissive.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, BodyError> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(BodyError::NotAnObject);
    }

    let mut unknown = None;
    let params = serde_ignored::deserialize(value, |path| {
        if let Path::Map { parent: Path::Root, key } = path {
            unknown.get_or_insert(key);
        }
    })?;
    match unknown {
        Some(name) => Err(BodyError::UnknownField { name }),
        None => Ok(params),
    }
}

fn decode_query<T: Bindable>(params: &mut T, keys: &LookupKeys, uri: &Uri) -> Result<(), ParameterError> {
    let Some(query) = uri.query() else {
        return Ok(());
    };

    // Grouped by normalized name so `limit` and `LIMIT` count as the same parameter.
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let name = Source::Query.normalize(&name);
        match positions.get(&name) {
            Some(&index) => grouped[index].1.push(value.into_owned()),
            None => {
                positions.insert(name.clone(), grouped.len());
                grouped.push((name, vec![value.into_owned()]));
            }
        }
    }

    for (name, mut values) in grouped {
        let Some(field) = keys.field_for(Source::Query, &name) else {
            continue;
        };
        if values.len() != 1 {
            return Err(ParameterError::MultipleValues {
                origin: QUERY_TAG,
                name,
                values,
            });
        }
        let value = values.remove(0);
        assign_parameter(params, QUERY_TAG, field, name, value)?;
    }
    Ok(())
}

fn decode_headers<T: Bindable>(params: &mut T, keys: &LookupKeys, headers: &HeaderMap) -> Result<(), ParameterError> {
    for name in headers.keys() {
        let Some(field) = keys.field_for(Source::Header, name.as_str()) else {
            continue;
        };
        let values: Vec<_> = headers.get_all(name).iter().collect();
        if values.len() != 1 {
            return Err(ParameterError::MultipleValues {
                origin: HEADER_TAG,
                name: name.to_string(),
                values: values
                    .iter()
                    .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                    .collect(),
            });
        }
        let value = std::str::from_utf8(values[0].as_bytes()).map_err(|_| ParameterError::NotText {
            origin: HEADER_TAG,
            name: name.to_string(),
        })?;
        assign_parameter(params, HEADER_TAG, field, name.to_string(), value.to_owned())?;
    }
    Ok(())
}

fn decode_path<T: Bindable>(params: &mut T, keys: &LookupKeys, path: &PathParams) -> Result<(), ParameterError> {
    for (key, field) in keys.keys(Source::Path) {
        let Some(value) = path.get(key).filter(|value| !value.is_empty()) else {
            continue;
        };
        assign_parameter(params, PATH_TAG, field, key.to_owned(), value.to_owned())?;
    }
    Ok(())
}

fn assign_parameter<T: Bindable>(
    params: &mut T,
    origin: &'static str,
    field: &str,
    name: String,
    value: String,
) -> Result<(), ParameterError> {
    log::trace!("binding {origin} parameter {name} to field {field}");
    assign_to_field(params, field, &value).map_err(|source| ParameterError::Assign {
        origin,
        name,
        value,
        source,
    })
}
