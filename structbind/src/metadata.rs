//! Per-type field metadata.
//!
//! `#[derive(Bindable)]` implements [`Bindable::describe`], which feeds every field into a
//! [`MetadataBuilder`] and recurses into `#[bind(flatten)]` fields. [`extract`] runs that walk
//! once per type and caches the resulting [`MetadataTable`] for the rest of the process.

use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;

use crate::cache::Cache;
use crate::errors::ConversionError;
use crate::types::{FieldDescriptor, FieldKind, MetadataTable};

/// Matches every `key:"value"` entry of a raw tag string.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+):"([^"]*)""#).expect("tag pattern is a valid regex"));

static METADATA_CACHE: OnceLock<Cache<TypeId, Arc<MetadataTable>>> = OnceLock::new();

fn metadata_cache() -> &'static Cache<TypeId, Arc<MetadataTable>> {
    METADATA_CACHE.get_or_init(Cache::new)
}

/// A struct whose named fields can be assigned from raw text.
///
/// Implemented by `#[derive(Bindable)]`; hand-written implementations must keep
/// [`describe`](Bindable::describe) and [`assign_field`](Bindable::assign_field) in agreement.
pub trait Bindable: 'static {
    /// Feeds this type's fields into `builder` in declaration order.
    fn describe(builder: &mut MetadataBuilder);

    /// Decodes `raw` into the field called `field` and stores it.
    ///
    /// Returns `None` when no field of that name exists on this type or any flattened field.
    /// On `Some(Err(_))` the field has not been modified.
    fn assign_field(&mut self, field: &str, raw: &str) -> Option<Result<(), ConversionError>>;
}

impl<T: Bindable> Bindable for Box<T> {
    fn describe(builder: &mut MetadataBuilder) {
        T::describe(builder);
    }

    fn assign_field(&mut self, field: &str, raw: &str) -> Option<Result<(), ConversionError>> {
        (**self).assign_field(field, raw)
    }
}

/// Accumulates the flat field table of one struct type.
pub struct MetadataBuilder {
    type_name: &'static str,
    fields: HashMap<String, FieldDescriptor>,
    order: Vec<String>,
    ancestors: Vec<String>,
    flattening: Vec<TypeId>,
}

impl MetadataBuilder {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: HashMap::new(),
            order: Vec::new(),
            ancestors: Vec::new(),
            flattening: Vec::new(),
        }
    }

    /// Records one field.
    ///
    /// # Panics
    ///
    /// Panics when `name` is already in the table. Only conflicting flattened structs can cause
    /// this, which is a defect in the type definitions rather than bad input.
    pub fn field(&mut self, name: &str, kind: FieldKind, type_name: &'static str, tag: &str) -> &mut Self {
        if let Some(existing) = self.fields.get(name) {
            panic!(
                "field {name} is ambiguous in {}: reachable as {} and as {}",
                self.type_name,
                existing.path(),
                self.path_for(name),
            );
        }

        let descriptor = FieldDescriptor {
            name: name.to_owned(),
            kind,
            type_name,
            tags: parse_tag(tag),
            ancestors: self.ancestors.clone(),
        };
        self.order.push(descriptor.name.clone());
        self.fields.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Merges the fields of the flattened field `name`, of type `T`, into this table.
    ///
    /// # Panics
    ///
    /// Panics when `T` is already being flattened further up the chain.
    pub fn flatten<T: Bindable>(&mut self, name: &str) -> &mut Self {
        let type_id = TypeId::of::<T>();
        if self.flattening.contains(&type_id) {
            panic!(
                "field {} of {} flattens {} into itself",
                self.path_for(name),
                self.type_name,
                type_name::<T>(),
            );
        }

        self.flattening.push(type_id);
        self.ancestors.push(name.to_owned());
        T::describe(self);
        self.ancestors.pop();
        self.flattening.pop();
        self
    }

    pub fn build(self) -> MetadataTable {
        MetadataTable::new(self.type_name, self.fields, self.order)
    }

    fn path_for(&self, name: &str) -> String {
        self.ancestors
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Returns the metadata table of `T`, building it on first use.
///
/// Concurrent first calls for the same type build the table once; every caller receives the
/// same `Arc`.
///
/// # Panics
///
/// Panics when two fields of `T` share a name through flattening.
pub fn extract<T: Bindable>() -> Arc<MetadataTable> {
    let result = metadata_cache().get_or_set(TypeId::of::<T>(), |_| {
        let mut builder = MetadataBuilder::new(type_name::<T>());
        T::describe(&mut builder);
        let table = builder.build();
        log::debug!("built field metadata for {} ({} fields)", table.type_name(), table.len());
        Ok::<_, Infallible>((Arc::new(table), None))
    });
    match result {
        Ok(table) => table,
        Err(never) => match never {},
    }
}

/// Parses a raw tag string such as `config_format:"snake" config_default:"1"` into a map.
///
/// Text between entries is ignored; a repeated key keeps its last value.
pub fn parse_tag(tag: &str) -> BTreeMap<String, String> {
    if tag.is_empty() {
        return BTreeMap::new();
    }
    TAG_PATTERN
        .captures_iter(tag)
        .map(|captures| (captures[1].to_owned(), captures[2].to_owned()))
        .collect()
}
