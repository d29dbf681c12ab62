use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Closed set of field kinds the assignment engine knows how to convert into.
///
/// The derive macro classifies every bindable field into one of these at compile time,
/// so assignment never has to inspect a type at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `String`, copied verbatim.
    String,
    /// Signed integer of the given width.
    Signed { bits: u32 },
    /// Unsigned integer of the given width.
    Unsigned { bits: u32 },
    /// Floating point number of the given width.
    Float { bits: u32 },
    Bool,
    /// `chrono::DateTime<Tz>`, parsed as RFC 3339.
    Time,
    /// Type implementing [`FromText`](crate::convert::FromText).
    Text,
    /// Composite decoded from a JSON document (structs, maps, sequences).
    Json,
    /// `Option<T>` or `Box<T>`; the inner kind is decoded and then wrapped.
    Pointer(Box<FieldKind>),
    /// No textual form; assigning always fails with a recoverable error.
    Unsupported,
}

impl FieldKind {
    pub fn pointer(inner: FieldKind) -> Self {
        FieldKind::Pointer(Box::new(inner))
    }

    /// Returns false when this kind, or the kind behind any pointer layer, is [`FieldKind::Unsupported`].
    pub fn is_supported(&self) -> bool {
        match self {
            FieldKind::Unsupported => false,
            FieldKind::Pointer(inner) => inner.is_supported(),
            _ => true,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => f.write_str("string"),
            FieldKind::Signed { bits } => write!(f, "int{bits}"),
            FieldKind::Unsigned { bits } => write!(f, "uint{bits}"),
            FieldKind::Float { bits } => write!(f, "float{bits}"),
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Time => f.write_str("time"),
            FieldKind::Text => f.write_str("text"),
            FieldKind::Json => f.write_str("json"),
            FieldKind::Pointer(inner) => write!(f, "pointer to {inner}"),
            FieldKind::Unsupported => f.write_str("unsupported"),
        }
    }
}

/// Metadata for one bindable field, produced once per struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Fully qualified name of the declared Rust type.
    pub type_name: &'static str,
    pub tags: BTreeMap<String, String>,
    /// Names of the flattened fields this field was reached through, outermost first.
    /// Only used for diagnostics.
    pub ancestors: Vec<String>,
}

impl FieldDescriptor {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Dotted path including ancestors, e.g. `server.listen.port`.
    pub fn path(&self) -> String {
        let mut path = self.ancestors.join(".");
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(&self.name);
        path
    }
}

/// Flat, read-only mapping of field names to descriptors for one struct type,
/// including fields reached through flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTable {
    type_name: &'static str,
    fields: HashMap<String, FieldDescriptor>,
    order: Vec<String>,
}

impl MetadataTable {
    pub(crate) fn new(type_name: &'static str, fields: HashMap<String, FieldDescriptor>, order: Vec<String>) -> Self {
        Self {
            type_name,
            fields,
            order,
        }
    }

    /// Name of the struct type this table describes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Field names in declaration order, flattened fields in place.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.order.iter().filter_map(|name| self.fields.get(name))
    }
}

impl<'a> IntoIterator for &'a MetadataTable {
    type Item = &'a FieldDescriptor;
    type IntoIter = Box<dyn Iterator<Item = &'a FieldDescriptor> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
