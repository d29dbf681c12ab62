use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use structbind::{Bindable, ConversionError, FieldKind, MetadataBuilder, extract};

#[derive(Default, Bindable)]
struct Credentials {
    #[bind(tags(config_format = "snake"))]
    user: String,
    #[bind(tag = r#"config_format:"snake" config_default:"secret""#)]
    password: String,
}

#[derive(Default, Bindable)]
struct Database {
    #[bind(tags(config_format = "snake", config_default = "localhost"))]
    host: String,
    #[bind(flatten, rename = "auth")]
    credentials: Credentials,
}

#[derive(Default, Bindable)]
struct Settings {
    name: String,
    #[bind(flatten)]
    database: Database,
    retries: Option<u8>,
}

#[test]
fn flattening_merges_fields_in_declaration_order() {
    let metadata = extract::<Settings>();

    assert!(metadata.type_name().ends_with("Settings"));
    assert_eq!(
        metadata.names().collect::<Vec<_>>(),
        ["name", "host", "user", "password", "retries"]
    );
    assert!(!metadata.contains("database"));
    assert!(!metadata.contains("credentials"));

    let user = metadata.get("user").unwrap();
    assert_eq!(user.ancestors, ["database", "auth"]);
    assert_eq!(user.path(), "database.auth.user");
    assert_eq!(user.kind, FieldKind::String);
    assert!(user.type_name.ends_with("String"));

    let retries = metadata.get("retries").unwrap();
    assert!(retries.ancestors.is_empty());
    assert_eq!(retries.kind, FieldKind::pointer(FieldKind::Unsigned { bits: 8 }));
}

#[test]
fn tags_are_parsed_from_both_attribute_forms() {
    let metadata = extract::<Settings>();

    let host = metadata.get("host").unwrap();
    assert_eq!(host.tag("config_format"), Some("snake"));
    assert_eq!(host.tag("config_default"), Some("localhost"));

    let password = metadata.get("password").unwrap();
    assert_eq!(password.tag("config_default"), Some("secret"));
    assert_eq!(password.tag("json"), None);

    assert!(metadata.get("name").unwrap().tags.is_empty());
}

#[test]
fn extraction_is_cached() {
    let first = extract::<Settings>();
    let second = extract::<Settings>();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *extract::<Settings>());
}

static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

struct Counted {
    value: i64,
}

impl Bindable for Counted {
    fn describe(builder: &mut MetadataBuilder) {
        DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(std::time::Duration::from_millis(20));
        builder.field("value", FieldKind::Signed { bits: 64 }, "i64", "");
    }

    fn assign_field(&mut self, field: &str, raw: &str) -> Option<Result<(), ConversionError>> {
        match field {
            "value" => Some(structbind::convert::signed::<i64>(raw).map(|value| self.value = value)),
            _ => None,
        }
    }
}

#[test]
fn concurrent_first_extraction_builds_once() {
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                extract::<Counted>()
            })
        })
        .collect();
    let tables: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst), 1);
    assert!(tables.iter().all(|table| Arc::ptr_eq(table, &tables[0])));

    let mut counted = Counted { value: 0 };
    structbind::assign_to_field(&mut counted, "value", "-9").unwrap();
    assert_eq!(counted.value, -9);
}

#[derive(Default, Bindable)]
struct Left {
    id: String,
}

#[derive(Default, Bindable)]
struct Right {
    id: String,
}

#[derive(Default, Bindable)]
struct Ambiguous {
    #[bind(flatten)]
    left: Left,
    #[bind(flatten)]
    right: Right,
}

#[test]
#[should_panic(expected = "field id is ambiguous")]
fn conflicting_flattened_names_panic() {
    extract::<Ambiguous>();
}

#[derive(Bindable)]
struct Node {
    #[bind(flatten)]
    next: Box<Node>,
}

#[test]
#[should_panic(expected = "into itself")]
fn recursive_flattening_panics() {
    extract::<Node>();
}
