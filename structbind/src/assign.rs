//! The assignment engine.
//!
//! Defects in the calling code (unknown field, target that is not a bindable struct) panic.
//! Raw values that cannot be converted come back as [`AssignError`].

use std::any::{Any, type_name};

use crate::errors::{AssignError, ConversionError};
use crate::metadata::{Bindable, extract};
use crate::registry;
use crate::types::FieldDescriptor;

/// Converts `raw` into the declared type of `field` and writes it into `target`.
///
/// Only the named field is touched, and only once the conversion has succeeded.
///
/// # Panics
///
/// Panics with `no field '<field>' in struct <type>` when `field` is not in the metadata table
/// of `T`, and when two fields of `T` share a name through flattening.
pub fn assign_to_field<T: Bindable>(target: &mut T, field: &str, raw: &str) -> Result<(), AssignError> {
    let metadata = extract::<T>();
    let Some(descriptor) = metadata.get(field) else {
        panic!("no field '{field}' in struct {}", metadata.type_name());
    };
    assign_described(target, descriptor, raw)
}

/// Same as [`assign_to_field`] for a target known only as `&mut dyn Any`.
///
/// # Panics
///
/// Panics with `obj must be a pointer to a struct` when the concrete type of `target` is not a
/// registered `#[derive(Bindable)]` struct, and under the conditions of [`assign_to_field`].
pub fn assign_any(target: &mut dyn Any, field: &str, raw: &str) -> Result<(), AssignError> {
    let type_id = (*target).type_id();
    match registry::lookup(type_id) {
        Some(entry) => entry.assign(target, field, raw),
        None => panic!("obj must be a pointer to a struct deriving Bindable"),
    }
}

/// Type-erased trampoline stored in the registry.
pub(crate) fn assign_erased<T: Bindable>(target: &mut dyn Any, field: &str, raw: &str) -> Result<(), AssignError> {
    match target.downcast_mut::<T>() {
        Some(target) => assign_to_field(target, field, raw),
        None => panic!("obj must be a pointer to a struct of type {}", type_name::<T>()),
    }
}

fn assign_described<T: Bindable>(target: &mut T, descriptor: &FieldDescriptor, raw: &str) -> Result<(), AssignError> {
    let fail = |source: ConversionError| AssignError::new(&descriptor.name, raw, descriptor.kind.clone(), source);

    if !descriptor.kind.is_supported() {
        return Err(fail(ConversionError::UnsupportedType {
            type_name: descriptor.type_name,
        }));
    }

    log::trace!("assigning {} field {} of {}", descriptor.kind, descriptor.path(), type_name::<T>());
    match target.assign_field(&descriptor.name, raw) {
        Some(result) => result.map_err(fail),
        None => panic!(
            "no field '{}' in struct {}: metadata and assign_field disagree",
            descriptor.name,
            type_name::<T>()
        ),
    }
}
