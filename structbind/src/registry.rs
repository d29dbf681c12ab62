use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::assign::assign_erased;
use crate::errors::AssignError;
use crate::metadata::Bindable;

/// Link-time registration of a derived, non-generic [`Bindable`] struct.
///
/// `#[derive(Bindable)]` submits one of these through `inventory` so that targets only known as
/// `&mut dyn Any` can still be bound.
pub struct BindableType {
    type_id: fn() -> TypeId,
    type_name: fn() -> &'static str,
    assign: fn(&mut dyn Any, &str, &str) -> Result<(), AssignError>,
}

impl BindableType {
    pub const fn of<T: Bindable>() -> Self {
        Self {
            type_id: TypeId::of::<T>,
            type_name: std::any::type_name::<T>,
            assign: assign_erased::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    pub(crate) fn assign(&self, target: &mut dyn Any, field: &str, raw: &str) -> Result<(), AssignError> {
        (self.assign)(target, field, raw)
    }
}

inventory::collect!(BindableType);

static REGISTRY: OnceLock<HashMap<TypeId, &'static BindableType>> = OnceLock::new();

fn registry() -> &'static HashMap<TypeId, &'static BindableType> {
    REGISTRY.get_or_init(|| {
        let registered: HashMap<_, _> = inventory::iter::<BindableType>
            .into_iter()
            .map(|entry| (entry.type_id(), entry))
            .collect();
        log::debug!("registered {} bindable types", registered.len());
        registered
    })
}

/// Looks up the registration for a concrete type.
pub fn lookup(type_id: TypeId) -> Option<&'static BindableType> {
    registry().get(&type_id).copied()
}

/// Names of every registered bindable type.
pub fn registered_types() -> Vec<&'static str> {
    let mut names: Vec<_> = registry().values().map(|entry| entry.type_name()).collect();
    names.sort_unstable();
    names
}
