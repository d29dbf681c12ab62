use crate::errors::ValidationResult;

/// Hook run after a collaborator has bound every field.
///
/// The rules behind it are up to the implementor; the binders only look at the result. The default
/// implementation accepts everything, so `impl Validate for Config {}` is enough when a type has
/// no rules.
pub trait Validate {
    fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

impl<T: Validate> Validate for Box<T> {
    fn validate(&self) -> ValidationResult<()> {
        (**self).validate()
    }
}
