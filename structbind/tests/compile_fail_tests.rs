//! Compile-fail tests for `#[derive(Bindable)]` misuse.
//!
//! The derive must reject, with a spanned error:
//! - enums and tuple structs
//! - unknown `#[bind(...)]` options
//! - tag values that would break the raw tag format

#[test]
fn compile_fail_tests() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/*.rs");
}
