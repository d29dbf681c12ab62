use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod kind;
mod parsed;

use parsed::ParsedStruct;

/// Derives `structbind::metadata::Bindable`.
///
/// Field options, all under `#[bind(...)]`:
///
/// - `rename = "Name"`: bind under another name (defaults to the field identifier).
/// - `flatten`: merge the fields of this struct-typed field into the enclosing namespace.
/// - `skip`: leave the field out of the metadata table.
/// - `text`: decode through `structbind::FromText`.
/// - `json`: decode as a JSON document even when the type would be classified otherwise.
/// - `tag = r#"key:"value" other:"value""#`: raw tag entries.
/// - `tags(key = "value", other = "value")`: the same entries as key/value pairs.
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedStruct::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
