use super::*;

/// Whole-string shape of `#[bind(tag = "...")]`: space-separated `key:"value"` entries.
static TAG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*(?:\w+:"[^"]*"\s*)*$"#).expect("tag shape is a valid regex"));

static TAG_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+):"([^"]*)""#).expect("tag entry is a valid regex"));

pub(crate) enum FieldRole {
    Value(KindPlan),
    Flatten,
    Skip,
}

pub(crate) struct ParsedField {
    pub(crate) ident: Ident,
    pub(crate) name: String,
    ty: Type,
    pub(crate) role: FieldRole,
    tag: String,
}

#[derive(Default)]
struct FieldOptions {
    rename: Option<LitStr>,
    flatten: bool,
    skip: bool,
    decode: Option<Override>,
    tags: BTreeMap<String, String>,
    tag_order: Vec<String>,
}

impl ParsedField {
    pub(crate) fn from_field(field: &Field) -> Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "Bindable requires named fields"))?;

        let mut options = FieldOptions::default();
        for attr in &field.attrs {
            if attr.path().is_ident("bind") {
                Self::parse_field_attr(attr, &mut options)?;
            }
        }

        let name = match &options.rename {
            Some(rename) => {
                let value = rename.value();
                if value.is_empty() {
                    return Err(Error::new(rename.span(), "#[bind(rename)] needs a non-empty name"));
                }
                value
            }
            None => ident.unraw().to_string(),
        };

        let role = if options.skip {
            if options.rename.is_some() || options.flatten || options.decode.is_some() || !options.tags.is_empty() {
                return Err(Error::new(ident.span(), "#[bind(skip)] cannot be combined with other bind options"));
            }
            FieldRole::Skip
        } else if options.flatten {
            if options.decode.is_some() {
                return Err(Error::new(ident.span(), "#[bind(flatten)] cannot be combined with text or json"));
            }
            if !options.tags.is_empty() {
                return Err(Error::new(ident.span(), "#[bind(flatten)] fields carry no tags of their own"));
            }
            FieldRole::Flatten
        } else {
            FieldRole::Value(KindPlan::classify(&field.ty, options.decode))
        };

        let tag = options
            .tag_order
            .iter()
            .map(|key| format!("{key}:\"{}\"", options.tags[key]))
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            ident,
            name,
            ty: field.ty.clone(),
            role,
            tag,
        })
    }

    fn parse_field_attr(attr: &Attribute, options: &mut FieldOptions) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if options.rename.is_some() {
                    return Err(meta.error("#[bind(rename)] given twice"));
                }
                options.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("flatten") {
                options.flatten = true;
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("text") || meta.path.is_ident("json") {
                let requested = if meta.path.is_ident("text") { Override::Text } else { Override::Json };
                if options.decode.is_some_and(|current| current != requested) {
                    return Err(meta.error("#[bind(text)] and #[bind(json)] are mutually exclusive"));
                }
                options.decode = Some(requested);
            } else if meta.path.is_ident("tag") {
                let raw: LitStr = meta.value()?.parse()?;
                let value = raw.value();
                if !TAG_SHAPE.is_match(&value) {
                    return Err(Error::new(
                        raw.span(),
                        "malformed tag, expected space-separated key:\"value\" entries",
                    ));
                }
                for captures in TAG_ENTRY.captures_iter(&value) {
                    insert_tag(options, &captures[1], captures[2].to_owned(), raw.span())?;
                }
            } else if meta.path.is_ident("tags") {
                meta.parse_nested_meta(|entry| {
                    let key = entry
                        .path
                        .get_ident()
                        .map(|ident| ident.unraw().to_string())
                        .ok_or_else(|| entry.error("tag keys must be plain identifiers"))?;
                    let value: LitStr = entry.value()?.parse()?;
                    if value.value().contains('"') {
                        return Err(Error::new(value.span(), "tag values cannot contain '\"'"));
                    }
                    insert_tag(options, &key, value.value(), value.span())
                })?;
            } else {
                return Err(meta.error("unknown bind attribute, expected rename, flatten, skip, text, json, tag, or tags"));
            }
            Ok(())
        })
    }

    /// Statement feeding this field into the `MetadataBuilder` named `builder`.
    pub(crate) fn describe_tokens(&self) -> TokenStream2 {
        let name = &self.name;
        let ty = &self.ty;
        match &self.role {
            FieldRole::Value(plan) => {
                let kind = plan.kind_tokens();
                let tag = &self.tag;
                quote! {
                    builder.field(#name, #kind, ::core::any::type_name::<#ty>(), #tag);
                }
            }
            FieldRole::Flatten => quote! {
                builder.flatten::<#ty>(#name);
            },
            FieldRole::Skip => TokenStream2::new(),
        }
    }

    /// Match arm of `assign_field` for a directly owned field.
    pub(crate) fn assign_arm(&self) -> Option<TokenStream2> {
        let FieldRole::Value(plan) = &self.role else {
            return None;
        };
        let name = &self.name;
        let ident = &self.ident;
        let decode = plan.decode_tokens();
        Some(quote! {
            #name => ::core::option::Option::Some((#decode).map(|value| {
                self.#ident = value;
            })),
        })
    }

    /// Delegation into a flattened field, tried when no direct field matched.
    pub(crate) fn flatten_delegate(&self) -> Option<TokenStream2> {
        let FieldRole::Flatten = self.role else {
            return None;
        };
        let ident = &self.ident;
        Some(quote! {
            if let ::core::option::Option::Some(result) =
                ::structbind::metadata::Bindable::assign_field(&mut self.#ident, field, raw)
            {
                return ::core::option::Option::Some(result);
            }
        })
    }
}

fn insert_tag(options: &mut FieldOptions, key: &str, value: String, span: proc_macro2::Span) -> Result<()> {
    if options.tags.insert(key.to_owned(), value).is_some() {
        return Err(Error::new(span, format!("tag key `{key}` given twice")));
    }
    options.tag_order.push(key.to_owned());
    Ok(())
}
