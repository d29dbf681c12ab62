use super::*;

pub(crate) struct ParsedStruct {
    name: Ident,
    fields: Vec<ParsedField>,
}

impl ParsedStruct {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        if let Some(attr) = input.attrs.iter().find(|attr| attr.path().is_ident("bind")) {
            return Err(Error::new(attr.span(), "#[bind(...)] options belong on fields, not on the struct"));
        }
        if !input.generics.params.is_empty() {
            return Err(Error::new(
                input.generics.span(),
                "Bindable cannot be derived for generic structs",
            ));
        }

        let fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => {
                    let mut parsed = Vec::new();
                    for field in &named.named {
                        parsed.push(ParsedField::from_field(field)?);
                    }
                    parsed
                }
                _ => return Err(Error::new(input.ident.span(), "Bindable requires named fields")),
            },
            _ => return Err(Error::new(input.ident.span(), "Bindable can only be derived for structs")),
        };

        let mut seen: BTreeMap<&str, &Ident> = BTreeMap::new();
        for field in &fields {
            if !matches!(field.role, FieldRole::Value(_)) {
                continue;
            }
            if let Some(first) = seen.insert(&field.name, &field.ident) {
                return Err(Error::new(
                    field.ident.span(),
                    format!("bind name `{}` is already used by field `{first}`", field.name),
                ));
            }
        }

        Ok(Self {
            name: input.ident.clone(),
            fields,
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.name;
        let describe = self.fields.iter().map(ParsedField::describe_tokens);
        let arms = self.fields.iter().filter_map(ParsedField::assign_arm);
        let delegates = self.fields.iter().filter_map(ParsedField::flatten_delegate);

        quote! {
            impl ::structbind::metadata::Bindable for #name {
                fn describe(builder: &mut ::structbind::metadata::MetadataBuilder) {
                    let _ = &builder;
                    #(#describe)*
                }

                #[allow(unused_variables)]
                fn assign_field(
                    &mut self,
                    field: &str,
                    raw: &str,
                ) -> ::core::option::Option<::core::result::Result<(), ::structbind::ConversionError>> {
                    match field {
                        #(#arms)*
                        _ => {
                            #(#delegates)*
                            ::core::option::Option::None
                        }
                    }
                }
            }

            ::structbind::inventory::submit! {
                ::structbind::registry::BindableType::of::<#name>()
            }
        }
    }
}
