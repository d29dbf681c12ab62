use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type, TypePath};

/// How the derive decodes a field, decided from the declared type alone.
#[derive(Clone)]
pub(crate) struct KindPlan {
    ty: Type,
    kind: Kind,
}

#[derive(Clone)]
enum Kind {
    String,
    Signed,
    Unsigned,
    Float,
    Bool,
    Time,
    Text,
    Json,
    Pointer(Wrapper, Box<KindPlan>),
    Unsupported,
}

#[derive(Clone, Copy)]
enum Wrapper {
    Option,
    Box,
}

/// Explicit decoding requested through `#[bind(text)]` or `#[bind(json)]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Override {
    Text,
    Json,
}

impl KindPlan {
    /// Classifies `ty`. `Option` and `Box` layers become pointers; an override applies to the type
    /// behind them.
    pub(crate) fn classify(ty: &Type, override_kind: Option<Override>) -> Self {
        let ty = strip_groups(ty);

        if let Some((wrapper, inner)) = unwrap_pointer(ty) {
            return Self {
                ty: ty.clone(),
                kind: Kind::Pointer(wrapper, Box::new(Self::classify(inner, override_kind))),
            };
        }

        let kind = match override_kind {
            Some(Override::Text) => Kind::Text,
            Some(Override::Json) => Kind::Json,
            None => classify_leaf(ty),
        };
        Self { ty: ty.clone(), kind }
    }

    /// `structbind::types::FieldKind` expression describing this plan.
    pub(crate) fn kind_tokens(&self) -> TokenStream2 {
        let ty = &self.ty;
        match &self.kind {
            Kind::String => quote! { ::structbind::types::FieldKind::String },
            Kind::Signed => quote! { ::structbind::types::FieldKind::Signed { bits: <#ty>::BITS } },
            Kind::Unsigned => quote! { ::structbind::types::FieldKind::Unsigned { bits: <#ty>::BITS } },
            Kind::Float => quote! {
                ::structbind::types::FieldKind::Float { bits: <#ty as ::structbind::convert::Float>::BITS }
            },
            Kind::Bool => quote! { ::structbind::types::FieldKind::Bool },
            Kind::Time => quote! { ::structbind::types::FieldKind::Time },
            Kind::Text => quote! { ::structbind::types::FieldKind::Text },
            Kind::Json => quote! { ::structbind::types::FieldKind::Json },
            Kind::Pointer(_, inner) => {
                let inner = inner.kind_tokens();
                quote! { ::structbind::types::FieldKind::pointer(#inner) }
            }
            Kind::Unsupported => quote! { ::structbind::types::FieldKind::Unsupported },
        }
    }

    /// Expression of type `Result<#ty, ConversionError>` decoding the local `raw: &str`.
    pub(crate) fn decode_tokens(&self) -> TokenStream2 {
        let ty = &self.ty;
        if !self.is_supported() {
            return quote! {
                ::structbind::convert::unsupported::<#ty>(::core::any::type_name::<#ty>())
            };
        }
        match &self.kind {
            Kind::String => quote! { ::structbind::convert::string(raw) },
            Kind::Signed => quote! { ::structbind::convert::signed::<#ty>(raw) },
            Kind::Unsigned => quote! { ::structbind::convert::unsigned::<#ty>(raw) },
            Kind::Float => quote! { ::structbind::convert::float::<#ty>(raw) },
            Kind::Bool => quote! { ::structbind::convert::boolean(raw) },
            Kind::Time => quote! { ::structbind::convert::time::<#ty>(raw) },
            Kind::Text => quote! { ::structbind::convert::text::<#ty>(raw) },
            Kind::Json => quote! { ::structbind::convert::json::<#ty>(raw) },
            Kind::Pointer(wrapper, inner) => {
                let inner = inner.decode_tokens();
                match wrapper {
                    Wrapper::Option => quote! { (#inner).map(::core::option::Option::Some) },
                    Wrapper::Box => quote! { (#inner).map(::std::boxed::Box::new) },
                }
            }
            Kind::Unsupported => unreachable!("unsupported plans return early"),
        }
    }

    /// Unsized leaves such as `dyn Trait` only ever appear behind a pointer, so an unsupported
    /// plan is decoded at the outermost, sized, type.
    fn is_supported(&self) -> bool {
        match &self.kind {
            Kind::Unsupported => false,
            Kind::Pointer(_, inner) => inner.is_supported(),
            _ => true,
        }
    }
}

fn classify_leaf(ty: &Type) -> Kind {
    match ty {
        Type::Path(path) if path.qself.is_none() => classify_path(path),
        Type::Array(_) | Type::Slice(_) | Type::Tuple(_) => Kind::Json,
        _ => Kind::Unsupported,
    }
}

fn classify_path(path: &TypePath) -> Kind {
    let Some(ident) = last_ident_str(path) else {
        return Kind::Unsupported;
    };
    match ident.as_str() {
        "String" => Kind::String,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => Kind::Signed,
        "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => Kind::Unsigned,
        "f32" | "f64" => Kind::Float,
        "bool" => Kind::Bool,
        "DateTime" => Kind::Time,
        _ => Kind::Json,
    }
}

fn strip_groups(ty: &Type) -> &Type {
    match ty {
        Type::Group(group) => strip_groups(&group.elem),
        Type::Paren(paren) => strip_groups(&paren.elem),
        other => other,
    }
}

fn unwrap_pointer(ty: &Type) -> Option<(Wrapper, &Type)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let wrapper = match last_ident_str(path)?.as_str() {
        "Option" => Wrapper::Option,
        "Box" => Wrapper::Box,
        _ => return None,
    };
    single_type_argument(path).map(|inner| (wrapper, inner))
}

fn single_type_argument(path: &TypePath) -> Option<&Type> {
    match &path.path.segments.last()?.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn last_ident_str(path: &TypePath) -> Option<String> {
    path.path.segments.last().map(|seg| seg.ident.to_string())
}
