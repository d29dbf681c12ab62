use std::collections::BTreeMap;
use std::sync::LazyLock;

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use regex::Regex;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result, Type};

use crate::kind::{KindPlan, Override};

mod binding;
mod field;

pub(crate) use binding::ParsedStruct;
use field::{FieldRole, ParsedField};
