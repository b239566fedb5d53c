use darling::{FromAttributes, FromField};
use syn::punctuated::Punctuated;
use syn::{DeriveInput, Expr, Fields, Token};

/// Parsed attributes from #[stage_meta(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(stage_meta))]
pub struct StageMetaArgs {
    pub name: String,
    pub category: String,
}

/// Parsed attributes from #[param(...)]
///
/// Values are Rust expressions written as strings so that one attribute shape
/// covers integers, floats and enum constants alike.
#[derive(Debug, FromField)]
#[darling(attributes(param))]
pub struct ParamField {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    /// Configuration key; defaults to the field name
    #[darling(default)]
    pub key: Option<String>,

    pub default: String,

    #[darling(default)]
    pub min: Option<String>,

    #[darling(default)]
    pub max: Option<String>,

    /// Comma-separated list of allowed values
    #[darling(default)]
    pub choices: Option<String>,

    #[darling(default)]
    pub description: Option<String>,
}

pub enum DomainArgs {
    Range { min: Expr, max: Expr },
    Choices(Vec<Expr>),
    Any,
}

impl ParamField {
    pub fn key(&self) -> String {
        self.key.clone().unwrap_or_else(|| {
            self.ident
                .as_ref()
                .map(|i| i.to_string())
                .unwrap_or_default()
        })
    }

    pub fn default_expr(&self) -> syn::Result<Expr> {
        syn::parse_str(&self.default)
    }

    pub fn domain(&self) -> syn::Result<DomainArgs> {
        match (&self.min, &self.max, &self.choices) {
            (Some(min), Some(max), None) => Ok(DomainArgs::Range {
                min: syn::parse_str(min)?,
                max: syn::parse_str(max)?,
            }),
            (None, None, Some(choices)) => {
                let parser = Punctuated::<Expr, Token![,]>::parse_terminated;
                let list = syn::parse::Parser::parse_str(parser, choices)?;
                Ok(DomainArgs::Choices(list.into_iter().collect()))
            }
            (None, None, None) => Ok(DomainArgs::Any),
            _ => Err(syn::Error::new_spanned(
                &self.ty,
                "a parameter takes either `min` and `max`, or `choices`",
            )),
        }
    }
}

pub fn parse_stage_meta(input: &DeriveInput) -> darling::Result<Option<StageMetaArgs>> {
    if !input.attrs.iter().any(|attr| attr.path().is_ident("stage_meta")) {
        return Ok(None);
    }
    StageMetaArgs::from_attributes(&input.attrs).map(Some)
}

/// Splits named fields into parameters and plain fields
pub fn parse_fields(input: &DeriveInput) -> syn::Result<(Vec<ParamField>, Vec<syn::Ident>)> {
    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "StageParams requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "StageParams can only be derived for structs",
            ))
        }
    };

    let mut params = Vec::new();
    let mut plain = Vec::new();

    for field in fields.iter() {
        if field.attrs.iter().any(|attr| attr.path().is_ident("param")) {
            let param = ParamField::from_field(field)
                .map_err(|e| syn::Error::new_spanned(field, e.to_string()))?;
            params.push(param);
        } else if let Some(ident) = &field.ident {
            plain.push(ident.clone());
        }
    }

    Ok((params, plain))
}
