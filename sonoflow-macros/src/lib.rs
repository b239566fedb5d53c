use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod stage_params;
use stage_params::{parse_fields, parse_stage_meta, DomainArgs};

/// Implements `StageParams` for a struct of stage parameters.
///
/// Fields marked `#[param(...)]` are declared in the configuration store and
/// kept in sync with it; other fields are initialised with `Default`. With
/// `#[stage_meta(name, category)]` the stage is also added to the registry.
#[proc_macro_derive(StageParams, attributes(stage_meta, param))]
pub fn derive_stage_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let stage_meta = match parse_stage_meta(&input) {
        Ok(meta) => meta,
        Err(e) => return e.write_errors().into(),
    };

    let (params, plain) = match parse_fields(&input) {
        Ok(fields) => fields,
        Err(e) => return e.to_compile_error().into(),
    };

    let struct_name = &input.ident;

    let mut specs: Vec<TokenStream2> = Vec::new();
    let mut loads: Vec<TokenStream2> = Vec::new();
    let mut reloads: Vec<TokenStream2> = Vec::new();
    let mut snapshots: Vec<TokenStream2> = Vec::new();

    for param in &params {
        let Some(field) = param.ident.as_ref() else {
            continue;
        };
        let ty = &param.ty;
        let key = param.key();
        let description = param.description.clone().unwrap_or_default();

        let default = match param.default_expr() {
            Ok(expr) => expr,
            Err(e) => return e.to_compile_error().into(),
        };

        let domain = match param.domain() {
            Ok(DomainArgs::Range { min, max }) => quote! {
                crate::config::ParameterDomain::range(
                    { let min: #ty = #min; min },
                    { let max: #ty = #max; max },
                )
            },
            Ok(DomainArgs::Choices(choices)) => quote! {
                crate::config::ParameterDomain::choices::<_, #ty>([#(#choices),*])
            },
            Ok(DomainArgs::Any) => quote! { crate::config::ParameterDomain::Any },
            Err(e) => return e.to_compile_error().into(),
        };

        specs.push(quote! {
            crate::config::ParameterSpec::new(
                #key,
                #domain,
                { let default: #ty = #default; default },
                #description,
            )
        });

        loads.push(quote! {
            #field: store.get_as::<#ty>(#key)?
        });

        reloads.push(quote! {
            #key => {
                self.#field = store.get_as::<#ty>(#key)?;
                Ok(true)
            }
        });

        snapshots.push(quote! {
            snapshot.insert(
                #key,
                crate::config::ParameterValue::from(::core::clone::Clone::clone(&self.#field)),
            );
        });
    }

    let registration: Option<TokenStream2> = stage_meta.map(|meta| {
        let stage_name = &meta.name;
        let category = &meta.category;

        let mod_name = syn::Ident::new(
            &format!("__stage_registration_{}", struct_name.to_string().to_lowercase()),
            struct_name.span(),
        );

        quote! {
            mod #mod_name {
                use super::*;

                fn describe() -> crate::registry::StageDescriptor {
                    crate::registry::StageDescriptor::new(
                        #stage_name,
                        #category,
                        <#struct_name as crate::config::StageParams>::schema(),
                    )
                }

                ::inventory::submit! {
                    crate::registry::StageDescriptorFactory(describe)
                }
            }
        }
    });

    let expanded = quote! {
        impl crate::config::StageParams for #struct_name {
            fn schema() -> ::std::vec::Vec<crate::config::ParameterSpec> {
                ::std::vec![#(#specs),*]
            }

            fn load(
                store: &crate::config::ConfigurationStore,
            ) -> ::core::result::Result<Self, crate::config::ConfigError> {
                ::core::result::Result::Ok(Self {
                    #(#loads,)*
                    #(#plain: ::core::default::Default::default(),)*
                })
            }

            fn reload(
                &mut self,
                key: &str,
                store: &crate::config::ConfigurationStore,
            ) -> ::core::result::Result<bool, crate::config::ConfigError> {
                match key {
                    #(#reloads)*
                    _ => ::core::result::Result::Ok(false),
                }
            }

            fn snapshot(&self) -> crate::config::ParameterSnapshot {
                let mut snapshot = crate::config::ParameterSnapshot::new();
                #(#snapshots)*
                snapshot
            }
        }

        #registration
    };

    TokenStream::from(expanded)
}
