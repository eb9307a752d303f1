use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type,
};

/// 为实现了 Deserialize 的类型自动实现 FromConfigValue trait
///
/// 原始值是字符串时按 JSON 文本解析，否则直接从 JSON 值反序列化
///
/// # 示例
/// ```ignore
/// use serde::Deserialize;
/// use config_facade::FromConfigValue;
///
/// #[derive(Debug, Clone, Deserialize, FromConfigValue)]
/// struct Endpoint {
///     host: String,
///     port: u16,
/// }
/// ```
#[proc_macro_derive(FromConfigValue)]
pub fn from_config_value_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::config_facade::convert::FromConfigValue for #name #ty_generics #where_clause {
            fn from_config_value(
                value: &::config_facade::ConfigValue,
            ) -> ::config_facade::Result<Self> {
                ::config_facade::convert::deserialize_config_value(value)
            }
        }
    };

    TokenStream::from(expanded)
}

/// 为结构体实现 Bind trait
///
/// 字段属性：
/// - `#[config(key = "a.b")]`：字段对应的路径，默认为字段名
/// - `#[config(nested)]`：在子路径视图上调用字段类型的 `Bind::bind`
///
/// # 示例
/// ```ignore
/// use config_facade::{BindConfig, Property};
///
/// #[derive(BindConfig)]
/// struct Server {
///     host: Property<String>,
///     port: i32,
///     alias: Option<String>,
/// }
/// ```
#[proc_macro_derive(BindConfig, attributes(config))]
pub fn bind_config_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_bind_config(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

struct FieldOptions {
    key: Option<String>,
    nested: bool,
}

fn expand_bind_config(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "BindConfig only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "BindConfig can only be derived for structs",
            ))
        }
    };

    let mut initializers = Vec::new();
    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let options = parse_field_options(&field.attrs)?;
        let key = options.key.unwrap_or_else(|| ident.to_string());
        let ty = &field.ty;

        let value = if options.nested {
            quote! { <#ty as ::config_facade::Bind>::bind(&config.at_path(#key)?)? }
        } else if let Some(inner) = generic_argument(ty, "Property") {
            quote! { config.get_as::<#inner>(#key) }
        } else if let Some(inner) = generic_argument(ty, "Option") {
            quote! { config.get_as::<#inner>(#key).optional()? }
        } else {
            quote! { config.get_as::<#ty>(#key).get()? }
        };

        initializers.push(quote! { #ident: #value });
    }

    Ok(quote! {
        impl #impl_generics ::config_facade::Bind for #name #ty_generics #where_clause {
            fn bind(config: &::config_facade::Config) -> ::config_facade::Result<Self> {
                Ok(Self {
                    #(#initializers,)*
                })
            }
        }
    })
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions {
        key: None,
        nested: false,
    };

    for attr in attrs.iter().filter(|a| a.path().is_ident("config")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                let lit: LitStr = meta.value()?.parse()?;
                options.key = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("nested") {
                options.nested = true;
                Ok(())
            } else {
                Err(meta.error("unsupported config attribute, expected `key` or `nested`"))
            }
        })?;
    }

    Ok(options)
}

// 类型的最后一段是 `wrapper<T>` 时返回 T
fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
