use proc_macro::TokenStream;
use proc_macro2::Span;
use proc_macro_error::{abort, proc_macro_error};
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, punctuated::Punctuated, FnArg, ItemFn, Lit, Meta, MetaNameValue, Token,
};

const CATEGORY: &str = "category";
const NAME: &str = "name";
const DESCRIPTION: &str = "description";
const ARGS_SCHEMA: &str = "args_schema";

fn string_value(nv: &MetaNameValue, key: &str) -> String {
    if let syn::Expr::Lit(expr_lit) = &nv.value {
        if let Lit::Str(lit) = &expr_lit.lit {
            return lit.value();
        }
    }
    abort!(nv.value, "Expected a string literal for {}", key);
}

fn check_segment(value: &str, key: &str, span: Span) {
    let mut chars = value.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        abort!(span, "`{}` must be a plain identifier, got {:?}", key, value);
    }
}

/// Turns an async function into a unit and links it into the unit catalog.
///
/// ```ignore
/// #[titanoboa::unit(category = "services", description = "Say hello")]
/// async fn orchestrate_hello(ctx: &ExecutionContext, args: &[Value]) -> anyhow::Result<()> {
///     tracing::info!(project = ctx.project(), "hello");
///     Ok(())
/// }
/// ```
///
/// The unit registers as `<category>.<name>`; `name` defaults to the
/// function name. `args_schema` is a JSON Schema for the argument array and
/// is checked for valid JSON at compile time.
#[proc_macro_attribute]
#[proc_macro_error]
pub fn unit(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(item as ItemFn);
    let attr_args =
        syn::parse::Parser::parse2(Punctuated::<Meta, Token![,]>::parse_terminated, attr.into())
            .unwrap_or_else(|e| abort!(e.span(), "Failed to parse unit attributes: {}", e));

    let mut category = None;
    let mut name = None;
    let mut description = None;
    let mut args_schema = None;

    for meta in &attr_args {
        let Meta::NameValue(nv) = meta else {
            abort!(meta, "Expected `key = \"value\"` unit attributes");
        };
        if nv.path.is_ident(CATEGORY) {
            category = Some(string_value(nv, CATEGORY));
        } else if nv.path.is_ident(NAME) {
            name = Some(string_value(nv, NAME));
        } else if nv.path.is_ident(DESCRIPTION) {
            description = Some(string_value(nv, DESCRIPTION));
        } else if nv.path.is_ident(ARGS_SCHEMA) {
            args_schema = Some(string_value(nv, ARGS_SCHEMA));
        } else {
            abort!(
                nv.path,
                "Unknown unit attribute; expected one of \
                 `category`, `name`, `description`, `args_schema`"
            );
        }
    }

    let category = category
        .unwrap_or_else(|| abort!(Span::call_site(), "Unit requires a category attribute"));
    check_segment(&category, CATEGORY, Span::call_site());

    let fn_name = &input_fn.sig.ident;
    let name = name.unwrap_or_else(|| fn_name.to_string());
    check_segment(&name, NAME, Span::call_site());
    let description = description.unwrap_or_default();

    if let Some(schema) = &args_schema {
        if let Err(e) = serde_json::from_str::<serde_json::Value>(schema) {
            abort!(input_fn.sig, "Invalid args_schema JSON: {}", e);
        }
    }

    if input_fn.sig.asyncness.is_none() {
        abort!(input_fn.sig.fn_token, "Unit functions must be async");
    }
    if input_fn.sig.inputs.len() != 2
        || input_fn
            .sig
            .inputs
            .iter()
            .any(|arg| matches!(arg, FnArg::Receiver(_)))
    {
        abort!(
            input_fn.sig.inputs,
            "Unit functions take `ctx: &ExecutionContext` and `args: &[serde_json::Value]`"
        );
    }

    let fn_vis = &input_fn.vis;
    let unit_struct_name = format_ident!("{}_Unit", fn_name);
    let factory_name = format_ident!("__titanoboa_factory_{}", fn_name);
    let static_name = format_ident!("__TITANOBOA_UNIT_{}", fn_name.to_string().to_uppercase());
    let args_schema = match args_schema {
        Some(schema) => quote! { ::core::option::Option::Some(#schema) },
        None => quote! { ::core::option::Option::None },
    };

    let expanded = quote! {
        #input_fn

        #[allow(non_camel_case_types)]
        #fn_vis struct #unit_struct_name;

        #[::titanoboa::__private::async_trait]
        impl ::titanoboa::registry::Unit for #unit_struct_name {
            async fn run(
                &self,
                ctx: &::titanoboa::dispatch::ExecutionContext,
                args: &[::titanoboa::__private::serde_json::Value],
            ) -> ::titanoboa::__private::anyhow::Result<()> {
                #fn_name(ctx, args).await
            }

            fn description(&self) -> &str {
                #description
            }

            fn args_schema(&self) -> ::core::option::Option<&str> {
                #args_schema
            }
        }

        #[allow(non_snake_case)]
        fn #factory_name() -> ::std::sync::Arc<dyn ::titanoboa::registry::Unit> {
            ::std::sync::Arc::new(#unit_struct_name)
        }

        #[::titanoboa::__private::linkme::distributed_slice(::titanoboa::registry::UNITS)]
        #[linkme(crate = ::titanoboa::__private::linkme)]
        static #static_name: ::titanoboa::registry::UnitEntry = ::titanoboa::registry::UnitEntry {
            category: #category,
            stem: #name,
            description: #description,
            factory: #factory_name,
        };
    };

    TokenStream::from(expanded)
}
