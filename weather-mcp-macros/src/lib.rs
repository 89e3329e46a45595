//! # Procedural Macros for weather-mcp
//!
//! This crate provides the `#[tool]` attribute, which turns a struct implementing
//! `weather_mcp::tool::ToolHandler` into a registrable `weather_mcp::tool::Tool`.
//!
//! ## Example
//!
//! ```ignore
//! use weather_mcp::tool::{ToolHandler, Validate};
//! use weather_mcp::message::CallToolResult;
//! use weather_mcp::{ToolError, ValidationError, tool};
//! use async_trait::async_trait;
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct EchoInput {
//!     /// Text to send back
//!     message: String,
//! }
//!
//! impl Validate for EchoInput {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tool(name = "echo", title = "Echo", description = "Echo back the input message")]
//! struct EchoTool {
//!     prefix: String,
//! }
//!
//! #[async_trait]
//! impl ToolHandler for EchoTool {
//!     type Input = EchoInput;
//!
//!     async fn handle(&self, input: Self::Input) -> Result<CallToolResult, ToolError> {
//!         Ok(CallToolResult::text(format!("{}: {}", self.prefix, input.message)))
//!     }
//! }
//!
//! let mut registry = weather_mcp::ToolRegistry::new();
//! registry.register(EchoTool { prefix: "Echo".to_string() })?;
//! ```

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{ToTokens, quote};
use syn::{
    Expr, LitStr, parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated,
    spanned::Spanned, token::Comma,
};

/// A struct to parse the input to the tool attribute macro
struct ToolAttr {
    name: LitStr,
    title: Option<LitStr>,
    description: LitStr,
}

impl Parse for ToolAttr {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name = None;
        let mut title = None;
        let mut description = None;

        let vars = Punctuated::<Expr, Comma>::parse_terminated(input)?;

        for expr in vars {
            let assign = match expr {
                Expr::Assign(assign) => assign,
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "Expected key-value pair like name = \"tool_name\"",
                    ));
                }
            };

            let key = assign.left.to_token_stream().to_string();
            let value = match *assign.right {
                Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => s,
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        format!("Expected a string literal for '{key}'"),
                    ));
                }
            };

            let slot = match key.as_str() {
                "name" => &mut name,
                "title" => &mut title,
                "description" => &mut description,
                _ => {
                    return Err(syn::Error::new(
                        assign.left.span(),
                        format!("Unknown attribute: {key}"),
                    ));
                }
            };

            if slot.replace(value).is_some() {
                return Err(syn::Error::new(
                    assign.left.span(),
                    format!("Duplicate attribute: {key}"),
                ));
            }
        }

        let name = name.ok_or_else(|| syn::Error::new(Span::call_site(), "Missing 'name' attribute"))?;
        let description = description
            .ok_or_else(|| syn::Error::new(Span::call_site(), "Missing 'description' attribute"))?;

        Ok(Self {
            name,
            title,
            description,
        })
    }
}

/// The `tool` attribute macro implements the `Tool` trait for a struct.
///
/// # Parameters
///
/// * `name`: The unique identifier hosts use to call the tool.
/// * `title` (optional): A display name for the tool.
/// * `description`: What the tool does, shown to the host's model.
///
/// # Requirements
///
/// The struct must implement `ToolHandler`. The generated `Tool::call` parses the
/// arguments into `ToolHandler::Input`, runs its `Validate` implementation and only
/// then calls `ToolHandler::handle`. The advertised input schema is generated from
/// the input type with `schemars`.
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = parse_macro_input!(attr as ToolAttr);
    let input = parse_macro_input!(item as syn::ItemStruct);

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let name = attr.name;
    let description = attr.description;
    let title = attr.title.map_or_else(
        || quote! { ::core::option::Option::None },
        |t| quote! { ::core::option::Option::Some(#t) },
    );

    let expanded = quote! {
        #input

        #[::weather_mcp::__private::async_trait]
        impl #impl_generics ::weather_mcp::tool::Tool for #struct_name #ty_generics #where_clause {
            fn name(&self) -> &str {
                #name
            }

            fn title(&self) -> ::core::option::Option<&str> {
                #title
            }

            fn description(&self) -> &str {
                #description
            }

            fn input_schema(&self) -> ::weather_mcp::__private::serde_json::Value {
                ::weather_mcp::tool::input_schema::<<Self as ::weather_mcp::tool::ToolHandler>::Input>()
            }

            async fn call(
                &self,
                args: ::weather_mcp::__private::serde_json::Value,
            ) -> ::core::result::Result<
                ::weather_mcp::message::CallToolResult,
                ::weather_mcp::error::ToolError,
            > {
                let input = ::weather_mcp::tool::parse_input::<
                    <Self as ::weather_mcp::tool::ToolHandler>::Input,
                >(#name, args)?;
                <Self as ::weather_mcp::tool::ToolHandler>::handle(self, input).await
            }
        }
    };

    TokenStream::from(expanded)
}
