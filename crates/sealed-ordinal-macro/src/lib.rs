//! The `#[ordinal]` marker attribute.
//!
//! The attribute does not number anything itself: numbering needs the whole
//! hierarchy, which only the build-time scanner sees. At expansion time it
//! checks its arguments, rejects anything that is not an enum, and records
//! the configuration as an `OrdinalRoot` impl.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Fields, Ident, Item, LitBool, Result, Token};

use proc_macro_crate::{crate_name, FoundCrate};

/// Parsed `#[ordinal(...)]` arguments.
struct OrdinalArgs {
    recursive: bool,
}

impl Parse for OrdinalArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut recursive: Option<bool> = None;
        while !input.is_empty() {
            let key: Ident = input.parse()?;
            if key != "recursive" {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown #[ordinal] argument `{key}`, expected `recursive`"),
                ));
            }
            if recursive.is_some() {
                return Err(syn::Error::new(key.span(), "duplicate `recursive` argument"));
            }
            input.parse::<Token![=]>()?;
            let value: LitBool = input.parse()?;
            recursive = Some(value.value);

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(Self {
            recursive: recursive.unwrap_or(true),
        })
    }
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn ordinal_crate_path() -> TokenStream2 {
    match crate_name("sealed-ordinal") {
        Ok(FoundCrate::Itself) => quote!(::sealed_ordinal),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::sealed_ordinal),
    }
}

// =============================================================================
// Expansion
// =============================================================================

/// Name and kind of an item that cannot carry `#[ordinal]`.
fn describe_item(item: &Item) -> (Option<&Ident>, &'static str) {
    match item {
        Item::Struct(s) => (
            Some(&s.ident),
            match s.fields {
                Fields::Named(_) => "struct",
                Fields::Unnamed(_) => "tuple struct",
                Fields::Unit => "unit struct",
            },
        ),
        Item::Union(u) => (Some(&u.ident), "union"),
        Item::Trait(t) => (Some(&t.ident), "trait"),
        Item::Type(t) => (Some(&t.ident), "type alias"),
        Item::Fn(f) => (Some(&f.sig.ident), "fn"),
        Item::Const(c) => (Some(&c.ident), "const"),
        Item::Static(s) => (Some(&s.ident), "static"),
        Item::Mod(m) => (Some(&m.ident), "module"),
        Item::Impl(_) => (None, "impl block"),
        _ => (None, "item"),
    }
}

fn expand(args: OrdinalArgs, item: Item, ordinal_crate: &TokenStream2) -> Result<TokenStream2> {
    let Item::Enum(ref target) = item else {
        let (ident, kind) = describe_item(&item);
        let (span, name) = match ident {
            Some(ident) => (ident.span(), format!("`{ident}`")),
            None => (Span::call_site(), "this item".to_string()),
        };
        return Err(syn::Error::new(
            span,
            format!("#[ordinal] must target an enum, but {name} is a {kind}"),
        ));
    };

    let ident = &target.ident;
    let (impl_generics, ty_generics, where_clause) = target.generics.split_for_impl();
    let recursive = args.recursive;

    Ok(quote! {
        #item

        impl #impl_generics #ordinal_crate::OrdinalRoot for #ident #ty_generics #where_clause {
            const RECURSIVE: bool = #recursive;
        }
    })
}

// =============================================================================
// Entry point
// =============================================================================

/// Mark an enum as a numbering root.
///
/// ```ignore
/// #[ordinal]
/// pub enum Shape { Circle(f32), Square(f32), Poly(Poly) }
///
/// #[ordinal(recursive = false)]
/// pub enum Event { Key(Key), Mouse(Mouse) }
/// ```
///
/// `recursive` (default `true`) controls whether variants wrapping another
/// enum are descended into or numbered like leaves.
#[proc_macro_attribute]
pub fn ordinal(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(attr as OrdinalArgs);
    let item = syn::parse_macro_input!(item as Item);
    let ordinal_crate = ordinal_crate_path();

    expand(args, item, &ordinal_crate)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
