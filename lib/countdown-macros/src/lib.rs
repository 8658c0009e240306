use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream, Result};
use syn::punctuated::Punctuated;
use syn::{braced, bracketed, parse_macro_input, DeriveInput, Ident, Token};

/// `settlement = [city, town, village]`
struct Preference {
    accessor: Ident,
    fields: Punctuated<Ident, Token![,]>,
}

impl Parse for Preference {
    fn parse(input: ParseStream) -> Result<Self> {
        let accessor = input.parse()?;
        input.parse::<Token![=]>()?;
        let fields;
        bracketed!(fields in input);
        Ok(Preference { accessor, fields: fields.parse_terminated(Ident::parse, Token![,])? })
    }
}

/// `{ preference, preference, ... }`
struct Preferences(Punctuated<Preference, Token![,]>);

impl Parse for Preferences {
    fn parse(input: ParseStream) -> Result<Self> {
        let content;
        braced!(content in input);
        Ok(Preferences(content.parse_terminated(Preference::parse, Token![,])?))
    }
}

/// Generates one accessor per entry which yields the first non-blank `Option<String>` field,
/// checked in the listed order.
///
/// ```ignore
/// #[first_present({ settlement = [city, town, village] })]
/// struct Address { city: Option<String>, town: Option<String>, village: Option<String> }
/// ```
#[proc_macro_attribute]
pub fn first_present(attr: TokenStream, item: TokenStream) -> TokenStream {
    let Preferences(preferences) = parse_macro_input!(attr as Preferences);
    let input = parse_macro_input!(item as DeriveInput);
    let struct_name = &input.ident;

    let implementations = preferences.iter().map(|Preference { accessor, fields }| {
        let field_refs = fields.iter().map(|field| quote! { self.#field.as_ref() });

        quote! {
            pub fn #accessor(&self) -> Option<&str> {
                let candidates = [
                    #(#field_refs),*
                ];
                countdown_utils::first_present(&candidates)
            }
        }
    });

    let expanded = quote! {
        #input

        impl #struct_name {
            #(#implementations)*
        }
    };

    expanded.into()
}
