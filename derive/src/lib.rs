use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod profile;

#[proc_macro_derive(Profile, attributes(profile, field))]
pub fn derive_profile(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match profile::expand_profile(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}
