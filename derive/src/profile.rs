use std::collections::HashSet;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DataStruct, DeriveInput, Error, Field, Fields, GenericArgument, Ident, LitInt,
    PathArguments, Result, Token, Type,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

pub(crate) fn expand_profile(input: &DeriveInput) -> Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => fields,
        _ => Err(Error::new(
            input.span(),
            "`Profile` may only be derived on structs with named fields.",
        ))?,
    };

    let Some(attr) = input.attrs.iter().find(|a| a.path().is_ident("profile")) else {
        Err(Error::new(
            input.span(),
            "`Profile` requires a `profile(N)` attribute naming the global message number.",
        ))?
    };

    let global = attr.parse_args::<LitInt>()?;
    global.base10_parse::<u16>()?;

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut numbers = HashSet::new();

    for FieldMetadata { number, .. } in &fields {
        if !numbers.insert(number.base10_parse::<u8>()?) {
            Err(Error::new(number.span(), "Field numbers may only be used once."))?
        }
    }

    let reads = fields.iter().map(
        |FieldMetadata {
             name,
             number,
             value,
             ..
         }| {
            quote! { profile.#name = message.get::<#value>(#number); }
        },
    );

    let writes = fields.iter().map(
        |FieldMetadata {
             name,
             number,
             base_type,
             ..
         }| {
            quote! { message.set_value(#number, BaseType::#base_type, self.#name.clone()); }
        },
    );

    let name = &input.ident;

    let expanded = quote! {
        impl Profile for #name {
            const GLOBAL: u16 = #global;

            fn from_message(message: &Message) -> Self {
                let mut profile = Self::default();
                #(#reads)*
                profile
            }

            fn apply(&self, message: &mut Message) {
                #(#writes)*
            }
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    number: LitInt,
    /// Base type written for the field.
    base_type: Ident,
    /// The `T` of `Option<T>`.
    value: Type,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            return Ok(None);
        };

        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Profile fields must be named."))?
        };

        let FieldAttribute { number, base_type } = attr.meta.require_list()?.parse_args()?;
        let value = option_argument(&field.ty)?.clone();

        Ok(Some(Self {
            name,
            number,
            base_type,
            value,
        }))
    }
}

/// The `T` of a field typed `Option<T>`.
fn option_argument(ty: &Type) -> Result<&Type> {
    let error = || Error::new_spanned(ty, "Profile fields must have type `Option<T>`.");

    let Type::Path(path) = ty else {
        Err(error())?
    };

    let segment = path.path.segments.last().ok_or_else(error)?;

    if segment.ident != "Option" {
        Err(error())?
    }

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        Err(error())?
    };

    match arguments.args.first() {
        Some(GenericArgument::Type(value)) if arguments.args.len() == 1 => Ok(value),
        _ => Err(error()),
    }
}

#[derive(Debug)]
struct FieldAttribute {
    number: LitInt,
    base_type: Ident,
}

impl Parse for FieldAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let number = input.parse::<LitInt>()?;
        number.base10_parse::<u8>()?;

        input.parse::<Token![,]>()?;
        let base_type = input.parse::<Ident>()?;

        Ok(Self { number, base_type })
    }
}
