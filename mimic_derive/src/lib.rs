// vim: tw=80
//! Proc Macros for use with Mimic
//!
//! You probably don't want to use this crate directly.  Instead, you use its
//! reexports via the [`mimic`](../mimic/index.html) crate.

extern crate proc_macro;

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::spanned::Spanned;

mod substitute;
use crate::substitute::SubstituteTrait;

fn do_substitute(attrs: TokenStream, input: TokenStream) -> TokenStream {
    if !attrs.is_empty() {
        return syn::Error::new(attrs.span(), "#[substitute] takes no arguments")
            .to_compile_error();
    }
    let item = match syn::parse2::<syn::Item>(input) {
        Ok(syn::Item::Trait(item)) => item,
        Ok(other) => {
            return syn::Error::new(other.span(),
                "#[substitute] can only be applied to traits")
                .to_compile_error();
        },
        Err(e) => return e.to_compile_error()
    };
    match SubstituteTrait::new(&item) {
        Ok(st) => st.into_token_stream(),
        Err(e) => e.to_compile_error()
    }
}

/// Generate a substitute for a trait.
///
/// The trait is left as is.  Next to it appears a struct named
/// `Substitute` followed by the trait's name, which implements the trait by
/// routing every call through a `mimic::Binding`.
///
/// # Restrictions
///
/// * Methods must take `&self` or `&mut self`.
/// * Methods may not have type parameters, be `async` or return references.
/// * The trait may not be generic, or have associated types or constants.
/// * Argument types must be `Clone + Debug + PartialEq + Send + Sync +
///   'static`, after `&str` and `&[T]` are replaced by `String` and `Vec<T>`.
/// * Return types must be `Clone + Send + Sync + 'static`.
#[proc_macro_attribute]
pub fn substitute(attrs: proc_macro::TokenStream,
                  input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    let input: TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_substitute(attrs.into(), input));
    output.into()
}
