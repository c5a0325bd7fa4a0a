// vim: tw=80
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{
    *,
    ext::IdentExt,
    spanned::Spanned
};

/// How an argument is captured for matching, and how it reaches a spied
/// target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Capture {
    /// Passed by value.  Matched against a clone.
    Owned,
    /// `&T`, matched against an owned `T`
    Ref,
    /// `&str`, matched against a `String`
    Str,
    /// `&[T]`, matched against a `Vec<T>`
    Slice,
    /// `&mut T`.  Matched against its value at call time, and may be
    /// overwritten afterwards.
    Out
}

struct Param {
    /// Name used by the generated `_call` function
    name: Ident,
    /// Name used inside the generated trait method
    local: Ident,
    /// Type that argument matchers see
    matched: Type,
    capture: Capture
}

impl Param {
    fn new(index: usize, pat: &PatType) -> Result<Self> {
        let name = match &*pat.pat {
            Pat::Ident(pi) => pi.ident.clone(),
            _ => format_ident!("__p{}", index)
        };
        let local = format_ident!("__a{}", index);
        let (matched, capture) = match &*pat.ty {
            Type::Reference(r) if r.mutability.is_some() =>
                ((*r.elem).clone(), Capture::Out),
            Type::Reference(r) => match &*r.elem {
                Type::Path(tp) if tp.qself.is_none() &&
                    tp.path.is_ident("str") =>
                    (parse_quote!(::std::string::String), Capture::Str),
                Type::Slice(ts) => {
                    let elem = &ts.elem;
                    (parse_quote!(::std::vec::Vec<#elem>), Capture::Slice)
                },
                elem => (elem.clone(), Capture::Ref)
            },
            Type::ImplTrait(_) => {
                return Err(Error::new(pat.ty.span(),
                    "#[substitute] does not support impl Trait arguments"));
            },
            ty => (ty.clone(), Capture::Owned)
        };
        Ok(Param { name, local, matched, capture })
    }

    /// Expression producing the owned value recorded in the invocation.
    fn snapshot(&self) -> TokenStream {
        let local = &self.local;
        match self.capture {
            Capture::Owned => quote!(::std::clone::Clone::clone(&#local)),
            Capture::Ref => quote!(::std::clone::Clone::clone(#local)),
            Capture::Str => quote!(::std::string::String::from(#local)),
            Capture::Slice => quote!(<[_]>::to_vec(#local)),
            Capture::Out => quote!(::std::clone::Clone::clone(&*#local))
        }
    }

    /// Expression passing the argument on to a spied target.
    fn forward(&self) -> TokenStream {
        let local = &self.local;
        match self.capture {
            Capture::Out => quote!(&mut *#local),
            _ => quote!(#local)
        }
    }
}

/// What the generated method does with the resolved call's result.
enum Output {
    /// Returns nothing.  Stubbed errors panic.
    Unit,
    /// Returns `Result<ok, err>`.  Stubbed errors become `Err`.
    Fallible { ty: Type, ok: Type, err: Type },
    /// Returns anything else.  Stubbed errors panic.
    Value(Type)
}

impl Output {
    fn new(rt: &ReturnType) -> Result<Self> {
        let ty = match rt {
            ReturnType::Default => return Ok(Output::Unit),
            ReturnType::Type(_, ty) => &**ty
        };
        match ty {
            Type::Tuple(tt) if tt.elems.is_empty() => Ok(Output::Unit),
            Type::Reference(_) => Err(Error::new(ty.span(),
                "#[substitute] does not support methods that return references")),
            Type::ImplTrait(_) => Err(Error::new(ty.span(),
                "#[substitute] does not support impl Trait return types")),
            Type::Path(tp) => Ok(result_args(tp)
                .map(|(ok, err)| Output::Fallible {
                    ty: ty.clone(),
                    ok,
                    err
                }).unwrap_or_else(|| Output::Value(ty.clone()))),
            _ => Ok(Output::Value(ty.clone()))
        }
    }
}

/// If `tp` looks like `Result<T, E>`, return `T` and `E`.
fn result_args(tp: &TypePath) -> Option<(Type, Type)> {
    let seg = tp.path.segments.last()?;
    if seg.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(abga) = &seg.arguments else {
        return None;
    };
    let mut types = abga.args.iter().filter_map(|ga| match ga {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None
    });
    match (types.next(), types.next(), types.next()) {
        (Some(ok), Some(err), None) => Some((ok, err)),
        _ => None
    }
}

struct Method {
    /// Signature as it appears in the trait implementation
    sig: Signature,
    konst: Ident,
    call_fn: Ident,
    mutable: bool,
    params: Vec<Param>,
    output: Output
}

impl Method {
    fn new(tif: &TraitItemFn) -> Result<Self> {
        let sig = &tif.sig;
        let mut errors = Errors::default();
        if sig.generics.type_params().next().is_some() ||
            sig.generics.const_params().next().is_some()
        {
            errors.push(Error::new(sig.generics.span(),
                "#[substitute] does not support generic methods"));
        }
        if let Some(asyncness) = sig.asyncness {
            errors.push(Error::new(asyncness.span(),
                "#[substitute] does not support async methods"));
        }
        if let Some(variadic) = &sig.variadic {
            errors.push(Error::new(variadic.span(),
                "#[substitute] does not support variadic methods"));
        }
        let mutable = match sig.receiver() {
            Some(rx) if rx.reference.is_some() => rx.mutability.is_some(),
            _ => {
                errors.push(Error::new(sig.span(),
                    "#[substitute] methods must take `&self` or `&mut self`"));
                false
            }
        };
        let mut params = Vec::new();
        let mut inputs = sig.inputs.clone();
        for (i, fn_arg) in inputs.iter_mut()
            .filter_map(|fa| match fa {
                FnArg::Typed(pt) => Some(pt),
                FnArg::Receiver(_) => None
            }).enumerate()
        {
            match Param::new(i, fn_arg) {
                Ok(param) => {
                    let local = &param.local;
                    *fn_arg.pat = parse_quote!(#local);
                    params.push(param);
                },
                Err(e) => errors.push(e)
            }
        }
        let output = Output::new(&sig.output)
            .map_err(|e| errors.push(e))
            .ok();
        errors.finish()?;
        let ident = sig.ident.unraw();
        let mut sig = sig.clone();
        sig.inputs = inputs;
        Ok(Method {
            sig,
            konst: format_ident!("{}", ident.to_string().to_uppercase()),
            call_fn: format_ident!("{}_call", ident),
            mutable,
            params,
            output: output.unwrap_or(Output::Unit)
        })
    }

    /// The inherent associated function that builds a `CallShape`.
    fn shape_builder(&self) -> TokenStream {
        let call_fn = &self.call_fn;
        let konst = &self.konst;
        let names = self.params.iter().map(|p| &p.name).collect::<Vec<_>>();
        let types = self.params.iter().map(|p| &p.matched).collect::<Vec<_>>();
        let doc = format!("Describe calls of `{}`, one predicate per argument.",
                          self.sig.ident.unraw());
        quote! {
            #[doc = #doc]
            #[allow(clippy::too_many_arguments)]
            pub fn #call_fn(#(
                #names: impl ::mimic::Predicate<#types> +
                    ::std::marker::Send + 'static
            ),*) -> ::mimic::CallShape
            {
                ::mimic::CallShape::new(Self::#konst)
                    #(.with::<#types, _>(#names))*
            }
        }
    }

    /// The trait method implementation.
    fn implementation(&self, struct_: &Ident, trait_: &Ident) -> TokenStream {
        let sig = &self.sig;
        let ident = &sig.ident;
        let konst = &self.konst;
        let snapshots = self.params.iter().map(Param::snapshot);
        let forwards = self.params.iter().map(Param::forward);
        let target = if self.mutable {
            quote!(self.__target.as_deref_mut())
        } else {
            quote!(self.__target.as_deref())
        };
        let write_backs = self.params.iter()
            .enumerate()
            .filter(|(_, p)| p.capture == Capture::Out)
            .map(|(i, p)| {
                let local = &p.local;
                quote!(__call.write_back(#i, #local);)
            });
        let finish = match &self.output {
            Output::Unit => quote! {
                __call.raise();
            },
            Output::Fallible { ty, ok, err } => quote! {
                if let ::std::option::Option::Some(__e) =
                    __call.error::<#err>()
                {
                    return ::std::result::Result::Err(__e);
                }
                match __forwarded {
                    ::std::option::Option::Some(__r) => __r,
                    ::std::option::Option::None =>
                        __call.output::<#ty, _>(|| {
                            #[allow(unused_imports)]
                            use ::mimic::__private::{ViaDefault, ViaNothing};
                            (&&::mimic::__private::Structural::<#ok>::new())
                                .structural()
                                .map(::std::result::Result::Ok)
                        })
                }
            },
            Output::Value(ty) => quote! {
                __call.raise();
                match __forwarded {
                    ::std::option::Option::Some(__r) => __r,
                    ::std::option::Option::None =>
                        __call.output::<#ty, _>(|| {
                            #[allow(unused_imports)]
                            use ::mimic::__private::{ViaDefault, ViaNothing};
                            (&&::mimic::__private::Structural::<#ty>::new())
                                .structural()
                        })
                }
            }
        };
        quote! {
            #sig {
                let __binding = ::mimic::Substitute::binding(self);
                let __invocation = __binding.invocation(
                    #struct_::#konst,
                    ::std::vec![#(::mimic::Arg::new(#snapshots)),*]
                );
                let __call = __binding.intercept(__invocation);
                let __forwarded = if __call.is_answered() {
                    ::std::option::Option::None
                } else {
                    #target.map(|__t| #trait_::#ident(__t, #(#forwards),*))
                };
                #(#write_backs)*
                #finish
            }
        }
    }
}

/// Accumulates errors so every problem in a trait is reported at once.
#[derive(Default)]
struct Errors(Option<Error>);

impl Errors {
    fn push(&mut self, e: Error) {
        match &mut self.0 {
            Some(acc) => acc.combine(e),
            None => self.0 = Some(e)
        }
    }

    fn finish(self) -> Result<()> {
        match self.0 {
            Some(e) => Err(e),
            None => Ok(())
        }
    }
}

/// A trait that `#[substitute]` can generate a substitute for.
pub(crate) struct SubstituteTrait {
    vis: Visibility,
    trait_: Ident,
    struct_: Ident,
    methods: Vec<Method>
}

impl SubstituteTrait {
    pub(crate) fn new(item: &ItemTrait) -> Result<Self> {
        let mut errors = Errors::default();
        if !item.generics.params.is_empty() {
            errors.push(Error::new(item.generics.span(),
                "#[substitute] does not support generic traits"));
        }
        for bound in item.supertraits.iter() {
            let auto = match bound {
                TypeParamBound::Trait(tb) => tb.path.is_ident("Send") ||
                    tb.path.is_ident("Sync"),
                TypeParamBound::Lifetime(_) => true,
                _ => false
            };
            if !auto {
                errors.push(Error::new(bound.span(),
                    "#[substitute] does not support supertraits other than \
                    Send and Sync"));
            }
        }
        let mut methods = Vec::new();
        for ti in item.items.iter() {
            match ti {
                TraitItem::Fn(tif) => match Method::new(tif) {
                    Ok(m) => methods.push(m),
                    Err(e) => errors.push(e)
                },
                TraitItem::Type(_) | TraitItem::Const(_) => {
                    errors.push(Error::new(ti.span(),
                        "#[substitute] does not support associated types or \
                        constants"));
                },
                _ => {
                    errors.push(Error::new(ti.span(),
                        "#[substitute] does not support this trait item"));
                }
            }
        }
        errors.finish()?;
        Ok(SubstituteTrait {
            vis: item.vis.clone(),
            trait_: item.ident.clone(),
            struct_: format_ident!("Substitute{}", item.ident),
            methods
        })
    }
}

impl ToTokens for SubstituteTrait {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let vis = &self.vis;
        let trait_ = &self.trait_;
        let struct_ = &self.struct_;
        let trait_name = trait_.unraw().to_string();
        let struct_doc = format!("Substitute for [`{trait_name}`]");
        let konsts = self.methods.iter().map(|m| {
            let konst = &m.konst;
            let method_name = m.sig.ident.unraw().to_string();
            quote! {
                pub const #konst: ::mimic::MethodId =
                    ::mimic::MethodId::new(#trait_name, #method_name);
            }
        });
        let builders = self.methods.iter().map(Method::shape_builder);
        let impls = self.methods.iter()
            .map(|m| m.implementation(struct_, trait_));
        quote! {
            #[doc = #struct_doc]
            #vis struct #struct_ {
                __mimic: ::mimic::Binding,
                __target: ::std::option::Option<::std::boxed::Box<
                    dyn #trait_ + ::std::marker::Send + ::std::marker::Sync
                >>
            }

            #[allow(dead_code)]
            impl #struct_ {
                #(#konsts)*

                /// Create a substitute registered with `session`.
                pub fn new(session: &::mimic::Session) -> Self {
                    #struct_ {
                        __mimic: session.bind(#trait_name),
                        __target: ::std::option::Option::None
                    }
                }

                /// Create a substitute that `session` doesn't track.  Its
                /// calls are answered but can't be verified.
                pub fn untracked(session: &::mimic::Session) -> Self {
                    #struct_ {
                        __mimic: session.bind_untracked(#trait_name),
                        __target: ::std::option::Option::None
                    }
                }

                /// Create a spy that forwards unanswered calls to `target`.
                pub fn spy<__T>(session: &::mimic::Session, target: __T)
                    -> Self
                    where __T: #trait_ + ::std::marker::Send +
                               ::std::marker::Sync + 'static
                {
                    #struct_ {
                        __mimic: session.bind(#trait_name),
                        __target: ::std::option::Option::Some(
                            ::std::boxed::Box::new(target))
                    }
                }

                #(#builders)*
            }

            impl ::mimic::Substitute for #struct_ {
                fn binding(&self) -> &::mimic::Binding {
                    &self.__mimic
                }
            }

            impl ::std::fmt::Debug for #struct_ {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>)
                    -> ::std::fmt::Result
                {
                    f.debug_struct(::std::stringify!(#struct_))
                        .field("id", &self.__mimic.id())
                        .field("spy", &self.__target.is_some())
                        .finish()
                }
            }

            impl #trait_ for #struct_ {
                #(#impls)*
            }
        }.to_tokens(tokens);
    }
}
