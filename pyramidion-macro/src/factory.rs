use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, ItemFn, ReturnType, Type};

pub fn pyramidion_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    let input = parse_macro_input!(item as ItemFn);

    match expand(attr, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(attr: TokenStream2, mut input: ItemFn) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(
            attr,
            "#[pyramidion] does not take arguments",
        ));
    }

    let ret = match &input.sig.output {
        ReturnType::Type(_, ty) => ty.clone(),
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &input.sig,
                "#[pyramidion] factories must return an Application",
            ))
        }
    };

    let block = &input.block;

    // Run the annotated body as a closure (or async block) so `return` and `?`
    // keep their meaning, then wrap what it produced.
    let base = if input.sig.asyncness.is_some() {
        quote! {
            ::pyramidion::__private::factory_future::<#ret, _>(async move #block).await
        }
    } else {
        quote! {
            (move || -> #ret #block)()
        }
    };

    let wrap = if returns_result(&ret) {
        quote! { __pyramidion_base.map(::pyramidion::wrap_application) }
    } else {
        quote! { ::pyramidion::wrap_application(__pyramidion_base) }
    };

    let new_block = quote! {
        {
            let __pyramidion_base: #ret = #base;
            #wrap
        }
    };

    input.block = syn::parse2(new_block)?;

    Ok(quote! {
        #input
    })
}

/// Whether the return type's last path segment is `Result`
fn returns_result(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == "Result")
            .unwrap_or(false),
        Type::Paren(inner) => returns_result(&inner.elem),
        Type::Group(inner) => returns_result(&inner.elem),
        _ => false,
    }
}
