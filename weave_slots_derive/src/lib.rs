use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

#[proc_macro_derive(Slots, attributes(slots))]
pub fn derive_slots(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // #[slots(crate_path="::weave")]
    let mut krate = quote!(::weave);
    for attr in &input.attrs {
        if !attr.path().is_ident("slots") { continue; }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate_path") {
                let s: LitStr = meta.value()?.parse()?;
                let ts: proc_macro2::TokenStream = s.parse()?;
                krate = ts;
                return Ok(());
            }
            Err(meta.error("unsupported slots attribute"))
        });
        if let Err(err) = parsed {
            return err.to_compile_error().into();
        }
    }

    let Data::Struct(data_struct) = &input.data else {
        return quote! { compile_error!("Slots can only be derived for structs"); }.into();
    };
    let Fields::Named(fields_named) = &data_struct.fields else {
        return quote! { compile_error!("Slots requires named fields"); }.into();
    };

    struct F { ident: syn::Ident, key: String, ty: Type }
    fn field_key(f: &syn::Field) -> syn::Result<String> {
        // #[slots(rename="_alias")]
        let mut key = f.ident.as_ref().map(|i| i.to_string()).unwrap_or_default();
        for a in &f.attrs {
            if !a.path().is_ident("slots") { continue; }
            a.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let s: LitStr = meta.value()?.parse()?;
                    key = s.value();
                    return Ok(());
                }
                Err(meta.error("unsupported slots field attribute"))
            })?;
        }
        Ok(key)
    }

    let mut fs: Vec<F> = Vec::new();
    for f in &fields_named.named {
        let Some(ident) = f.ident.clone() else { continue };
        let key = match field_key(f) {
            Ok(key) => key,
            Err(err) => return err.to_compile_error().into(),
        };
        fs.push(F { ident, key, ty: f.ty.clone() });
    }

    // ---- slots ----
    let slot_items = fs.iter().map(|f| {
        let field = &f.ident; let key = &f.key;
        quote! {
            (
                ::std::string::String::from(#key),
                #krate::Value::from(::std::clone::Clone::clone(&self.#field)),
            )
        }
    });

    // ---- load_slot ----
    let load_arms = fs.iter().map(|f| {
        let field = &f.ident; let key = &f.key; let ty = &f.ty;
        let ty_name = quote!(#ty).to_string().replace(' ', "");
        quote! {
            #key => {
                self.#field = <#ty as #krate::FromValue>::from_value(value).ok_or_else(|| {
                    ::std::format!("slot {} expects {}, got {}", #key, #ty_name, value.type_name())
                })?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics #krate::Slots for #struct_ident #ty_generics #where_clause {
            fn slots(&self) -> ::std::vec::Vec<(::std::string::String, #krate::Value)> {
                ::std::vec![#(#slot_items),*]
            }
            #[allow(unused_variables)]
            fn load_slot(
                &mut self,
                key: &str,
                value: &#krate::Value,
            ) -> ::std::result::Result<(), ::std::string::String> {
                match key {
                    #(#load_arms,)*
                    _ => ::std::result::Result::Err(::std::format!("unknown slot: {}", key)),
                }
            }
        }
    };
    TokenStream::from(expanded)
}
