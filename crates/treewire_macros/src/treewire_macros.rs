//! Treewire Macros - Derive support for node-backed slots
//!
//! This crate provides `#[derive(Slots)]`, which turns field annotations into
//! a static slot table so shapes can be resolved without runtime reflection.

use proc_macro::TokenStream;
use proc_macro2::Literal;
use quote::quote;
use syn::{
    ext::IdentExt,
    parse::{Parse, ParseStream},
    parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, Meta, Token,
};

/// Class used when a slot does not declare one
const DEFAULT_CLASS: &str = "Node";

/// Parsed arguments of a `#[slot(...)]` attribute
#[derive(Default)]
struct SlotAttrs {
    path: Option<String>,
    class: Option<String>,
}

impl Parse for SlotAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = SlotAttrs::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            let value = match input.parse::<Lit>()? {
                Lit::Str(s) => s.value(),
                other => return Err(syn::Error::new(other.span(), "expected a string literal")),
            };

            match ident.to_string().as_str() {
                "path" => {
                    if value.is_empty() {
                        return Err(syn::Error::new(ident.span(), "slot path must not be empty"));
                    }
                    attrs.path = Some(value);
                }
                "class" => attrs.class = Some(value),
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown slot attribute: {}", ident),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(attrs)
    }
}

/// Parse `#[slot]` or `#[slot(...)]`
fn parse_slot_attr(attr: &Attribute) -> syn::Result<SlotAttrs> {
    match &attr.meta {
        Meta::Path(_) => Ok(SlotAttrs::default()),
        Meta::List(_) => attr.parse_args::<SlotAttrs>(),
        Meta::NameValue(nv) => Err(syn::Error::new_spanned(
            nv,
            "expected #[slot] or #[slot(path = \"...\", class = \"...\")]",
        )),
    }
}

struct SlotField {
    ident: syn::Ident,
    attrs: SlotAttrs,
}

fn expand_slots(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Slots can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Slots can only be derived for structs",
            ));
        }
    };

    let mut slots = Vec::new();
    let mut state_field: Option<syn::Ident> = None;

    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let mut slot_attrs = None;
        let mut is_state = false;

        for attr in &field.attrs {
            if attr.path().is_ident("slot") {
                if slot_attrs.is_some() {
                    return Err(syn::Error::new_spanned(attr, "duplicate #[slot] attribute"));
                }
                slot_attrs = Some(parse_slot_attr(attr)?);
            } else if attr.path().is_ident("resolve_state") {
                is_state = true;
            }
        }

        match (slot_attrs, is_state) {
            (Some(_), true) => {
                return Err(syn::Error::new_spanned(
                    &ident,
                    "a field cannot be both #[slot] and #[resolve_state]",
                ));
            }
            (Some(attrs), false) => {
                let slot_id = ident.unraw().to_string();
                if attrs.path.is_none() && slot_id.trim_start_matches('_').is_empty() {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        "slot name is all underscores; give it #[slot(path = \"...\")]",
                    ));
                }
                slots.push(SlotField { ident, attrs });
            }
            (None, true) => {
                if state_field.is_some() {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        "only one field may be marked #[resolve_state]",
                    ));
                }
                state_field = Some(ident);
            }
            (None, false) => {}
        }
    }

    let state_field = state_field.ok_or_else(|| {
        syn::Error::new_spanned(
            name,
            "Slots requires a field of type ResolveState marked #[resolve_state]",
        )
    })?;

    let shape_name = name.to_string();
    let slot_count = slots.len();

    let assign_arms = slots.iter().enumerate().map(|(index, slot)| {
        let index = Literal::usize_unsuffixed(index);
        let ident = &slot.ident;
        quote! {
            #index => self.#ident = ::core::convert::Into::into(value),
        }
    });

    let descriptors = slots.iter().map(|slot| {
        let slot_id = slot.ident.unraw().to_string();
        let class = slot.attrs.class.as_deref().unwrap_or(DEFAULT_CLASS);
        let hint = match &slot.attrs.path {
            Some(path) => quote! { ::core::option::Option::Some(#path.to_string()) },
            None => quote! { ::core::option::Option::None },
        };
        quote! {
            ::treewire_types::SlotDescriptor {
                slot_id: #slot_id.to_string(),
                declared_type: #class.to_string(),
                lookup_hint: #hint,
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::treewire_types::SlotTarget for #name #ty_generics #where_clause {
            fn slot_count(&self) -> usize {
                #slot_count
            }

            fn assign_slot(&mut self, index: usize, value: ::treewire_types::NodeRef) {
                match index {
                    #(#assign_arms)*
                    _ => {
                        let _ = value;
                    }
                }
            }

            fn resolve_state(&self) -> &::treewire_types::ResolveState {
                &self.#state_field
            }

            fn resolve_state_mut(&mut self) -> &mut ::treewire_types::ResolveState {
                &mut self.#state_field
            }
        }

        impl #impl_generics ::treewire_types::SlotShape for #name #ty_generics #where_clause {
            fn shape_name() -> &'static str {
                #shape_name
            }

            fn slot_descriptors() -> ::std::vec::Vec<::treewire_types::SlotDescriptor> {
                ::std::vec![#(#descriptors),*]
            }
        }
    })
}

/// Derive `SlotTarget` and `SlotShape` from field annotations.
///
/// # Attributes
///
/// - `#[slot]` - slot looked up by the field name with leading underscores
///   removed, converted to upper camel case; accepts any node
/// - `#[slot(path = "A/B")]` - slot looked up at an explicit path
/// - `#[slot(class = "Label")]` - slot only accepts nodes assignable to `Label`
/// - `#[resolve_state]` - exactly one field of type `ResolveState`
///
/// Slot fields can be any type implementing `From<NodeRef>`, typically
/// `Option<NodeRef>`.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, Slots)]
/// struct Hud {
///     #[slot(class = "Label")]
///     _player_label: Option<NodeRef>,
///     #[slot(path = "Label/AudioStreamPlayer2D", class = "AudioStreamPlayer2D")]
///     player: Option<NodeRef>,
///     #[resolve_state]
///     state: ResolveState,
/// }
/// ```
#[proc_macro_derive(Slots, attributes(slot, resolve_state))]
pub fn derive_slots(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_slots(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
