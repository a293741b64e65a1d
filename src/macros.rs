/// Generates the `Managed` and `DeepClone` boilerplate for a struct whose
/// fields are already tagged by kind. Rust has no compiler-generated copy
/// constructor to lean on, so this macro expands to an explicit per-field
/// list instead of a single line, but the intent — "the obvious thing, once
/// per type, written once" — is the same one every hand-written impl in this
/// crate follows.
///
/// ```
/// use ltm::{Header, Managed, Own, Weak};
///
/// struct Node {
///     header: Header,
///     value: char,
///     next: Option<Own<Node>>,
///     back: Weak<Node>,
/// }
/// ```
///
/// `Option<Own<T>>` and plain value fields are listed under `value:` — only
/// bare `Own<T>` / `Weak<T>` fields need the `owned:` / `weak:` treatment,
/// since those are the fields whose `Clone` must route through
/// `Own::deep_copy` / `Weak::clone` rather than a derived `Clone`.
#[macro_export]
macro_rules! impl_managed {
    (
        $name:ident {
            header: $header_field:ident,
            $(owned: [$($owned_field:ident),+ $(,)?],)?
            $(owned_opt: [$($owned_opt_field:ident),+ $(,)?],)?
            $(weak: [$($weak_field:ident),+ $(,)?],)?
            $(value: [$($value_field:ident),+ $(,)?],)?
        }
    ) => {
        impl $crate::Managed for $name {
            fn header(&self) -> &$crate::Header {
                &self.$header_field
            }

            #[allow(unused_variables)]
            fn visit_owned(&self, visitor: &mut dyn FnMut(&dyn $crate::Managed)) {
                $($( visitor(&*self.$owned_field); )+)?
                $($( if let Some(child) = self.$owned_opt_field.as_ref() {
                    visitor(&**child);
                } )+)?
            }

            #[allow(unused_variables)]
            fn visit_weak(&self, visitor: &mut dyn FnMut(&dyn $crate::WeakSlot)) {
                $($( visitor(&self.$weak_field); )+)?
            }
        }

        impl $crate::DeepClone for $name {
            fn clone_value(&self) -> Result<Self, $crate::CloneError> {
                Ok($name {
                    $header_field: self.$header_field.clone(),
                    $($( $owned_field: self.$owned_field.deep_copy()?, )+)?
                    $($( $owned_opt_field: match self.$owned_opt_field.as_ref() {
                        Some(child) => Some(child.deep_copy()?),
                        None => None,
                    }, )+)?
                    $($( $weak_field: self.$weak_field.clone(), )+)?
                    $($( $value_field: self.$value_field.clone(), )+)?
                })
            }
        }
    };
}
