//! Domain core: identifiers, error taxonomy, temporal helpers and the pure
//! business rules shared by the storage and service layers.
//!
//! This crate has zero internal dependencies and performs no I/O.

/// Define a closed string-valued enum with its wire labels.
///
/// Generates serde (snake_case labels), `as_str`, `ALL` and
/// `Display`, so every domain enum exposes the same surface.
macro_rules! define_label_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// The wire label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod activities;
pub mod clients;
pub mod error;
pub mod goals;
pub mod pagination;
pub mod shift_notes;
pub mod stakeholders;
pub mod temporal;
pub mod types;
