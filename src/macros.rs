//! # Internal Macros
//!
//! Boilerplate generators shared across the crate.
//!
//! - `impl_fixed_elem!` stamps out [`crate::columns::FixedElem`] impls for
//!   the little-endian integer-like element types.
//! - `column_primitive_getters!` generates the typed accessor surface on
//!   [`crate::columns::Column`] (one `get_*` per fixed kind), including the
//!   null-error path through nullable columns.
//! - `zerocopy_getters!` generates read-only accessors for zerocopy
//!   little-endian header fields.

/// Implements `FixedElem` for a type with `to_le_bytes`/`from_le_bytes` and
/// a total `Ord`.
#[macro_export]
macro_rules! impl_fixed_elem {
    ($($ty:ty => $width:expr),* $(,)?) => {
        $(
            impl $crate::columns::FixedElem for $ty {
                const WIDTH: usize = $width;

                #[inline]
                fn decode(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; $width];
                    buf.copy_from_slice(&bytes[..$width]);
                    <$ty>::from_le_bytes(buf)
                }

                #[inline]
                fn encode(&self, out: &mut [u8]) {
                    out[..$width].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn total_cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                    ::std::cmp::Ord::cmp(self, other)
                }
            }
        )*
    };
}

/// Generates the typed primitive accessors on `Column`: one `get_*` method
/// per fixed kind, named after the wire code.
#[macro_export]
macro_rules! column_primitive_getters {
    ($($suffix:ident => $variant:ident : $native:ty),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Reads the `" $suffix "` element at `index`, failing on kind"]
                #[doc = "mismatch, out-of-range index, or a null position."]
                pub fn [<get_ $suffix>](&self, index: usize) -> ::eyre::Result<$native> {
                    match self {
                        Column::$variant(c) => c.get(index),
                        Column::Nullable(n) => {
                            let physical = n.require_present(index)?;
                            match n.dense() {
                                Column::$variant(c) => c.get(physical),
                                other => ::eyre::bail!(
                                    concat!("column of type {} has no get_", stringify!($suffix), " accessor"),
                                    other.scalar_type(),
                                ),
                            }
                        }
                        other => ::eyre::bail!(
                            concat!("column of type {} has no get_", stringify!($suffix), " accessor"),
                            other.scalar_type(),
                        ),
                    }
                }
            )*
        }
    };
}

/// Generates read-only getters for zerocopy little-endian fields.
#[macro_export]
macro_rules! zerocopy_getters {
    ($($field:ident : $native_ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $field(&self) -> $native_ty {
                self.$field.get()
            }
        )*
    };
}
