//! Index types for mesh elements.
//!
//! Vertices, half-edges and faces are addressed through distinct wrapper
//! types so that a vertex index can never be passed where a half-edge index
//! is expected. The wrappers are generic over the stored integer width.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for integer types that can back a mesh index.
///
/// Implemented for `u16`, `u32` and `u64`. The largest value of each type is
/// reserved as the "no element" sentinel.
pub trait MeshIndex:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static
{
    /// The largest storable index.
    const MAX: Self;

    /// Sentinel meaning "no element".
    const INVALID: Self;

    /// Convert from `usize`.
    ///
    /// # Panics
    /// Debug builds panic when the value does not fit.
    fn from_usize(v: usize) -> Self;

    /// Convert to `usize`.
    fn to_usize(self) -> usize;

    /// Whether this is a real index rather than the sentinel.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {
        $(
            impl MeshIndex for $ty {
                const MAX: Self = <$ty>::MAX - 1;
                const INVALID: Self = <$ty>::MAX;

                #[inline]
                fn from_usize(v: usize) -> Self {
                    debug_assert!(
                        v <= Self::MAX as usize,
                        "index {} too large for {}",
                        v,
                        stringify!($ty)
                    );
                    v as $ty
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// A type-safe half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_index_type {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create an index from a raw position.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The "no element" index.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// The raw position.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Whether this refers to an element.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }

            /// `Some(self)` when valid, `None` for the sentinel.
            #[inline]
            pub fn valid(self) -> Option<Self> {
                self.is_valid().then_some(self)
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.valid() {
                    Some(id) => write!(f, "{}({})", $tag, id.index()),
                    None => write!(f, "{}(INVALID)", $tag),
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(FaceId, "F");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_and_sentinel() {
        let v: VertexId = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(v.valid(), Some(v));

        let none: HalfEdgeId = HalfEdgeId::invalid();
        assert!(!none.is_valid());
        assert_eq!(none.valid(), None);
        assert_eq!(HalfEdgeId::<u32>::default(), none);
    }

    #[test]
    fn test_narrow_indices() {
        let he: HalfEdgeId<u16> = HalfEdgeId::new(65_000);
        assert_eq!(he.index(), 65_000);
        assert!(he.is_valid());
    }

    #[test]
    fn test_debug_format() {
        let f: FaceId = FaceId::new(3);
        assert_eq!(format!("{:?}", f), "F(3)");
        assert_eq!(format!("{:?}", VertexId::<u64>::invalid()), "V(INVALID)");
    }
}
