//! Handle and index types for subdivision elements.
//!
//! Two kinds of identifiers are in play:
//!
//! - **Handles** are opaque values chosen by the caller to name its vertices,
//!   edges and faces. They only need equality and a stable 64-bit key, see
//!   [`Handle`].
//! - **Indices** ([`VertIndex`], [`EdgeIndex`], [`FaceIndex`]) are type-safe
//!   slots into the element arenas owned by a context. They are what the
//!   accessor API hands back and what adjacency lists store.

use std::fmt::{self, Debug};

/// Trait for caller-supplied element handles.
///
/// Handles are compared for equality and bucketed by [`Handle::key`]. The
/// trait is implemented for the primitive integer types; any other `Copy`
/// identifier can implement it by providing a well-distributed key.
pub trait Handle: Copy + Eq + Debug + 'static {
    /// A 64-bit key used to pick the registry bucket for this handle.
    fn key(&self) -> u64;
}

macro_rules! impl_handle_int {
    ($($ty:ty),*) => {
        $(
            impl Handle for $ty {
                #[inline]
                fn key(&self) -> u64 {
                    *self as u64
                }
            }
        )*
    };
}

impl_handle_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Registry key of an edge.
///
/// Edges synced by the caller are keyed by their handle. Edges the engine
/// creates on its own while syncing a face get an engine-assigned serial so
/// that they live in the same registry without colliding with caller handles.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKey<H> {
    /// An edge synced by the caller.
    Handle(H),
    /// An edge created automatically for a face.
    Auto(u32),
}

impl<H: Handle> EdgeKey<H> {
    /// The caller handle, if this edge was synced explicitly.
    #[inline]
    pub fn handle(&self) -> Option<H> {
        match *self {
            EdgeKey::Handle(h) => Some(h),
            EdgeKey::Auto(_) => None,
        }
    }

    /// Whether the engine created this edge.
    #[inline]
    pub fn is_auto(&self) -> bool {
        matches!(self, EdgeKey::Auto(_))
    }
}

impl<H: Debug> Debug for EdgeKey<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKey::Handle(h) => write!(f, "{h:?}"),
            EdgeKey::Auto(n) => write!(f, "auto#{n}"),
        }
    }
}

impl<H: Handle> Handle for EdgeKey<H> {
    #[inline]
    fn key(&self) -> u64 {
        match self {
            EdgeKey::Handle(h) => h.key(),
            // Spread serials away from small caller handles.
            EdgeKey::Auto(n) => u64::from(*n).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        }
    }
}

/// Slot-addressable index used by [`Arena`](super::Arena).
pub trait ArenaIndex: Copy + Eq + Debug {
    /// Create an index from a raw slot number.
    fn from_slot(slot: usize) -> Self;

    /// The raw slot number.
    fn slot(self) -> usize;
}

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertIndex(u32);

/// A type-safe edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeIndex(u32);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceIndex(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ArenaIndex for $name {
            #[inline]
            fn from_slot(slot: usize) -> Self {
                Self::new(slot)
            }

            #[inline]
            fn slot(self) -> usize {
                self.index()
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertIndex, "V");
impl_index_type!(EdgeIndex, "E");
impl_index_type!(FaceIndex, "F");
