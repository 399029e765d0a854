//! Typed native handles.
//!
//! Handles are plain integers issued by the backend. They carry no lifetime;
//! freeing them is the job of the owning wrapper.

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

/// Location of a vertex attribute in a linked program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeLocation(pub u32);

/// Location of a uniform in a linked program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// A resource handle together with who is allowed to free it.
///
/// Resources shared across visuals are `Borrowed` by every visual but the
/// one that created them. Only `Owned` handles are ever deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership<T> {
    Owned(T),
    Borrowed(T),
}

impl<T> Ownership<T> {
    #[inline]
    pub fn get(&self) -> &T {
        match self {
            Ownership::Owned(v) | Ownership::Borrowed(v) => v,
        }
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, Ownership::Owned(_))
    }

    /// The handle, if this side may free it.
    #[inline]
    pub fn owned(&self) -> Option<&T> {
        match self {
            Ownership::Owned(v) => Some(v),
            Ownership::Borrowed(_) => None,
        }
    }

    #[inline]
    pub fn owned_mut(&mut self) -> Option<&mut T> {
        match self {
            Ownership::Owned(v) => Some(v),
            Ownership::Borrowed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_handles_are_never_owned() {
        let owned = Ownership::Owned(BufferId(1));
        let borrowed = Ownership::Borrowed(BufferId(1));

        assert_eq!(owned.get(), borrowed.get());
        assert_eq!(owned.owned(), Some(&BufferId(1)));
        assert_eq!(borrowed.owned(), None);
        assert!(!borrowed.is_owned());
    }
}
