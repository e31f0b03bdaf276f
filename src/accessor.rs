//! Accessor Checks
//!
//! Element decoding (strides, normalization, sparse substitution, index
//! widening) is done by the glTF crate's readers. This module decides whether
//! an accessor may be handed to a reader at all: the encoding must be one the
//! channel allows, and every byte range the reader will touch must lie inside
//! its buffer. All size arithmetic is overflow-checked, so a hostile count or
//! offset becomes an error instead of a panic.

use crate::errors::{AnimatorError, Result};

/// Native component type of an accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size of one component in bytes.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// Width of sparse substitution indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Component encodings a channel accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `f32` only: positions, normals, keyframe times, matrices,
    /// translation and scale outputs.
    Float,
    /// `f32`, or normalized `i8`/`u8`/`i16`/`u16`: rotations and morph weights.
    Normalized,
    /// `f32`, or normalized `u8`/`u16`: texture coordinates and skin weights.
    UnsignedNormalized,
    /// Plain `u8`/`u16`: joint indices.
    Joints,
    /// Plain `u8`/`u16`/`u32`: vertex indices.
    Indices,
}

impl Encoding {
    #[must_use]
    pub fn accepts(self, ty: ComponentType, normalized: bool) -> bool {
        use ComponentType::{F32, I8, I16, U8, U16, U32};
        match self {
            Self::Float => ty == F32 && !normalized,
            Self::Normalized => match ty {
                F32 => !normalized,
                I8 | U8 | I16 | U16 => normalized,
                U32 => false,
            },
            Self::UnsignedNormalized => match ty {
                F32 => !normalized,
                U8 | U16 => normalized,
                I8 | I16 | U32 => false,
            },
            Self::Joints => matches!(ty, U8 | U16) && !normalized,
            Self::Indices => matches!(ty, U8 | U16 | U32) && !normalized,
        }
    }
}

/// A buffer view as seen from one of its accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLayout {
    /// Byte offset of the view in its buffer.
    pub offset: usize,
    pub length: usize,
    /// Byte distance between elements; `None` when tightly packed.
    pub stride: Option<usize>,
    /// Bytes actually loaded for the backing buffer.
    pub buffer_length: usize,
}

impl ViewLayout {
    fn check_in_buffer(&self) -> Result<()> {
        let end = add(self.offset, self.length)?;
        if end > self.buffer_length {
            return Err(AnimatorError::AccessorOutOfRange {
                needed: end,
                available: self.buffer_length,
            });
        }
        Ok(())
    }
}

/// Sparse substitution layered over an accessor's base data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseLayout {
    pub count: usize,
    pub index_type: IndexType,
    pub indices: ViewLayout,
    pub indices_offset: usize,
    pub values: ViewLayout,
    pub values_offset: usize,
}

/// Everything needed to vet an accessor before it is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorLayout {
    pub component_type: ComponentType,
    /// Components per element (1 for scalars, 3 for vec3, 16 for mat4, ...).
    pub components: usize,
    /// Number of elements.
    pub count: usize,
    pub normalized: bool,
    /// Byte offset of the first element inside the view.
    pub offset: usize,
    /// `None` means the base data is all zeros.
    pub view: Option<ViewLayout>,
    pub sparse: Option<SparseLayout>,
}

impl AccessorLayout {
    /// A tightly packed, dense, non-normalized accessor over a whole buffer.
    #[must_use]
    pub fn packed(
        buffer_length: usize,
        component_type: ComponentType,
        components: usize,
        count: usize,
    ) -> Self {
        Self {
            component_type,
            components,
            count,
            normalized: false,
            offset: 0,
            view: Some(ViewLayout {
                offset: 0,
                length: buffer_length,
                stride: None,
                buffer_length,
            }),
            sparse: None,
        }
    }

    /// Bytes of one element.
    pub fn element_size(&self) -> Result<usize> {
        mul(self.component_type.size(), self.components)
    }

    /// Neither a buffer view nor sparse data: every element is zero.
    #[must_use]
    pub fn is_zero_filled(&self) -> bool {
        self.view.is_none() && self.sparse.is_none()
    }

    /// Fails unless the accessor holds `components`-wide elements in an
    /// encoding `encoding` accepts, laid out inside its buffers.
    pub fn check(&self, encoding: Encoding, components: usize) -> Result<()> {
        if self.components != components {
            return Err(AnimatorError::UnsupportedAccessor(format!(
                "{} components, expected {components}",
                self.components
            )));
        }
        if !encoding.accepts(self.component_type, self.normalized) {
            return Err(AnimatorError::UnsupportedAccessor(format!(
                "{}{:?} components are not valid {encoding:?} data",
                if self.normalized { "normalized " } else { "" },
                self.component_type
            )));
        }
        self.check_bounds()
    }

    /// Fails if any element, sparse index or sparse value would be read
    /// outside its view or buffer.
    pub fn check_bounds(&self) -> Result<()> {
        if self.count == 0 {
            return Err(AnimatorError::UnsupportedAccessor(
                "accessor has no elements".to_string(),
            ));
        }
        let element_size = self.element_size()?;

        if let Some(view) = &self.view {
            view.check_in_buffer()?;
            let stride = view.stride.unwrap_or(element_size);
            if stride < element_size {
                return Err(AnimatorError::UnsupportedAccessor(format!(
                    "stride {stride} is smaller than element size {element_size}"
                )));
            }
            // Last element needs only its own bytes, not a full stride
            let needed = add(add(self.offset, mul(stride, self.count - 1)?)?, element_size)?;
            if needed > view.length {
                return Err(AnimatorError::AccessorOutOfRange {
                    needed,
                    available: view.length,
                });
            }
        }

        if let Some(sparse) = &self.sparse {
            if sparse.count > self.count {
                return Err(AnimatorError::UnsupportedAccessor(format!(
                    "{} sparse substitutions for {} elements",
                    sparse.count, self.count
                )));
            }
            let index_bytes = mul(sparse.count, sparse.index_type.size())?;
            let value_bytes = mul(sparse.count, element_size)?;
            for (view, offset, bytes) in [
                (&sparse.indices, sparse.indices_offset, index_bytes),
                (&sparse.values, sparse.values_offset, value_bytes),
            ] {
                view.check_in_buffer()?;
                let needed = add(offset, bytes)?;
                if needed > view.length {
                    return Err(AnimatorError::AccessorOutOfRange {
                        needed,
                        available: view.length,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Collects a reader's output for a checked accessor.
///
/// A zero-filled accessor yields `count` default elements; any other
/// accessor the reader declined is an error. Storage is reserved fallibly so
/// exhaustion fails the load.
pub fn decode<T: Clone + Default>(
    layout: &AccessorLayout,
    decoded: Option<impl Iterator<Item = T>>,
) -> Result<Vec<T>> {
    match decoded {
        Some(iter) => collect(iter),
        None if layout.is_zero_filled() => collect(std::iter::repeat_n(T::default(), layout.count)),
        None => Err(AnimatorError::MissingAccessor(
            "buffer data unavailable to the reader".to_string(),
        )),
    }
}

fn collect<T>(iter: impl Iterator<Item = T>) -> Result<Vec<T>> {
    let (len, _) = iter.size_hint();
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|e| AnimatorError::AllocationFailed(format!("{len} accessor elements: {e}")))?;
    out.extend(iter);
    Ok(out)
}

fn add(a: usize, b: usize) -> Result<usize> {
    a.checked_add(b).ok_or(AnimatorError::AccessorOutOfRange {
        needed: usize::MAX,
        available: 0,
    })
}

fn mul(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b).ok_or(AnimatorError::AccessorOutOfRange {
        needed: usize::MAX,
        available: 0,
    })
}
