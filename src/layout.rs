//! Layout calculator (component A).
//!
//! Pure, total functions from [`ValType`] to size/alignment in linear
//! memory. Every other layer builds on these two functions; nothing here
//! touches memory or allocation.

use crate::types::ValType;

/// Size and alignment of a value's in-memory representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub size: u32,
    pub align: u32,
}

impl Layout {
    pub const fn new(size: u32, align: u32) -> Self {
        Self { size, align }
    }

    /// `size` rounded up to a multiple of `align`, the space this value
    /// occupies when followed by another value of the same alignment.
    pub const fn padded_size(&self) -> u32 {
        align_to(self.size, self.align)
    }
}

/// Round `offset` up to the next multiple of `align`. `align` must be a
/// power of two.
pub const fn align_to(offset: u32, align: u32) -> u32 {
    debug_assert!(align.is_power_of_two());
    (offset + align - 1) & !(align - 1)
}

/// The width, in bytes, of the discriminant needed to distinguish
/// `case_count` cases. Matches the Canonical ABI rule: the smallest
/// unsigned integer type that can hold every case index. A variant with a
/// single case still carries a `U8` discriminant (always `0`) rather than
/// an empty one.
pub const fn discriminant_size(case_count: usize) -> u32 {
    if case_count == 0 {
        0
    } else if case_count <= 0x100 {
        1
    } else if case_count <= 0x1_0000 {
        2
    } else {
        4
    }
}

/// Compute the layout of `ty`.
pub fn layout_of(ty: &ValType) -> Layout {
    match ty {
        ValType::Bool | ValType::S8 | ValType::U8 => Layout::new(1, 1),
        ValType::S16 | ValType::U16 => Layout::new(2, 2),
        ValType::S32 | ValType::U32 | ValType::F32 | ValType::Char => Layout::new(4, 4),
        ValType::S64 | ValType::U64 | ValType::F64 => Layout::new(8, 8),
        ValType::String => Layout::new(8, 4),
        ValType::List { len: None, .. } => Layout::new(8, 4),
        ValType::List { element, len: Some(n) } => {
            let elem = layout_of(element);
            Layout::new(elem.padded_size() * n, elem.align)
        }
        ValType::Record(fields) => record_layout(fields.iter().map(|(_, t)| t)),
        ValType::Tuple(elems) => record_layout(elems.iter()),
        ValType::Option(inner) => variant_layout([&None::<ValType>, &Some((**inner).clone())]),
        ValType::Result { ok, err } => {
            variant_layout([&ok.as_deref().cloned(), &err.as_deref().cloned()])
        }
        ValType::Enum(cases) => Layout::new(discriminant_size(cases.len()), discriminant_align(cases.len())),
        ValType::Variant(cases) => {
            variant_layout(cases.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>().iter())
        }
        ValType::Flags(names) => flags_layout(names.len()),
    }
}

fn discriminant_align(case_count: usize) -> u32 {
    discriminant_size(case_count).max(1)
}

/// Layout of a sequence of fields laid out one after another: each field's
/// offset is its running offset rounded up to its own alignment, and the
/// record's size is the final offset rounded up to the max alignment across
/// all fields (or `1` if there are none).
fn record_layout<'a>(fields: impl Iterator<Item = &'a ValType>) -> Layout {
    let mut offset = 0u32;
    let mut max_align = 1u32;
    for field_ty in fields {
        let field = layout_of(field_ty);
        offset = align_to(offset, field.align);
        offset += field.size;
        max_align = max_align.max(field.align);
    }
    Layout::new(align_to(offset, max_align), max_align)
}

/// Field offsets for a record/tuple, in declaration order, following the
/// same accumulation rule as [`record_layout`].
pub fn field_offsets<'a>(fields: impl Iterator<Item = &'a ValType>) -> Vec<u32> {
    let mut offset = 0u32;
    let mut offsets = Vec::new();
    for field_ty in fields {
        let field = layout_of(field_ty);
        offset = align_to(offset, field.align);
        offsets.push(offset);
        offset += field.size;
    }
    offsets
}

/// Layout of a variant given its case payload types (`None` for a
/// unit/no-payload case).
///
/// The critical rule, and the one most implementations get wrong: the
/// payload region's alignment and the discriminant's padding must account
/// for the MAXIMUM alignment across *all* cases, not just whichever case
/// happens to be active for a particular value. Two values of the same
/// variant type must always place their payload at the same offset.
pub fn variant_layout<'a>(cases: impl IntoIterator<Item = &'a Option<ValType>>) -> Layout {
    let mut max_payload_size = 0u32;
    let mut max_payload_align = 1u32;
    let mut case_count = 0usize;
    for case in cases {
        case_count += 1;
        if let Some(t) = case {
            let l = layout_of(t);
            max_payload_size = max_payload_size.max(l.size);
            max_payload_align = max_payload_align.max(l.align);
        }
    }
    let disc_size = discriminant_size(case_count);
    let disc_align = disc_size.max(1);
    let max_align = disc_align.max(max_payload_align);
    let payload_offset = align_to(disc_size, max_payload_align);
    let total = if max_payload_size == 0 { payload_offset } else { payload_offset + max_payload_size };
    Layout::new(align_to(total, max_align), max_align)
}

/// Offset of a variant's payload region, for a variant whose cases have the
/// given payload types. Same alignment rule as [`variant_layout`]: computed
/// across all cases, independent of which one is active.
pub fn variant_payload_offset<'a>(cases: impl IntoIterator<Item = &'a Option<ValType>>) -> u32 {
    let mut max_payload_align = 1u32;
    let mut case_count = 0usize;
    for case in cases {
        case_count += 1;
        if let Some(t) = case {
            max_payload_align = max_payload_align.max(layout_of(t).align);
        }
    }
    align_to(discriminant_size(case_count), max_payload_align)
}

fn flags_layout(flag_count: usize) -> Layout {
    let bytes = flags_byte_len(flag_count);
    let align = if bytes >= 4 { 4 } else if bytes >= 2 { 2 } else { 1 };
    Layout::new(bytes, align)
}

/// Number of bytes needed to bit-pack `flag_count` flags, rounded up to the
/// next power-of-two byte width used by the discriminant table (1, 2, or a
/// multiple of 4 bytes for larger flag sets).
pub fn flags_byte_len(flag_count: usize) -> u32 {
    let raw = ((flag_count + 7) / 8) as u32;
    if raw <= 1 {
        raw.max(if flag_count == 0 { 0 } else { 1 })
    } else if raw <= 2 {
        2
    } else {
        align_to(raw, 4)
    }
}
