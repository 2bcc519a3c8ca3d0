// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The op arena: a growable byte buffer of variable-length records.
//!
//! Every record starts with an 8-byte header:
//!
//! ```text
//!   0        4        8
//!   ┌────────┬────────┬──────────────────────────┐
//!   │ kind   │ size   │ payload ... (zero pad)   │
//!   └────────┴────────┴──────────────────────────┘
//! ```
//!
//! `kind` is a [`DlOpType`] discriminant and `size` the total record length,
//! header included, rounded up to [`RECORD_ALIGN`]. Scalars are stored in
//! native byte order; the stream is an in-process format and is never
//! persisted.
//!
//! Shared objects (images, filters, paths, nested lists) are not embedded.
//! They go into a side table of [`DlResource`]s and the record stores a `u32`
//! index. Dropping the table releases every reference.
//!
//! Records are encoded in two passes over the same [`OpSink`] code: a
//! [`SizeCounter`] pass measures the payload, the arena reserves exactly that
//! many bytes (growing by whole pages), then an [`ArenaWriter`] pass writes
//! it. A failed reservation therefore never leaves a partial record behind.

use alloc::borrow::Cow;
use alloc::vec::Vec;

use bytemuck::Pod;
use kurbo::{Point, Rect, RoundedRect, RoundedRectRadii};

use crate::error::DisplayListError;
use crate::op::{DlOp, DlOpType, SaveLayerOptions};
use crate::resource::DlResource;

/// Alignment, in bytes, of every record's start and size.
pub const RECORD_ALIGN: usize = 8;

/// Size of the `{kind, size}` record header.
pub const HEADER_SIZE: usize = 8;

/// Default arena growth granularity.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Resource slot value meaning "no resource".
const NO_RESOURCE: u32 = u32::MAX;

#[inline]
const fn align_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Destination for one record's payload bytes.
pub trait OpSink {
    /// Appends raw bytes.
    fn put(&mut self, bytes: &[u8]);

    /// Appends a shared object to the resource table and writes its index.
    fn put_resource(&mut self, resource: DlResource);

    /// Writes an index slot that refers to nothing.
    fn put_no_resource(&mut self) {
        self.put_u32(NO_RESOURCE);
    }

    /// Writes an optional resource slot.
    fn put_optional_resource(&mut self, resource: Option<DlResource>) {
        match resource {
            Some(r) => self.put_resource(r),
            None => self.put_no_resource(),
        }
    }

    /// Writes a `u32`.
    fn put_u32(&mut self, v: u32) {
        self.put(&v.to_ne_bytes());
    }

    /// Writes an array length, saturating at `u32::MAX`.
    fn put_len(&mut self, len: usize) {
        self.put_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    /// Writes a `bool` as a `u32`.
    fn put_bool(&mut self, v: bool) {
        self.put_u32(u32::from(v));
    }

    /// Writes an `f64`.
    fn put_f64(&mut self, v: f64) {
        self.put(&v.to_ne_bytes());
    }

    /// Writes a point as two `f64`s.
    fn put_point(&mut self, p: Point) {
        self.put_f64(p.x);
        self.put_f64(p.y);
    }

    /// Writes a rect as four `f64`s.
    fn put_rect(&mut self, r: &Rect) {
        self.put_f64(r.x0);
        self.put_f64(r.y0);
        self.put_f64(r.x1);
        self.put_f64(r.y1);
    }

    /// Writes a rounded rect: its rect, then the four radii clockwise from
    /// the top left.
    fn put_rrect(&mut self, rr: &RoundedRect) {
        self.put_rect(&rr.rect());
        let radii = rr.radii();
        self.put_f64(radii.top_left);
        self.put_f64(radii.top_right);
        self.put_f64(radii.bottom_right);
        self.put_f64(radii.bottom_left);
    }

    /// Writes a plain-old-data array with no length prefix.
    fn put_pod<T: Pod>(&mut self, values: &[T]) {
        self.put(bytemuck::cast_slice(values));
    }
}

/// Measuring pass: counts bytes and resource slots without storing anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeCounter {
    /// Payload bytes.
    pub bytes: usize,
    /// Resource table entries.
    pub resources: usize,
}

impl OpSink for SizeCounter {
    fn put(&mut self, bytes: &[u8]) {
        self.bytes += bytes.len();
    }

    fn put_resource(&mut self, _resource: DlResource) {
        self.bytes += 4;
        self.resources += 1;
    }
}

/// Writing pass: appends to the arena and its resource table.
///
/// Capacity must already have been reserved by the measuring pass.
#[derive(Debug)]
pub struct ArenaWriter<'a> {
    storage: &'a mut Vec<u8>,
    resources: &'a mut Vec<DlResource>,
}

impl OpSink for ArenaWriter<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.storage.extend_from_slice(bytes);
    }

    fn put_resource(&mut self, resource: DlResource) {
        let index = u32::try_from(self.resources.len()).unwrap_or(NO_RESOURCE);
        self.resources.push(resource);
        self.put_u32(index);
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Cursor over one record's payload.
///
/// Every read returns `None` once the payload is exhausted or a value is out
/// of range, so a malformed record can never read past its own end.
#[derive(Clone, Copy, Debug)]
pub struct OpReader<'a> {
    data: &'a [u8],
    pos: usize,
    resources: &'a [DlResource],
}

impl<'a> OpReader<'a> {
    /// Creates a reader over a record payload.
    #[must_use]
    pub fn new(data: &'a [u8], resources: &'a [DlResource]) -> Self {
        Self {
            data,
            pos: 0,
            resources,
        }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }

    /// Reads a `u32`.
    pub fn read_u32(&mut self) -> Option<u32> {
        self.take_array().map(u32::from_ne_bytes)
    }

    /// Reads a `u32` that must fit in a `u8` (enum discriminants).
    pub fn read_tag(&mut self) -> Option<u8> {
        u8::try_from(self.read_u32()?).ok()
    }

    /// Reads an array length.
    pub fn read_len(&mut self) -> Option<usize> {
        usize::try_from(self.read_u32()?).ok()
    }

    /// Reads a `bool`.
    pub fn read_bool(&mut self) -> Option<bool> {
        match self.read_u32()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    /// Reads an `f64`.
    pub fn read_f64(&mut self) -> Option<f64> {
        self.take_array().map(f64::from_ne_bytes)
    }

    /// Reads a point.
    pub fn read_point(&mut self) -> Option<Point> {
        Some(Point::new(self.read_f64()?, self.read_f64()?))
    }

    /// Reads a rect.
    pub fn read_rect(&mut self) -> Option<Rect> {
        Some(Rect::new(
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
        ))
    }

    /// Reads a rounded rect.
    pub fn read_rrect(&mut self) -> Option<RoundedRect> {
        let rect = self.read_rect()?;
        let radii = RoundedRectRadii::new(
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
        );
        Some(RoundedRect::from_rect(rect, radii))
    }

    /// Reads `count` points.
    pub fn read_points(&mut self, count: usize) -> Option<Vec<Point>> {
        // Bound the allocation by what the payload can actually hold.
        if count > self.remaining() / 16 {
            return None;
        }
        (0..count).map(|_| self.read_point()).collect()
    }

    /// Reads `count` rects.
    pub fn read_rects(&mut self, count: usize) -> Option<Vec<Rect>> {
        if count > self.remaining() / 32 {
            return None;
        }
        (0..count).map(|_| self.read_rect()).collect()
    }

    /// Reads `count` plain-old-data values.
    ///
    /// Borrows straight from the arena when the bytes happen to be aligned
    /// for `T`, otherwise copies them out.
    pub fn read_pod<T: Pod>(&mut self, count: usize) -> Option<Cow<'a, [T]>> {
        let len = count.checked_mul(size_of::<T>())?;
        let bytes = self.take(len)?;
        Some(match bytemuck::try_cast_slice(bytes) {
            Ok(values) => Cow::Borrowed(values),
            Err(_) => Cow::Owned(bytemuck::allocation::pod_collect_to_vec(bytes)),
        })
    }

    /// Reads a resource slot that must be filled.
    pub fn read_resource(&mut self) -> Option<&'a DlResource> {
        let index = usize::try_from(self.read_u32()?).ok()?;
        self.resources.get(index)
    }

    /// Reads a resource slot that may be empty.
    ///
    /// The outer `Option` reports decode failure, the inner one an empty slot.
    pub fn read_optional_resource(&mut self) -> Option<Option<&'a DlResource>> {
        let raw = self.read_u32()?;
        if raw == NO_RESOURCE {
            return Some(None);
        }
        self.resources.get(usize::try_from(raw).ok()?).map(Some)
    }

    /// Bytes left in the payload (including trailing padding).
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// Reads and validates the header at `offset`.
///
/// Returns the record kind and its total size.
pub(crate) fn read_header(
    data: &[u8],
    offset: usize,
) -> Result<(DlOpType, usize), DisplayListError> {
    let malformed = DisplayListError::Malformed { offset };
    let header = data
        .get(offset..offset.checked_add(HEADER_SIZE).ok_or(malformed)?)
        .ok_or(malformed)?;
    let mut reader = OpReader::new(header, &[]);
    let kind = reader
        .read_tag()
        .and_then(DlOpType::from_raw)
        .ok_or(malformed)?;
    let size = reader.read_len().ok_or(malformed)?;
    if size < HEADER_SIZE || size % RECORD_ALIGN != 0 || data.len() - offset < size {
        return Err(malformed);
    }
    Ok((kind, size))
}

/// Decodes the record at `offset`.
pub(crate) fn decode_at<'a>(
    data: &'a [u8],
    resources: &'a [DlResource],
    offset: usize,
) -> Result<(DlOp<'a>, usize), DisplayListError> {
    let (kind, size) = read_header(data, offset)?;
    let mut reader = OpReader::new(&data[offset + HEADER_SIZE..offset + size], resources);
    DlOp::decode(kind, &mut reader)
        .map(|op| (op, size))
        .ok_or(DisplayListError::Malformed { offset })
}

/// One decoded record.
#[derive(Debug)]
pub struct DlOpEntry<'a> {
    /// Sequence number of the record (its op index).
    pub index: u32,
    /// Byte offset of the record header.
    pub offset: usize,
    /// Total record size.
    pub size: usize,
    /// The decoded op.
    pub op: DlOp<'a>,
}

/// Sequential decoder over a record stream.
///
/// Stops at the end of the stream or at the first malformed record.
#[derive(Clone, Debug)]
pub struct OpIter<'a> {
    data: &'a [u8],
    resources: &'a [DlResource],
    offset: usize,
    index: u32,
}

impl<'a> OpIter<'a> {
    /// Iterates over `data`, resolving resource slots against `resources`.
    #[must_use]
    pub fn new(data: &'a [u8], resources: &'a [DlResource]) -> Self {
        Self {
            data,
            resources,
            offset: 0,
            index: 0,
        }
    }

    /// Continues decoding at a record boundary, numbering records from
    /// `index`.
    pub(crate) fn seek(&mut self, offset: usize, index: u32) {
        self.offset = offset;
        self.index = index;
    }
}

impl<'a> Iterator for OpIter<'a> {
    type Item = DlOpEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }
        let Ok((op, size)) = decode_at(self.data, self.resources, self.offset) else {
            self.offset = self.data.len();
            return None;
        };
        let entry = DlOpEntry {
            index: self.index,
            offset: self.offset,
            size,
            op,
        };
        self.offset += size;
        self.index = self.index.saturating_add(1);
        Some(entry)
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// The recorded bytes and resource table, moved out of an [`OpBuffer`].
#[derive(Clone, Debug, Default)]
pub struct RecordedOps {
    /// Record stream.
    pub storage: Vec<u8>,
    /// Shared objects referenced by index from the stream.
    pub resources: Vec<DlResource>,
    /// Records that render or change render state.
    pub render_op_count: u32,
    /// All records, attribute ops included.
    pub op_index_count: u32,
}

/// Append-only record arena.
#[derive(Debug)]
pub struct OpBuffer {
    storage: Vec<u8>,
    resources: Vec<DlResource>,
    page_size: usize,
    render_op_count: u32,
    op_index: u32,
}

impl Default for OpBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl OpBuffer {
    /// Creates an empty arena that grows in multiples of `page_size` bytes
    /// (rounded up to [`RECORD_ALIGN`]).
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            storage: Vec::new(),
            resources: Vec::new(),
            page_size: align_up(page_size.max(1), RECORD_ALIGN),
            render_op_count: 0,
            op_index: 0,
        }
    }

    /// Bytes written.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.storage.len()
    }

    /// Bytes reserved.
    #[inline]
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.storage.capacity()
    }

    /// Records that are not attribute ops.
    #[inline]
    #[must_use]
    pub fn render_op_count(&self) -> u32 {
        self.render_op_count
    }

    /// Index the next pushed record will receive.
    #[inline]
    #[must_use]
    pub fn op_index(&self) -> u32 {
        self.op_index
    }

    /// The record stream written so far.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.storage
    }

    /// The resource table written so far.
    #[inline]
    #[must_use]
    pub fn resources(&self) -> &[DlResource] {
        &self.resources
    }

    /// Decodes the records written so far.
    #[must_use]
    pub fn iter(&self) -> OpIter<'_> {
        OpIter::new(&self.storage, &self.resources)
    }

    /// Decodes the record at `offset`.
    ///
    /// # Errors
    ///
    /// [`DisplayListError::Malformed`] if `offset` is not a record boundary.
    pub fn decode_at(&self, offset: usize) -> Result<DlOp<'_>, DisplayListError> {
        decode_at(&self.storage, &self.resources, offset).map(|(op, _)| op)
    }

    fn reserve(&mut self, size: usize) -> Result<(), DisplayListError> {
        let used = self.storage.len();
        if self.storage.capacity() - used >= size {
            return Ok(());
        }
        let failed = DisplayListError::AllocationFailed { requested: size };
        let target = used
            .checked_add(size)
            .and_then(|n| n.checked_next_multiple_of(self.page_size))
            .ok_or(failed)?;
        self.storage
            .try_reserve_exact(target - used)
            .map_err(|_| failed)
    }

    /// Appends one record and returns its byte offset.
    ///
    /// Advances the used byte count, the render op count (unless `op` is an
    /// attribute op) and the op index, in that order.
    ///
    /// # Errors
    ///
    /// [`DisplayListError::AllocationFailed`] if the arena could not grow;
    /// nothing is written in that case.
    pub fn push(&mut self, op: &DlOp<'_>) -> Result<usize, DisplayListError> {
        let mut counter = SizeCounter::default();
        op.encode(&mut counter);
        let size = align_up(HEADER_SIZE + counter.bytes, RECORD_ALIGN);
        let size_field = u32::try_from(size)
            .map_err(|_| DisplayListError::AllocationFailed { requested: size })?;
        self.reserve(size)?;
        self.resources
            .try_reserve(counter.resources)
            .map_err(|_| DisplayListError::AllocationFailed {
                requested: counter.resources * size_of::<DlResource>(),
            })?;

        let kind = op.op_type();
        let offset = self.storage.len();
        self.storage
            .extend_from_slice(&u32::from(kind as u8).to_ne_bytes());
        self.storage.extend_from_slice(&size_field.to_ne_bytes());
        op.encode(&mut ArenaWriter {
            storage: &mut self.storage,
            resources: &mut self.resources,
        });
        debug_assert_eq!(
            self.storage.len(),
            offset + HEADER_SIZE + counter.bytes,
            "measuring and writing passes disagree for {kind:?}"
        );
        self.storage.resize(offset + size, 0);

        if !kind.is_attribute() {
            self.render_op_count = self.render_op_count.saturating_add(1);
        }
        self.op_index = self.op_index.saturating_add(1);
        Ok(offset)
    }

    fn patch_u32(&mut self, at: usize, value: u32) {
        if let Some(slot) = self.storage.get_mut(at..at + 4) {
            slot.copy_from_slice(&value.to_ne_bytes());
        }
    }

    fn peek_u32(&self, at: usize) -> Option<u32> {
        let bytes = self.storage.get(at..at + 4)?;
        Some(u32::from_ne_bytes(bytes.try_into().ok()?))
    }

    /// Links the save-kind record at `offset` to the op index of its
    /// matching restore.
    pub fn update_restore_index(&mut self, offset: usize, restore_index: u32) {
        let Ok((kind, _)) = read_header(&self.storage, offset) else {
            debug_assert!(false, "no record at offset {offset}");
            return;
        };
        let field = match kind {
            DlOpType::Save => offset + HEADER_SIZE,
            k if k.is_save_layer() => offset + HEADER_SIZE + 4,
            _ => {
                debug_assert!(false, "{kind:?} at {offset} carries no restore index");
                return;
            }
        };
        self.patch_u32(field, restore_index);
    }

    /// Sets the "can distribute opacity" option on the save-layer record at
    /// `offset`.
    pub fn set_can_distribute_opacity(&mut self, offset: usize) {
        let is_layer =
            read_header(&self.storage, offset).is_ok_and(|(kind, _)| kind.is_save_layer());
        debug_assert!(is_layer, "no save-layer record at offset {offset}");
        if !is_layer {
            return;
        }
        let field = offset + HEADER_SIZE;
        if let Some(bits) = self.peek_u32(field) {
            let options = SaveLayerOptions::from_bits_retain(bits)
                | SaveLayerOptions::CAN_DISTRIBUTE_OPACITY;
            self.patch_u32(field, options.bits());
        }
    }

    /// Moves the recorded data out and resets the arena to empty.
    pub fn take(&mut self) -> RecordedOps {
        let recorded = RecordedOps {
            storage: core::mem::take(&mut self.storage),
            resources: core::mem::take(&mut self.resources),
            render_op_count: self.render_op_count,
            op_index_count: self.op_index,
        };
        self.render_op_count = 0;
        self.op_index = 0;
        recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DlColor;
    use crate::op::DlPointMode;
    use crate::path::DlPath;
    use alloc::vec;

    #[test]
    fn records_are_aligned_and_counted() {
        let mut buf = OpBuffer::default();
        let a = buf.push(&DlOp::SetColor(DlColor::RED)).unwrap();
        let b = buf.push(&DlOp::DrawRect(Rect::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b % RECORD_ALIGN, 0, "second record starts aligned");
        assert_eq!(buf.used() % RECORD_ALIGN, 0);
        assert_eq!(buf.op_index(), 2);
        assert_eq!(buf.render_op_count(), 1, "attribute ops do not render");
    }

    #[test]
    fn growth_is_page_granular() {
        let mut buf = OpBuffer::new(256);
        buf.push(&DlOp::DrawPaint).unwrap();
        assert_eq!(buf.allocated(), 256, "first record reserves one page");
        for _ in 0..40 {
            buf.push(&DlOp::DrawPaint).unwrap();
        }
        assert_eq!(buf.allocated() % 256, 0, "capacity stays a page multiple");
        assert!(buf.used() <= buf.allocated());
    }

    #[test]
    fn decode_walks_every_record() {
        let mut buf = OpBuffer::default();
        let points = [Point::new(1.0, 2.0), Point::new(3.0, 4.0), Point::new(5.0, 6.0)];
        buf.push(&DlOp::Translate { tx: 2.0, ty: 3.0 }).unwrap();
        buf.push(&DlOp::DrawPoints {
            mode: DlPointMode::Lines,
            points: Cow::Borrowed(&points),
        })
        .unwrap();
        buf.push(&DlOp::DrawPath(&DlPath::circle(Point::ZERO, 4.0))).unwrap();

        let entries: Vec<_> = buf.iter().collect();
        assert_eq!(entries.len(), 3);
        assert!(
            matches!(entries[0].op, DlOp::Translate { tx, ty } if tx == 2.0 && ty == 3.0)
        );
        match &entries[1].op {
            DlOp::DrawPoints { mode, points: decoded } => {
                assert_eq!(*mode, DlPointMode::Lines);
                assert_eq!(decoded.as_ref(), &points[..]);
            }
            other => panic!("unexpected {other:?}"),
        }
        let expected = Rect::new(-4.0, -4.0, 4.0, 4.0);
        assert!(
            matches!(entries[2].op, DlOp::DrawPath(p) if p.bounds() == expected),
            "path survives the round trip"
        );
        assert_eq!(entries[2].index, 2);
        assert_eq!(buf.resources().len(), 1, "the path went to the side table");
    }

    #[test]
    fn backpatches_touch_only_their_fields() {
        let mut buf = OpBuffer::default();
        let save = buf.push(&DlOp::Save { restore_index: 0 }).unwrap();
        let layer = buf
            .push(&DlOp::SaveLayer {
                options: SaveLayerOptions::RENDERS_WITH_ATTRIBUTES,
                restore_index: 0,
                bounds: Some(Rect::new(0.0, 0.0, 5.0, 5.0)),
                backdrop: None,
            })
            .unwrap();
        let before = buf.used();
        buf.update_restore_index(save, 7);
        buf.update_restore_index(layer, 5);
        buf.set_can_distribute_opacity(layer);
        assert_eq!(buf.used(), before, "patching never resizes");

        assert!(
            matches!(buf.decode_at(save).unwrap(), DlOp::Save { restore_index: 7 })
        );
        match buf.decode_at(layer).unwrap() {
            DlOp::SaveLayer {
                options,
                restore_index,
                bounds,
                backdrop,
            } => {
                assert_eq!(restore_index, 5);
                assert!(options.contains(SaveLayerOptions::CAN_DISTRIBUTE_OPACITY));
                assert!(options.contains(SaveLayerOptions::RENDERS_WITH_ATTRIBUTES));
                assert_eq!(bounds, Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
                assert!(backdrop.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_headers_stop_iteration() {
        let mut bytes = vec![0_u8; 16];
        bytes[0] = 200;
        bytes[4] = 16;
        assert!(matches!(
            read_header(&bytes, 0),
            Err(DisplayListError::Malformed { offset: 0 })
        ));
        assert_eq!(OpIter::new(&bytes, &[]).count(), 0);

        let mut buf = OpBuffer::default();
        buf.push(&DlOp::DrawPaint).unwrap();
        assert!(buf.decode_at(4).is_err(), "mid-record offset");
    }

    #[test]
    fn take_resets() {
        let mut buf = OpBuffer::default();
        buf.push(&DlOp::DrawPaint).unwrap();
        let taken = buf.take();
        assert_eq!(taken.render_op_count, 1);
        assert_eq!(taken.storage.len(), HEADER_SIZE);
        assert_eq!(buf.used(), 0);
        assert_eq!(buf.op_index(), 0);
    }
}
