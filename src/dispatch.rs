use bstr::BStr;
use csvmap_core::Boundary;

use crate::cell::Cell;

/// Receives the events of a materializing traversal.
///
/// Every method defaults to doing nothing, so implementors only write the
/// events they care about. Fields are handed over as `&BStr`, already
/// unescaped and trimmed; the view is only valid for the duration of the
/// call.
///
/// Events arrive left to right, top to bottom. Each field and each row
/// boundary is delivered exactly once.
pub trait Handler {
    /// A field of the header row.
    fn header(&mut self, _field: &BStr) {}

    /// A field outside of the header row.
    fn value(&mut self, _field: &BStr) {}

    /// The end of a row. This fires after the row's last field.
    fn row(&mut self) {}
}

/// Receives the events of a zero-copy traversal.
///
/// This is the [`Handler`] counterpart for [`Reader::dispatch_span`]. Cells
/// borrow the reader for `'r`, so they may be kept past the call.
///
/// [`Reader::dispatch_span`]: crate::Reader::dispatch_span
pub trait SpanHandler<'r> {
    /// A cell of the header row.
    fn header(&mut self, _cell: Cell<'r>) {}

    /// A cell outside of the header row.
    fn value(&mut self, _cell: Cell<'r>) {}

    /// The end of a row. This fires after the row's last cell.
    fn row(&mut self) {}
}

/// Adapts a triple of closures into a handler.
pub(crate) struct Callbacks<H, V, R> {
    pub(crate) header: H,
    pub(crate) value: V,
    pub(crate) row: R,
}

impl<H, V, R> Handler for Callbacks<H, V, R>
where
    H: FnMut(&BStr),
    V: FnMut(&BStr),
    R: FnMut(),
{
    fn header(&mut self, field: &BStr) {
        (self.header)(field)
    }

    fn value(&mut self, field: &BStr) {
        (self.value)(field)
    }

    fn row(&mut self) {
        (self.row)()
    }
}

impl<'r, H, V, R> SpanHandler<'r> for Callbacks<H, V, R>
where
    H: FnMut(Cell<'r>),
    V: FnMut(Cell<'r>),
    R: FnMut(),
{
    fn header(&mut self, cell: Cell<'r>) {
        (self.header)(cell)
    }

    fn value(&mut self, cell: Cell<'r>) {
        (self.value)(cell)
    }

    fn row(&mut self) {
        (self.row)()
    }
}

/// Where a finished field goes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Slot {
    Header,
    Value,
}

/// Routes field boundaries to slots.
///
/// The first `header_len` fields of a traversal are headers and the rest are
/// values. The router also keeps the totals that are logged when a traversal
/// ends.
#[derive(Debug)]
pub(crate) struct Router {
    header_len: u64,
    pub(crate) fields: u64,
    pub(crate) rows: u64,
}

impl Router {
    pub(crate) fn new(header_len: u64) -> Router {
        Router { header_len, fields: 0, rows: 0 }
    }

    /// Route the field ended by `boundary`. The second value is true when a
    /// row boundary must fire after the field.
    pub(crate) fn route(&mut self, boundary: Boundary) -> (Slot, bool) {
        let slot =
            if self.fields < self.header_len { Slot::Header } else { Slot::Value };
        self.fields += 1;
        let row_end = boundary.is_row();
        if row_end {
            self.rows += 1;
        }
        (slot, row_end)
    }
}

pub(crate) fn ignore_field(_: &BStr) {}

pub(crate) fn ignore_cell(_: Cell<'_>) {}

pub(crate) fn ignore_row() {}
