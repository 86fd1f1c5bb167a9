//! Table repositories: one small handle per marketplace table.
//!
//! Each handle borrows the [`Marketplace`](crate::Marketplace) and builds a
//! fresh query client per call, so a sign-in between calls takes effect on
//! the next request.

mod categories;
mod messages;
mod notifications;
mod products;
mod reviews;
mod users;

pub use categories::*;
pub use messages::*;
pub use notifications::*;
pub use products::*;
pub use reviews::*;
pub use users::*;

use crate::error::Error;
use crate::postgrest::Counted;

/// First row of a write that asked for the representation back
pub(crate) fn first_row<T>(rows: Vec<T>, what: &str) -> Result<T, Error> {
    rows.into_iter()
        .next()
        .ok_or_else(|| Error::database(format!("{what} returned no row")))
}

/// The reported total, or the rows on hand when the backend sent none
pub(crate) fn total_of<T>(counted: &Counted<T>) -> usize {
    counted.total.unwrap_or(counted.rows.len())
}

/// Zero-based inclusive row range of a 1-based page
pub(crate) fn row_range(page: usize, page_size: usize) -> (usize, usize) {
    let from = (page.max(1) - 1).saturating_mul(page_size.max(1));
    (from, from.saturating_add(page_size.max(1) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_ranges() {
        assert_eq!(row_range(1, 30), (0, 29));
        assert_eq!(row_range(3, 30), (60, 89));
        assert_eq!(row_range(0, 0), (0, 0));
    }

    #[test]
    fn huge_pages_saturate() {
        assert_eq!(row_range(usize::MAX, 30), (usize::MAX, usize::MAX));
    }
}
