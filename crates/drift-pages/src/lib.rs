mod cursor;
mod error;
mod offset;
mod state;

pub use cursor::{CursorPaginator, CursorSpec};
pub use error::{FetchError, PageError};
pub use offset::OffsetPaginator;
pub use state::{Applied, LoadMore, Page, PageRequest};
