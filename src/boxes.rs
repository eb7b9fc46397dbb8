//! Readers for the payload of the boxes that hold chapter data.
//!
//! Each reader expects the [`BoxScanner`](crate::mp4box::BoxScanner) to
//! be positioned at the start of the content of its box, and reads no
//! further than the end of that box.
//!
pub(crate) mod prelude;

mod chpl;
mod mdia;
mod stco;
mod stts;
mod tref;

pub use self::chpl::*;
pub use self::mdia::*;
pub use self::stco::*;
pub use self::stts::*;
pub use self::tref::*;
