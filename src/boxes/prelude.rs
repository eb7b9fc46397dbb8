pub(crate) use crate::mp4box::{BoxRange, BoxScanner};
pub(crate) use crate::serialize::ReadBytes;
pub(crate) use crate::types::*;
