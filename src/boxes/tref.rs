use std::io;

use crate::boxes::prelude::*;

/// 8.3.3 Track Reference Type Box (ISO/IEC 14496-12:2015(E))
///
/// One of the children of `tref`. The fourcc is the reference type,
/// such as `chap` for "this track has chapters in track ...".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackReferenceTypeBox {
    pub reference_type: FourCC,
    pub track_ids:      Vec<u32>,
}

impl TrackReferenceTypeBox {
    /// Read the track ids, up to the end of the box.
    pub fn read<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> io::Result<TrackReferenceTypeBox> {
        let reference_type = scanner
            .container()
            .map(|c| c.fourcc)
            .ok_or_else(|| ioerr!(InvalidInput, "TrackReferenceTypeBox: not in a box"))?;
        let mut track_ids = Vec::new();
        while scanner.left() >= 4 {
            track_ids.push(scanner.read::<u32>()?);
        }
        Ok(TrackReferenceTypeBox {
            reference_type,
            track_ids,
        })
    }
}
