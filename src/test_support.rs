//! Byte builders for tests: ISO boxes, EBML elements, and small but
//! complete chaptered files in each container format.

pub fn make_box(fourcc: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let size = (8 + body.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(fourcc);
    out.extend_from_slice(body);
    out
}

/// Box with a 64-bit size (size field 1).
pub fn make_large_box(fourcc: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + body.len());
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&((16 + body.len()) as u64).to_be_bytes());
    out.extend_from_slice(body);
    out
}

pub fn make_full_box(fourcc: &[u8; 4], version: u8, flags: u32, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + payload.len());
    body.push(version);
    body.extend_from_slice(&flags.to_be_bytes()[1..]);
    body.extend_from_slice(payload);
    make_box(fourcc, &body)
}

/// `mdhd` version 0 with the given time scale.
pub fn make_mdhd(timescale: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 8];
    payload.extend_from_slice(&timescale.to_be_bytes());
    payload.extend_from_slice(&[0u8; 8]);
    make_full_box(b"mdhd", 0, 0, &payload)
}

pub fn make_stts(entries: &[(u32, u32)]) -> Vec<u8> {
    let mut payload = (entries.len() as u32).to_be_bytes().to_vec();
    for (count, delta) in entries {
        payload.extend_from_slice(&count.to_be_bytes());
        payload.extend_from_slice(&delta.to_be_bytes());
    }
    make_full_box(b"stts", 0, 0, &payload)
}

pub fn make_stco(offsets: &[u32]) -> Vec<u8> {
    let mut payload = (offsets.len() as u32).to_be_bytes().to_vec();
    for offset in offsets {
        payload.extend_from_slice(&offset.to_be_bytes());
    }
    make_full_box(b"stco", 0, 0, &payload)
}

pub fn make_co64(offsets: &[u64]) -> Vec<u8> {
    let mut payload = (offsets.len() as u32).to_be_bytes().to_vec();
    for offset in offsets {
        payload.extend_from_slice(&offset.to_be_bytes());
    }
    make_full_box(b"co64", 0, 0, &payload)
}

/// A text sample: 16-bit length, then the text.
pub fn make_text_sample(text: &[u8]) -> Vec<u8> {
    let mut out = (text.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(text);
    out
}

/// `trak` with an optional `tref/chap` reference and optional media box.
pub fn make_trak(chap_ref: Option<u32>, mdia: Option<&[u8]>) -> Vec<u8> {
    let mut body = make_full_box(b"tkhd", 0, 0, &[0u8; 80]);
    if let Some(id) = chap_ref {
        body.extend(make_box(b"tref", &make_box(b"chap", &id.to_be_bytes())));
    }
    if let Some(mdia) = mdia {
        body.extend(make_box(b"mdia", mdia));
    }
    make_box(b"trak", &body)
}

/// `mdia` payload of a chapter text track.
pub fn make_chapter_mdia(timescale: u32, stts: &[(u32, u32)], chunk_offsets: &[u8]) -> Vec<u8> {
    let mut stbl = make_full_box(b"stsd", 0, 0, &[0, 0, 0, 0]);
    stbl.extend(make_stts(stts));
    stbl.extend_from_slice(chunk_offsets);
    let minf = make_box(b"minf", &make_box(b"stbl", &stbl));
    let mut mdia = make_mdhd(timescale);
    mdia.extend(make_full_box(b"hdlr", 0, 0, b"\0\0\0\0text\0\0\0\0\0\0\0\0\0\0\0\0\0"));
    mdia.extend(minf);
    mdia
}

/// A QuickTime file with a video, an audio and a chapter text track.
///
/// The video track (track 1) has a `chap` reference to `chap_ref`,
/// the text samples are stored in an `mdat` before the `moov`. The
/// `stts` table gets `stts` as is.
pub fn make_quicktime_file(chap_ref: u32, titles: &[&str], stts: &[(u32, u32)]) -> Vec<u8> {
    make_quicktime_file_with(chap_ref, titles, stts, false)
}

pub fn make_quicktime_file_with(
    chap_ref: u32,
    titles: &[&str],
    stts: &[(u32, u32)],
    large_offsets: bool,
) -> Vec<u8> {
    let ftyp = make_box(b"ftyp", b"M4A \0\0\0\0M4A mp42isom");
    let mut samples = Vec::new();
    let mut offsets = Vec::new();
    let mdat_content_start = ftyp.len() as u64 + 8;
    for title in titles {
        offsets.push(mdat_content_start + samples.len() as u64);
        samples.extend(make_text_sample(title.as_bytes()));
    }
    let mdat = make_box(b"mdat", &samples);
    let chunk_offsets = if large_offsets {
        make_co64(&offsets)
    } else {
        make_stco(&offsets.iter().map(|&o| o as u32).collect::<Vec<_>>())
    };

    let video_mdia = make_mdhd(90000);
    let audio_mdia = make_mdhd(44100);
    let text_mdia = make_chapter_mdia(1000, stts, &chunk_offsets);

    let mut moov = make_full_box(b"mvhd", 0, 0, &[0u8; 96]);
    moov.extend(make_trak(Some(chap_ref), Some(&video_mdia)));
    moov.extend(make_trak(None, Some(&audio_mdia)));
    moov.extend(make_trak(None, Some(&text_mdia)));

    [ftyp, mdat, make_box(b"moov", &moov)].concat()
}

/// A Nero `chpl` box body: version 1, flags, reserved byte, count, entries.
pub fn make_chpl(chapters: &[(u64, &str)]) -> Vec<u8> {
    let mut payload = vec![0u8];
    payload.extend_from_slice(&(chapters.len() as u32).to_be_bytes());
    for (start, title) in chapters {
        payload.extend_from_slice(&start.to_be_bytes());
        payload.push(title.len() as u8);
        payload.extend_from_slice(title.as_bytes());
    }
    make_full_box(b"chpl", 1, 0, &payload)
}

/// An MP4 file with Nero chapters in the second `udta` of `moov`.
pub fn make_nero_file(chapters: &[(u64, &str)]) -> Vec<u8> {
    let ftyp = make_box(b"ftyp", b"M4V \0\0\0\0M4V mp42isom");
    let mut moov = make_full_box(b"mvhd", 0, 0, &[0u8; 96]);
    moov.extend(make_trak(None, Some(&make_mdhd(90000))));
    moov.extend(make_box(b"udta", &make_box(b"meta", &[0u8; 4])));
    moov.extend(make_box(b"udta", &make_chpl(chapters)));
    [ftyp, make_box(b"moov", &moov), make_box(b"mdat", &[0u8; 16])].concat()
}

/// Encode an EBML data size in the smallest number of bytes.
pub fn ebml_size(size: u64) -> Vec<u8> {
    let mut len = 1;
    // all-ones is reserved for "unknown size".
    while len < 8 && size >= (1u64 << (7 * len)) - 1 {
        len += 1;
    }
    let marked = size | (1u64 << (7 * len));
    marked.to_be_bytes()[8 - len..].to_vec()
}

/// An EBML element: raw id, size, data.
pub fn ebml_element(id: u32, data: &[u8]) -> Vec<u8> {
    let mut out = crate::types::ElementId(id).to_bytes();
    out.extend(ebml_size(data.len() as u64));
    out.extend_from_slice(data);
    out
}

/// An unsigned integer element, in the smallest number of bytes.
pub fn ebml_uint(id: u32, value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take(7).take_while(|&&b| b == 0).count();
    ebml_element(id, &bytes[skip..])
}

/// One chapter of a synthetic Matroska file.
pub struct MkvChapter<'a> {
    pub start_ns: u64,
    pub end_ns:   Option<u64>,
    pub displays: Vec<(&'a str, &'a str)>,
}

pub fn mkv_chapter_atom(chapter: &MkvChapter) -> Vec<u8> {
    let mut atom = ebml_uint(0x73C4, 0x1234);
    atom.extend(ebml_uint(0x91, chapter.start_ns));
    if let Some(end) = chapter.end_ns {
        atom.extend(ebml_uint(0x92, end));
    }
    for (title, lang) in &chapter.displays {
        let mut display = ebml_element(0x85, title.as_bytes());
        display.extend(ebml_element(0x437C, lang.as_bytes()));
        atom.extend(ebml_element(0x80, &display));
    }
    ebml_element(0xB6, &atom)
}

/// A Matroska file with a SeekHead pointing at a Chapters element,
/// or no Chapters seek entry if `with_seek_entry` is false.
pub fn make_matroska_file(chapters: &[MkvChapter], with_seek_entry: bool) -> Vec<u8> {
    let atoms: Vec<u8> = chapters.iter().flat_map(mkv_chapter_atom).collect();
    make_matroska_file_with_atoms(&atoms, with_seek_entry)
}

/// Like `make_matroska_file`, with the encoded children of the
/// EditionEntry (after its EditionUID) given as is.
pub fn make_matroska_file_with_atoms(atoms: &[u8], with_seek_entry: bool) -> Vec<u8> {
    let ebml_header = ebml_element(
        0x1A45DFA3,
        &[ebml_uint(0x4286, 1), ebml_element(0x4282, b"matroska")].concat(),
    );

    let mut edition = ebml_uint(0x45BC, 0x55);
    edition.extend_from_slice(atoms);
    let chapters_elem = ebml_element(0x1043A770, &ebml_element(0x45B9, &edition));
    let info = ebml_element(0x1549A966, &ebml_uint(0x2AD7B1, 1_000_000));

    // The seek positions depend on the SeekHead size, which does not
    // depend on the positions as long as they fit in the same number of
    // bytes. So build it once with placeholders, then for real.
    let build_seek_head = |info_pos: u64, chapters_pos: u64| {
        let mut seeks = ebml_element(
            0x4DBB,
            &[ebml_element(0x53AB, &[0x15, 0x49, 0xA9, 0x66]), ebml_uint_fixed(0x53AC, info_pos)].concat(),
        );
        if with_seek_entry {
            seeks.extend(ebml_element(
                0x4DBB,
                &[ebml_element(0x53AB, &[0x10, 0x43, 0xA7, 0x70]), ebml_uint_fixed(0x53AC, chapters_pos)]
                    .concat(),
            ));
        }
        ebml_element(0x114D9B74, &seeks)
    };
    let seek_head_len = build_seek_head(0, 0).len() as u64;
    let info_pos = seek_head_len;
    let chapters_pos = info_pos + info.len() as u64;
    let seek_head = build_seek_head(info_pos, chapters_pos);

    let segment_data = [seek_head, info, chapters_elem].concat();
    [ebml_header, ebml_element(0x18538067, &segment_data)].concat()
}

/// Unsigned integer element with a fixed 4-byte value.
fn ebml_uint_fixed(id: u32, value: u64) -> Vec<u8> {
    ebml_element(id, &(value as u32).to_be_bytes())
}
