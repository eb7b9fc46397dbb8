use std::fs;
use std::time::Duration;

use mediachapters::{
    find_base_media_file, media_chapters, read_chapter_file, read_chapters, write_chapter_file, ChapterError,
};

fn make_box(fourcc: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((8 + body.len()) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(fourcc);
    out.extend_from_slice(body);
    out
}

fn full_box(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    make_box(fourcc, &[&[0u8, 0, 0, 0][..], payload].concat())
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes().to_vec()).collect()
}

// ftyp, mdat with the titles, moov with a sound track that refers to
// the chapter text track (track 2).
fn quicktime_file(titles: &[&str], deltas: &[u32]) -> Vec<u8> {
    let ftyp = make_box(b"ftyp", b"M4B \0\0\0\0M4B isom");
    let mut samples = Vec::new();
    let mut offsets = Vec::new();
    for title in titles {
        offsets.push((ftyp.len() + 8 + samples.len()) as u32);
        samples.extend_from_slice(&(title.len() as u16).to_be_bytes());
        samples.extend_from_slice(title.as_bytes());
    }
    let mdat = make_box(b"mdat", &samples);

    let mut stts = vec![1 + deltas.len() as u32, 1, 0];
    for d in deltas {
        stts.extend_from_slice(&[1, *d]);
    }
    let mut stco = vec![offsets.len() as u32];
    stco.extend_from_slice(&offsets);
    let stbl = [full_box(b"stts", &u32s(&stts)), full_box(b"stco", &u32s(&stco))].concat();
    let mdhd = full_box(b"mdhd", &u32s(&[0, 0, 600, 0, 0]));
    let mdia = [mdhd, make_box(b"minf", &make_box(b"stbl", &stbl))].concat();

    let sound = make_box(
        b"trak",
        &[make_box(b"tref", &make_box(b"chap", &u32s(&[2]))), make_box(b"mdia", &full_box(b"mdhd", &[0; 20]))]
            .concat(),
    );
    let text = make_box(b"trak", &make_box(b"mdia", &mdia));
    [ftyp, mdat, make_box(b"moov", &[sound, text].concat())].concat()
}

fn ebml(id: &[u8], data: &[u8]) -> Vec<u8> {
    assert!(data.len() < 0x3fff);
    let mut out = id.to_vec();
    out.extend_from_slice(&(0x4000u16 | data.len() as u16).to_be_bytes());
    out.extend_from_slice(data);
    out
}

fn matroska_file(chapters: &[(u64, &str, &str)]) -> Vec<u8> {
    let header = ebml(&[0x1A, 0x45, 0xDF, 0xA3], &ebml(&[0x42, 0x82], b"webm"));
    let mut edition = Vec::new();
    for (start, title, lang) in chapters {
        let display = [ebml(&[0x85], title.as_bytes()), ebml(&[0x43, 0x7C], lang.as_bytes())].concat();
        let atom = [ebml(&[0x91], &start.to_be_bytes()), ebml(&[0x80], &display)].concat();
        edition.extend(ebml(&[0xB6], &atom));
    }
    let chapters = ebml(&[0x10, 0x43, 0xA7, 0x70], &ebml(&[0x45, 0xB9], &edition));
    // SeekHead: 4 + 2 bytes header, Seek: 2 + 2, SeekID: 2 + 2 + 4, SeekPosition: 2 + 2 + 4.
    let seek_head_len = 6 + 4 + 8 + 8;
    let seek = [
        ebml(&[0x53, 0xAB], &[0x10, 0x43, 0xA7, 0x70]),
        ebml(&[0x53, 0xAC], &(seek_head_len as u32).to_be_bytes()),
    ]
    .concat();
    let seek_head = ebml(&[0x11, 0x4D, 0x9B, 0x74], &ebml(&[0x4D, 0xBB], &seek));
    assert_eq!(seek_head.len(), seek_head_len);
    let segment = ebml(&[0x18, 0x53, 0x80, 0x67], &[seek_head, chapters].concat());
    [header, segment].concat()
}

#[test]
fn quicktime_file_to_chap_file_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("book.m4b");
    fs::write(&media, quicktime_file(&["Prologue", "Chapter 1", "Chapter 2"], &[600 * 30, 900])).unwrap();

    let chapters = read_chapters(&media).unwrap();
    assert_eq!(chapters.len(), 3);
    assert_eq!(chapters[1].title(), "Chapter 1");
    assert_eq!(chapters[1].start(), Duration::from_secs(30));
    assert_eq!(chapters[2].start(), Duration::from_millis(31_500));
    assert_eq!(chapters[0].end(), Some(Duration::from_secs(30)));
    assert_eq!(chapters[2].end(), None);

    let written = write_chapter_file(&media, &chapters, 0).unwrap();
    assert_eq!(written, dir.path().join("book.chap"));
    assert_eq!(read_chapter_file(&written).unwrap(), chapters);
    assert_eq!(find_base_media_file(&written), Some(media));
}

#[test]
fn matroska_file_chapters() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("film.mkv");
    let data = matroska_file(&[(0, "Start", "eng"), (42_000_000_000, "End", "eng")]);
    fs::write(&media, data).unwrap();

    let chapters = media_chapters(&media).unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].languages(), &["eng".to_string()]);
    assert_eq!(chapters[0].end(), Some(Duration::from_secs(42)));
    assert_eq!(chapters[1].title(), "End");
}

#[test]
fn unreadable_and_unknown_files() {
    let dir = tempfile::tempdir().unwrap();
    match read_chapters(dir.path().join("missing.mp4")) {
        Err(ChapterError::Io(_)) => {},
        other => panic!("expected an i/o error, got {:?}", other),
    }

    let unknown = dir.path().join("notes.bin");
    fs::write(&unknown, b"just some bytes, not media").unwrap();
    assert!(read_chapters(&unknown).unwrap_err().is_not_found());
    assert!(media_chapters(&unknown).is_none());

    let empty = dir.path().join("empty.mp4");
    fs::write(&empty, b"").unwrap();
    assert!(read_chapters(&empty).unwrap_err().is_malformed());
}

#[test]
fn chap_file_example() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("show.chap");
    fs::write(&path, "# comment\n\n0:00:00 - 0:01:30 Intro\n0:01:30 Main\n").unwrap();
    let chapters = read_chapter_file(&path).unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].title(), "Intro");
    assert_eq!(chapters[0].end(), Some(Duration::from_secs(90)));
    assert_eq!(chapters[1].title(), "Main");
    assert_eq!(chapters[1].start(), Duration::from_secs(90));
    assert_eq!(chapters[1].end(), None);
}
