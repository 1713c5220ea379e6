//! Container probing: just enough to learn a video's duration.
//!
//! Only ISO base media files (mp4/m4v/mov) are understood: the `mvhd` box
//! inside `moov` carries a timescale and a duration.  Anything else reports
//! `None`, which the playback model treats as "duration unknown".

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Read the duration (seconds) of an MP4/MOV file.
pub fn video_duration(path: &Path) -> Option<f64> {
    let mut file = File::open(path).ok()?;
    let len = file.metadata().ok()?.len();
    let (moov_start, moov_end) = find_box(&mut file, 0, len, b"moov")?;
    let (mvhd_start, mvhd_end) = find_box(&mut file, moov_start, moov_end, b"mvhd")?;
    read_mvhd(&mut file, mvhd_start, mvhd_end)
}

/// Scan sibling boxes in `[start, end)` for `kind`; returns the payload
/// range of the first match.
fn find_box<R: Read + Seek>(r: &mut R, start: u64, end: u64, kind: &[u8; 4]) -> Option<(u64, u64)> {
    let mut pos = start;
    while pos + 8 <= end {
        r.seek(SeekFrom::Start(pos)).ok()?;
        let mut header = [0u8; 8];
        r.read_exact(&mut header).ok()?;
        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let (size, header_len) = match size32 {
            0 => (end - pos, 8),
            1 => {
                let mut large = [0u8; 8];
                r.read_exact(&mut large).ok()?;
                (u64::from_be_bytes(large), 16)
            }
            n => (n, 8),
        };
        if size < header_len || pos.checked_add(size)? > end {
            return None;
        }
        if &header[4..8] == kind {
            return Some((pos + header_len, pos + size));
        }
        pos += size;
    }
    None
}

fn read_mvhd<R: Read + Seek>(r: &mut R, start: u64, end: u64) -> Option<f64> {
    r.seek(SeekFrom::Start(start)).ok()?;
    let mut version = [0u8; 4];
    r.read_exact(&mut version).ok()?;
    let (timescale, duration) = if version[0] == 1 {
        if end - start < 32 {
            return None;
        }
        let mut buf = [0u8; 28];
        r.read_exact(&mut buf).ok()?;
        let timescale = u32::from_be_bytes(buf[16..20].try_into().ok()?);
        let duration = u64::from_be_bytes(buf[20..28].try_into().ok()?);
        (timescale, duration)
    } else {
        if end - start < 20 {
            return None;
        }
        let mut buf = [0u8; 16];
        r.read_exact(&mut buf).ok()?;
        let timescale = u32::from_be_bytes(buf[8..12].try_into().ok()?);
        let duration = u32::from_be_bytes(buf[12..16].try_into().ok()?) as u64;
        (timescale, duration)
    };
    if timescale == 0 {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn boxed(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out
    }

    fn mvhd_v0(timescale: u32, duration: u32) -> Vec<u8> {
        let mut payload = vec![0u8; 12]; // version/flags + creation + modification
        payload.extend_from_slice(&timescale.to_be_bytes());
        payload.extend_from_slice(&duration.to_be_bytes());
        payload.extend_from_slice(&[0u8; 80]);
        boxed(b"mvhd", &payload)
    }

    fn probe(bytes: Vec<u8>) -> Option<f64> {
        let len = bytes.len() as u64;
        let mut cursor = Cursor::new(bytes);
        let (s, e) = find_box(&mut cursor, 0, len, b"moov")?;
        let (s, e) = find_box(&mut cursor, s, e, b"mvhd")?;
        read_mvhd(&mut cursor, s, e)
    }

    #[test]
    fn test_reads_v0_duration() {
        let mut file = boxed(b"ftyp", b"isom\0\0\0\0");
        file.extend(boxed(b"free", &[0; 4]));
        let mut moov_payload = boxed(b"trak", &[0; 16]);
        moov_payload.extend(mvhd_v0(1000, 12_500));
        file.extend(boxed(b"moov", &moov_payload));
        assert_eq!(probe(file), Some(12.5));
    }

    #[test]
    fn test_reads_v1_duration() {
        let mut payload = vec![1u8, 0, 0, 0];
        payload.extend_from_slice(&[0u8; 16]); // creation + modification (64-bit)
        payload.extend_from_slice(&600u32.to_be_bytes());
        payload.extend_from_slice(&36_000u64.to_be_bytes());
        let file = boxed(b"moov", &boxed(b"mvhd", &payload));
        assert_eq!(probe(file), Some(60.0));
    }

    #[test]
    fn test_garbage_and_zero_timescale_are_unknown() {
        assert_eq!(probe(b"not a video at all".to_vec()), None);
        assert_eq!(probe(boxed(b"moov", &mvhd_v0(0, 100))), None);
        // Box claims to be longer than the file.
        let mut truncated = boxed(b"moov", &mvhd_v0(1000, 1000));
        truncated.truncate(20);
        assert_eq!(probe(truncated), None);
    }
}
