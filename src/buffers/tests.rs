//! Tests for the payload container

use std::{
    io::{Read, Seek, SeekFrom},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};

use super::*;
use crate::error::ErrorKind;

#[test]
fn test_empty_is_distinguished() {
    let empty = Bytes::empty();
    assert_eq!(empty.len(), 0);
    assert!(empty.is_empty());
    assert_eq!(empty.segment_count(), 0);
    assert_eq!(Bytes::from_vec(Vec::new()).segment_count(), 0);
}

#[test]
fn test_buffer_round_trip() {
    let data: Vec<u8> = (0..=255u8).collect();
    let bytes = Bytes::from_buffer(&data);
    assert_eq!(bytes.to_vec(), data);
    assert_eq!(bytes.len(), 256);
}

#[test]
fn test_clone_shares_segments() {
    let bytes = Bytes::from("shared payload");
    let clone = bytes.clone();
    assert_eq!(bytes, clone);
    assert_eq!(bytes.slices().next().unwrap().as_ptr(), clone.slices().next().unwrap().as_ptr());
}

#[test]
fn test_release_callback_runs_once_on_last_drop() {
    let released = Arc::new(AtomicUsize::new(0));
    let counter = released.clone();

    let bytes = Bytes::from_buffer_with_release(vec![1u8, 2, 3], move |buffer: Vec<u8>| {
        assert_eq!(buffer, vec![1, 2, 3]);
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let clone = bytes.clone();

    drop(bytes);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    assert_eq!(clone.to_vec(), vec![1, 2, 3]);

    drop(clone);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_writer_composes_segments() {
    let head = Bytes::from("hello ");
    let mut writer = Bytes::writer();
    writer.append(head.clone());
    writer.write_all(b"wide ");
    writer.append(Bytes::from("world"));
    assert_eq!(writer.len(), 16);

    let bytes = writer.finish();
    assert_eq!(bytes.segment_count(), 3);
    assert_eq!(bytes.try_to_string().unwrap(), "hello wide world");

    let spans: Vec<&[u8]> = bytes.slices().collect();
    assert_eq!(spans, vec![&b"hello "[..], &b"wide "[..], &b"world"[..]]);
    // a second iterator restarts from the first span
    assert_eq!(bytes.slices().count(), 3);
}

#[test]
fn test_reader_across_segments() {
    let mut writer = BytesWriter::new();
    writer.append(Bytes::from(&[0u8, 1, 2][..]));
    writer.append(Bytes::from(&[3u8, 4][..]));
    writer.append(Bytes::from(&[5u8, 6, 7, 8][..]));
    let bytes = writer.finish();

    let mut reader = bytes.reader();
    assert_eq!(reader.read_bytes(4), vec![0, 1, 2, 3]);
    assert_eq!(reader.tell(), 4);
    assert_eq!(reader.remaining(), 5);

    reader.seek(SeekFrom::End(-2)).unwrap();
    assert_eq!(reader.read_bytes(10), vec![7, 8]);
    assert_eq!(reader.remaining(), 0);

    reader.seek(SeekFrom::Start(1)).unwrap();
    reader.seek(SeekFrom::Current(1)).unwrap();
    let mut buf = [0u8; 3];
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(buf, [2, 3, 4]);

    assert!(reader.seek(SeekFrom::Current(-10)).is_err());
    assert!(reader.seek(SeekFrom::Start(100)).is_err());
    assert_eq!(reader.tell(), 5);
}

#[test]
fn test_make_exclusive_copies_when_shared() {
    let original = Bytes::from("abc");
    let mut copy = original.clone();
    copy.make_exclusive().push(b'd');

    assert_eq!(original.to_vec(), b"abc");
    assert_eq!(copy.to_vec(), b"abcd");

    // now sole owner: no further copy, mutation in place
    let before = copy.slices().next().unwrap().as_ptr();
    copy.make_exclusive()[0] = b'x';
    assert_eq!(copy.slices().next().unwrap().as_ptr(), before);
    assert_eq!(copy.to_vec(), b"xbcd");
}

#[test]
fn test_make_exclusive_flattens_segments() {
    let mut writer = BytesWriter::new();
    writer.append(Bytes::from("ab"));
    writer.append(Bytes::from("cd"));
    let mut bytes = writer.finish();
    bytes.make_exclusive().extend_from_slice(b"ef");
    assert_eq!(bytes.segment_count(), 1);
    assert_eq!(bytes.to_vec(), b"abcdef");
}

#[test]
fn test_utf8_failure_is_an_error_not_empty() {
    let invalid = Bytes::from(vec![0xffu8, 0xfe]);
    let err = invalid.try_to_string().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Utf8Error);

    let empty = Bytes::empty();
    assert_eq!(empty.try_to_string().unwrap(), "");
    assert_eq!(invalid.to_string_lossy(), "\u{fffd}\u{fffd}");
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Reading {
    sensor: String,
    values: Vec<i32>,
}

#[test]
fn test_codec_through_views() {
    let reading = Reading {
        sensor: "temp".to_string(),
        values: vec![-3, 0, 42],
    };
    let bytes = Bytes::serialize(&reading).unwrap();
    let decoded: Reading = bytes.deserialize().unwrap();
    assert_eq!(decoded, reading);

    let err = Bytes::from(&[1u8][..]).deserialize::<Reading>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeserializeError);
}
