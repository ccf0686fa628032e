// In: src/writer/tests.rs

use std::io::{self, Write};

use chrono::{TimeZone, Utc};

use super::*;
use crate::column::TypedStatistics;
use crate::config::CompressionKind;
use crate::encoding;
use crate::format::{read_tail, ColumnEncoding, FileTail, StreamKind};
use crate::kernels::{boolean, int_rle};

//==================================================================================
// Helpers
//==================================================================================

fn writer(schema: &str, config: WriterConfig) -> Writer<Vec<u8>> {
    Writer::from_schema_text(Vec::new(), schema, config).unwrap()
}

fn finish(mut w: Writer<Vec<u8>>) -> Vec<u8> {
    w.close().unwrap();
    w.into_inner()
}

fn stream(
    tail: &FileTail,
    file: &[u8],
    stripe: usize,
    column: u32,
    kind: StreamKind,
) -> Option<Vec<u8>> {
    tail.stream(file, stripe, column, kind).unwrap()
}

fn signed(tail: &FileTail, file: &[u8], stripe: usize, column: u32, n: usize) -> Vec<i64> {
    let bytes = stream(tail, file, stripe, column, StreamKind::Data).unwrap();
    int_rle::decode(&bytes, n, true).unwrap()
}

fn present(tail: &FileTail, file: &[u8], stripe: usize, column: u32, n: usize) -> Vec<bool> {
    let bytes = stream(tail, file, stripe, column, StreamKind::Present).unwrap();
    boolean::decode(&bytes, n).unwrap()
}

/// Transposes rows into one `Vec` per top-level field.
fn columns_of(rows: &[Vec<Value>]) -> Vec<Vec<Value>> {
    let width = rows.first().map_or(0, Vec::len);
    (0..width)
        .map(|c| rows.iter().map(|r| r[c].clone()).collect())
        .collect()
}

const MIXED_SCHEMA: &str =
    "struct<id:bigint,name:string,score:double,tags:array<string>,flag:boolean>";

fn mixed_rows(n: usize) -> Vec<Vec<Value>> {
    (0..n)
        .map(|i| {
            let name = if i % 4 == 3 {
                Value::Null
            } else {
                Value::from(format!("user{}", i % 3))
            };
            let tags = if i % 5 == 0 {
                Value::Null
            } else {
                Value::List((0..i % 3).map(|t| Value::from(format!("t{t}"))).collect())
            };
            vec![
                Value::Int(i as i64 * 7 - 20),
                name,
                Value::Double(i as f64 / 4.0),
                tags,
                Value::Boolean(i % 2 == 0),
            ]
        })
        .collect()
}

/// A sink that accepts `budget` bytes and then fails every write.
struct FlakySink {
    budget: usize,
}

impl Write for FlakySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.budget {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.budget -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

//==================================================================================
// Lifecycle
//==================================================================================

#[test]
fn test_three_rows_two_stripes() {
    // --- ARRANGE ---
    let mut w = writer(
        "struct<a:int,b:string>",
        WriterConfig::default().with_stripe_rows(2),
    );

    // --- ACT ---
    w.write(&[Value::Int(1), Value::from("x")]).unwrap();
    w.write(&[Value::Int(2), Value::from("y")]).unwrap();
    assert_eq!(w.stripes().len(), 1);
    w.write(&[Value::Int(3), Value::Null]).unwrap();
    let file = finish(w);

    // --- ASSERT ---
    assert_eq!(&file[..3], b"ORC");
    assert_eq!(&file[file.len() - 3..], b"ORC");
    let tail = read_tail(&file).unwrap();
    let footer = &tail.footer;
    assert_eq!(footer.number_of_rows, 3);
    assert_eq!(footer.header_length, 3);
    assert_eq!(footer.stripes.len(), 2);
    assert_eq!(footer.stripes[0].number_of_rows, 2);
    assert_eq!(footer.stripes[1].number_of_rows, 1);
    assert_eq!(footer.stripes[0].offset, 3);
    assert_eq!(
        footer.stripes[1].offset,
        footer.stripes[0].offset + footer.stripes[0].total_length()
    );
    assert_eq!(
        footer.content_length,
        footer.stripes[1].offset + footer.stripes[1].total_length()
    );

    assert_eq!(signed(&tail, &file, 0, 1, 2), vec![1, 2]);
    assert_eq!(signed(&tail, &file, 1, 1, 1), vec![3]);
    assert_eq!(stream(&tail, &file, 0, 2, StreamKind::Data).unwrap(), b"xy");
    assert_eq!(stream(&tail, &file, 0, 2, StreamKind::Present), None);
    assert_eq!(present(&tail, &file, 1, 2, 1), vec![false]);
    // No non-null strings in the second stripe: its data and length streams
    // are empty and therefore omitted.
    assert_eq!(stream(&tail, &file, 1, 2, StreamKind::Data), None);
    assert_eq!(stream(&tail, &file, 1, 2, StreamKind::Length), None);

    let stats = &footer.statistics;
    assert_eq!(stats[0].number_of_values, 3);
    assert_eq!(
        stats[1].typed,
        TypedStatistics::Integer {
            minimum: Some(1),
            maximum: Some(3),
            sum: Some(6)
        }
    );
    assert_eq!(stats[2].number_of_values, 2);
    assert_eq!(stats[2].null_count, 1);
}

#[test]
fn test_double_close_leaves_output_untouched() {
    let mut w = writer("struct<a:int>", WriterConfig::default());
    w.write(&[Value::Int(1)]).unwrap();
    let footer = w.close().unwrap();
    assert_eq!(footer.number_of_rows, 1);
    let closed = w.get_ref().clone();

    assert!(matches!(w.close(), Err(OrcError::ClosedWriter)));
    assert!(matches!(w.write(&[Value::Int(2)]), Err(OrcError::ClosedWriter)));
    assert!(matches!(
        w.write_columns(vec![vec![Value::Int(3)]]),
        Err(OrcError::ClosedWriter)
    ));
    assert_eq!(w.state(), WriterState::Closed);
    assert_eq!(w.get_ref(), &closed);
}

#[test]
fn test_empty_file() {
    let w = writer("struct<a:int>", WriterConfig::default());
    let file = finish(w);
    let tail = read_tail(&file).unwrap();
    assert_eq!(tail.footer.number_of_rows, 0);
    assert!(tail.footer.stripes.is_empty());
    assert_eq!(tail.footer.content_length, 3);
    assert_eq!(tail.footer.types.len(), 2);
}

#[test]
fn test_rejects_non_struct_root_and_bad_config() {
    assert!(matches!(
        Writer::from_schema_text(Vec::new(), "int", WriterConfig::default()),
        Err(OrcError::Schema(_))
    ));
    assert!(matches!(
        Writer::from_schema_text(
            Vec::new(),
            "struct<a:int>",
            WriterConfig::default().with_stripe_rows(0)
        ),
        Err(OrcError::Config(_))
    ));
}

#[test]
fn test_io_failure_poisons_writer() {
    let config = WriterConfig::default().with_stripe_rows(1);
    let schema = crate::schema::parse("struct<a:int>").unwrap();
    let mut w = Writer::new(FlakySink { budget: 3 }, schema, config).unwrap();

    assert!(matches!(w.write(&[Value::Int(1)]), Err(OrcError::Io(_))));
    assert_eq!(w.state(), WriterState::Poisoned);
    assert!(matches!(w.write(&[Value::Int(2)]), Err(OrcError::Poisoned)));
    assert!(matches!(w.close(), Err(OrcError::Poisoned)));
}

#[test]
fn test_create_writes_file() -> Result<(), OrcError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("people.orc");
    let schema = crate::schema::parse("struct<name:string,age:smallint>")?;

    let mut w = Writer::create(&path, schema, WriterConfig::default())?;
    w.write(&[Value::from("ada"), Value::Int(36)])?;
    w.write(&[Value::from("alan"), Value::Int(41)])?;
    w.close()?;
    drop(w);

    let file = std::fs::read(&path)?;
    let tail = read_tail(&file)?;
    assert_eq!(tail.footer.number_of_rows, 2);
    assert_eq!(
        tail.footer.types[0].field_names,
        vec!["name".to_string(), "age".to_string()]
    );
    Ok(())
}

//==================================================================================
// Validation
//==================================================================================

#[test]
fn test_arity_error_does_not_mutate() {
    let config = WriterConfig::default();
    let mut w = writer("struct<a:int,b:string>", config.clone());
    assert!(matches!(
        w.write(&[Value::Int(1)]),
        Err(OrcError::Arity {
            expected: 2,
            found: 1,
            ..
        })
    ));
    match w.write(&[Value::Int(1), Value::Int(2)]) {
        Err(OrcError::TypeMismatch { path, .. }) => assert_eq!(path, "b"),
        other => panic!("expected a type mismatch, got {other:?}"),
    }
    assert!(matches!(
        w.write_columns(vec![
            vec![Value::Int(1), Value::Int(2)],
            vec![Value::from("ok")]
        ]),
        Err(OrcError::Arity { .. })
    ));
    assert!(matches!(
        w.write_columns(vec![
            vec![Value::Int(1), Value::Int(2)],
            vec![Value::from("ok"), Value::Boolean(true)]
        ]),
        Err(OrcError::TypeMismatch { .. })
    ));
    assert_eq!(w.rows_written(), 0);
    assert_eq!(w.state(), WriterState::Open);
    assert!(w.builder.accumulators().iter().all(|a| a.row_count() == 0));

    // The rejected calls leave no trace in the output.
    w.write(&[Value::Int(9), Value::from("z")]).unwrap();
    let mut clean = writer("struct<a:int,b:string>", config);
    clean.write(&[Value::Int(9), Value::from("z")]).unwrap();
    assert_eq!(finish(w), finish(clean));
}

//==================================================================================
// Ingestion paths
//==================================================================================

#[test]
fn test_row_and_column_paths_are_byte_identical() {
    let rows = mixed_rows(25);
    for config in [
        WriterConfig::default().with_stripe_rows(7),
        WriterConfig::default().with_stripe_bytes(90),
        WriterConfig::default()
            .with_stripe_rows(4)
            .with_compression(CompressionKind::Snappy),
    ] {
        let mut by_row = writer(MIXED_SCHEMA, config.clone());
        for row in &rows {
            by_row.write(row).unwrap();
        }

        let mut by_column = writer(MIXED_SCHEMA, config.clone());
        by_column.write_columns(columns_of(&rows[..10])).unwrap();
        by_column.write_columns(columns_of(&rows[10..])).unwrap();

        assert_eq!(by_row.stripes(), by_column.stripes());
        assert_eq!(finish(by_row), finish(by_column));
    }
}

#[test]
fn test_row_threshold_flushes_exactly() {
    let mut w = writer("struct<a:int>", WriterConfig::default().with_stripe_rows(3));
    for i in 0..6 {
        w.write(&[Value::Int(i)]).unwrap();
        assert_eq!(w.stripes().len(), (i as usize + 1) / 3);
    }
    let footer = w.close().unwrap();
    // The final close has nothing left to flush.
    assert_eq!(footer.stripes.len(), 2);
}

#[test]
fn test_byte_threshold_must_be_exceeded() {
    // Each row is estimated at 1 (root) + 10 + 4 = 15 bytes.
    let row = [Value::from("abcdefghij")];
    let mut w = writer("struct<s:string>", WriterConfig::default().with_stripe_bytes(30));
    w.write(&row).unwrap();
    w.write(&row).unwrap();
    assert!(w.stripes().is_empty());
    w.write(&row).unwrap();
    assert_eq!(w.stripes().len(), 1);
    assert_eq!(w.stripes()[0].number_of_rows, 3);
}

#[test]
fn test_nested_values_and_nulls() {
    let mut w = writer(
        "struct<s:struct<x:int,y:string>,l:array<int>,m:map<string,double>>",
        WriterConfig::default(),
    );
    w.write(&[
        Value::Struct(vec![Value::Int(1), Value::from("a")]),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        Value::Map(vec![(Value::from("k"), Value::Double(1.5))]),
    ])
    .unwrap();
    w.write(&[Value::Null, Value::Null, Value::Map(vec![])]).unwrap();
    w.write(&[Value::Struct(vec![Value::Int(2)]), Value::List(vec![]), Value::Null])
        .unwrap();
    let file = finish(w);
    let tail = read_tail(&file).unwrap();

    // 0 root, 1 s, 2 s.x, 3 s.y, 4 l, 5 l.element, 6 m, 7 m.key, 8 m.value
    assert_eq!(tail.footer.types.len(), 9);
    assert_eq!(tail.footer.types[0].subtypes, vec![1, 4, 6]);
    assert_eq!(tail.footer.types[4].subtypes, vec![5]);
    assert_eq!(tail.footer.types[6].subtypes, vec![7, 8]);

    assert_eq!(present(&tail, &file, 0, 1, 3), vec![true, false, true]);
    assert_eq!(stream(&tail, &file, 0, 2, StreamKind::Present), None);
    assert_eq!(signed(&tail, &file, 0, 2, 2), vec![1, 2]);
    assert_eq!(present(&tail, &file, 0, 3, 2), vec![true, false]);

    assert_eq!(present(&tail, &file, 0, 4, 3), vec![true, false, true]);
    let lengths = stream(&tail, &file, 0, 4, StreamKind::Length).unwrap();
    assert_eq!(int_rle::decode(&lengths, 2, false).unwrap(), vec![3, 0]);
    assert_eq!(signed(&tail, &file, 0, 5, 3), vec![1, 2, 3]);

    assert_eq!(present(&tail, &file, 0, 6, 3), vec![true, true, false]);
    let lengths = stream(&tail, &file, 0, 6, StreamKind::Length).unwrap();
    assert_eq!(int_rle::decode(&lengths, 2, false).unwrap(), vec![1, 0]);
    assert_eq!(
        stream(&tail, &file, 0, 8, StreamKind::Data).unwrap(),
        1.5f64.to_le_bytes().to_vec()
    );
}

#[test]
fn test_timestamps_are_relative_to_2015() {
    let mut w = writer("struct<t:timestamp>", WriterConfig::default());
    let ts = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 1).unwrap()
        + chrono::Duration::milliseconds(500);
    w.write(&[Value::Timestamp(ts)]).unwrap();
    let file = finish(w);
    let tail = read_tail(&file).unwrap();

    assert_eq!(signed(&tail, &file, 0, 1, 1), vec![1]);
    let nanos = stream(&tail, &file, 0, 1, StreamKind::Secondary).unwrap();
    assert_eq!(
        int_rle::decode(&nanos, 1, false).unwrap(),
        vec![encoding::format_nanos(500_000_000) as i64]
    );
}

#[test]
fn test_double_statistics_match_footer_on_disk() {
    let mut w = writer("struct<d:double,f:float>", WriterConfig::default());
    for (d, f) in [
        (1.0, 0.5f32),
        (f64::INFINITY, f32::NEG_INFINITY),
        (-2.5, f32::NAN),
        (f64::NEG_INFINITY, 4.0),
    ] {
        w.write(&[Value::Double(d), Value::Float(f)]).unwrap();
    }
    let footer = w.close().unwrap();
    let file = w.into_inner();
    let tail = read_tail(&file).unwrap();

    assert_eq!(footer.statistics, tail.footer.statistics);
    assert_eq!(
        tail.footer.statistics[1].typed,
        TypedStatistics::Double {
            minimum: Some(-2.5),
            maximum: Some(1.0),
            sum: None,
        }
    );
    assert_eq!(
        tail.footer.statistics[2].typed,
        TypedStatistics::Double {
            minimum: Some(0.5),
            maximum: Some(4.0),
            sum: None,
        }
    );
}

//==================================================================================
// Compression
//==================================================================================

#[test]
fn test_compressed_round_trip_per_codec() {
    for kind in [
        CompressionKind::None,
        CompressionKind::Zlib,
        CompressionKind::Snappy,
        CompressionKind::Zstd,
    ] {
        let mut w = writer(
            "struct<a:int,b:string>",
            WriterConfig::default()
                .with_compression(kind)
                .with_block_size(64),
        );
        let rows: Vec<Vec<Value>> = (0..200)
            .map(|i| vec![Value::Int(i), Value::from(format!("name{}", i % 5))])
            .collect();
        for row in &rows {
            w.write(row).unwrap();
        }
        let file = finish(w);
        let tail = read_tail(&file).unwrap();

        assert_eq!(tail.postscript.compression, kind);
        assert_eq!(tail.postscript.compression_block_size, 64);
        assert_eq!(signed(&tail, &file, 0, 1, 200), (0..200).collect::<Vec<i64>>());

        let stripe_footer = tail.stripe_footer(&file, 0).unwrap();
        assert_eq!(
            stripe_footer.columns[2],
            ColumnEncoding::Dictionary { dictionary_size: 5 }
        );
        assert_eq!(
            stream(&tail, &file, 0, 2, StreamKind::DictionaryData).unwrap(),
            b"name0name1name2name3name4"
        );
        let indices = stream(&tail, &file, 0, 2, StreamKind::Data).unwrap();
        let expected: Vec<i64> = (0..200).map(|i| i % 5).collect();
        assert_eq!(int_rle::decode(&indices, 200, false).unwrap(), expected);
    }
}

#[test]
fn test_incompressible_stream_is_stored_original() {
    let mut w = writer(
        "struct<a:int>",
        WriterConfig::default().with_compression(CompressionKind::Zlib),
    );
    w.write(&[Value::Int(5)]).unwrap();
    let file = finish(w);
    let tail = read_tail(&file).unwrap();

    // A single literal: [-1][zigzag(5)] is two bytes, too small for deflate to
    // shrink.
    let info = tail.footer.stripes[0];
    let start = info.offset as usize;
    let raw = &file[start..start + 5];
    assert_eq!(raw[..3], [(2u8 << 1) | 1, 0, 0]);
    assert_eq!(raw[3..], [0xFFu8, 0x0A]);
}
