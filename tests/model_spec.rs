use std::io::Cursor;

use xydata_reader::xydata::decode;
use xydata_reader::xydata::util;
use xydata_reader::{Block, Column, Error, MetaData, StepColumn, VecColumn};

fn assert_runtime(err: Error) {
    assert!(matches!(err, Error::Runtime(_)), "expected runtime error, got: {}", err);
}

fn assert_format(err: Error) {
    assert!(matches!(err, Error::Format(_)), "expected format error, got: {}", err);
}

#[test]
fn step_column_generates_arithmetic_sequence() {
    let col = Column::Stepwise(StepColumn::new(15.0, 0.02, Some(4751)));
    assert_eq!(col.point_count(), Some(4751));
    assert_eq!(col.step(), 0.02);
    assert_eq!(col.value(0).expect("first point"), 15.0);
    let last = col.value(4750).expect("last point");
    assert!((last - (15.0 + 0.02 * 4750.0)).abs() < 1e-9);
    assert_runtime(col.value(4751).unwrap_err());
    assert_eq!(col.min(), 15.0);
    assert!((col.max(None).expect("bounded max") - last).abs() < 1e-12);
}

#[test]
fn unbounded_step_column_needs_explicit_count_for_max() {
    let col = Column::Stepwise(StepColumn::new(0.0, 2.0, None));
    assert_eq!(col.point_count(), None);
    // any index is valid for an unbounded generator
    assert_eq!(col.value(1_000_000).expect("value"), 2_000_000.0);
    assert_runtime(col.max(None).unwrap_err());
    assert_eq!(col.max(Some(5)).expect("max with count"), 8.0);
}

#[test]
fn vec_column_is_append_only() {
    let mut col = VecColumn::new();
    for v in [3.0, 1.0, 2.0] {
        col.push(v);
    }
    let before: Vec<f64> = (0..3).map(|i| col.value(i).expect("value")).collect();
    assert_eq!(col.min(), 1.0);
    assert_eq!(col.max(), 3.0);

    // appending never changes values at lower indices
    col.push(-7.0);
    col.push(9.0);
    for (i, v) in before.iter().enumerate() {
        assert_eq!(col.value(i).expect("value"), *v);
    }
    // the cached scan is refreshed once the length changed
    assert_eq!(col.min(), -7.0);
    assert_eq!(col.max(), 9.0);
    assert_runtime(col.value(5).unwrap_err());
}

#[test]
fn empty_vec_column_min_max_are_zero() {
    let col = VecColumn::new();
    assert_eq!(col.min(), 0.0);
    assert_eq!(col.max(), 0.0);
}

#[test]
fn push_values_from_str_parses_and_rejects() {
    let mut col = VecColumn::new();
    col.push_values_from_str(" 1.5  2.5\t3.5 ", ' ').expect("plain numbers");
    assert_eq!(col.point_count(), 3);
    assert_eq!(col.value(2).expect("value"), 3.5);

    let mut col = VecColumn::new();
    assert_format(col.push_values_from_str("1.0 oops", ' ').unwrap_err());
    let mut col = VecColumn::new();
    assert_format(col.push_values_from_str("1e99999", ' ').unwrap_err());
}

#[test]
fn index_column_is_shared_and_unbounded() {
    let blk = Block::new();
    assert_eq!(blk.column_count(), 0);
    let index = blk.column(0).expect("index column");
    assert_eq!(index.point_count(), None);
    assert_eq!(index.value(0).expect("value"), 0.0);
    assert_eq!(index.value(41).expect("value"), 41.0);
    assert_eq!(index.step(), 1.0);
    // one shared instance, owned by no block
    assert!(std::ptr::eq(index, Block::index_column()));
}

#[test]
fn block_point_count_is_minimum_over_finite_columns() {
    let mut blk = Block::new();
    assert_eq!(blk.point_count(), None);

    blk.add_column(Column::Stepwise(StepColumn::new(0.0, 1.0, None)));
    assert_eq!(blk.point_count(), None);

    let mut y = VecColumn::new();
    for v in [5.0, 6.0, 7.0] {
        y.push(v);
    }
    blk.add_column(Column::Materialized(y));
    assert_eq!(blk.point_count(), Some(3));
    assert_eq!(blk.column_count(), 2);
    assert_runtime(blk.column(3).unwrap_err());
}

#[test]
fn prepend_column_becomes_column_one() {
    let mut blk = Block::new();
    let mut y = VecColumn::new();
    y.push(10.0);
    blk.add_column(Column::Materialized(y));
    let mut x = VecColumn::new();
    x.set_name("x");
    x.push(1.0);
    blk.prepend_column(Column::Materialized(x));
    assert_eq!(blk.column(1).expect("column 1").name(), "x");
    assert_eq!(blk.column(2).expect("column 2").value(0).expect("value"), 10.0);
}

#[test]
fn metadata_last_write_wins_and_enumerates_in_stable_order() {
    let mut meta = MetaData::new();
    assert!(meta.set("wavelength", "1.54"));
    assert!(meta.set("date", "2003-07-01"));
    assert!(!meta.set("wavelength", "0.7"));
    assert_eq!(meta.get("wavelength").expect("key"), "0.7");
    assert!(meta.has_key("date"));
    assert_eq!(meta.size(), 2);

    let keys: Vec<&str> = (0..meta.size()).map(|i| meta.key_at(i).expect("key")).collect();
    assert_eq!(keys, ["date", "wavelength"]);
    assert_runtime(meta.key_at(2).unwrap_err());
    assert_runtime(meta.get("absent").unwrap_err());

    meta.clear();
    assert_eq!(meta.size(), 0);
}

#[test]
fn fixed_width_reads_are_endian_aware() {
    let mut f = Cursor::new(vec![0x01u8, 0x02, 0x03, 0x04]);
    assert_eq!(decode::read_u32_le(&mut f).expect("le"), 0x0403_0201);
    let mut f = Cursor::new(vec![0x01u8, 0x02, 0x03, 0x04]);
    assert_eq!(decode::read_u32_be(&mut f).expect("be"), 0x0102_0304);
    let mut f = Cursor::new(vec![0xFFu8, 0xFF]);
    assert_eq!(decode::read_i16_le(&mut f).expect("i16"), -1);

    // short read is a format error, not a silent truncation
    let mut f = Cursor::new(vec![0x01u8, 0x02]);
    assert_format(decode::read_u32_le(&mut f).unwrap_err());
}

#[test]
fn padded_string_read_decodes_every_byte() {
    // 0xB0 is the degree sign in WINDOWS-1252
    let mut f = Cursor::new(b"2\xB0 scan  rest".to_vec());
    let s = decode::read_string(&mut f, 8).expect("string");
    assert_eq!(s, "2\u{b0} scan ");
    let mut f = Cursor::new(b"ab".to_vec());
    assert_format(decode::read_string(&mut f, 3).unwrap_err());
}

#[test]
fn pdp11_float_decodes_vendor_layout() {
    // exponent field zero: 0.0, or NaN when the sign bit is set
    assert_eq!(decode::from_pdp11(&[0, 0, 0, 0]), 0.0);
    assert!(decode::from_pdp11(&[0x00, 0x80, 0, 0]).is_nan());

    assert_eq!(decode::from_pdp11(&[0x80, 0x40, 0, 0]), 1.0);
    assert_eq!(decode::from_pdp11(&[0x80, 0xC0, 0, 0]), -1.0);
    assert_eq!(decode::from_pdp11(&[0xC8, 0x43, 0, 0]), 100.0);
}

#[test]
fn number_parsing_distinguishes_garbage_from_overflow() {
    assert_eq!(decode::parse_double(" 1.25e2 K").expect("double"), 125.0);
    assert_format(decode::parse_double("alpha").unwrap_err());
    assert_format(decode::parse_double("1e400").unwrap_err());

    assert_eq!(decode::parse_long(" -42 ").expect("long"), -42);
    assert_format(decode::parse_long("x12").unwrap_err());
    assert_format(decode::parse_long("99999999999999999999").unwrap_err());
}

#[test]
fn read_numbers_returns_unconsumed_remainder() {
    let mut row = Vec::new();
    let rest = decode::read_numbers("10, 20; 30 counts", &mut row).expect("numbers");
    assert_eq!(row, [10.0, 20.0, 30.0]);
    assert_eq!(rest, "counts");

    let rest = decode::read_numbers("7.5 8.5", &mut row).expect("numbers");
    assert_eq!(row, [7.5, 8.5]);
    assert!(rest.is_empty());

    let rest = decode::read_numbers("no data here", &mut row).expect("numbers");
    assert!(row.is_empty());
    assert_eq!(rest, "no data here");

    assert_format(decode::read_numbers("1 2e9999", &mut row).unwrap_err());
}

#[test]
fn count_numbers_counts_leading_tokens() {
    assert_eq!(decode::count_numbers("1 2.5 -3e2 tail"), 3);
    assert_eq!(decode::count_numbers("tail 1 2"), 0);
    assert_eq!(decode::count_numbers(""), 0);
}

#[test]
fn start_step_end_line_builds_a_step_column() {
    let mut f = Cursor::new(b"  15.000   0.020 110.000\n".to_vec());
    let col = util::read_start_step_end_line(&mut f)
        .expect("read")
        .expect("triple recognized");
    assert_eq!(col.start, 15.0);
    assert_eq!(col.step, 0.02);
    assert_eq!(col.count, Some(4751));
}

#[test]
fn start_step_end_line_rejects_degenerate_triples() {
    let rejected = [
        "1.0 0.0 10.0",   // zero step
        "1.0 1.0 3.0",    // fewer than 4 points
        "1.0 0.3 2.0",    // step does not cover the range evenly
        "1.0 2.0",        // missing stop
        "start step end", // no numbers at all
    ];
    for line in rejected {
        let mut f = Cursor::new(format!("{}\n", line).into_bytes());
        assert!(
            util::read_start_step_end_line(&mut f).expect("read").is_none(),
            "line {:?} should be rejected",
            line
        );
    }
}

#[test]
fn ssel_and_data_reads_only_as_much_as_needed() {
    let text = "scan of sample A\n0.0 1.0 5.0\n10 20 30\n40 50 60\ntrailing free text\n";
    let mut f = Cursor::new(text.as_bytes().to_vec());
    let blk = util::read_ssel_and_data(&mut f, 1)
        .expect("read")
        .expect("block recognized");
    assert_eq!(blk.point_count(), Some(6));
    assert_eq!(blk.column(1).expect("x").value(5).expect("value"), 5.0);
    assert_eq!(blk.column(2).expect("y").value(5).expect("value"), 60.0);
}

#[test]
fn ssel_and_data_rejects_mismatched_lengths() {
    let text = "0.0 1.0 5.0\n10 20 30\n";
    let mut f = Cursor::new(text.as_bytes().to_vec());
    assert!(util::read_ssel_and_data(&mut f, 0).expect("read").is_none());
}

#[test]
fn valid_line_skips_blanks_and_comments() {
    let text = "# header comment\n\n  \n  KEY: value # trailing\nnext\n";
    let mut f = Cursor::new(text.as_bytes().to_vec());
    let line = util::get_valid_line(&mut f, '#').expect("read").expect("line");
    assert_eq!(line, "KEY: value");
    let (key, val) = util::split_key_value(&line, ':');
    assert_eq!(key, "KEY");
    assert_eq!(val, "value");
    assert_eq!(util::get_valid_line(&mut f, '#').expect("read").as_deref(), Some("next"));
    assert!(util::get_valid_line(&mut f, '#').expect("read").is_none());
}

#[test]
fn has_word_matches_whole_words_only() {
    assert!(util::has_word("strict first-line-header", "strict"));
    assert!(!util::has_word("first-line-header", "header"));
    assert!(!util::has_word("", "strict"));
}
