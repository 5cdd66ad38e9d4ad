use crate::color_usage;
use ir::ColumnUsage;

#[test]
fn reads_are_green() {
    assert_eq!(color_usage(ColumnUsage::Read), "\x1b[32mR\x1b[0m");
}

#[test]
fn writes_are_red() {
    assert_eq!(color_usage(ColumnUsage::Write), "\x1b[31mW\x1b[0m");
}

#[test]
fn mixed_usage_is_yellow() {
    assert_eq!(color_usage(ColumnUsage::ReadWrite), "\x1b[33mRW\x1b[0m");
}
