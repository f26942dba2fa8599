/// UI (Unique Identifier) value representation.
pub type UI = String;

/// DA (Date) value representation, formatted as `YYYYMMDD`.
pub type DA = String;

/// TM (Time) value representation, formatted as `HHMMSS.FFFFFF`.
pub type TM = String;

/// SH (Short String) value representation.
pub type SH = String;

/// LO (Long String) value representation.
pub type LO = String;

/// CS (Code String) value representation.
pub type CS = String;

/// IS (Integer String) value representation, kept in its parsed form.
pub type IS = i32;

/// Strips the padding DICOM appends to even-length string values.
pub fn trim_padding(value: &str) -> &str {
	value.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}
