//! Zero-allocation VCF line parsing utilities.
//!
//! These functions split and parse record lines without any heap allocation in
//! the hot path; full record decoding builds on them.

use memchr::memchr;

/// Number of fixed columns before FORMAT.
pub const FIXED_COLUMN_COUNT: usize = 8;

/// Largest accepted POS; VCF positions are 32-bit signed.
pub const MAX_POSITION: u64 = i32::MAX as u64;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Signed 32-bit parsing with an optional leading sign. Overflow is `None`.
#[inline]
pub fn parse_i32_fast(bytes: &[u8]) -> Option<i32> {
    let (negative, digits) = match bytes.first()? {
        b'-' => (true, &bytes[1..]),
        b'+' => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let magnitude = parse_u64_fast(digits)?;
    if magnitude > i32::MAX as u64 + 1 {
        return None;
    }
    let value = if negative {
        -(magnitude as i64)
    } else {
        magnitude as i64
    };
    i32::try_from(value).ok()
}

/// Float parsing; accepts everything `f32::from_str` does (`NaN`, `Inf`, exponents).
#[inline]
pub fn parse_f32(bytes: &[u8]) -> Option<f32> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

/// Check if a line should be skipped (empty or a header/comment line).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#'
}

/// Strip a trailing `\n` or `\r\n`.
#[inline]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Iterator over the pieces of `bytes` separated by `sep`, using memchr.
#[derive(Debug, Clone)]
pub struct Split<'a> {
    rest: Option<&'a [u8]>,
    sep: u8,
}

#[inline]
pub fn split(bytes: &[u8], sep: u8) -> Split<'_> {
    Split {
        rest: Some(bytes),
        sep,
    }
}

impl<'a> Iterator for Split<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest?;
        match memchr(self.sep, rest) {
            Some(i) => {
                self.rest = Some(&rest[i + 1..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// The columns of a record line, borrowed from the line.
#[derive(Debug, Clone)]
pub struct RecordColumns<'a> {
    pub chrom: &'a [u8],
    pub pos: &'a [u8],
    pub id: &'a [u8],
    pub reference: &'a [u8],
    pub alt: &'a [u8],
    pub qual: &'a [u8],
    pub filter: &'a [u8],
    pub info: &'a [u8],
    /// FORMAT keys, `None` for sites-only lines.
    pub format: Option<&'a [u8]>,
    /// Everything after FORMAT (the sample columns), tab separated.
    pub samples: &'a [u8],
}

/// Split a record line into its columns. Returns None when fewer than eight
/// columns are present.
#[inline]
pub fn split_columns(line: &[u8]) -> Option<RecordColumns<'_>> {
    let mut fixed: [&[u8]; FIXED_COLUMN_COUNT] = [&[]; FIXED_COLUMN_COUNT];
    let mut rest = line;
    for (i, slot) in fixed.iter_mut().enumerate() {
        match memchr(b'\t', rest) {
            Some(tab) => {
                *slot = &rest[..tab];
                rest = &rest[tab + 1..];
            }
            None if i == FIXED_COLUMN_COUNT - 1 => {
                *slot = rest;
                rest = &[];
            }
            None => return None,
        }
    }

    let (format, samples) = if rest.is_empty() {
        (None, &rest[..0])
    } else {
        match memchr(b'\t', rest) {
            Some(tab) => (Some(&rest[..tab]), &rest[tab + 1..]),
            None => (Some(rest), &rest[rest.len()..]),
        }
    };

    Some(RecordColumns {
        chrom: fixed[0],
        pos: fixed[1],
        id: fixed[2],
        reference: fixed[3],
        alt: fixed[4],
        qual: fixed[5],
        filter: fixed[6],
        info: fixed[7],
        format,
        samples,
    })
}

/// Parse CHROM, POS and the reference span without decoding the rest of the line.
///
/// Returns (chrom_bytes, pos, end) where `end` is the last reference base.
#[inline]
pub fn parse_record_span(line: &[u8]) -> Option<(&[u8], u64, u64)> {
    let tab1 = memchr(b'\t', line)?;
    let chrom = &line[..tab1];

    let rest = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest)?;
    let pos = parse_u64_fast(&rest[..tab2])?;

    // Skip ID
    let rest = &rest[tab2 + 1..];
    let tab3 = memchr(b'\t', rest)?;

    let rest = &rest[tab3 + 1..];
    let ref_len = memchr(b'\t', rest).unwrap_or(rest.len()) as u64;
    if pos == 0 || pos > MAX_POSITION || ref_len == 0 {
        return None;
    }

    Some((chrom, pos, pos.checked_add(ref_len - 1)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64_fast(b"18446744073709551616"), None);
    }

    #[test]
    fn test_parse_i32_fast() {
        assert_eq!(parse_i32_fast(b"-12"), Some(-12));
        assert_eq!(parse_i32_fast(b"+7"), Some(7));
        assert_eq!(parse_i32_fast(b"2147483647"), Some(i32::MAX));
        assert_eq!(parse_i32_fast(b"2147483648"), None);
        assert_eq!(parse_i32_fast(b"-2147483648"), Some(i32::MIN));
        assert_eq!(parse_i32_fast(b"-"), None);
        assert_eq!(parse_i32_fast(b"."), None);
    }

    #[test]
    fn test_split() {
        let parts: Vec<&[u8]> = split(b"a:bb::c", b':').collect();
        let expected: Vec<&[u8]> = vec![b"a", b"bb", b"", b"c"];
        assert_eq!(parts, expected);
        assert_eq!(split(b"", b':').count(), 1);
    }

    #[test]
    fn test_split_columns() {
        let cols = split_columns(b"chr1\t100\trs1\tA\tC,G\t50\tPASS\tDP=3\tGT:DP\t0/1:4\t1/1:5").unwrap();
        assert_eq!(cols.chrom, b"chr1");
        assert_eq!(cols.alt, b"C,G");
        assert_eq!(cols.info, b"DP=3");
        assert_eq!(cols.format, Some(&b"GT:DP"[..]));
        assert_eq!(cols.samples, b"0/1:4\t1/1:5");

        let sites = split_columns(b"chr1\t100\t.\tA\tC\t.\t.\t.").unwrap();
        assert!(sites.format.is_none());
        assert!(sites.samples.is_empty());

        assert!(split_columns(b"chr1\t100\t.\tA").is_none());
    }

    #[test]
    fn test_parse_record_span() {
        assert_eq!(
            parse_record_span(b"chr1\t100\t.\tACG\tA\t.\t.\t."),
            Some((&b"chr1"[..], 100, 102))
        );
        assert_eq!(parse_record_span(b"chr1\t0\t.\tA\tC"), None);
        assert_eq!(
            parse_record_span(b"chr1\t2147483647\t.\tAC\tA"),
            Some((&b"chr1"[..], 2_147_483_647, 2_147_483_648))
        );
        assert_eq!(parse_record_span(b"chr1\t2147483648\t.\tA\tC"), None);
        assert_eq!(parse_record_span(b"chr1\t18446744073709551615\t.\tA\tC"), None);
        assert_eq!(parse_record_span(b"chr1\t100"), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#CHROM"));
        assert!(!should_skip_line(b"chr1\t100"));
        assert_eq!(trim_line_end(b"abc\r\n"), b"abc");
    }
}
