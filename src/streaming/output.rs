//! Efficient output formatting for synchronized rows.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot path.

use crate::error::Result;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use crate::synced::SyncedRow;
use std::io::{BufWriter, Write};

/// Tab-separated writer for [`SyncedRow`]s.
///
/// A row line is `contig  pos  count  list  flag...`, where `list` holds the
/// 1-based numbers of the sources present at the coordinate and there is one
/// 0/1 presence flag per source.
pub struct RowWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> RowWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Writer with an explicit buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write the column header for `sources` inputs.
    pub fn write_header(&mut self, sources: &[String]) -> Result<()> {
        self.writer.write_all(b"#contig\tpos\tcount\tlist")?;
        for name in sources {
            self.writer.write_all(b"\t")?;
            self.writer.write_all(name.as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write one row line.
    #[inline]
    pub fn write_row(&mut self, row: &SyncedRow) -> Result<()> {
        self.writer.write_all(row.contig().as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(row.position()).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(row.present_count()).as_bytes())?;
        self.writer.write_all(b"\t")?;
        for (n, (i, _)) in row.present().enumerate() {
            if n > 0 {
                self.writer.write_all(b",")?;
            }
            self.writer.write_all(self.itoa_buf.format(i + 1).as_bytes())?;
        }
        for i in 0..row.len() {
            self.writer
                .write_all(if row.is_missing(i) { b"\t0" } else { b"\t1" })?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write the present records of `row`, one `source<TAB>record` line each.
    pub fn write_records(&mut self, row: &SyncedRow) -> Result<()> {
        for (i, record) in row.present() {
            self.writer.write_all(self.itoa_buf.format(i + 1).as_bytes())?;
            self.writer.write_all(b"\t")?;
            write!(self.writer, "{}", record)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderOptions;
    use crate::synced::SyncedReader;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn write_sites(dir: &TempDir, name: &str, positions: &[u64]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "##fileformat=VCFv4.2\n##contig=<ID=chr1>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n"
        )
        .unwrap();
        for pos in positions {
            writeln!(file, "chr1\t{}\t.\tA\tG\t.\t.\t.", pos).unwrap();
        }
        path
    }

    #[test]
    fn test_write_rows() {
        let dir = TempDir::new().unwrap();
        let a = write_sites(&dir, "a.vcf", &[100, 200]);
        let b = write_sites(&dir, "b.vcf", &[200]);
        let reader = SyncedReader::with_options(&[a, b], "", ReaderOptions::default()).unwrap();

        let mut output = Vec::new();
        {
            let mut writer = RowWriter::new(&mut output);
            writer
                .write_header(&["a".to_string(), "b".to_string()])
                .unwrap();
            for row in reader {
                let row = row.unwrap();
                writer.write_row(&row).unwrap();
                if row.position() == 200 {
                    writer.write_records(&row).unwrap();
                }
            }
            writer.flush().unwrap();
        }
        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "#contig\tpos\tcount\tlist\ta\tb\n\
             chr1\t100\t1\t1\t1\t0\n\
             chr1\t200\t2\t1,2\t1\t1\n\
             1\tchr1\t200\t.\tA\tG\t.\t.\t.\n\
             2\tchr1\t200\t.\tA\tG\t.\t.\t.\n"
        );
    }
}
