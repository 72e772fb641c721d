//! Variant records and their FORMAT field accessors.

use crate::error::{Result, VcfError};
use crate::field::{FieldValue, FieldView, FormatField, SampleBuffer, ValueType};
use crate::genotype::Genotype;
use crate::header::{FieldKind, VariantHeader};
use crate::interval::Locus;
use crate::packing::{pack_format, PackedFormat};
use crate::streaming::parsing::{parse_f32, parse_i32_fast, parse_u64_fast, split, split_columns, MAX_POSITION};
use std::fmt;
use std::rc::Rc;

/// A decoded INFO value.
#[derive(Debug, Clone, PartialEq)]
pub enum SharedValue {
    Flag,
    Integer(Vec<Option<i32>>),
    Float(Vec<Option<f32>>),
    String(String),
}

impl fmt::Display for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[Option<T>]) -> fmt::Result {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                match v {
                    Some(v) => write!(f, "{}", v)?,
                    None => f.write_str(".")?,
                }
            }
            Ok(())
        }
        match self {
            SharedValue::Flag => Ok(()),
            SharedValue::Integer(values) => list(f, values),
            SharedValue::Float(values) => list(f, values),
            SharedValue::String(s) => f.write_str(s),
        }
    }
}

/// One variant site.
///
/// FORMAT values live in a single [`SampleBuffer`] shared with every
/// [`FieldView`] handed out by [`VariantRecord::format`].
#[derive(Debug, Clone)]
pub struct VariantRecord {
    header: Rc<VariantHeader>,
    contig_id: usize,
    position: u64,
    ids: Vec<String>,
    reference: String,
    alternates: Vec<String>,
    quality: Option<f32>,
    filters: Vec<String>,
    shared: Vec<(String, SharedValue)>,
    format: Vec<FormatField>,
    buffer: SampleBuffer,
    offset: Option<u64>,
}

impl VariantRecord {
    /// A sites-only record on `contig_id` at `position`.
    pub fn new(
        header: Rc<VariantHeader>,
        contig_id: usize,
        position: u64,
        reference: impl Into<String>,
        alternates: Vec<String>,
    ) -> Self {
        Self {
            header,
            contig_id,
            position,
            ids: Vec::new(),
            reference: reference.into(),
            alternates,
            quality: None,
            filters: Vec::new(),
            shared: Vec::new(),
            format: Vec::new(),
            buffer: SampleBuffer::default(),
            offset: None,
        }
    }

    /// Attach packed FORMAT data. Every field must fit `buffer` for the header's
    /// sample count.
    pub fn with_format(mut self, fields: Vec<FormatField>, buffer: SampleBuffer) -> Result<Self> {
        let sample_count = self.header.sample_count();
        for field in &fields {
            field.check_layout(sample_count, buffer.len())?;
        }
        self.format = fields;
        self.buffer = buffer;
        Ok(self)
    }

    /// Decode one record line. `offset` is the line's byte offset in its file.
    pub fn parse(line: &[u8], header: &Rc<VariantHeader>, offset: u64) -> Result<Self> {
        let malformed = |message: &str| VcfError::malformed(offset, message);
        let cols = split_columns(line).ok_or_else(|| malformed("fewer than 8 columns"))?;

        let chrom = utf8(cols.chrom, offset)?;
        let contig_id = header.contigs().id(chrom).ok_or_else(|| {
            VcfError::malformed(offset, format!("contig '{}' is not declared in the header", chrom))
        })?;
        let position = parse_u64_fast(cols.pos)
            .filter(|&p| p > 0)
            .ok_or_else(|| malformed("POS must be a positive integer"))?;
        if position > MAX_POSITION {
            return Err(VcfError::malformed(
                offset,
                format!("POS {} exceeds the largest supported position {}", position, MAX_POSITION),
            ));
        }

        let reference = utf8(cols.reference, offset)?;
        if reference.is_empty() || reference == "." {
            return Err(malformed("REF allele is missing"));
        }
        let alternates = list_column(cols.alt, b',', offset)?;
        let ids = list_column(cols.id, b';', offset)?;
        let filters = list_column(cols.filter, b';', offset)?;
        let quality = match cols.qual {
            b"." => None,
            q => Some(parse_f32(q).ok_or_else(|| malformed("QUAL is not a number"))?),
        };
        let shared = parse_info(cols.info, header, offset)?;

        let PackedFormat { fields, bytes } = match cols.format {
            Some(keys) => pack_format(keys, cols.samples, header, alternates.len() + 1, offset)?,
            None if header.sample_count() > 0 => {
                return Err(malformed("record has no FORMAT column but the header declares samples"))
            }
            None => PackedFormat::default(),
        };

        Ok(Self {
            header: Rc::clone(header),
            contig_id,
            position,
            ids,
            reference: reference.to_string(),
            alternates,
            quality,
            filters,
            shared,
            format: fields,
            buffer: SampleBuffer::new(bytes),
            offset: Some(offset),
        })
    }

    /// Header of the file the record was read from.
    pub fn header(&self) -> &Rc<VariantHeader> {
        &self.header
    }

    #[inline]
    pub fn contig_id(&self) -> usize {
        self.contig_id
    }

    /// Contig name, looked up in the header.
    pub fn contig(&self) -> &str {
        self.header.contigs().name(self.contig_id).unwrap_or_default()
    }

    /// 1-based position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Last reference base covered by the record.
    #[inline]
    pub fn end(&self) -> u64 {
        self.position.saturating_add(self.reference.len().max(1) as u64 - 1)
    }

    #[inline]
    pub fn locus(&self) -> Locus {
        Locus::new(self.contig_id, self.position)
    }

    /// ID column entries; empty for `.`.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// REF allele.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// ALT alleles; empty for `.`.
    pub fn alternates(&self) -> &[String] {
        &self.alternates
    }

    /// REF followed by the ALT alleles.
    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.reference.as_str()).chain(self.alternates.iter().map(String::as_str))
    }

    /// QUAL, `None` when missing.
    pub fn quality(&self) -> Option<f32> {
        self.quality
    }

    /// FILTER values; empty when the column is `.`.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Whether FILTER is `PASS`.
    pub fn is_pass(&self) -> bool {
        self.filters.len() == 1 && self.filters[0] == "PASS"
    }

    /// INFO values in column order.
    pub fn shared_fields(&self) -> &[(String, SharedValue)] {
        &self.shared
    }

    /// INFO value for `id`.
    pub fn shared_field(&self, id: &str) -> Option<&SharedValue> {
        self.shared.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn sample_count(&self) -> usize {
        self.header.sample_count()
    }

    /// Byte offset of the line in its source file, when read from a file.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Packed per-sample FORMAT data shared with every view.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// FORMAT field layouts in column order.
    pub fn format_fields(&self) -> &[FormatField] {
        &self.format
    }

    /// Whether FORMAT key `id` is present on this record.
    pub fn has_format(&self, id: &str) -> bool {
        self.format.iter().any(|f| f.id() == id)
    }

    /// The descriptor of FORMAT field `id`.
    pub fn format_field(&self, id: &str) -> Result<&FormatField> {
        self.format
            .iter()
            .find(|f| f.id() == id)
            .ok_or_else(|| VcfError::UnknownField(id.to_string()))
    }

    /// A typed view over FORMAT field `id`.
    ///
    /// Fails with `UnknownField` when this record has no such field and with
    /// `TypeMismatch` when `T` cannot be decoded from the field's storage.
    pub fn format<T: FieldValue>(&self, id: &str) -> Result<FieldView<T>> {
        let field = self.format_field(id)?.clone();
        FieldView::new(self.buffer.clone(), field, self.sample_count())
    }

    /// Integer view of `id`; 16-bit storage is widened on read.
    pub fn integer_field(&self, id: &str) -> Result<FieldView<i32>> {
        self.format(id)
    }

    /// Float view of `id`.
    pub fn float_field(&self, id: &str) -> Result<FieldView<f32>> {
        self.format(id)
    }

    /// Character field values of every sample.
    pub fn string_field(&self, id: &str) -> Result<Vec<String>> {
        let view = self.format::<u8>(id)?;
        (0..view.len()).map(|s| view.string_at(s)).collect()
    }

    /// Decoded GT of one sample.
    pub fn genotype(&self, sample: usize) -> Result<Genotype> {
        let view = self.format::<u8>("GT")?;
        Ok(Genotype::from_bytes(view.sample(sample)?))
    }

    /// Decoded GT of every sample.
    pub fn genotypes(&self) -> Result<Vec<Genotype>> {
        let view = self.format::<u8>("GT")?;
        (0..view.len())
            .map(|s| -> Result<Genotype> { Ok(Genotype::from_bytes(view.sample(s)?)) })
            .collect()
    }

    fn write_sample_value(&self, f: &mut fmt::Formatter<'_>, field: &FormatField, sample: usize) -> fmt::Result {
        let n = self.sample_count();
        let rendered = match field.value_type() {
            ValueType::UInt8 if field.id() == "GT" => FieldView::<u8>::new(self.buffer.clone(), field.clone(), n)
                .and_then(|v| Ok(Genotype::from_bytes(v.sample(sample)?).to_string())),
            ValueType::Char => FieldView::<u8>::new(self.buffer.clone(), field.clone(), n)
                .and_then(|v| v.string_at(sample)),
            ValueType::Float32 => FieldView::<f32>::new(self.buffer.clone(), field.clone(), n)
                .and_then(|v| Ok(join_values(v.sample(sample)?, format_float))),
            ValueType::UInt8 => FieldView::<u8>::new(self.buffer.clone(), field.clone(), n)
                .and_then(|v| Ok(join_values(v.sample(sample)?, |b| itoa::Buffer::new().format(b).to_string()))),
            ValueType::Int16 | ValueType::Int32 => FieldView::<i32>::new(self.buffer.clone(), field.clone(), n)
                .and_then(|v| Ok(join_values(v.sample(sample)?, |i| itoa::Buffer::new().format(i).to_string()))),
        };
        match rendered {
            Ok(text) if !text.is_empty() => f.write_str(&text),
            _ => f.write_str("."),
        }
    }
}

fn utf8(bytes: &[u8], offset: u64) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| VcfError::malformed(offset, "column is not UTF-8"))
}

/// Split a column into its values; `.` means none.
fn list_column(bytes: &[u8], sep: u8, offset: u64) -> Result<Vec<String>> {
    if bytes == b"." || bytes.is_empty() {
        return Ok(Vec::new());
    }
    split(bytes, sep)
        .map(|v| utf8(v, offset).map(str::to_string))
        .collect()
}

fn parse_info(bytes: &[u8], header: &VariantHeader, offset: u64) -> Result<Vec<(String, SharedValue)>> {
    if bytes == b"." || bytes.is_empty() {
        return Ok(Vec::new());
    }
    let mut shared = Vec::new();
    for entry in split(bytes, b';') {
        let entry = utf8(entry, offset)?;
        let (key, value) = match entry.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (entry, None),
        };
        let kind = header.shared_field(key).map(|d| d.kind);
        let parsed = match (kind, value) {
            (Some(FieldKind::Flag), _) | (None, None) => SharedValue::Flag,
            (Some(FieldKind::Integer), Some(v)) => SharedValue::Integer(
                parse_number_list(v, parse_i32_fast)
                    .ok_or_else(|| VcfError::malformed(offset, format!("INFO {} is not an integer list", key)))?,
            ),
            (Some(FieldKind::Float), Some(v)) => SharedValue::Float(
                parse_number_list(v, parse_f32)
                    .ok_or_else(|| VcfError::malformed(offset, format!("INFO {} is not a float list", key)))?,
            ),
            (Some(_), None) => {
                return Err(VcfError::malformed(offset, format!("INFO {} has no value", key)));
            }
            (_, Some(v)) => SharedValue::String(v.to_string()),
        };
        shared.push((key.to_string(), parsed));
    }
    Ok(shared)
}

fn parse_number_list<T>(text: &str, parse: impl Fn(&[u8]) -> Option<T>) -> Option<Vec<Option<T>>> {
    split(text.as_bytes(), b',')
        .map(|v| match v {
            b"." => Some(None),
            _ => parse(v).map(Some),
        })
        .collect()
}

/// Join the present values of one sample; all-missing renders as empty.
fn join_values<T: FieldValue>(values: impl Iterator<Item = T>, render: impl Fn(T) -> String) -> String {
    let values: Vec<T> = values.collect();
    if values.iter().all(|v| v.is_missing()) {
        return String::new();
    }
    values
        .into_iter()
        .map(|v| if v.is_missing() { ".".to_string() } else { render(v) })
        .collect::<Vec<_>>()
        .join(",")
}

fn format_float(value: f32) -> String {
    let mut buf = ryu::Buffer::new();
    let text = buf.format(value);
    text.strip_suffix(".0").unwrap_or(text).to_string()
}

/// Renders the record as a VCF line without the trailing newline.
impl fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut itoa_buf = itoa::Buffer::new();
        write!(f, "{}\t{}\t", self.contig(), itoa_buf.format(self.position))?;
        write_list(f, &self.ids, ";")?;
        write!(f, "\t{}\t", self.reference)?;
        write_list(f, &self.alternates, ",")?;
        f.write_str("\t")?;
        match self.quality {
            Some(q) => f.write_str(&format_float(q))?,
            None => f.write_str(".")?,
        }
        f.write_str("\t")?;
        write_list(f, &self.filters, ";")?;
        f.write_str("\t")?;
        if self.shared.is_empty() {
            f.write_str(".")?;
        }
        for (i, (key, value)) in self.shared.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            match value {
                SharedValue::Flag => f.write_str(key)?,
                value => write!(f, "{}={}", key, value)?,
            }
        }
        if self.format.is_empty() {
            return Ok(());
        }
        f.write_str("\t")?;
        for (i, field) in self.format.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            f.write_str(field.id())?;
        }
        for sample in 0..self.sample_count() {
            f.write_str("\t")?;
            for (i, field) in self.format.iter().enumerate() {
                if i > 0 {
                    f.write_str(":")?;
                }
                self.write_sample_value(f, field, sample)?;
            }
        }
        Ok(())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[String], sep: &str) -> fmt::Result {
    if values.is_empty() {
        f.write_str(".")
    } else {
        f.write_str(&values.join(sep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HeaderBuilder, Number};

    fn header() -> Rc<VariantHeader> {
        Rc::new(
            HeaderBuilder::new()
                .add_contig("chr1", Some(10_000), None, None)
                .add_contig("chr2", None, None, None)
                .add_shared_field("DP", Number::Count(1), FieldKind::Integer, None, None, None, None)
                .add_shared_field("AF", Number::PerAltAllele, FieldKind::Float, None, None, None, None)
                .add_shared_field("DB", Number::Count(0), FieldKind::Flag, None, None, None, None)
                .add_individual_field("GT", Number::Count(1), FieldKind::String, None, None)
                .add_individual_field("DP", Number::Count(1), FieldKind::Integer, None, None)
                .add_individual_field("GQ", Number::Count(1), FieldKind::Integer, None, None)
                .add_sample("S1")
                .add_sample("S2")
                .build()
                .unwrap(),
        )
    }

    const LINE: &[u8] = b"chr2\t150\trs7\tAT\tA,ATT\t37.5\tPASS\tDP=20;AF=0.25,0.5;DB\tGT:DP:GQ\t0/1:12:99\t1|2:8:.";

    #[test]
    fn test_parse_record() {
        let header = header();
        let rec = VariantRecord::parse(LINE, &header, 512).unwrap();
        assert_eq!(rec.contig(), "chr2");
        assert_eq!(rec.contig_id(), 1);
        assert_eq!(rec.position(), 150);
        assert_eq!(rec.end(), 151);
        assert_eq!(rec.locus(), Locus::new(1, 150));
        assert_eq!(rec.ids(), &["rs7".to_string()]);
        assert_eq!(rec.alleles().collect::<Vec<_>>(), vec!["AT", "A", "ATT"]);
        assert_eq!(rec.quality(), Some(37.5));
        assert!(rec.is_pass());
        assert_eq!(rec.offset(), Some(512));
        assert_eq!(rec.shared_field("DP"), Some(&SharedValue::Integer(vec![Some(20)])));
        assert_eq!(
            rec.shared_field("AF"),
            Some(&SharedValue::Float(vec![Some(0.25), Some(0.5)]))
        );
        assert_eq!(rec.shared_field("DB"), Some(&SharedValue::Flag));
    }

    #[test]
    fn test_format_access() {
        let rec = VariantRecord::parse(LINE, &header(), 0).unwrap();
        let dp = rec.integer_field("DP").unwrap();
        assert_eq!(dp.to_vec(), vec![12, 8]);
        let gq = rec.integer_field("GQ").unwrap();
        assert!(gq.is_missing_at(1).unwrap());
        assert_eq!(rec.genotype(1).unwrap().to_string(), "1|2");
        assert!(rec.genotypes().unwrap()[0].is_het());

        assert!(matches!(rec.format::<i32>("AD"), Err(VcfError::UnknownField(_))));
        assert!(matches!(
            rec.float_field("DP"),
            Err(VcfError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_views_share_and_outlive_record() {
        let rec = VariantRecord::parse(LINE, &header(), 0).unwrap();
        let dp = rec.integer_field("DP").unwrap();
        let again = rec.integer_field("DP").unwrap();
        assert_eq!(rec.buffer().owners(), 3);

        dp.set_at(0, 30).unwrap();
        assert_eq!(again.value_at(0).unwrap(), 30);
        assert!(rec.to_string().contains("0/1:30:99"));

        drop(rec);
        assert_eq!(dp.buffer().owners(), 2);
        assert_eq!(again.value_at(1).unwrap(), 8);
    }

    #[test]
    fn test_display_round_trip() {
        let header = header();
        let rec = VariantRecord::parse(LINE, &header, 0).unwrap();
        assert_eq!(rec.to_string().as_bytes(), LINE);

        let sites = b"chr1\t5\t.\tA\t.\t.\t.\t.\tGT\t./.\t0";
        let rec = VariantRecord::parse(sites, &header, 0).unwrap();
        assert_eq!(rec.to_string().as_bytes(), &sites[..]);
    }

    #[test]
    fn test_malformed_records() {
        let header = header();
        for line in [
            &b"chrX\t5\t.\tA\tC\t.\t.\t.\tGT\t0\t0"[..],
            b"chr1\t0\t.\tA\tC\t.\t.\t.\tGT\t0\t0",
            b"chr1\t5\t.\tA\tC\tbad\t.\t.\tGT\t0\t0",
            b"chr1\t5\t.\tA\tC\t.\t.\tDP=x\tGT\t0\t0",
            b"chr1\t5\t.\tA\tC\t.\t.\t.\tGT\t0",
            b"chr1\t5\t.\tA\tC\t.\t.\t.",
            b"chr1\t5",
        ] {
            let err = VariantRecord::parse(line, &header, 9).unwrap_err();
            assert!(matches!(err, VcfError::MalformedRecord(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_position_out_of_range() {
        let header = header();
        for line in [
            &b"chr1\t18446744073709551615\t.\tA\tC\t.\t.\t.\tGT\t0\t0"[..],
            b"chr1\t2147483648\t.\tA\tC\t.\t.\t.\tGT\t0\t0",
        ] {
            let err = VariantRecord::parse(line, &header, 9).unwrap_err();
            assert!(err.to_string().contains("exceeds"), "{}", err);
        }

        let rec = VariantRecord::parse(b"chr1\t2147483647\t.\tACGT\tA\t.\t.\t.\tGT\t0\t0", &header, 9).unwrap();
        assert_eq!(rec.end(), 2_147_483_650);
        let far = VariantRecord::new(Rc::clone(&header), 0, u64::MAX, "AC", Vec::new());
        assert_eq!(far.end(), u64::MAX);
    }

    #[test]
    fn test_with_format_checks_layout() {
        let header = header();
        let field = FormatField::new("DP", ValueType::Int32, 4, 0);
        let rec = VariantRecord::new(Rc::clone(&header), 0, 100, "A", vec!["C".to_string()]);
        assert!(rec
            .clone()
            .with_format(vec![field.clone()], SampleBuffer::new(vec![0; 4]))
            .is_err());
        let rec = rec
            .with_format(vec![field], SampleBuffer::new(vec![1, 0, 0, 0, 2, 0, 0, 0]))
            .unwrap();
        assert_eq!(rec.integer_field("DP").unwrap().to_vec(), vec![1, 2]);
    }
}
