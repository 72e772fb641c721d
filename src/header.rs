//! VCF header model, parser and builder.

use crate::contig::ContigDictionary;
use crate::error::{Result, VcfError};
use rustc_hash::FxHashMap;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

const FIXED_COLUMNS: [&str; 8] = ["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// Default file format written by [`HeaderBuilder`].
pub const DEFAULT_FILE_FORMAT: &str = "VCFv4.2";

/// Declared cardinality of an INFO or FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    Count(usize),
    /// One value per alternate allele (`A`).
    PerAltAllele,
    /// One value per allele including the reference (`R`).
    PerAllele,
    /// One value per possible genotype (`G`).
    PerGenotype,
    /// Unknown or varying (`.`).
    Unbounded,
}

impl FromStr for Number {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "A" => Ok(Number::PerAltAllele),
            "R" => Ok(Number::PerAllele),
            "G" => Ok(Number::PerGenotype),
            "." => Ok(Number::Unbounded),
            _ => s
                .parse::<usize>()
                .map(Number::Count)
                .map_err(|_| format!("invalid Number '{}'", s)),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Count(n) => write!(f, "{}", n),
            Number::PerAltAllele => f.write_str("A"),
            Number::PerAllele => f.write_str("R"),
            Number::PerGenotype => f.write_str("G"),
            Number::Unbounded => f.write_str("."),
        }
    }
}

/// Declared `Type=` of an INFO or FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Integer" => Ok(FieldKind::Integer),
            "Float" => Ok(FieldKind::Float),
            "Flag" => Ok(FieldKind::Flag),
            "Character" => Ok(FieldKind::Character),
            "String" => Ok(FieldKind::String),
            _ => Err(format!("invalid Type '{}'", s)),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Integer => "Integer",
            FieldKind::Float => "Float",
            FieldKind::Flag => "Flag",
            FieldKind::Character => "Character",
            FieldKind::String => "String",
        })
    }
}

/// An `##INFO` or `##FORMAT` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub id: String,
    pub number: Number,
    pub kind: FieldKind,
    pub description: String,
}

/// Parsed VCF header.
#[derive(Debug, Clone, Default)]
pub struct VariantHeader {
    file_format: String,
    meta: Vec<String>,
    contigs: ContigDictionary,
    filters: Vec<String>,
    shared: Vec<FieldDefinition>,
    shared_ids: FxHashMap<String, usize>,
    individual: Vec<FieldDefinition>,
    individual_ids: FxHashMap<String, usize>,
    samples: Vec<String>,
    sample_ids: FxHashMap<String, usize>,
}

impl VariantHeader {
    /// Parse header text (meta lines plus the `#CHROM` line).
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = HeaderParser::default();
        for line in text.lines() {
            if parser.push_line(line)? {
                return parser.finish();
            }
        }
        Err(VcfError::Header {
            line: parser.line,
            message: "missing #CHROM line".to_string(),
        })
    }

    /// Read a header from the start of `reader`, leaving it positioned at the
    /// first record. Returns the header and the number of bytes consumed.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<(Self, u64)> {
        let mut parser = HeaderParser::default();
        let mut consumed = 0u64;
        let mut buf = String::with_capacity(256);
        loop {
            buf.clear();
            let n = reader.read_line(&mut buf)?;
            if n == 0 {
                return Err(VcfError::Header {
                    line: parser.line,
                    message: "unexpected end of file before #CHROM line".to_string(),
                });
            }
            consumed += n as u64;
            if parser.push_line(buf.trim_end_matches(['\n', '\r']))? {
                return Ok((parser.finish()?, consumed));
            }
        }
    }

    /// Value of the `##fileformat` line.
    pub fn file_format(&self) -> &str {
        &self.file_format
    }

    /// Declared contigs in header order.
    pub fn contigs(&self) -> &ContigDictionary {
        &self.contigs
    }

    /// Declared FILTER ids.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// INFO declarations.
    pub fn shared_fields(&self) -> &[FieldDefinition] {
        &self.shared
    }

    /// INFO definition for `id`.
    pub fn shared_field(&self, id: &str) -> Option<&FieldDefinition> {
        self.shared_ids.get(id).map(|&i| &self.shared[i])
    }

    /// FORMAT declarations.
    pub fn individual_fields(&self) -> &[FieldDefinition] {
        &self.individual
    }

    /// FORMAT definition for `id`.
    pub fn individual_field(&self, id: &str) -> Option<&FieldDefinition> {
        self.individual_ids.get(id).map(|&i| &self.individual[i])
    }

    /// Sample names in column order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Column index of sample `name`.
    pub fn sample_index(&self, name: &str) -> Option<usize> {
        self.sample_ids.get(name).copied()
    }

    /// Meta lines other than `##fileformat`, in file order, without the `##`.
    pub fn meta_lines(&self) -> &[String] {
        &self.meta
    }
}

impl fmt::Display for VariantHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "##fileformat={}", self.file_format)?;
        for line in &self.meta {
            writeln!(f, "##{}", line)?;
        }
        f.write_str(&FIXED_COLUMNS.join("\t"))?;
        if !self.samples.is_empty() {
            write!(f, "\tFORMAT\t{}", self.samples.join("\t"))?;
        }
        writeln!(f)
    }
}

#[derive(Default)]
struct HeaderParser {
    header: VariantHeader,
    line: usize,
}

impl HeaderParser {
    /// Consume one line; returns true once the `#CHROM` line has been seen.
    fn push_line(&mut self, line: &str) -> Result<bool> {
        self.line += 1;
        if self.line == 1 {
            return match line.strip_prefix("##fileformat=") {
                Some(version) if version.starts_with("VCF") => {
                    self.header.file_format = version.to_string();
                    Ok(false)
                }
                _ => Err(self.error("not a VCF file (missing ##fileformat=VCF line)")),
            };
        }
        if let Some(meta) = line.strip_prefix("##") {
            self.push_meta(meta)?;
            return Ok(false);
        }
        if line.starts_with("#CHROM") {
            self.push_column_line(line)?;
            return Ok(true);
        }
        if line.trim().is_empty() {
            return Ok(false);
        }
        Err(self.error(format!("expected a header line, found '{}'", truncate(line))))
    }

    fn push_meta(&mut self, meta: &str) -> Result<()> {
        let (key, value) = meta.split_once('=').unwrap_or((meta, ""));
        let fields = parse_structured(value);
        match key {
            "contig" => {
                let id = self.required(&fields, "ID", key)?;
                let length = match lookup(&fields, "length") {
                    Some(len) => Some(
                        len.parse::<u64>()
                            .map_err(|_| self.error(format!("invalid contig length '{}'", len)))?,
                    ),
                    None => None,
                };
                self.header.contigs.insert(id, length);
            }
            "FILTER" => {
                let id = self.required(&fields, "ID", key)?;
                if !self.header.filters.iter().any(|f| f == id) {
                    self.header.filters.push(id.to_string());
                }
            }
            "INFO" | "FORMAT" => {
                let definition = self.definition(&fields, key)?;
                let (defs, ids) = if key == "INFO" {
                    (&mut self.header.shared, &mut self.header.shared_ids)
                } else {
                    if definition.kind == FieldKind::Flag {
                        return Err(self.error(format!(
                            "FORMAT field {} cannot have Type=Flag",
                            definition.id
                        )));
                    }
                    (&mut self.header.individual, &mut self.header.individual_ids)
                };
                match ids.get(&definition.id) {
                    Some(&i) => defs[i] = definition,
                    None => {
                        ids.insert(definition.id.clone(), defs.len());
                        defs.push(definition);
                    }
                }
            }
            _ => {}
        }
        self.header.meta.push(meta.to_string());
        Ok(())
    }

    fn push_column_line(&mut self, line: &str) -> Result<()> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < FIXED_COLUMNS.len() || columns[..FIXED_COLUMNS.len()] != FIXED_COLUMNS {
            return Err(self.error("column line must start with #CHROM POS ID REF ALT QUAL FILTER INFO"));
        }
        if columns.len() > FIXED_COLUMNS.len() {
            if columns[FIXED_COLUMNS.len()] != "FORMAT" {
                return Err(self.error("ninth column must be FORMAT"));
            }
            for name in &columns[FIXED_COLUMNS.len() + 1..] {
                if self.header.sample_ids.contains_key(*name) {
                    return Err(self.error(format!("duplicate sample name '{}'", name)));
                }
                let id = self.header.samples.len();
                self.header.sample_ids.insert(name.to_string(), id);
                self.header.samples.push(name.to_string());
            }
        }
        Ok(())
    }

    fn definition(&self, fields: &[(String, String)], key: &str) -> Result<FieldDefinition> {
        let id = self.required(fields, "ID", key)?;
        let number = self
            .required(fields, "Number", key)?
            .parse::<Number>()
            .map_err(|e| self.error(format!("{} {}: {}", key, id, e)))?;
        let kind = self
            .required(fields, "Type", key)?
            .parse::<FieldKind>()
            .map_err(|e| self.error(format!("{} {}: {}", key, id, e)))?;
        Ok(FieldDefinition {
            id: id.to_string(),
            number,
            kind,
            description: lookup(fields, "Description").unwrap_or_default().to_string(),
        })
    }

    fn required<'a>(&self, fields: &'a [(String, String)], name: &str, key: &str) -> Result<&'a str> {
        lookup(fields, name).ok_or_else(|| self.error(format!("##{} line without {}", key, name)))
    }

    fn error(&self, message: impl Into<String>) -> VcfError {
        VcfError::Header {
            line: self.line,
            message: message.into(),
        }
    }

    fn finish(self) -> Result<VariantHeader> {
        Ok(self.header)
    }
}

fn lookup<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn truncate(line: &str) -> &str {
    match line.char_indices().nth(40) {
        Some((i, _)) => &line[..i],
        None => line,
    }
}

/// Split a `<K=V,K="V, with commas",...>` value into its pairs. Values that are
/// not wrapped in angle brackets yield no pairs.
fn parse_structured(value: &str) -> Vec<(String, String)> {
    let Some(inner) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    let mut key = String::new();
    let mut current = String::new();
    let mut in_key = true;
    let mut in_quotes = false;
    let mut escaped = false;

    for c in inner.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '=' if in_key && !in_quotes => {
                key = std::mem::take(&mut current);
                in_key = false;
            }
            ',' if !in_quotes => {
                pairs.push((std::mem::take(&mut key), std::mem::take(&mut current)));
                in_key = true;
            }
            _ => current.push(c),
        }
    }
    if !in_key || !current.is_empty() {
        pairs.push((key, current));
    }
    pairs
}

/// Builds header text line by line.
///
/// Optional parameters that are `None` are left out of the rendered line.
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    file_format: String,
    meta: Vec<String>,
    samples: Vec<String>,
}

impl Default for HeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self {
            file_format: DEFAULT_FILE_FORMAT.to_string(),
            meta: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Start from a copy of an existing header.
    pub fn from_header(header: &VariantHeader) -> Self {
        Self {
            file_format: header.file_format.clone(),
            meta: header.meta.clone(),
            samples: header.samples.clone(),
        }
    }

    /// Set the `##fileformat` version.
    pub fn file_format(mut self, version: &str) -> Self {
        self.file_format = version.to_string();
        self
    }

    /// Declare a contig. Empty optional parameters are left out of the rendered line.
    pub fn add_contig(
        mut self,
        id: &str,
        length: Option<u64>,
        url: Option<&str>,
        extra: Option<&str>,
    ) -> Self {
        let mut line = format!("contig=<ID={}", id);
        if let Some(length) = length {
            line.push_str(&format!(",length={}", length));
        }
        push_optional(&mut line, "URL=", url);
        push_optional(&mut line, "", extra);
        line.push('>');
        self.meta.push(line);
        self
    }

    /// Declare a FILTER.
    pub fn add_filter(mut self, id: &str, description: Option<&str>, extra: Option<&str>) -> Self {
        let mut line = format!("FILTER=<ID={}", id);
        push_description(&mut line, description);
        push_optional(&mut line, "", extra);
        line.push('>');
        self.meta.push(line);
        self
    }

    /// Declare an INFO field.
    pub fn add_shared_field(
        mut self,
        id: &str,
        number: Number,
        kind: FieldKind,
        description: Option<&str>,
        source: Option<&str>,
        version: Option<&str>,
        extra: Option<&str>,
    ) -> Self {
        let mut line = format!("INFO=<ID={},Number={},Type={}", id, number, kind);
        push_description(&mut line, description);
        push_optional(&mut line, "Source=", source);
        push_optional(&mut line, "Version=", version);
        push_optional(&mut line, "", extra);
        line.push('>');
        self.meta.push(line);
        self
    }

    /// Declare a FORMAT field.
    pub fn add_individual_field(
        mut self,
        id: &str,
        number: Number,
        kind: FieldKind,
        description: Option<&str>,
        extra: Option<&str>,
    ) -> Self {
        let mut line = format!("FORMAT=<ID={},Number={},Type={}", id, number, kind);
        push_description(&mut line, description);
        push_optional(&mut line, "", extra);
        line.push('>');
        self.meta.push(line);
        self
    }

    /// Add a `##source` line.
    pub fn add_source(mut self, source: &str) -> Self {
        self.meta.push(format!("source={}", source));
        self
    }

    /// Append a sample column.
    pub fn add_sample(mut self, name: &str) -> Self {
        self.samples.push(name.to_string());
        self
    }

    /// Append an arbitrary meta line; a leading `##` is optional.
    pub fn add_line(mut self, line: &str) -> Self {
        self.meta
            .push(line.strip_prefix("##").unwrap_or(line).to_string());
        self
    }

    /// Add the meta lines and samples of `other` that are not declared yet.
    /// Structured lines are matched on their key and ID.
    pub fn merge(mut self, other: &VariantHeader) -> Self {
        let mut seen: Vec<String> = self.meta.iter().map(|m| meta_identity(m)).collect();
        for line in &other.meta {
            let identity = meta_identity(line);
            if !seen.contains(&identity) {
                seen.push(identity);
                self.meta.push(line.clone());
            }
        }
        for sample in &other.samples {
            if !self.samples.contains(sample) {
                self.samples.push(sample.clone());
            }
        }
        self
    }

    /// Render the header text.
    pub fn render(&self) -> String {
        let mut text = format!("##fileformat={}\n", self.file_format);
        for line in &self.meta {
            text.push_str("##");
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&FIXED_COLUMNS.join("\t"));
        if !self.samples.is_empty() {
            text.push_str("\tFORMAT\t");
            text.push_str(&self.samples.join("\t"));
        }
        text.push('\n');
        text
    }

    /// Parse the rendered text into a header.
    pub fn build(&self) -> Result<VariantHeader> {
        VariantHeader::parse(&self.render())
    }
}

fn push_optional(line: &mut String, prefix: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        line.push(',');
        line.push_str(prefix);
        line.push_str(value);
    }
}

fn push_description(line: &mut String, description: Option<&str>) {
    if let Some(description) = description {
        line.push_str(",Description=\"");
        line.push_str(&description.replace('"', "\\\""));
        line.push('"');
    }
}

fn meta_identity(meta: &str) -> String {
    let (key, value) = meta.split_once('=').unwrap_or((meta, ""));
    match lookup(&parse_structured(value), "ID") {
        Some(id) => format!("{}:{}", key, id),
        None => meta.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "##fileformat=VCFv4.2\n\
##contig=<ID=chr1,length=1000>\n\
##contig=<ID=chr2>\n\
##FILTER=<ID=LowQual,Description=\"Low quality, really\">\n\
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA1\tNA2\n";

    #[test]
    fn test_parse_header() {
        let header = VariantHeader::parse(HEADER).unwrap();
        assert_eq!(header.file_format(), "VCFv4.2");
        assert_eq!(header.contigs().len(), 2);
        assert_eq!(header.contigs().length(0), Some(1000));
        assert_eq!(header.filters(), &["LowQual".to_string()]);
        let ad = header.individual_field("AD").unwrap();
        assert_eq!(ad.number, Number::PerAllele);
        assert_eq!(ad.kind, FieldKind::Integer);
        assert_eq!(header.shared_field("DP").unwrap().description, "Total depth");
        assert_eq!(header.samples(), &["NA1".to_string(), "NA2".to_string()]);
        assert_eq!(header.sample_index("NA2"), Some(1));
    }

    #[test]
    fn test_quoted_commas() {
        let pairs = parse_structured("<ID=X,Description=\"a, b = c\",Extra=1>");
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[1], ("Description".to_string(), "a, b = c".to_string()));
    }

    #[test]
    fn test_display_round_trip() {
        let header = VariantHeader::parse(HEADER).unwrap();
        assert_eq!(header.to_string(), HEADER);
    }

    #[test]
    fn test_not_a_vcf() {
        let err = VariantHeader::parse("chr1\t100\t200\n").unwrap_err();
        assert!(matches!(err, VcfError::Header { line: 1, .. }));
    }

    #[test]
    fn test_missing_column_line() {
        assert!(VariantHeader::parse("##fileformat=VCFv4.2\n##contig=<ID=chr1>\n").is_err());
    }

    #[test]
    fn test_format_flag_rejected() {
        let text = "##fileformat=VCFv4.2\n##FORMAT=<ID=X,Number=0,Type=Flag>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        assert!(VariantHeader::parse(text).is_err());
    }

    #[test]
    fn test_read_from_counts_bytes() {
        let text = format!("{}chr1\t5\t.\tA\tC\t.\t.\t.\tGT\t0/1\t0/0\n", HEADER);
        let mut cursor = std::io::Cursor::new(text.as_bytes());
        let (header, consumed) = VariantHeader::read_from(&mut cursor).unwrap();
        assert_eq!(consumed, HEADER.len() as u64);
        assert_eq!(header.sample_count(), 2);
    }

    #[test]
    fn test_builder() {
        let header = HeaderBuilder::new()
            .add_contig("chr1", Some(1000), None, None)
            .add_contig("chr2", None, Some("http://example.org"), None)
            .add_filter("PASS", Some("All filters passed"), None)
            .add_shared_field("DP", Number::Count(1), FieldKind::Integer, Some("Depth"), None, None, None)
            .add_individual_field("GQ", Number::Count(1), FieldKind::Integer, None, None)
            .add_source("varsync")
            .add_sample("S1")
            .add_sample("S2")
            .build()
            .unwrap();

        assert_eq!(header.contigs().names().collect::<Vec<_>>(), vec!["chr1", "chr2"]);
        assert!(header.individual_field("GQ").is_some());
        assert_eq!(header.shared_field("DP").unwrap().description, "Depth");
        assert!(header.meta_lines().iter().any(|l| l == "source=varsync"));
        assert!(header
            .meta_lines()
            .iter()
            .any(|l| l == "contig=<ID=chr2,URL=http://example.org>"));
        assert_eq!(header.sample_count(), 2);
    }

    #[test]
    fn test_builder_merge() {
        let a = HeaderBuilder::new()
            .add_contig("chr1", None, None, None)
            .add_sample("S1")
            .build()
            .unwrap();
        let b = HeaderBuilder::new()
            .add_contig("chr1", Some(10), None, None)
            .add_contig("chr2", None, None, None)
            .add_individual_field("DP", Number::Count(1), FieldKind::Integer, None, None)
            .add_sample("S1")
            .add_sample("S2")
            .build()
            .unwrap();

        let merged = HeaderBuilder::from_header(&a).merge(&b).build().unwrap();
        assert_eq!(merged.contigs().len(), 2);
        assert!(merged.individual_field("DP").is_some());
        assert_eq!(merged.samples(), &["S1".to_string(), "S2".to_string()]);
    }
}
