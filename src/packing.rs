//! Packing of text FORMAT columns into one typed, fixed-stride sample buffer.
//!
//! Every FORMAT key becomes a [`FormatField`] whose block holds `stride` bytes
//! per sample. The stride fits the widest sample; shorter samples are padded with
//! end-of-vector markers and absent values use the missing sentinels.

use crate::error::{Result, VcfError};
use crate::field::{
    FieldValue, FormatField, ValueType, FLOAT32_END_OF_VECTOR_BITS, FLOAT32_MISSING_BITS,
    INT32_END_OF_VECTOR, INT32_MISSING, UINT8_END_OF_VECTOR,
};
use crate::genotype::Genotype;
use crate::header::{FieldKind, Number, VariantHeader};
use crate::streaming::parsing::{parse_f32, parse_i32_fast, split};

/// Smallest integer accepted from text; lower values are reserved for sentinels.
const MIN_INTEGER_VALUE: i32 = i32::MIN + 8;

/// Packed FORMAT data of one record.
#[derive(Debug, Default)]
pub struct PackedFormat {
    pub fields: Vec<FormatField>,
    pub bytes: Vec<u8>,
}

/// Pack the FORMAT keys and sample columns of a record.
///
/// `offset` is only used in error messages; `n_alleles` counts REF plus ALT.
pub fn pack_format(
    keys: &[u8],
    samples: &[u8],
    header: &VariantHeader,
    n_alleles: usize,
    offset: u64,
) -> Result<PackedFormat> {
    let sample_count = header.sample_count();
    let columns: Vec<&[u8]> = if sample_count == 0 && samples.is_empty() {
        Vec::new()
    } else {
        split(samples, b'\t').collect()
    };
    if columns.len() != sample_count {
        return Err(VcfError::malformed(
            offset,
            format!(
                "record has {} sample columns, header declares {} samples",
                columns.len(),
                sample_count
            ),
        ));
    }

    let keys: Vec<&str> = split(keys, b':')
        .map(|k| std::str::from_utf8(k).map_err(|_| VcfError::malformed(offset, "FORMAT key is not UTF-8")))
        .collect::<Result<_>>()?;
    for (i, key) in keys.iter().enumerate() {
        if keys[..i].contains(key) {
            return Err(VcfError::malformed(offset, format!("duplicate FORMAT key {}", key)));
        }
    }

    let tokens: Vec<Vec<&[u8]>> = columns.iter().map(|c| split(c, b':').collect()).collect();
    if let Some((s, t)) = tokens.iter().enumerate().find(|(_, t)| t.len() > keys.len()) {
        return Err(VcfError::malformed(
            offset,
            format!(
                "sample {} has {} values for {} FORMAT keys",
                s + 1,
                t.len(),
                keys.len()
            ),
        ));
    }

    let mut packed = PackedFormat::default();
    for (k, key) in keys.iter().enumerate() {
        let definition = header.individual_field(key).ok_or_else(|| {
            VcfError::malformed(offset, format!("FORMAT key {} is not declared in the header", key))
        })?;
        let values: Vec<Option<&[u8]>> = tokens.iter().map(|t| t.get(k).copied()).collect();
        let limit = value_limit(definition.number, n_alleles);
        let start = packed.bytes.len();
        let layout = if *key == "GT" {
            pack_genotypes(&values, &mut packed.bytes)
        } else {
            match definition.kind {
                FieldKind::Integer => pack_integers(&values, limit, &mut packed.bytes),
                FieldKind::Float => pack_floats(&values, limit, &mut packed.bytes),
                FieldKind::String | FieldKind::Character => Ok(pack_chars(&values, &mut packed.bytes)),
                FieldKind::Flag => Err(format!("FORMAT field {} is a Flag", key)),
            }
        };
        let (value_type, stride) = layout
            .map_err(|message| VcfError::malformed(offset, format!("FORMAT {}: {}", key, message)))?;
        packed
            .fields
            .push(FormatField::new(key, value_type, stride, start));
    }
    Ok(packed)
}

fn value_limit(number: Number, n_alleles: usize) -> Option<usize> {
    match number {
        Number::Count(n) => Some(n.max(1)),
        Number::PerAltAllele => Some(n_alleles.saturating_sub(1).max(1)),
        Number::PerAllele => Some(n_alleles.max(1)),
        Number::PerGenotype | Number::Unbounded => None,
    }
}

fn check_limit(count: usize, limit: Option<usize>) -> std::result::Result<(), String> {
    match limit {
        Some(max) if count > max => Err(format!("{} values where at most {} are declared", count, max)),
        _ => Ok(()),
    }
}

fn pack_genotypes(
    values: &[Option<&[u8]>],
    out: &mut Vec<u8>,
) -> std::result::Result<(ValueType, usize), String> {
    let genotypes: Vec<Genotype> = values
        .iter()
        .map(|v| {
            let text = std::str::from_utf8(v.unwrap_or(b".")).map_err(|_| "genotype is not UTF-8".to_string())?;
            Genotype::parse(text).ok_or_else(|| format!("invalid genotype '{}'", text))
        })
        .collect::<std::result::Result<_, _>>()?;
    let stride = genotypes.iter().map(Genotype::ploidy).max().unwrap_or(1).max(1);
    for gt in &genotypes {
        out.extend(gt.encode());
        out.extend(std::iter::repeat(UINT8_END_OF_VECTOR).take(stride - gt.ploidy()));
    }
    Ok((ValueType::UInt8, stride))
}

/// Parse comma-separated values; `.` is missing.
fn parse_list<T>(
    token: Option<&[u8]>,
    parse: impl Fn(&[u8]) -> Option<T>,
) -> std::result::Result<Vec<Option<T>>, String> {
    match token {
        None | Some(b".") | Some(b"") => Ok(vec![None]),
        Some(token) => split(token, b',')
            .map(|v| match v {
                b"." => Ok(None),
                _ => parse(v)
                    .map(Some)
                    .ok_or_else(|| format!("invalid value '{}'", String::from_utf8_lossy(v))),
            })
            .collect(),
    }
}

fn pack_integers(
    values: &[Option<&[u8]>],
    limit: Option<usize>,
    out: &mut Vec<u8>,
) -> std::result::Result<(ValueType, usize), String> {
    let parsed: Vec<Vec<Option<i32>>> = values
        .iter()
        .map(|v| parse_list(*v, parse_i32_fast))
        .collect::<std::result::Result<_, _>>()?;

    let mut width = 1;
    let (mut min, mut max) = (0i32, 0i32);
    for sample in &parsed {
        check_limit(sample.len(), limit)?;
        width = width.max(sample.len());
        for &v in sample.iter().flatten() {
            if v < MIN_INTEGER_VALUE {
                return Err(format!("value {} is reserved", v));
            }
            min = min.min(v);
            max = max.max(v);
        }
    }

    let value_type = ValueType::for_integer_range(min, max);
    let mut slot = [0u8; 4];
    let slot = &mut slot[..value_type.width()];
    for sample in &parsed {
        for j in 0..width {
            let v = match sample.get(j) {
                Some(Some(v)) => *v,
                Some(None) => INT32_MISSING,
                None => INT32_END_OF_VECTOR,
            };
            v.encode(value_type, slot);
            out.extend_from_slice(slot);
        }
    }
    Ok((value_type, width * value_type.width()))
}

fn pack_floats(
    values: &[Option<&[u8]>],
    limit: Option<usize>,
    out: &mut Vec<u8>,
) -> std::result::Result<(ValueType, usize), String> {
    let parsed: Vec<Vec<Option<f32>>> = values
        .iter()
        .map(|v| parse_list(*v, parse_f32))
        .collect::<std::result::Result<_, _>>()?;

    let mut width = 1;
    for sample in &parsed {
        check_limit(sample.len(), limit)?;
        width = width.max(sample.len());
    }

    let mut slot = [0u8; 4];
    for sample in &parsed {
        for j in 0..width {
            let v = match sample.get(j) {
                Some(Some(v)) => *v,
                Some(None) => f32::from_bits(FLOAT32_MISSING_BITS),
                None => f32::from_bits(FLOAT32_END_OF_VECTOR_BITS),
            };
            v.encode(ValueType::Float32, &mut slot);
            out.extend_from_slice(&slot);
        }
    }
    Ok((ValueType::Float32, width * 4))
}

fn pack_chars(values: &[Option<&[u8]>], out: &mut Vec<u8>) -> (ValueType, usize) {
    let stride = values
        .iter()
        .map(|v| v.map_or(0, <[u8]>::len))
        .max()
        .unwrap_or(0)
        .max(1);
    for v in values {
        let bytes = v.unwrap_or(b"");
        out.extend_from_slice(bytes);
        out.extend(std::iter::repeat(0u8).take(stride - bytes.len()));
    }
    (ValueType::Char, stride)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldView, SampleBuffer, INT16_END_OF_VECTOR};
    use crate::header::HeaderBuilder;

    fn header() -> VariantHeader {
        HeaderBuilder::new()
            .add_contig("chr1", None, None, None)
            .add_individual_field("GT", Number::Count(1), FieldKind::String, None, None)
            .add_individual_field("DP", Number::Count(1), FieldKind::Integer, None, None)
            .add_individual_field("AD", Number::PerAllele, FieldKind::Integer, None, None)
            .add_individual_field("GL", Number::PerGenotype, FieldKind::Float, None, None)
            .add_individual_field("FT", Number::Count(1), FieldKind::String, None, None)
            .add_sample("A")
            .add_sample("B")
            .add_sample("C")
            .build()
            .unwrap()
    }

    fn view<T: FieldValue>(packed: &PackedFormat, id: &str) -> FieldView<T> {
        let field = packed.fields.iter().find(|f| f.id() == id).unwrap().clone();
        FieldView::new(SampleBuffer::new(packed.bytes.clone()), field, 3).unwrap()
    }

    #[test]
    fn test_pack_mixed_fields() {
        let packed = pack_format(
            b"GT:DP:AD:FT",
            b"0/1:12:5,7:PASS\t1|1:.:0,9:LowDP\t./.:40000",
            &header(),
            2,
            0,
        )
        .unwrap();
        assert_eq!(packed.fields.len(), 4);

        let dp = view::<i32>(&packed, "DP");
        assert_eq!(dp.value_type(), ValueType::Int32);
        assert_eq!(dp.to_vec(), vec![12, INT32_MISSING, 40000]);

        let ad = view::<i32>(&packed, "AD");
        assert_eq!(ad.value_type(), ValueType::Int16);
        assert_eq!(ad.sample(0).unwrap().collect::<Vec<_>>(), vec![5, 7]);
        assert_eq!(ad.sample(2).unwrap().collect::<Vec<_>>(), vec![INT32_MISSING]);
        let raw = view::<i16>(&packed, "AD");
        assert_eq!(raw.element_at(2, 1).unwrap(), INT16_END_OF_VECTOR);

        let gt = view::<u8>(&packed, "GT");
        assert_eq!(gt.values_per_sample(), 2);
        assert_eq!(Genotype::from_bytes(gt.sample(1).unwrap()).to_string(), "1|1");

        let ft = view::<u8>(&packed, "FT");
        assert_eq!(ft.string_at(1).unwrap(), "LowDP");
        assert_eq!(ft.string_at(2).unwrap(), "");
    }

    #[test]
    fn test_sample_count_mismatch() {
        let err = pack_format(b"DP", b"1\t2", &header(), 2, 77).unwrap_err();
        assert!(matches!(err, VcfError::MalformedRecord(ref m) if m.contains("byte offset 77")));
    }

    #[test]
    fn test_declared_count_exceeded() {
        assert!(pack_format(b"DP", b"1,2\t3\t4", &header(), 2, 0).is_err());
        assert!(pack_format(b"AD", b"1,2,3\t3\t4", &header(), 2, 0).is_err());
        assert!(pack_format(b"AD", b"1,2,3\t3\t4", &header(), 3, 0).is_ok());
    }

    #[test]
    fn test_undeclared_and_invalid_values() {
        assert!(pack_format(b"XX", b"1\t2\t3", &header(), 2, 0).is_err());
        assert!(pack_format(b"DP", b"x\t2\t3", &header(), 2, 0).is_err());
        assert!(pack_format(b"DP:DP", b"1:1\t2:2\t3:3", &header(), 2, 0).is_err());
        assert!(pack_format(b"DP", b"1:5\t2\t3", &header(), 2, 0).is_err());
    }

    #[test]
    fn test_float_padding() {
        let packed = pack_format(b"GL", b"-0.5,-1,-2\t.\t-3", &header(), 2, 0).unwrap();
        let gl = view::<f32>(&packed, "GL");
        assert_eq!(gl.values_per_sample(), 3);
        assert_eq!(gl.sample(0).unwrap().collect::<Vec<_>>(), vec![-0.5, -1.0, -2.0]);
        assert!(gl.is_missing_at(1).unwrap());
        assert_eq!(gl.sample(2).unwrap().len(), 1);
    }
}
