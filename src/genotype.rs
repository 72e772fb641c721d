//! Genotype (GT) encoding in one-byte packed storage.
//!
//! Each allele is stored as `(index + 1) << 1 | phased`, with `0` for a missing
//! allele and `0x81` padding ploidies shorter than the field width.

use crate::field::{UINT8_END_OF_VECTOR, UINT8_MISSING};
use std::fmt;

/// Largest allele index that fits the one-byte encoding.
pub const MAX_ALLELE_INDEX: u32 = 62;

/// Encode one allele. `phased` refers to the separator preceding the allele.
#[inline]
pub fn encode_allele(index: Option<u32>, phased: bool) -> u8 {
    match index {
        Some(i) => (((i + 1) << 1) as u8) | phased as u8,
        None => UINT8_MISSING | phased as u8,
    }
}

/// Decode one stored byte. Returns `None` for end-of-vector padding.
#[inline]
pub fn decode_allele(byte: u8) -> Option<GenotypeAllele> {
    if byte == UINT8_END_OF_VECTOR {
        return None;
    }
    let index = match byte >> 1 {
        0 => None,
        n => Some(n as u32 - 1),
    };
    Some(GenotypeAllele {
        index,
        phased: byte & 1 == 1,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenotypeAllele {
    /// Allele index into REF + ALT, `None` when missing (`.`).
    pub index: Option<u32>,
    /// Whether the separator before this allele was `|`.
    pub phased: bool,
}

/// A decoded per-sample genotype.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Genotype {
    alleles: Vec<GenotypeAllele>,
}

impl Genotype {
    pub fn new(alleles: Vec<GenotypeAllele>) -> Self {
        Self { alleles }
    }

    /// Decode from the stored bytes of one sample.
    pub fn from_bytes(bytes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            alleles: bytes.into_iter().map_while(decode_allele).collect(),
        }
    }

    /// Parse a VCF genotype string such as `0/1`, `1|0` or `./.`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut alleles = Vec::new();
        let mut phased = false;
        let mut rest = text;
        loop {
            let split = rest.find(['/', '|']).unwrap_or(rest.len());
            let token = &rest[..split];
            let index = match token {
                "." => None,
                _ => Some(token.parse::<u32>().ok()?),
            };
            if index.is_some_and(|i| i > MAX_ALLELE_INDEX) {
                return None;
            }
            alleles.push(GenotypeAllele { index, phased });
            if split == rest.len() {
                break;
            }
            phased = rest.as_bytes()[split] == b'|';
            rest = &rest[split + 1..];
        }
        Some(Self { alleles })
    }

    pub fn alleles(&self) -> &[GenotypeAllele] {
        &self.alleles
    }

    /// Number of alleles, end-of-vector padding excluded.
    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    /// Whether every allele is missing.
    pub fn is_missing(&self) -> bool {
        self.alleles.iter().all(|a| a.index.is_none())
    }

    /// Phased when every separator is `|`.
    pub fn is_phased(&self) -> bool {
        self.alleles.len() > 1 && self.alleles.iter().skip(1).all(|a| a.phased)
    }

    /// Two or more distinct called alleles.
    pub fn is_het(&self) -> bool {
        let mut called = self.alleles.iter().filter_map(|a| a.index);
        match called.next() {
            Some(first) => called.any(|i| i != first),
            None => false,
        }
    }

    pub fn is_hom_ref(&self) -> bool {
        !self.alleles.is_empty() && self.alleles.iter().all(|a| a.index == Some(0))
    }

    /// All alleles called and equal to the same non-reference allele.
    pub fn is_hom_alt(&self) -> bool {
        match self.alleles.first().and_then(|a| a.index) {
            Some(first) if first > 0 => self.alleles.iter().all(|a| a.index == Some(first)),
            _ => false,
        }
    }

    /// Packed GT bytes, one per allele.
    pub fn encode(&self) -> impl Iterator<Item = u8> + '_ {
        self.alleles.iter().map(|a| encode_allele(a.index, a.phased))
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alleles.is_empty() {
            return f.write_str(".");
        }
        for (i, allele) in self.alleles.iter().enumerate() {
            if i > 0 {
                f.write_str(if allele.phased { "|" } else { "/" })?;
            }
            match allele.index {
                Some(idx) => write!(f, "{}", idx)?,
                None => f.write_str(".")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_allele() {
        assert_eq!(encode_allele(Some(0), false), 0x02);
        assert_eq!(encode_allele(Some(1), true), 0x05);
        assert_eq!(encode_allele(None, false), 0x00);
        assert_eq!(
            decode_allele(0x05),
            Some(GenotypeAllele {
                index: Some(1),
                phased: true
            })
        );
        assert_eq!(decode_allele(UINT8_END_OF_VECTOR), None);
    }

    #[test]
    fn test_parse_and_display() {
        for text in ["0/1", "1|0", "./.", "2", "0|1|2"] {
            let gt = Genotype::parse(text).unwrap();
            assert_eq!(gt.to_string(), text);
        }
        assert!(Genotype::parse("a/1").is_none());
        assert!(Genotype::parse("0/63").is_none());
    }

    #[test]
    fn test_classification() {
        assert!(Genotype::parse("0/1").unwrap().is_het());
        assert!(Genotype::parse("0/0").unwrap().is_hom_ref());
        assert!(Genotype::parse("2/2").unwrap().is_hom_alt());
        assert!(Genotype::parse("./.").unwrap().is_missing());
        assert!(Genotype::parse("0|1").unwrap().is_phased());
        assert!(!Genotype::parse("0/1").unwrap().is_phased());
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let gt = Genotype::parse("1|0").unwrap();
        let mut bytes: Vec<u8> = gt.encode().collect();
        bytes.push(UINT8_END_OF_VECTOR);
        assert_eq!(Genotype::from_bytes(bytes), gt);
    }
}
