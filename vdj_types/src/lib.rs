//! vdj_types
// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.
#![deny(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;

// From https://danielkeep.github.io/tlborm/book/blk-counting.html
macro_rules! replace_expr {
    ($_t:tt $sub:expr) => {
        $sub
    };
}

macro_rules! count_tts {
    ($($tts:tt)*) => {0usize $(+ replace_expr!($tts 1usize))*};
}

macro_rules! make_enum {
    (
        $(#[$meta:meta])*
        name: $name:ident,
        variants:[$( ($field:ident, $lit: literal) ,)*],
        const_var_name: $const_var_name:ident,
    ) => {
        /// String forms of every variant, in declaration order.
        pub const $const_var_name: [&str; count_tts!($($field)*)] = [
            $($lit,)*
        ];

        $(#[$meta])*
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            Hash,
        )]
        #[allow(missing_docs)]
        pub enum $name {
            $(
                #[serde(rename = $lit)]
                $field,
            )*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub fn all() -> [Self; count_tts!($($field)*)] {
                [
                    $($name::$field,)*
                ]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", match self {
                    $(
                        $name::$field => $lit,
                    )*
                })
            }
        }

        impl From<$name> for &'static str {
            fn from(src: $name) -> &'static str {
                match src {
                    $(
                        $name::$field => $lit,
                    )*
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(
                        $lit => Ok($name::$field),
                    )*
                    unknown => Err(
                        format!("Unknown variant '{}' for {}. Supported variants are: [{}]", unknown, stringify!($name), $const_var_name.join(", "))
                    )
                }
            }
        }
    };
}

make_enum! {
    /// A receptor locus.  The declaration order is the default canonical
    /// ordering used when a cell's chains are laid out locus by locus.
    name: Locus,
    variants: [
        (IGH, "IGH"),
        (IGK, "IGK"),
        (IGL, "IGL"),
        (TRA, "TRA"),
        (TRB, "TRB"),
        (TRD, "TRD"),
        (TRG, "TRG"),
    ],
    const_var_name: LOCI,
}

/// Amino acid codes accepted in a junction, including X for an unknown residue
/// and '*' for a stop codon.
pub const AMINO_ACIDS: &[u8] = b"ACDEFGHIKLMNPQRSTVWXY*";

/// Return the position of the first byte that is not an amino acid code.
pub fn first_non_amino_acid(seq: &[u8]) -> Option<usize> {
    seq.iter().position(|c| !AMINO_ACIDS.contains(c))
}

/// One receptor chain observed on one cell.
///
/// Rank 0 is the primary chain of its locus on that cell, rank 1 the secondary
/// chain, and so on.  A missing or empty junction means the chain was detected
/// but no junction could be called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    /// Cell barcode or other cell identifier.
    pub cell_id: String,
    /// Locus of the chain.
    pub locus: Locus,
    /// Rank of the chain among chains of the same locus on this cell.
    pub chain_rank: u8,
    /// Junction amino acid sequence.
    #[serde(default)]
    pub junction_aa: Option<String>,
    /// V gene call.
    #[serde(default)]
    pub v_gene: Option<String>,
    /// J gene call.
    #[serde(default)]
    pub j_gene: Option<String>,
}

impl ChainRecord {
    /// Create a record with a junction and no gene calls.
    pub fn new(cell_id: &str, locus: Locus, chain_rank: u8, junction_aa: &str) -> Self {
        ChainRecord {
            cell_id: cell_id.to_string(),
            locus,
            chain_rank,
            junction_aa: Some(junction_aa.to_string()),
            v_gene: None,
            j_gene: None,
        }
    }

    /// Attach a V gene call.
    pub fn with_v_gene(mut self, v_gene: &str) -> Self {
        self.v_gene = Some(v_gene.to_string());
        self
    }

    /// Return the junction if it is present and nonempty.
    pub fn junction(&self) -> Option<&str> {
        self.junction_aa.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_locus_invalid_from_str() {
        assert_eq!(
            Locus::from_str("beta").unwrap_err(),
            "Unknown variant 'beta' for Locus. Supported variants are: [IGH, IGK, IGL, TRA, TRB, TRD, TRG]"
        );
    }

    #[test]
    fn test_locus_round_trip() {
        for locus in Locus::all() {
            assert_eq!(Locus::from_str(&locus.to_string()), Ok(locus));
            let s = serde_json::to_string(&locus).unwrap();
            assert_eq!(s, format!("\"{locus}\""));
            assert_eq!(serde_json::from_str::<Locus>(&s).unwrap(), locus);
        }
    }

    #[test]
    fn test_first_non_amino_acid() {
        assert_eq!(first_non_amino_acid(b"CASSLGQF"), None);
        assert_eq!(first_non_amino_acid(b"CAS*X"), None);
        assert_eq!(first_non_amino_acid(b"CASsL"), Some(3));
        assert_eq!(first_non_amino_acid(b"CA1"), Some(2));
    }

    #[test]
    fn test_chain_record_json() {
        let rec: ChainRecord = serde_json::from_str(
            r#"{"cell_id": "AAAC-1", "locus": "TRB", "chain_rank": 0, "junction_aa": "CASSL"}"#,
        )
        .unwrap();
        assert_eq!(rec, ChainRecord::new("AAAC-1", Locus::TRB, 0, "CASSL"));
        let empty = ChainRecord {
            junction_aa: Some(String::new()),
            ..rec
        };
        assert_eq!(empty.junction(), None);
    }
}
