use crate::errors::QuantError;
use std::collections::HashMap;

/// Externally supplied transcript-to-gene annotation map, used to aggregate
/// transcript-level tables (StringTie, Kallisto) to gene level. Extracted
/// once from a StringTie coverage table and reused across tools.
#[derive(Debug, Clone, Default)]
pub struct TxToGene {
    map: HashMap<String, String>,
}

impl TxToGene {
    pub fn new() -> TxToGene {
        TxToGene::default()
    }

    /// Build the map from (transcript, gene) pairs, rejecting pairs that
    /// would map one transcript to two different genes.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<TxToGene, QuantError> {
        let mut map: HashMap<String, String> = HashMap::new();
        for (transcript, gene) in pairs {
            match map.get(&transcript) {
                Some(existing) if *existing != gene => {
                    return Err(QuantError::ConflictingTxMapping {
                        transcript,
                        gene_a: existing.clone(),
                        gene_b: gene,
                    });
                }
                Some(_) => {}
                None => {
                    map.insert(transcript, gene);
                }
            }
        }
        Ok(TxToGene { map })
    }

    pub fn gene(&self, transcript: &str) -> Option<&str> {
        self.map.get(transcript).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
