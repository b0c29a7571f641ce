//! Errors raised while combining report fragments.
//!
//! Every variant here is fatal for the run: the combined report is only
//! written when all fragments agree.

use std::path::PathBuf;
use thiserror::Error;

/// A consistency violation or unreadable embedded value.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("multiple references found: {}", names.join(", "))]
    MultipleReferences { names: Vec<String> },

    #[error("multiple values found for minimum contig length: {}", values.join(", "))]
    MultipleContigThresholds { values: Vec<String> },

    #[error("no minimum contig length declared in any report page")]
    MissingContigThreshold,

    #[error("species found do not match: '{species}' is not reported for '{assembler}'")]
    SpeciesMismatch { assembler: String, species: String },

    #[error("LMAS report folders not found in {}", dir.display())]
    ReportFoldersNotFound { dir: PathBuf },

    #[error("malformed value for '{variable}': {source}")]
    MalformedLiteral {
        variable: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_cause() {
        let err = MergeError::MultipleContigThresholds {
            values: vec!["1000".to_string(), "2000".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "multiple values found for minimum contig length: 1000, 2000"
        );

        let err = MergeError::SpeciesMismatch {
            assembler: "SPAdes".to_string(),
            species: "Bacillus_subtilis".to_string(),
        };
        assert!(err.to_string().contains("Bacillus_subtilis"));
        assert!(err.to_string().contains("SPAdes"));
    }
}
