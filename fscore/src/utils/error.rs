use fsrel::variable::Variable;
use strum::EnumIs;
use thiserror::Error;

use crate::{record::RecordId, system::RelationId};

#[derive(Debug, EnumIs, Error)]
pub enum FsError {
    #[error(transparent)]
    Relation(#[from] fsrel::utils::Error),

    /// A formula failed while deriving a record. The run is aborted and its
    /// records are discarded.
    #[error(
        "Derivation aborted while computing `{output}` with relation `{relation_name}` ({relation}): {source}"
    )]
    DerivationAborted {
        relation: RelationId,
        relation_name: String,
        output: Variable,
        #[source]
        source: fsrel::utils::Error,
    },

    #[error("Failed to parse derivation configuration: {source}")]
    ConfigParse {
        #[source]
        source: toml::de::Error,
    },

    #[error("Record {0} does not exist in this derivation")]
    UnknownRecord(RecordId),
}

pub type FsResult<T> = Result<T, FsError>;
