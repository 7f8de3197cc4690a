//! Compiled contract artifacts
//!
//! An artifact pairs the contract's interface description (ABI) with the
//! creation bytecode sent in the deployment transaction. Truffle and Hardhat
//! store the bytecode as a hex string, Foundry and solc standard JSON nest it
//! under `bytecode.object`; both layouts are accepted.

use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use serde::Deserialize;
use std::path::Path;

use crate::contract_library::ContractLibrary;
use crate::error::SoltestError;

#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    #[serde(default)]
    bytecode: Option<RawBytecode>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl ContractArtifact {
    /// Load an artifact JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SoltestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SoltestError::InvalidArtifact(format!("Cannot read {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded artifact {} ({} bytes)", path.display(), content.len());
        Self::from_json(&content)
    }

    /// Parse artifact JSON with `abi` and `bytecode` fields
    pub fn from_json(json: &str) -> Result<Self, SoltestError> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| SoltestError::InvalidArtifact(format!("Malformed artifact: {}", e)))?;

        let hex_code = match raw.bytecode {
            Some(RawBytecode::Hex(code)) => code,
            Some(RawBytecode::Object { object }) => object,
            None => {
                return Err(SoltestError::InvalidArtifact(
                    "Artifact has no bytecode".to_string(),
                ))
            }
        };

        Ok(Self {
            abi: raw.abi,
            bytecode: decode_bytecode(&hex_code)?,
        })
    }

    /// Build an artifact from a bare ABI JSON array and hex bytecode
    pub fn from_parts(abi_json: &str, bytecode_hex: &str) -> Result<Self, SoltestError> {
        let abi: JsonAbi = serde_json::from_str(abi_json)
            .map_err(|e| SoltestError::InvalidArtifact(format!("Malformed ABI: {}", e)))?;
        Ok(Self {
            abi,
            bytecode: decode_bytecode(bytecode_hex)?,
        })
    }

    /// Built-in authorized-wallet ABI with the given bytecode
    pub fn authorized_wallet(bytecode_hex: &str) -> Result<Self, SoltestError> {
        Ok(Self {
            abi: ContractLibrary::authorized_wallet()?,
            bytecode: decode_bytecode(bytecode_hex)?,
        })
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.abi.function(name).is_some()
    }
}

fn decode_bytecode(hex_code: &str) -> Result<Bytes, SoltestError> {
    let trimmed = hex_code.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if stripped.is_empty() {
        return Err(SoltestError::InvalidArtifact(
            "Bytecode is empty (abstract contract or interface?)".to_string(),
        ));
    }

    hex::decode(stripped).map(Bytes::from).map_err(|e| {
        if stripped.contains("__") {
            SoltestError::InvalidArtifact(
                "Bytecode contains unlinked library placeholders".to_string(),
            )
        } else {
            SoltestError::InvalidArtifact(format!("Bytecode is not valid hex: {}", e))
        }
    })
}
