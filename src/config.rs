//! Checker configuration: target EVM version and default ABI coder.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target execution environment. Ordered by release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    #[default]
    London,
}

impl EvmVersion {
    pub const ALL: [EvmVersion; 9] = [
        EvmVersion::Homestead,
        EvmVersion::TangerineWhistle,
        EvmVersion::SpuriousDragon,
        EvmVersion::Byzantium,
        EvmVersion::Constantinople,
        EvmVersion::Petersburg,
        EvmVersion::Istanbul,
        EvmVersion::Berlin,
        EvmVersion::London,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
            EvmVersion::Berlin => "berlin",
            EvmVersion::London => "london",
        }
    }

    pub fn supports_returndata(&self) -> bool {
        *self >= EvmVersion::Byzantium
    }

    pub fn has_static_call(&self) -> bool {
        *self >= EvmVersion::Byzantium
    }

    pub fn has_bitwise_shifting(&self) -> bool {
        *self >= EvmVersion::Constantinople
    }

    pub fn has_create2(&self) -> bool {
        *self >= EvmVersion::Constantinople
    }

    pub fn has_ext_code_hash(&self) -> bool {
        *self >= EvmVersion::Constantinople
    }

    pub fn has_chain_id(&self) -> bool {
        *self >= EvmVersion::Istanbul
    }

    pub fn has_self_balance(&self) -> bool {
        *self >= EvmVersion::Istanbul
    }

    pub fn has_base_fee(&self) -> bool {
        *self >= EvmVersion::London
    }
}

impl Display for EvmVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown EVM version {0:?}")]
    UnknownEvmVersion(String),
    #[error("unknown ABI coder version {0:?}, expected v1 or v2")]
    UnknownAbiCoder(String),
}

impl FromStr for EvmVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvmVersion::ALL
            .iter()
            .find(|version| version.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ConfigError::UnknownEvmVersion(String::from(s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiCoderVersion {
    V1,
    #[default]
    V2,
}

impl FromStr for AbiCoderVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(AbiCoderVersion::V1),
            "v2" | "2" => Ok(AbiCoderVersion::V2),
            _ => Err(ConfigError::UnknownAbiCoder(String::from(s))),
        }
    }
}

impl Display for AbiCoderVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbiCoderVersion::V1 => write!(f, "v1"),
            AbiCoderVersion::V2 => write!(f, "v2"),
        }
    }
}

/// Immutable for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckerSettings {
    pub evm_version: EvmVersion,
    /// Used for source units without a `pragma abicoder`.
    pub abi_coder: AbiCoderVersion,
}

impl CheckerSettings {
    pub fn new(evm_version: EvmVersion) -> Self {
        CheckerSettings {
            evm_version,
            abi_coder: AbiCoderVersion::default(),
        }
    }

    pub fn with_abi_coder(mut self, abi_coder: AbiCoderVersion) -> Self {
        self.abi_coder = abi_coder;
        self
    }
}
