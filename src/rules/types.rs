use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Verification policy selecting which evidence is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMode {
    /// Vaccination, recovery or negative test.
    #[default]
    NormalDgp,
    /// Booster dose, or a completed cycle or recovery backed by a test.
    BoosterDgp,
    /// Vaccination or recovery only.
    SuperDgp,
}

impl VerificationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMode::NormalDgp => "NORMAL_DGP",
            VerificationMode::BoosterDgp => "BOOSTER_DGP",
            VerificationMode::SuperDgp => "SUPER_DGP",
        }
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown verification mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for VerificationMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL_DGP" | "NORMAL" => Ok(VerificationMode::NormalDgp),
            "BOOSTER_DGP" | "BOOSTER" => Ok(VerificationMode::BoosterDgp),
            "SUPER_DGP" | "SUPER" => Ok(VerificationMode::SuperDgp),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// Machine-checkable outcome of the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictCode {
    Valid,
    NotValid,
    NotValidYet,
    TestNeeded,
    NotEuDcc,
}

impl VerdictCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictCode::Valid => "VALID",
            VerdictCode::NotValid => "NOT_VALID",
            VerdictCode::NotValidYet => "NOT_VALID_YET",
            VerdictCode::TestNeeded => "TEST_NEEDED",
            VerdictCode::NotEuDcc => "NOT_EU_DCC",
        }
    }
}

impl fmt::Display for VerdictCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// True only for [`VerdictCode::Valid`].
    pub result: bool,
    pub code: VerdictCode,
    pub message: String,
}

impl Verdict {
    pub fn new(code: VerdictCode, message: impl Into<String>) -> Self {
        Self {
            result: code == VerdictCode::Valid,
            code,
            message: message.into(),
        }
    }

    pub fn valid(message: impl Into<String>) -> Self {
        Self::new(VerdictCode::Valid, message)
    }

    pub fn not_valid(message: impl Into<String>) -> Self {
        Self::new(VerdictCode::NotValid, message)
    }

    pub fn not_valid_yet(message: impl Into<String>) -> Self {
        Self::new(VerdictCode::NotValidYet, message)
    }

    pub fn is_valid(&self) -> bool {
        self.code == VerdictCode::Valid
    }
}
