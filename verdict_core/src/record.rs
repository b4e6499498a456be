use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, Result};

/// One agent's scored assessment of a claim.
///
/// Fields are private: a record is built once at the end of an agent run and
/// never mutated afterwards. Construction does not validate; `validate` is
/// called by the decision engine so that out-of-range input surfaces as an
/// error instead of being clamped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    agent_id: String,
    confidence: f64,
    contradiction: f64,
    entropy: f64,
    coverage: f64,
    falsified: bool,
}

impl VerdictRecord {
    pub fn new(
        agent_id: impl Into<String>,
        confidence: f64,
        contradiction: f64,
        entropy: f64,
        coverage: f64,
        falsified: bool,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            confidence,
            contradiction,
            entropy,
            coverage,
            falsified,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn contradiction(&self) -> f64 {
        self.contradiction
    }

    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    pub fn falsified(&self) -> bool {
        self.falsified
    }

    /// Range-check all four scalars. The first offending field is reported.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("confidence", self.confidence),
            ("contradiction", self.contradiction),
            ("entropy", self.entropy),
            ("coverage", self.coverage),
        ];
        for (field, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Validation {
                    agent_id: self.agent_id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Canonical text the signature is computed over.
    ///
    /// Scalars use Rust's shortest round-trip formatting so that two records
    /// print the same text iff their fields compare equal. `-0.0` prints as `0`.
    pub fn canonical_text(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            unsigned_zero(self.confidence),
            unsigned_zero(self.contradiction),
            unsigned_zero(self.entropy),
            unsigned_zero(self.coverage),
            self.falsified,
            self.agent_id,
        )
    }

    /// Hex SHA-256 over `canonical_text`.
    pub fn signature(&self) -> String {
        let digest = Sha256::digest(self.canonical_text().as_bytes());
        hex::encode(digest)
    }
}

/// Adding `+0.0` maps `-0.0` to `0.0` and leaves every other value alone.
#[inline]
fn unsigned_zero(x: f64) -> f64 {
    x + 0.0
}
