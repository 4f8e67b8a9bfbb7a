mod overlay;
mod policy;
mod recovery;
mod table;
mod test_entry;
mod types;
mod vaccination;

pub use policy::RulePolicy;
pub use table::{Offsets, RuleSetting, RuleTable, TestType, Timing, VaccineRule, Window};
pub use types::{UnknownMode, Verdict, VerdictCode, VerificationMode};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::certificate::Certificate;

use overlay::{Assessment, Evidence};

pub(crate) const NO_CATEGORY: &str = "No vaccination, test or recovery statement found in payload";
pub(crate) const OUT_OF_RANGE: &str = "Validity window is out of range";

/// Evaluates certificates against a rule table and a policy.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    table: RuleTable,
    policy: RulePolicy,
}

impl RuleEngine {
    pub fn new(table: RuleTable, policy: RulePolicy) -> Self {
        Self { table, policy }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn policy(&self) -> &RulePolicy {
        &self.policy
    }

    /// Computes the verdict for `certificate` at `now`.
    ///
    /// The first non-empty category, in the order vaccinations, tests,
    /// recovery statements, decides the base verdict. The mode overlay then
    /// runs on that verdict and can only downgrade it.
    pub fn evaluate(
        &self,
        certificate: &Certificate,
        now: DateTime<Utc>,
        mode: VerificationMode,
    ) -> Verdict {
        let assessment = if !certificate.vaccinations.is_empty() {
            vaccination::assess(&certificate.vaccinations, &self.table, &self.policy, now)
        } else if !certificate.tests.is_empty() {
            test_entry::assess(&certificate.tests, &self.table, now)
        } else if !certificate.recovery_statements.is_empty() {
            recovery::assess(&certificate.recovery_statements, &self.table, now)
        } else {
            Assessment::terminal(Verdict::new(VerdictCode::NotEuDcc, NO_CATEGORY))
        };

        let verdict = overlay::apply(assessment, mode, &certificate.kid, &self.policy);
        debug!("Rules verdict in {} mode: {}", mode, verdict.code);
        verdict
    }
}
