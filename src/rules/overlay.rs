use super::policy::RulePolicy;
use super::types::{Verdict, VerdictCode, VerificationMode};

pub(crate) const BOOSTER_PARTIAL: &str = "Vaccine is not valid in Booster mode";
pub(crate) const TEST_NEEDED: &str = "Test needed";
pub(crate) const SUPER_REQUIRED: &str = "Not valid. Super DGP or Booster required.";

/// What the base verdict was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Evidence {
    Vaccination { complete: bool, booster: bool },
    Test,
    Recovery,
    /// Malformed or unlisted input; no overlay applies.
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Assessment {
    pub evidence: Evidence,
    pub verdict: Verdict,
}

impl Assessment {
    pub fn new(evidence: Evidence, verdict: Verdict) -> Self {
        Self { evidence, verdict }
    }

    pub fn terminal(verdict: Verdict) -> Self {
        Self::new(Evidence::Terminal, verdict)
    }
}

/// Adjusts a base verdict for the verification mode. Never upgrades.
pub(crate) fn apply(
    assessment: Assessment,
    mode: VerificationMode,
    kid: &str,
    policy: &RulePolicy,
) -> Verdict {
    let Assessment { evidence, verdict } = assessment;

    match (mode, evidence) {
        (VerificationMode::NormalDgp, _) | (_, Evidence::Terminal) => verdict,

        (VerificationMode::BoosterDgp, Evidence::Vaccination { complete: false, .. }) => {
            Verdict::not_valid(BOOSTER_PARTIAL)
        }
        (
            VerificationMode::BoosterDgp,
            Evidence::Vaccination {
                complete: true,
                booster: false,
            },
        ) if verdict.is_valid() => Verdict::new(VerdictCode::TestNeeded, TEST_NEEDED),
        (VerificationMode::BoosterDgp, Evidence::Recovery)
            if verdict.is_valid() && !policy.keeps_recovery_in_booster(kid) =>
        {
            Verdict::new(VerdictCode::TestNeeded, TEST_NEEDED)
        }
        (VerificationMode::BoosterDgp, Evidence::Test) => Verdict::not_valid(SUPER_REQUIRED),

        (VerificationMode::SuperDgp, Evidence::Test) if verdict.is_valid() => {
            Verdict::not_valid(SUPER_REQUIRED)
        }

        _ => verdict,
    }
}
