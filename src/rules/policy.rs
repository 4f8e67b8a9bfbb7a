use std::collections::{HashMap, HashSet};

/// Country and issuer specific exceptions applied on top of the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePolicy {
    /// Countries where an incomplete vaccination series is accepted on its own.
    pub partial_series_countries: HashSet<String>,
    /// Signer key identifiers whose recovery statements stay valid in booster mode.
    pub booster_recovery_kids: HashSet<String>,
    /// Products accepted only when administered in the listed countries.
    pub restricted_products: HashMap<String, HashSet<String>>,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            partial_series_countries: HashSet::from(["IT".to_string()]),
            booster_recovery_kids: HashSet::new(),
            restricted_products: HashMap::from([(
                "Sputnik-V".to_string(),
                HashSet::from(["SM".to_string()]),
            )]),
        }
    }
}

impl RulePolicy {
    pub fn accepts_partial_series(&self, country: &str) -> bool {
        self.partial_series_countries.contains(country)
    }

    /// Whether `product` may be accepted when administered in `country`.
    pub fn accepts_product_in(&self, product: &str, country: &str) -> bool {
        self.restricted_products
            .get(product)
            .is_none_or(|countries| countries.contains(country))
    }

    pub fn keeps_recovery_in_booster(&self, kid: &str) -> bool {
        self.booster_recovery_kids.contains(kid)
    }
}
