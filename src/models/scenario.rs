use indexmap::IndexMap;
use lazy_static::lazy_static;

/// Scenario classification derived from the scenario code alone.
///
/// Every function here is total: a code that matches no rule lands in an
/// explicit fallback label, never in an error or an empty string. The raw
/// export legitimately contains exploratory codes.

// Ordered substring rules, first match wins. The exact code "PAM4" is
// handled separately so sensitivity runs like "PAM4EK" classify as variants.
const FAMILY_RULES: [(&str, &str); 7] = [
    ("PAM4", "PAM4 Variant"),
    ("PAM1", "PAM1"),
    ("PAM2", "PAM2"),
    ("PAM3", "PAM3"),
    ("HCARB", "High Carbon"),
    ("LCARB", "Low Carbon"),
    ("REF", "WEM"),
];

pub const FAMILY_OTHER: &str = "Other";
pub const GROWTH_UNKNOWN: &str = "Unknown";

lazy_static! {
    /// Carbon-budget tiers in gigatonnes, keyed by the digit run embedded in
    /// the scenario code. Kept in ascending order for the ladder chart.
    pub static ref BUDGET_TIERS: IndexMap<&'static str, f64> = {
        let mut tiers = IndexMap::new();
        tiers.insert("075", 7.5);
        tiers.insert("0775", 7.75);
        tiers.insert("08", 8.0);
        tiers.insert("0825", 8.25);
        tiers.insert("085", 8.5);
        tiers.insert("0875", 8.75);
        tiers.insert("09", 9.0);
        tiers.insert("0925", 9.25);
        tiers.insert("095", 9.5);
        tiers.insert("0975", 9.75);
        tiers.insert("10", 10.0);
        tiers.insert("1025", 10.25);
        tiers.insert("105", 10.5);
        tiers
    };
}

/// Scenario family from the ordered rule table.
pub fn scenario_family(code: &str) -> &'static str {
    let code = code.trim();
    if code == "PAM4" {
        return "PAM4";
    }
    for (needle, family) in FAMILY_RULES {
        if code.contains(needle) {
            return family;
        }
    }
    FAMILY_OTHER
}

/// Reporting group: the PAM families collapse into one group, everything
/// else keeps its family label.
pub fn scenario_group(family: &str) -> &str {
    if family.starts_with("PAM") {
        "PAM"
    } else {
        family
    }
}

/// Economic growth assumption from the code suffix.
pub fn economic_growth(code: &str) -> &'static str {
    if code.contains("-RG") {
        "Reference"
    } else if code.contains("-LG") {
        "Low"
    } else if code.contains("-HG") {
        "High"
    } else {
        GROWTH_UNKNOWN
    }
}

/// Carbon budget in gigatonnes, taken from the first run of 2 to 4
/// consecutive digits in the code. Runs of other lengths (the family digit
/// in "PAM2", for instance) never qualify.
pub fn carbon_budget(code: &str) -> Option<f64> {
    let run = first_digit_run(code)?;
    BUDGET_TIERS.get(run).copied()
}

fn first_digit_run(code: &str) -> Option<&str> {
    let bytes = code.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if (2..=4).contains(&(i - start)) {
                return Some(&code[start..i]);
            }
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pam4_is_not_a_variant() {
        assert_eq!(scenario_family("PAM4"), "PAM4");
        assert_eq!(scenario_family("  PAM4 "), "PAM4");
        assert_eq!(scenario_family("PAM4EK"), "PAM4 Variant");
        assert_eq!(scenario_family("PAM4-095-RG"), "PAM4 Variant");
    }

    #[test]
    fn family_rules_in_order() {
        assert_eq!(scenario_family("PAM1-075-RG"), "PAM1");
        assert_eq!(scenario_family("PAM2-095-LG"), "PAM2");
        assert_eq!(scenario_family("PAM3"), "PAM3");
        assert_eq!(scenario_family("HCARB-HG"), "High Carbon");
        assert_eq!(scenario_family("LCARB-LG"), "Low Carbon");
        assert_eq!(scenario_family("REF-RG"), "WEM");
        assert_eq!(scenario_family("EXPLORE7"), "Other");
    }

    #[test]
    fn groups_collapse_pam() {
        assert_eq!(scenario_group("PAM1"), "PAM");
        assert_eq!(scenario_group("PAM4 Variant"), "PAM");
        assert_eq!(scenario_group("WEM"), "WEM");
        assert_eq!(scenario_group("High Carbon"), "High Carbon");
    }

    #[test]
    fn growth_from_suffix() {
        assert_eq!(economic_growth("PAM1-075-RG"), "Reference");
        assert_eq!(economic_growth("PAM2-095-LG"), "Low");
        assert_eq!(economic_growth("HCARB-HG"), "High");
        assert_eq!(economic_growth("REF"), "Unknown");
    }

    #[test]
    fn budget_from_digit_run() {
        assert_eq!(carbon_budget("PAM1-075-RG"), Some(7.5));
        assert_eq!(carbon_budget("PAM2-0925-LG"), Some(9.25));
        assert_eq!(carbon_budget("PAM3-10-HG"), Some(10.0));
        assert_eq!(carbon_budget("PAM4-105"), Some(10.5));
    }

    #[test]
    fn family_digit_never_reads_as_budget() {
        // "2" in PAM2 is a one-digit run and must be skipped.
        assert_eq!(carbon_budget("PAM2-LG"), None);
        assert_eq!(carbon_budget("REF-RG"), None);
        // A qualifying run outside the tier table is still no budget.
        assert_eq!(carbon_budget("PAM1-42-RG"), None);
    }

    #[test]
    fn budget_tiers_ascend() {
        let values: Vec<f64> = BUDGET_TIERS.values().copied().collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, sorted);
    }
}
