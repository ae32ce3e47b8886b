//! Listing filters and dashboard statistics.

use crate::types::{Category, ProofRecord};
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeSet;

/// Category and free-text filter for listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofFilter {
    /// `None` shows every category
    pub category: Option<Category>,
    /// Case-insensitive substring matched against title and description
    pub search: Option<String>,
}

impl ProofFilter {
    pub fn matches(&self, proof: &ProofRecord) -> bool {
        if self.category.is_some_and(|c| c != proof.category) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                proof.title.to_lowercase().contains(&query)
                    || proof.description.to_lowercase().contains(&query)
            }
        }
    }
}

/// Keep the proofs matching `filter`, in their current order.
pub fn filter_proofs<'a>(proofs: &'a [ProofRecord], filter: &ProofFilter) -> Vec<&'a ProofRecord> {
    proofs.iter().filter(|p| filter.matches(p)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    /// Created in the calendar month (UTC) of `now`
    pub this_month: usize,
    /// Distinct categories in use
    pub categories: usize,
}

pub fn dashboard_stats(proofs: &[ProofRecord], now: DateTime<Utc>) -> DashboardStats {
    let this_month = proofs
        .iter()
        .filter_map(ProofRecord::created_at_time)
        .filter(|t| t.year() == now.year() && t.month() == now.month())
        .count();
    let categories: BTreeSet<Category> = proofs.iter().map(|p| p.category).collect();
    DashboardStats {
        total: proofs.len(),
        this_month,
        categories: categories.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::create_proof_at;
    use crate::types::{EvidenceFile, ProofDraft};
    use chrono::TimeZone;

    fn make_record(title: &str, description: &str, category: Category, month: u32) -> ProofRecord {
        let draft = ProofDraft {
            title: title.to_string(),
            description: description.to_string(),
            category,
            files: vec![EvidenceFile::capture("f", "", title.as_bytes())],
            location: None,
        };
        create_proof_at(draft, Utc.with_ymd_and_hms(2024, month, 15, 10, 0, 0).unwrap()).unwrap()
    }

    fn sample() -> Vec<ProofRecord> {
        vec![
            make_record("Kitchen tiles", "cracked near sink", Category::Apartment, 3),
            make_record("Car dent", "Parking garage level 2", Category::Vehicle, 3),
            make_record("Laptop receipt", "", Category::Purchase, 2),
            make_record("Balcony", "Garage door visible", Category::Apartment, 1),
        ]
    }

    #[test]
    fn default_filter_matches_everything() {
        let proofs = sample();
        assert_eq!(filter_proofs(&proofs, &ProofFilter::default()).len(), 4);
    }

    #[test]
    fn category_filter() {
        let proofs = sample();
        let filter = ProofFilter {
            category: Some(Category::Apartment),
            search: None,
        };
        let titles: Vec<&str> = filter_proofs(&proofs, &filter)
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Kitchen tiles", "Balcony"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let proofs = sample();
        let filter = ProofFilter {
            category: None,
            search: Some("GARAGE".to_string()),
        };
        let titles: Vec<&str> = filter_proofs(&proofs, &filter)
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Car dent", "Balcony"]);
    }

    #[test]
    fn category_and_search_combine() {
        let proofs = sample();
        let filter = ProofFilter {
            category: Some(Category::Vehicle),
            search: Some("balcony".to_string()),
        };
        assert!(filter_proofs(&proofs, &filter).is_empty());
    }

    #[test]
    fn blank_search_is_ignored() {
        let proofs = sample();
        let filter = ProofFilter {
            category: None,
            search: Some("   ".to_string()),
        };
        assert_eq!(filter_proofs(&proofs, &filter).len(), 4);
    }

    #[test]
    fn stats_count_month_and_categories() {
        let proofs = sample();
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 23, 0, 0).unwrap();
        assert_eq!(
            dashboard_stats(&proofs, now),
            DashboardStats {
                total: 4,
                this_month: 2,
                categories: 3,
            }
        );
    }

    #[test]
    fn stats_on_empty_list() {
        let now = Utc::now();
        let stats = dashboard_stats(&[], now);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.this_month, 0);
        assert_eq!(stats.categories, 0);
    }
}
