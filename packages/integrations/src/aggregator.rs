// ABOUTME: Fans one search out to all enabled vendors and ranks the combined results
// ABOUTME: Partial failures become per-vendor entries; stragglers are abandoned at the budget

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use partsbin_core::{
    AggregatedResult, PartRecord, PartSearchQuery, SearchTerm, VendorFailure, VendorId,
};

use crate::error::{ProviderError, SearchError};
use crate::providers::IntegrationApi;

const DEFAULT_BUDGET_SECS: u64 = 5;

/// Fans a part search out to every registered vendor integration
pub struct SearchAggregator {
    integrations: Vec<Arc<dyn IntegrationApi>>,
    budget: Duration,
}

impl SearchAggregator {
    pub fn new(integrations: Vec<Arc<dyn IntegrationApi>>) -> Self {
        Self::with_budget(integrations, Duration::from_secs(DEFAULT_BUDGET_SECS))
    }

    pub fn with_budget(integrations: Vec<Arc<dyn IntegrationApi>>, budget: Duration) -> Self {
        Self {
            integrations,
            budget,
        }
    }

    /// Search every registered vendor
    pub async fn search(&self, query: &PartSearchQuery) -> Result<AggregatedResult, SearchError> {
        self.search_vendors(query, None).await
    }

    /// Search a caller-selected subset of vendors (all when `vendors` is None)
    pub async fn search_vendors(
        &self,
        query: &PartSearchQuery,
        vendors: Option<&[VendorId]>,
    ) -> Result<AggregatedResult, SearchError> {
        let selected: Vec<Arc<dyn IntegrationApi>> = self
            .integrations
            .iter()
            .filter(|api| vendors.map_or(true, |wanted| wanted.contains(&api.vendor())))
            .cloned()
            .collect();

        info!(
            "Searching {} vendors for '{}'",
            selected.len(),
            query.term.text()
        );

        let mut tasks = JoinSet::new();
        for api in &selected {
            let api = api.clone();
            let query = query.clone();
            let budget = self.budget;
            tasks.spawn(async move {
                let vendor = api.vendor();
                // A vendor that outlives the budget is abandoned, not awaited
                let result = match tokio::time::timeout(budget, api.search(&query)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout),
                };
                (vendor, result)
            });
        }

        let mut parts = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((vendor, Ok(records))) => {
                    debug!("{} contributed {} records", vendor, records.len());
                    parts.extend(records);
                }
                Ok((vendor, Err(e))) => {
                    warn!("{} failed: {}", vendor, e);
                    failures.push(VendorFailure {
                        vendor,
                        kind: e.kind(),
                    });
                }
                Err(e) => {
                    error!("Vendor search task failed: {}", e);
                }
            }
        }

        if !selected.is_empty()
            && parts.is_empty()
            && failures.len() == selected.len()
            && failures.iter().all(|f| !f.kind.is_backpressure())
        {
            return Err(SearchError::AllProvidersFailed { failures });
        }

        let parts = rank_parts(parts, &query.term, query.result_limit);
        failures.sort_by_key(|f| f.vendor);
        Ok(AggregatedResult {
            query: query.clone(),
            parts,
            failures,
        })
    }
}

/// Grouping key for cross-vendor listings of the same physical part
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    /// Listings sharing a normalized manufacturer part number
    Mpn(String),
    /// Listings with no manufacturer part number stand alone
    Listing(VendorId, String),
}

/// Deterministic ordering over the combined result set
///
/// Groups by manufacturer part number, orders groups by best-match relevance
/// to the query term, then within a group by ascending unit price. Grouping
/// never merges or drops a vendor's listing. A limit of 0 means unlimited.
fn rank_parts(records: Vec<PartRecord>, term: &SearchTerm, limit: usize) -> Vec<PartRecord> {
    let mut groups: BTreeMap<GroupKey, Vec<PartRecord>> = BTreeMap::new();
    for record in records {
        let normalized = record.normalized_mpn();
        let key = if normalized.is_empty() {
            GroupKey::Listing(record.vendor, record.vendor_part_number.clone())
        } else {
            GroupKey::Mpn(normalized)
        };
        groups.entry(key).or_default().push(record);
    }

    let mut ordered: Vec<(GroupKey, Vec<PartRecord>)> = groups.into_iter().collect();
    // Stable sort over BTreeMap order keeps equal-relevance groups in key order
    ordered.sort_by(|(_, a), (_, b)| group_score(b, term).cmp(&group_score(a, term)));

    let mut ranked = Vec::new();
    for (_, mut group) in ordered {
        group.sort_by(|a, b| {
            a.unit_price
                .total_cmp(&b.unit_price)
                .then_with(|| a.vendor.cmp(&b.vendor))
                .then_with(|| a.vendor_part_number.cmp(&b.vendor_part_number))
        });
        ranked.extend(group);
    }

    if limit > 0 {
        ranked.truncate(limit);
    }
    ranked
}

fn group_score(group: &[PartRecord], term: &SearchTerm) -> u8 {
    group
        .iter()
        .map(|record| match_score(record, term))
        .max()
        .unwrap_or(0)
}

/// Relevance of one listing to the query term: exact manufacturer part number
/// match beats a prefix match beats a description occurrence
fn match_score(record: &PartRecord, term: &SearchTerm) -> u8 {
    let needle = term.text().trim().to_ascii_uppercase();
    if needle.is_empty() {
        return 0;
    }
    let mpn = record.normalized_mpn();
    if mpn == needle {
        3
    } else if mpn.starts_with(&needle) {
        2
    } else if record.description.to_ascii_uppercase().contains(&needle) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(vendor: VendorId, vpn: &str, mpn: &str, description: &str, price: f64) -> PartRecord {
        PartRecord {
            vendor,
            vendor_part_number: vpn.to_string(),
            manufacturer_part_number: mpn.to_string(),
            description: description.to_string(),
            datasheet_url: None,
            unit_price: price,
            currency: "USD".to_string(),
            quantity_available: 100,
            package_type: None,
        }
    }

    fn keyword(term: &str) -> SearchTerm {
        SearchTerm::Keyword(term.to_string())
    }

    #[test]
    fn test_cheaper_listing_first_within_group() {
        let records = vec![
            record(VendorId::Digikey, "296-1411-5-ND", "NE555P", "Timer", 1.20),
            record(VendorId::Mouser, "595-NE555P", "NE555P", "Timer", 0.95),
        ];
        let ranked = rank_parts(records, &keyword("NE555P"), 0);
        assert_eq!(ranked[0].unit_price, 0.95);
        assert_eq!(ranked[1].unit_price, 1.20);
    }

    #[test]
    fn test_exact_match_group_outranks_description_match() {
        let records = vec![
            record(VendorId::Mouser, "595-X", "LM358P", "Op amp, works like NE555P", 0.10),
            record(VendorId::Mouser, "595-NE555P", "NE555P", "Timer", 0.95),
        ];
        let ranked = rank_parts(records, &keyword("NE555P"), 0);
        assert_eq!(ranked[0].manufacturer_part_number, "NE555P");
    }

    #[test]
    fn test_prefix_match_outranks_description_match() {
        let records = vec![
            record(VendorId::Mouser, "595-A", "OTHER1", "Kit containing NE555", 0.10),
            record(VendorId::Mouser, "595-B", "NE555PSR", "Timer", 0.95),
        ];
        let ranked = rank_parts(records, &keyword("NE555"), 0);
        assert_eq!(ranked[0].manufacturer_part_number, "NE555PSR");
    }

    #[test]
    fn test_case_insensitive_grouping() {
        let records = vec![
            record(VendorId::Digikey, "A", "ne555p", "Timer", 1.20),
            record(VendorId::Mouser, "B", "NE555P", "Timer", 0.95),
        ];
        let ranked = rank_parts(records, &keyword("NE555P"), 0);
        // One group of two, price-ordered
        assert_eq!(ranked[0].vendor, VendorId::Mouser);
        assert_eq!(ranked[1].vendor, VendorId::Digikey);
    }

    #[test]
    fn test_no_mpn_listings_group_alone() {
        let records = vec![
            record(VendorId::AliExpress, "40012345", "", "10PCS NE555 Timer", 1.20),
            record(VendorId::AliExpress, "40099999", "", "NE555 DIP-8 lot", 0.80),
            record(VendorId::Mouser, "595-NE555P", "NE555P", "Timer", 0.95),
        ];
        let ranked = rank_parts(records, &keyword("NE555P"), 0);
        // Exact-match group first; the marketplace listings keep their own groups
        assert_eq!(ranked[0].manufacturer_part_number, "NE555P");
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_limit_truncates_after_ordering() {
        let records = vec![
            record(VendorId::Digikey, "A", "NE555P", "Timer", 1.20),
            record(VendorId::Mouser, "B", "NE555P", "Timer", 0.95),
            record(VendorId::Octopart, "C", "NE555P", "Timer", 1.50),
        ];
        let ranked = rank_parts(records, &keyword("NE555P"), 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].unit_price, 0.95);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let build = || {
            vec![
                record(VendorId::Octopart, "C", "NE555P", "Timer", 0.95),
                record(VendorId::Mouser, "B", "NE555P", "Timer", 0.95),
                record(VendorId::AliExpress, "40012345", "", "NE555 lot", 1.20),
                record(VendorId::Digikey, "A", "LM358P", "Op amp", 0.30),
            ]
        };
        let first = rank_parts(build(), &keyword("NE555P"), 0);
        let second = rank_parts(build(), &keyword("NE555P"), 0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_equal_price_ties_break_by_vendor() {
        let records = vec![
            record(VendorId::Octopart, "C", "NE555P", "Timer", 0.95),
            record(VendorId::Mouser, "B", "NE555P", "Timer", 0.95),
        ];
        let ranked = rank_parts(records, &keyword("NE555P"), 0);
        assert_eq!(ranked[0].vendor, VendorId::Mouser);
        assert_eq!(ranked[1].vendor, VendorId::Octopart);
    }
}
