//! Provider registry: ranked, thread-safe catalog of providers per category.
//!
//! All state sits behind one lock so that a registration and the chain rebuild it
//! triggers are observed atomically, and an outcome update touches the usage
//! counters and the denormalized record fields together.

use crate::config::CatalogConfig;
use crate::error::ApiError;
use crate::provider::catalog::default_catalog;
use crate::provider::{ProviderCategory, ProviderRecord, QualityTier, UsageStats};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Constraints for picking the best provider of a category.
///
/// Every field except `prefer_feature` is a hard filter. The preference only
/// reorders the survivors and never turns a hit into a miss.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCriteria {
    pub min_quality: f64,
    pub max_cost: Option<f64>,
    pub required_features: Vec<String>,
    pub exclude: Vec<String>,
    pub prefer_feature: Option<String>,
    pub min_duration: Option<u32>,
}

impl SelectionCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_quality(mut self, score: f64) -> Self {
        self.min_quality = score;
        self
    }

    pub fn max_cost(mut self, cost: f64) -> Self {
        self.max_cost = Some(cost);
        self
    }

    pub fn require(mut self, feature: impl Into<String>) -> Self {
        self.required_features.push(feature.into());
        self
    }

    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.push(name.into());
        self
    }

    pub fn prefer(mut self, feature: impl Into<String>) -> Self {
        self.prefer_feature = Some(feature.into());
        self
    }

    pub fn min_duration(mut self, seconds: u32) -> Self {
        self.min_duration = Some(seconds);
        self
    }

    fn admits(&self, record: &ProviderRecord) -> bool {
        record.is_available
            && record.quality_score >= self.min_quality
            && self.max_cost.map_or(true, |max| record.cost_per_unit <= max)
            && self
                .required_features
                .iter()
                .all(|feature| record.supports(feature))
            && !self.exclude.iter().any(|name| name == &record.name)
            && self
                .min_duration
                .map_or(true, |seconds| record.covers_duration(seconds))
    }
}

/// Listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub category: Option<ProviderCategory>,
    pub tier: Option<QualityTier>,
    pub available_only: bool,
}

/// Health view of a single provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub name: String,
    pub category: ProviderCategory,
    pub is_available: bool,
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    pub total_requests: u64,
}

#[derive(Default)]
struct RegistryState {
    providers: HashMap<ProviderCategory, BTreeMap<String, ProviderRecord>>,
    chains: HashMap<ProviderCategory, Vec<String>>,
    usage: HashMap<String, UsageStats>,
}

impl RegistryState {
    fn find(&self, name: &str) -> Option<&ProviderRecord> {
        ProviderCategory::ALL
            .iter()
            .find_map(|category| self.providers.get(category)?.get(name))
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut ProviderRecord> {
        let category = ProviderCategory::ALL.into_iter().find(|category| {
            self.providers
                .get(category)
                .map_or(false, |records| records.contains_key(name))
        })?;
        self.providers.get_mut(&category)?.get_mut(name)
    }

    fn rebuild_chain(&mut self, category: ProviderCategory) {
        let mut ranked: Vec<&ProviderRecord> = self
            .providers
            .get(&category)
            .map(|records| records.values().collect())
            .unwrap_or_default();
        ranked.sort_by(|a, b| rank_order(a, b));
        let chain = ranked.into_iter().map(|record| record.name.clone()).collect();
        self.chains.insert(category, chain);
    }
}

/// Quality descending, ties broken by name ascending.
pub(crate) fn rank_order(a: &ProviderRecord, b: &ProviderRecord) -> Ordering {
    b.quality_score
        .total_cmp(&a.quality_score)
        .then_with(|| a.name.cmp(&b.name))
}

pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Create a registry holding the built-in catalog.
    pub fn with_default_catalog() -> Self {
        let registry = Self::new();
        for record in default_catalog() {
            // Built-in records are statically valid.
            if let Err(err) = registry.register(record) {
                warn!(error = %err, "default_catalog_record_rejected");
            }
        }
        registry
    }

    /// Build a registry from the `[catalog]` configuration section.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, ApiError> {
        let registry = Self::new();
        registry.load_from_config(config)?;
        Ok(registry)
    }

    /// Register configured providers, then apply the disabled list.
    pub fn load_from_config(&self, config: &CatalogConfig) -> Result<(), ApiError> {
        if config.include_defaults {
            for record in default_catalog() {
                self.register(record)?;
            }
        }
        for record in &config.providers {
            self.register(record.clone())?;
        }
        for name in &config.disabled {
            self.set_availability(name, false).map_err(|_| {
                ApiError::ConfigError(format!(
                    "catalog.disabled names unknown provider '{}'",
                    name
                ))
            })?;
        }
        Ok(())
    }

    /// Insert or replace a provider and rebuild its category's fallback chain.
    ///
    /// A name may only live in one category; re-registering it elsewhere is rejected.
    pub fn register(&self, record: ProviderRecord) -> Result<(), ApiError> {
        record.validate().map_err(|reason| ApiError::InvalidProvider {
            name: record.name.clone(),
            reason,
        })?;

        let mut state = self.state.write();
        if let Some(existing) = state.find(&record.name) {
            if existing.category != record.category {
                return Err(ApiError::InvalidProvider {
                    name: record.name.clone(),
                    reason: format!("already registered as a {} provider", existing.category),
                });
            }
        }

        let category = record.category;
        let name = record.name.clone();
        let replaced = state
            .providers
            .entry(category)
            .or_default()
            .insert(name.clone(), record)
            .is_some();
        state.rebuild_chain(category);
        debug!(provider = %name, category = %category, replaced, "provider_registered");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<ProviderRecord> {
        self.state.read().find(name).cloned()
    }

    pub fn get_or_error(&self, name: &str) -> Result<ProviderRecord, ApiError> {
        self.get(name)
            .ok_or_else(|| ApiError::ProviderNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.read().find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .providers
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest-ranked provider satisfying every hard filter, or `None`.
    pub fn best(
        &self,
        category: ProviderCategory,
        criteria: &SelectionCriteria,
    ) -> Option<ProviderRecord> {
        let state = self.state.read();
        let mut candidates: Vec<&ProviderRecord> = state
            .providers
            .get(&category)?
            .values()
            .filter(|record| criteria.admits(record))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        if let Some(feature) = &criteria.prefer_feature {
            let preferred: Vec<&ProviderRecord> = candidates
                .iter()
                .copied()
                .filter(|record| record.supports(feature))
                .collect();
            if !preferred.is_empty() {
                candidates = preferred;
            }
        }

        candidates
            .into_iter()
            .min_by(|a, b| rank_order(a, b))
            .cloned()
    }

    /// Ordered provider names to try for a category.
    ///
    /// When `primary` is a registered member of the category it leads the chain,
    /// followed by the remaining members in ranking order. Availability is not
    /// filtered here; the fallback executor skips unavailable entries as it walks.
    pub fn fallback_chain(&self, category: ProviderCategory, primary: Option<&str>) -> Vec<String> {
        let state = self.state.read();
        let chain = state.chains.get(&category).cloned().unwrap_or_default();
        match primary {
            Some(primary) if chain.iter().any(|name| name == primary) => {
                let mut ordered = Vec::with_capacity(chain.len());
                ordered.push(primary.to_string());
                ordered.extend(chain.into_iter().filter(|name| name != primary));
                ordered
            }
            _ => chain,
        }
    }

    /// Full chain of every category.
    pub fn fallback_chains(&self) -> BTreeMap<ProviderCategory, Vec<String>> {
        let state = self.state.read();
        ProviderCategory::ALL
            .into_iter()
            .map(|category| {
                (
                    category,
                    state.chains.get(&category).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Fold one provider attempt into its usage stats and denormalized health fields.
    pub fn record_outcome(
        &self,
        name: &str,
        latency_ms: f64,
        success: bool,
        cost: f64,
    ) -> Result<(), ApiError> {
        let mut state = self.state.write();
        if state.find(name).is_none() {
            return Err(ApiError::ProviderNotFound(name.to_string()));
        }
        let stats = {
            let stats = state.usage.entry(name.to_string()).or_default();
            stats.record(latency_ms, success, cost);
            stats.clone()
        };
        if let Some(record) = state.find_mut(name) {
            record.success_rate = stats.success_rate();
            record.avg_latency_ms = Some(stats.avg_latency_ms);
            record.last_checked = Some(Utc::now());
        }
        debug!(
            provider = name,
            success,
            latency_ms,
            total_requests = stats.total_requests,
            "provider_outcome_recorded"
        );
        Ok(())
    }

    /// Administrative availability override. Chains keep their membership; the
    /// flag only decides whether selection and execution consider the provider.
    pub fn set_availability(&self, name: &str, available: bool) -> Result<(), ApiError> {
        let mut state = self.state.write();
        let record = state
            .find_mut(name)
            .ok_or_else(|| ApiError::ProviderNotFound(name.to_string()))?;
        if record.is_available != available {
            record.is_available = available;
            info!(provider = name, available, "provider_availability_changed");
        }
        Ok(())
    }

    /// Records matching the filter, in ranking order within each category.
    pub fn list(&self, filter: &ListFilter) -> Vec<ProviderRecord> {
        let state = self.state.read();
        let categories: Vec<ProviderCategory> = match filter.category {
            Some(category) => vec![category],
            None => ProviderCategory::ALL.to_vec(),
        };
        let mut listed = Vec::new();
        for category in categories {
            let Some(records) = state.providers.get(&category) else {
                continue;
            };
            let mut matching: Vec<&ProviderRecord> = records
                .values()
                .filter(|record| filter.tier.map_or(true, |tier| record.quality_tier == tier))
                .filter(|record| !filter.available_only || record.is_available)
                .collect();
            matching.sort_by(|a, b| rank_order(a, b));
            listed.extend(matching.into_iter().cloned());
        }
        listed
    }

    pub fn health(&self, name: &str) -> Result<ProviderHealth, ApiError> {
        let state = self.state.read();
        let record = state
            .find(name)
            .ok_or_else(|| ApiError::ProviderNotFound(name.to_string()))?;
        let total_requests = state
            .usage
            .get(name)
            .map_or(0, |stats| stats.total_requests);
        Ok(ProviderHealth {
            name: record.name.clone(),
            category: record.category,
            is_available: record.is_available,
            success_rate: record.success_rate,
            avg_latency_ms: record.avg_latency_ms,
            last_checked: record.last_checked,
            total_requests,
        })
    }

    /// Usage counters for one provider; zeroed when it was never attempted.
    pub fn usage_stats(&self, name: &str) -> Result<UsageStats, ApiError> {
        let state = self.state.read();
        if state.find(name).is_none() {
            return Err(ApiError::ProviderNotFound(name.to_string()));
        }
        Ok(state.usage.get(name).cloned().unwrap_or_default())
    }

    /// Usage counters of every provider that has been attempted at least once.
    pub fn all_usage_stats(&self) -> BTreeMap<String, UsageStats> {
        self.state
            .read()
            .usage
            .iter()
            .map(|(name, stats)| (name.clone(), stats.clone()))
            .collect()
    }
}
