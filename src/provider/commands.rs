use crate::error::ApiError;
use crate::provider::registry::ListFilter;
use crate::provider::{
    ProviderCategory, ProviderHealth, ProviderRecord, ProviderRegistry, QualityTier, UsageStats,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub struct ProviderCommandService;

/// Result of provider list command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderListResult {
    pub providers: Vec<ProviderRecord>,
}

/// Result of provider show: record, live health and where it sits in its chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderShowResult {
    pub record: ProviderRecord,
    pub health: ProviderHealth,
    pub usage: UsageStats,
    /// 1-based position in the category fallback chain.
    pub chain_position: Option<usize>,
}

/// Result of provider chains command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderChainsResult {
    pub chains: BTreeMap<ProviderCategory, Vec<String>>,
}

/// Result of provider stats command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatsResult {
    pub stats: BTreeMap<String, UsageStats>,
}

/// One row of a side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub name: String,
    pub category: ProviderCategory,
    pub quality_tier: QualityTier,
    pub quality_score: f64,
    /// Rounded to cents.
    pub estimated_cost: f64,
    pub max_duration: Option<u32>,
    pub supports_audio: bool,
    pub success_rate: f64,
    pub features: Vec<String>,
}

/// Result of provider compare command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderComparison {
    pub entries: Vec<ComparisonEntry>,
    /// Names that matched no registered provider.
    pub unknown: Vec<String>,
    pub best_quality: Option<String>,
    pub best_value: Option<String>,
}

impl ProviderCommandService {
    pub fn parse_category(value: &str) -> Result<ProviderCategory, ApiError> {
        value.parse().map_err(ApiError::InvalidRequest)
    }

    pub fn parse_tier(value: &str) -> Result<QualityTier, ApiError> {
        value.parse().map_err(ApiError::InvalidRequest)
    }

    pub fn run_list(
        registry: &ProviderRegistry,
        category: Option<&str>,
        tier: Option<&str>,
        available_only: bool,
    ) -> Result<ProviderListResult, ApiError> {
        let filter = ListFilter {
            category: category.map(Self::parse_category).transpose()?,
            tier: tier.map(Self::parse_tier).transpose()?,
            available_only,
        };
        Ok(ProviderListResult {
            providers: registry.list(&filter),
        })
    }

    pub fn run_show(registry: &ProviderRegistry, name: &str) -> Result<ProviderShowResult, ApiError> {
        let record = registry.get_or_error(name)?;
        let health = registry.health(name)?;
        let usage = registry.usage_stats(name)?;
        let chain_position = registry
            .fallback_chain(record.category, None)
            .iter()
            .position(|member| member == name)
            .map(|index| index + 1);
        Ok(ProviderShowResult {
            record,
            health,
            usage,
            chain_position,
        })
    }

    pub fn run_chains(registry: &ProviderRegistry) -> ProviderChainsResult {
        ProviderChainsResult {
            chains: registry.fallback_chains(),
        }
    }

    pub fn run_stats(
        registry: &ProviderRegistry,
        name: Option<&str>,
    ) -> Result<ProviderStatsResult, ApiError> {
        let stats = match name {
            Some(name) => {
                let mut single = BTreeMap::new();
                single.insert(name.to_string(), registry.usage_stats(name)?);
                single
            }
            None => registry.all_usage_stats(),
        };
        Ok(ProviderStatsResult { stats })
    }

    /// Compare providers by quality and estimated cost for one job of
    /// `duration_secs` seconds narrated from `prompt_chars` characters.
    pub fn run_compare(
        registry: &ProviderRegistry,
        names: &[String],
        duration_secs: u32,
        prompt_chars: usize,
    ) -> ProviderComparison {
        let mut entries = Vec::new();
        let mut unknown = Vec::new();
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let Some(record) = registry.get(name) else {
                unknown.push(name.to_string());
                continue;
            };
            let quantity = record.category.billed_quantity(duration_secs, prompt_chars);
            entries.push(ComparisonEntry {
                estimated_cost: round_cents(record.estimated_cost(quantity)),
                supports_audio: record.supports_audio(),
                features: record.features.iter().cloned().collect(),
                name: record.name,
                category: record.category,
                quality_tier: record.quality_tier,
                quality_score: record.quality_score,
                max_duration: record.max_duration,
                success_rate: record.success_rate,
            });
        }
        entries.sort_by(|a, b| {
            b.quality_score
                .total_cmp(&a.quality_score)
                .then_with(|| a.name.cmp(&b.name))
        });

        let best_quality = entries.first().map(|entry| entry.name.clone());
        // First minimum wins, so equal prices favour the higher quality.
        let best_value = entries
            .iter()
            .fold(None::<&ComparisonEntry>, |best, entry| match best {
                Some(current) if current.estimated_cost <= entry.estimated_cost => Some(current),
                _ => Some(entry),
            })
            .map(|entry| entry.name.clone());

        ProviderComparison {
            entries,
            unknown,
            best_quality,
            best_value,
        }
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
