use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RadarError, RadarResult};

/// The five analytical lenses every report has to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrivingForce {
    #[serde(rename = "能源與物理約束")]
    Energy,
    #[serde(rename = "勞動力與自動化")]
    Labor,
    #[serde(rename = "地緣政治離婚")]
    Geopolitics,
    #[serde(rename = "數位化實體資產")]
    Assets,
    #[serde(rename = "智能代理化")]
    Agency,
}

impl DrivingForce {
    pub const ALL: [DrivingForce; 5] = [
        DrivingForce::Energy,
        DrivingForce::Labor,
        DrivingForce::Geopolitics,
        DrivingForce::Assets,
        DrivingForce::Agency,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DrivingForce::Energy => "能源與物理約束",
            DrivingForce::Labor => "勞動力與自動化",
            DrivingForce::Geopolitics => "地緣政治離婚",
            DrivingForce::Assets => "數位化實體資產",
            DrivingForce::Agency => "智能代理化",
        }
    }
}

impl fmt::Display for DrivingForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceDetail {
    pub description: String,
    pub detailed_analysis: String,
    pub empirical_data: String,
    pub future_path: String,
}

/// One entry per driving force. Unknown keys are rejected so a payload
/// can only carry exactly the five categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Forces {
    #[serde(rename = "能源與物理約束")]
    pub energy: ForceDetail,
    #[serde(rename = "勞動力與自動化")]
    pub labor: ForceDetail,
    #[serde(rename = "地緣政治離婚")]
    pub geopolitics: ForceDetail,
    #[serde(rename = "數位化實體資產")]
    pub assets: ForceDetail,
    #[serde(rename = "智能代理化")]
    pub agency: ForceDetail,
}

impl Forces {
    pub fn get(&self, force: DrivingForce) -> &ForceDetail {
        match force {
            DrivingForce::Energy => &self.energy,
            DrivingForce::Labor => &self.labor,
            DrivingForce::Geopolitics => &self.geopolitics,
            DrivingForce::Assets => &self.assets,
            DrivingForce::Agency => &self.agency,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DrivingForce, &ForceDetail)> + '_ {
        DrivingForce::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inversion {
    pub falsification: String,
    pub physical_limits: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSuggestion {
    pub ticker: String,
    pub name: String,
    pub logic: String,
    pub risk: String,
    /// 1 (low) to 5 (high)
    pub risk_level: u8,
    pub correlated_force: DrivingForce,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentAnalysis {
    pub taiwan_stocks: Vec<StockSuggestion>,
    pub us_stocks: Vec<StockSuggestion>,
    pub strategic_summary: String,
}

impl InvestmentAnalysis {
    /// Every `riskLevel` must sit in 1-5.
    pub fn validate(&self) -> RadarResult<()> {
        let markets = [("taiwanStocks", &self.taiwan_stocks), ("usStocks", &self.us_stocks)];
        for (market, stocks) in markets {
            for (i, stock) in stocks.iter().enumerate() {
                if !(1..=5).contains(&stock.risk_level) {
                    return Err(RadarError::schema(
                        format!("investments.{}[{}].riskLevel", market, i),
                        format!("{} is outside 1-5", stock.risk_level),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn for_market(&self, market: Market) -> &[StockSuggestion] {
        match market {
            Market::Taiwan => &self.taiwan_stocks,
            Market::Us => &self.us_stocks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Market {
    #[default]
    Taiwan,
    Us,
}

impl Market {
    pub const ALL: [Market; 2] = [Market::Taiwan, Market::Us];

    pub fn label(&self) -> &'static str {
        match self {
            Market::Taiwan => "台股",
            Market::Us => "美股",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFreshness {
    /// 1-10
    pub score: u8,
    pub reason: String,
    pub last_updated_info: String,
}

impl DataFreshness {
    pub fn validate(&self) -> RadarResult<()> {
        if !(1..=10).contains(&self.score) {
            return Err(RadarError::schema(
                "dataFreshness.score",
                format!("{} is outside 1-10", self.score),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub thought: String,
    pub forces: Forces,
    pub inversion: Inversion,
    pub investments: InvestmentAnalysis,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
    pub timestamp: DateTime<Utc>,
    pub data_freshness: DataFreshness,
}

impl AnalysisReport {
    /// Range checks serde cannot express. Applied to fresh replies and to
    /// anything restored from storage.
    pub fn validate(&self) -> RadarResult<()> {
        self.data_freshness.validate()?;
        self.investments.validate()
    }
}
