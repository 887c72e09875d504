//! Advertising campaigns
//!
//! There is no campaign table yet, so this service serves a fixed demo
//! dataset. Daily metrics are randomised on every call.

use chrono::{Days, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdPlatform {
    Facebook,
    Google,
    Tiktok,
    Instagram,
    Youtube,
}

impl AdPlatform {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "facebook" => Some(Self::Facebook),
            "google" => Some(Self::Google),
            "tiktok" => Some(Self::Tiktok),
            "instagram" => Some(Self::Instagram),
            "youtube" => Some(Self::Youtube),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
    Draft,
}

impl CampaignStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCampaign {
    pub id: i64,
    pub name: String,
    pub platform: AdPlatform,
    pub status: CampaignStatus,
    pub start_date: String,
    pub end_date: String,
    pub budget: f64,
    pub spent: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub roas: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdMetrics {
    pub total_spend: f64,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    #[serde(rename = "averageCTR")]
    pub average_ctr: f64,
    #[serde(rename = "averageCPC")]
    pub average_cpc: f64,
    #[serde(rename = "averageCPM")]
    pub average_cpm: f64,
    #[serde(rename = "averageROAS")]
    pub average_roas: f64,
    #[serde(rename = "averageROI")]
    pub average_roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    pub platform: String,
    pub campaigns: i64,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    #[serde(rename = "avgCTR")]
    pub avg_ctr: f64,
    #[serde(rename = "avgCPC")]
    pub avg_cpc: f64,
    #[serde(rename = "avgROAS")]
    pub avg_roas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: String,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub ctr: f64,
    pub roas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicMetrics {
    pub country: String,
    pub region: String,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
}

/// Empty lists match everything
#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub platforms: Vec<AdPlatform>,
    pub statuses: Vec<CampaignStatus>,
}

impl CampaignFilter {
    fn matches(&self, campaign: &AdCampaign) -> bool {
        (self.platforms.is_empty() || self.platforms.contains(&campaign.platform))
            && (self.statuses.is_empty() || self.statuses.contains(&campaign.status))
    }
}

#[derive(Debug, Clone)]
pub struct AdService {
    campaigns: Vec<AdCampaign>,
}

impl Default for AdService {
    fn default() -> Self {
        Self::new()
    }
}

impl AdService {
    pub fn new() -> Self {
        Self {
            campaigns: demo_campaigns(),
        }
    }

    pub fn campaigns(&self, filter: &CampaignFilter) -> Vec<AdCampaign> {
        self.campaigns.iter().filter(|c| filter.matches(c)).cloned().collect()
    }

    pub fn campaign(&self, id: i64) -> Option<AdCampaign> {
        self.campaigns.iter().find(|c| c.id == id).cloned()
    }

    pub fn metrics(&self) -> AdMetrics {
        AdMetrics {
            total_spend: 125_420.50,
            total_impressions: 8_542_300,
            total_clicks: 68_338,
            total_conversions: 3_417,
            average_ctr: 0.8,
            average_cpc: 1.84,
            average_cpm: 14.68,
            average_roas: 4.2,
            average_roi: 320.0,
        }
    }

    pub fn platform_metrics(&self) -> Vec<PlatformMetrics> {
        let platform = |name: &str, campaigns, spend, impressions, clicks, conversions, ctr, cpc, roas| {
            PlatformMetrics {
                platform: name.to_string(),
                campaigns,
                spend,
                impressions,
                clicks,
                conversions,
                avg_ctr: ctr,
                avg_cpc: cpc,
                avg_roas: roas,
            }
        };
        vec![
            platform("Facebook", 8, 45_200.0, 3_200_000, 28_500, 1_425, 0.89, 1.59, 4.3),
            platform("Google", 6, 38_500.0, 2_800_000, 24_200, 1_210, 0.86, 1.59, 4.8),
            platform("TikTok", 5, 28_900.0, 1_850_000, 12_500, 625, 0.68, 2.31, 3.8),
            platform("Instagram", 4, 12_820.0, 692_300, 3_138, 157, 0.45, 4.08, 2.9),
        ]
    }

    /// One randomised row per day, oldest first, ending today (UTC)
    pub fn daily_metrics(&self, days: u32) -> Vec<DailyMetrics> {
        let today = Utc::now().date_naive();
        let mut rng = rand::rng();

        (0..days)
            .rev()
            .filter_map(|ago| today.checked_sub_days(Days::new(u64::from(ago))))
            .map(|date| DailyMetrics {
                date: date.format("%Y-%m-%d").to_string(),
                spend: rng.random::<f64>() * 5000.0 + 2000.0,
                impressions: rng.random_range(100_000..400_000),
                clicks: rng.random_range(1_000..4_000),
                conversions: rng.random_range(50..250),
                ctr: rng.random::<f64>() * 0.5 + 0.5,
                roas: rng.random::<f64>() * 3.0 + 2.0,
            })
            .collect()
    }

    pub fn geographic_metrics(&self) -> Vec<GeographicMetrics> {
        let country = |name: &str, region: &str, impressions, clicks, conversions, spend, ctr| GeographicMetrics {
            country: name.to_string(),
            region: region.to_string(),
            impressions,
            clicks,
            conversions,
            spend,
            ctr,
            conversion_rate: 5.0,
        };
        vec![
            country("United States", "North America", 3_500_000, 31_500, 1_575, 47_250.0, 0.9),
            country("United Kingdom", "Europe", 1_200_000, 9_600, 480, 14_400.0, 0.8),
            country("Canada", "North America", 800_000, 6_400, 320, 9_600.0, 0.8),
            country("Australia", "Oceania", 600_000, 4_200, 210, 6_300.0, 0.7),
        ]
    }
}

#[allow(clippy::too_many_arguments)]
fn campaign(
    id: i64,
    name: &str,
    platform: AdPlatform,
    status: CampaignStatus,
    dates: (&str, &str),
    budget: f64,
    spent: f64,
    impressions: i64,
    clicks: i64,
    conversions: i64,
    rates: [f64; 5],
) -> AdCampaign {
    let [ctr, cpc, cpm, roas, roi] = rates;
    AdCampaign {
        id,
        name: name.to_string(),
        platform,
        status,
        start_date: dates.0.to_string(),
        end_date: dates.1.to_string(),
        budget,
        spent,
        impressions,
        clicks,
        conversions,
        ctr,
        cpc,
        cpm,
        roas,
        roi,
    }
}

fn demo_campaigns() -> Vec<AdCampaign> {
    use AdPlatform::*;
    use CampaignStatus::*;
    vec![
        campaign(
            1,
            "Summer Sale 2024",
            Facebook,
            Active,
            ("2024-06-01", "2024-08-31"),
            50_000.0,
            32_450.25,
            2_150_000,
            18_200,
            910,
            [0.85, 1.78, 15.09, 4.5, 350.0],
        ),
        campaign(
            2,
            "Product Launch Campaign",
            Google,
            Active,
            ("2024-07-15", "2024-09-15"),
            75_000.0,
            45_680.75,
            3_200_000,
            28_400,
            1_420,
            [0.89, 1.61, 14.28, 5.2, 420.0],
        ),
        campaign(
            3,
            "TikTok Influencer Campaign",
            Tiktok,
            Completed,
            ("2024-05-01", "2024-06-30"),
            30_000.0,
            28_900.50,
            1_850_000,
            12_500,
            625,
            [0.68, 2.31, 15.62, 3.8, 280.0],
        ),
        campaign(
            4,
            "Instagram Stories Ads",
            Instagram,
            Active,
            ("2024-08-01", "2024-10-31"),
            40_000.0,
            18_390.00,
            1_342_300,
            9_238,
            462,
            [0.69, 1.99, 13.70, 3.5, 250.0],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_filters() {
        let ads = AdService::new();
        assert_eq!(ads.campaigns(&CampaignFilter::default()).len(), 4);

        let active = CampaignFilter {
            statuses: vec![CampaignStatus::Active],
            ..Default::default()
        };
        assert_eq!(ads.campaigns(&active).len(), 3);

        let google_completed = CampaignFilter {
            platforms: vec![AdPlatform::Google],
            statuses: vec![CampaignStatus::Completed],
        };
        assert!(ads.campaigns(&google_completed).is_empty());
    }

    #[test]
    fn test_campaign_lookup_and_wire_names() {
        let ads = AdService::new();
        let campaign = ads.campaign(3).unwrap();
        assert_eq!(campaign.platform, AdPlatform::Tiktok);
        assert!(ads.campaign(99).is_none());

        let json = serde_json::to_value(&campaign).unwrap();
        assert_eq!(json["platform"], "tiktok");
        assert_eq!(json["startDate"], "2024-05-01");

        let metrics = serde_json::to_value(ads.metrics()).unwrap();
        assert_eq!(metrics["averageROAS"], 4.2);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(AdPlatform::parse("TikTok"), Some(AdPlatform::Tiktok));
        assert_eq!(CampaignStatus::parse(" Paused "), Some(CampaignStatus::Paused));
        assert_eq!(AdPlatform::parse("myspace"), None);
    }

    #[test]
    fn test_daily_metrics_ranges() {
        let days = AdService::new().daily_metrics(7);
        assert_eq!(days.len(), 7);
        assert_eq!(days[6].date, Utc::now().date_naive().format("%Y-%m-%d").to_string());
        for day in &days {
            assert!((2000.0..7000.0).contains(&day.spend));
            assert!((100_000..400_000).contains(&day.impressions));
            assert!((0.5..1.0).contains(&day.ctr));
            assert!((2.0..5.0).contains(&day.roas));
        }
        assert!(AdService::new().daily_metrics(0).is_empty());
    }

    #[test]
    fn test_platform_and_geographic_metrics() {
        let ads = AdService::new();
        assert_eq!(ads.platform_metrics().len(), 4);
        let spend: f64 = ads.geographic_metrics().iter().map(|g| g.spend).sum();
        assert_eq!(spend, 77_550.0);
    }
}
