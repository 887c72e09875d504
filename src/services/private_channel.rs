//! Private-channel analytics: EDM, LinkedIn, Shopify, WhatsApp and customer lifecycle
//!
//! Backed by a fixed demo dataset until the channel exports land in the database.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use store_object::query_builder::{total_pages, PageRequest};

/// Page size used when the client does not send `limit`
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Edm,
    Linkedin,
    Shopify,
    Whatsapp,
    Lifecycle,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Edm,
        Channel::Linkedin,
        Channel::Shopify,
        Channel::Whatsapp,
        Channel::Lifecycle,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Edm => "edm",
            Channel::Linkedin => "linkedin",
            Channel::Shopify => "shopify",
            Channel::Whatsapp => "whatsapp",
            Channel::Lifecycle => "lifecycle",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date window and page for a channel listing. Bounds are inclusive.
#[derive(Debug, Clone, Copy)]
pub struct ChannelQuery {
    pub page: PageRequest,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Default for ChannelQuery {
    fn default() -> Self {
        Self {
            page: PageRequest::clamped(None, Some(DEFAULT_LIMIT)),
            date_from: None,
            date_to: None,
        }
    }
}

impl ChannelQuery {
    fn in_window(&self, date: &str) -> bool {
        let Ok(date) = date.parse::<NaiveDate>() else {
            return false;
        };
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPage<T> {
    pub data: Vec<T>,
    pub pagination: ChannelPagination,
}

/// Rows that carry the date they were recorded on
trait Dated {
    fn date(&self) -> &str;
}

fn paginate<T: Dated + Clone>(rows: &[T], query: &ChannelQuery) -> ChannelPage<T> {
    let matching: Vec<T> = rows.iter().filter(|r| query.in_window(r.date())).cloned().collect();
    let total = matching.len() as i64;
    let limit = query.page.page_size();
    ChannelPage {
        data: query.page.slice(&matching),
        pagination: ChannelPagination {
            page: query.page.page(),
            limit,
            total,
            total_pages: total_pages(total, limit),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdmCampaign {
    pub id: i64,
    pub campaign_name: String,
    pub sent_date: String,
    pub total_sent: i64,
    pub opens: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub conversion_rate: f64,
    pub revenue: f64,
}

impl Dated for EdmCampaign {
    fn date(&self) -> &str {
        &self.sent_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedInPost {
    pub id: i64,
    pub post_date: String,
    pub post_type: String,
    pub impressions: i64,
    pub engagements: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub engagement_rate: f64,
    pub follower_count: i64,
    pub follower_growth: i64,
}

impl Dated for LinkedInPost {
    fn date(&self) -> &str {
        &self.post_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopifyDay {
    pub id: i64,
    pub date: String,
    pub store_name: String,
    pub sessions: i64,
    pub unique_visitors: i64,
    pub page_views: i64,
    pub add_to_carts: i64,
    pub checkouts: i64,
    pub purchases: i64,
    pub conversion_rate: f64,
    pub average_order_value: f64,
    pub revenue: f64,
}

impl Dated for ShopifyDay {
    fn date(&self) -> &str {
        &self.date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppCampaign {
    pub id: i64,
    pub campaign_name: String,
    pub sent_date: String,
    pub total_sent: i64,
    pub delivered: i64,
    pub read: i64,
    pub replied: i64,
    pub delivery_rate: f64,
    pub read_rate: f64,
    pub reply_rate: f64,
    pub conversions: i64,
    pub revenue: f64,
}

impl Dated for WhatsAppCampaign {
    fn date(&self) -> &str {
        &self.sent_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub id: i64,
    pub customer_segment: String,
    pub total_customers: i64,
    pub new_customers: i64,
    pub active_customers: i64,
    pub at_risk_customers: i64,
    pub churned_customers: i64,
    pub retention_rate: f64,
    pub lifetime_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel: String,
    pub total_reach: i64,
    pub total_engagement: i64,
    pub total_conversions: i64,
    pub total_revenue: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: String,
    pub value: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct PrivateChannelService {
    edm: Vec<EdmCampaign>,
    linkedin: Vec<LinkedInPost>,
    shopify: Vec<ShopifyDay>,
    whatsapp: Vec<WhatsAppCampaign>,
    lifecycle: Vec<CustomerSegment>,
}

impl Default for PrivateChannelService {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivateChannelService {
    pub fn new() -> Self {
        Self {
            edm: demo::edm(),
            linkedin: demo::linkedin(),
            shopify: demo::shopify(),
            whatsapp: demo::whatsapp(),
            lifecycle: demo::lifecycle(),
        }
    }

    pub fn edm_campaigns(&self, query: &ChannelQuery) -> ChannelPage<EdmCampaign> {
        paginate(&self.edm, query)
    }

    pub fn linkedin_posts(&self, query: &ChannelQuery) -> ChannelPage<LinkedInPost> {
        paginate(&self.linkedin, query)
    }

    pub fn shopify_days(&self, query: &ChannelQuery) -> ChannelPage<ShopifyDay> {
        paginate(&self.shopify, query)
    }

    pub fn whatsapp_campaigns(&self, query: &ChannelQuery) -> ChannelPage<WhatsAppCampaign> {
        paginate(&self.whatsapp, query)
    }

    /// Lifecycle segments are snapshots, so only paging applies
    pub fn lifecycle(&self, query: &ChannelQuery) -> ChannelPage<CustomerSegment> {
        let total = self.lifecycle.len() as i64;
        let limit = query.page.page_size();
        ChannelPage {
            data: query.page.slice(&self.lifecycle),
            pagination: ChannelPagination {
                page: query.page.page(),
                limit,
                total,
                total_pages: total_pages(total, limit),
            },
        }
    }

    pub fn channel_stats(&self) -> Vec<ChannelStats> {
        let stats = |channel: &str, reach, engagement, conversions, revenue, growth| ChannelStats {
            channel: channel.to_string(),
            total_reach: reach,
            total_engagement: engagement,
            total_conversions: conversions,
            total_revenue: revenue,
            growth_rate: growth,
        };
        vec![
            stats("EDM", 50_000, 13_710, 769, 217_300.0, 15.5),
            stats("LinkedIn", 22_500, 1_680, 120, 36_000.0, 22.3),
            stats("Shopify", 10_000, 3_500, 370, 56_350.0, 18.7),
            stats("WeChat", 15_000, 4_500, 225, 45_000.0, 25.0),
        ]
    }

    pub fn conversion_funnel(&self) -> Vec<FunnelStage> {
        [
            ("Website Visits", 10_000, 100.0),
            ("Product Views", 6_500, 65.0),
            ("Add to Cart", 2_500, 25.0),
            ("Checkout", 1_500, 15.0),
            ("Purchase", 1_200, 12.0),
            ("Repeat Purchase", 360, 3.6),
        ]
        .into_iter()
        .map(|(stage, value, percentage)| FunnelStage {
            stage: stage.to_string(),
            value,
            percentage,
        })
        .collect()
    }
}

mod demo {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    fn edm_row(
        id: i64,
        name: &str,
        sent_date: &str,
        total_sent: i64,
        opens: i64,
        clicks: i64,
        conversions: i64,
        rates: (f64, f64, f64),
        revenue: f64,
    ) -> EdmCampaign {
        EdmCampaign {
            id,
            campaign_name: name.to_string(),
            sent_date: sent_date.to_string(),
            total_sent,
            opens,
            clicks,
            conversions,
            open_rate: rates.0,
            click_rate: rates.1,
            conversion_rate: rates.2,
            revenue,
        }
    }

    pub(super) fn edm() -> Vec<EdmCampaign> {
        vec![
            edm_row(1, "Holiday Sale 2024", "2024-12-15", 10_000, 3_500, 1_200, 150, (35.0, 12.0, 1.5), 45_000.0),
            edm_row(2, "New Product Launch", "2024-12-10", 8_000, 3_200, 960, 120, (40.0, 12.0, 1.5), 36_000.0),
            edm_row(3, "Black Friday Special", "2024-11-24", 15_000, 6_000, 2_100, 315, (40.0, 14.0, 2.1), 94_500.0),
            edm_row(4, "Customer Retention", "2024-11-15", 5_000, 2_250, 750, 100, (45.0, 15.0, 2.0), 25_000.0),
            edm_row(5, "Weekly Newsletter", "2024-12-20", 12_000, 4_200, 840, 84, (35.0, 7.0, 0.7), 16_800.0),
        ]
    }

    pub(super) fn linkedin() -> Vec<LinkedInPost> {
        let post = |id, date: &str, kind: &str, impressions, engagements, reactions: [i64; 3], rate, followers, growth| {
            let [likes, comments, shares] = reactions;
            LinkedInPost {
                id,
                post_date: date.to_string(),
                post_type: kind.to_string(),
                impressions,
                engagements,
                likes,
                comments,
                shares,
                engagement_rate: rate,
                follower_count: followers,
                follower_growth: growth,
            }
        };
        vec![
            post(1, "2024-12-20", "article", 5_000, 350, [200, 50, 100], 7.0, 15_000, 150),
            post(2, "2024-12-18", "video", 8_000, 640, [400, 80, 160], 8.0, 14_850, 120),
            post(3, "2024-12-15", "image", 3_500, 210, [150, 30, 30], 6.0, 14_730, 80),
            post(4, "2024-12-12", "poll", 6_000, 480, [300, 120, 60], 8.0, 14_650, 100),
        ]
    }

    pub(super) fn shopify() -> Vec<ShopifyDay> {
        let day = |id, date: &str, traffic: [i64; 3], funnel: [i64; 3], rate, aov, revenue| {
            let [sessions, unique_visitors, page_views] = traffic;
            let [add_to_carts, checkouts, purchases] = funnel;
            ShopifyDay {
                id,
                date: date.to_string(),
                store_name: "Main Store".to_string(),
                sessions,
                unique_visitors,
                page_views,
                add_to_carts,
                checkouts,
                purchases,
                conversion_rate: rate,
                average_order_value: aov,
                revenue,
            }
        };
        vec![
            day(1, "2024-12-20", [2_500, 2_000, 7_500], [300, 150, 120], 4.8, 150.0, 18_000.0),
            day(2, "2024-12-19", [2_300, 1_840, 6_900], [276, 138, 110], 4.78, 145.0, 15_950.0),
            day(3, "2024-12-18", [2_800, 2_240, 8_400], [350, 175, 140], 5.0, 160.0, 22_400.0),
        ]
    }

    pub(super) fn whatsapp() -> Vec<WhatsAppCampaign> {
        let campaign = |id, name: &str, date: &str, sent: i64, delivered: i64, read: i64, replied: i64, conversions, revenue| {
            let rate = |part: i64, whole: i64| (part as f64 / whole as f64 * 1000.0).round() / 10.0;
            WhatsAppCampaign {
                id,
                campaign_name: name.to_string(),
                sent_date: date.to_string(),
                total_sent: sent,
                delivered,
                read,
                replied,
                delivery_rate: rate(delivered, sent),
                read_rate: rate(read, delivered),
                reply_rate: rate(replied, read),
                conversions,
                revenue,
            }
        };
        vec![
            campaign(1, "Order Follow-up", "2024-12-18", 4_000, 3_880, 3_300, 660, 132, 19_800.0),
            campaign(2, "VIP Early Access", "2024-12-05", 1_500, 1_470, 1_320, 400, 96, 24_000.0),
            campaign(3, "Cart Reminder", "2024-11-28", 2_500, 2_400, 1_920, 290, 58, 8_700.0),
        ]
    }

    pub(super) fn lifecycle() -> Vec<CustomerSegment> {
        let segment = |id, name: &str, counts: [i64; 5], retention, ltv| {
            let [total, new, active, at_risk, churned] = counts;
            CustomerSegment {
                id,
                customer_segment: name.to_string(),
                total_customers: total,
                new_customers: new,
                active_customers: active,
                at_risk_customers: at_risk,
                churned_customers: churned,
                retention_rate: retention,
                lifetime_value: ltv,
            }
        };
        vec![
            segment(1, "New Customers", [2_500, 2_500, 2_000, 300, 200], 92.0, 500.0),
            segment(2, "Active Customers", [8_000, 0, 8_000, 500, 100], 98.75, 1_200.0),
            segment(3, "VIP Customers", [1_500, 50, 1_450, 30, 20], 98.67, 3_500.0),
            segment(4, "At Risk", [1_000, 0, 400, 600, 0], 40.0, 800.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> Option<NaiveDate> {
        Some(value.parse().unwrap())
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(Channel::parse("EDM"), Some(Channel::Edm));
        assert_eq!(Channel::parse("whatsapp"), Some(Channel::Whatsapp));
        assert_eq!(Channel::parse("fax"), None);
        assert_eq!(Channel::Linkedin.to_string(), "linkedin");
    }

    #[test]
    fn test_date_window_is_inclusive() {
        let channels = PrivateChannelService::new();
        let query = ChannelQuery {
            date_from: date("2024-12-10"),
            date_to: date("2024-12-15"),
            ..Default::default()
        };
        let page = channels.edm_campaigns(&query);

        let names: Vec<&str> = page.data.iter().map(|c| c.campaign_name.as_str()).collect();
        assert_eq!(names, vec!["Holiday Sale 2024", "New Product Launch"]);
        assert_eq!(page.pagination.total, 2);

        let linkedin = channels.linkedin_posts(&ChannelQuery {
            date_from: date("2024-12-18"),
            ..Default::default()
        });
        assert_eq!(linkedin.pagination.total, 2);
    }

    #[test]
    fn test_page_and_limit() {
        let channels = PrivateChannelService::new();
        let query = ChannelQuery {
            page: PageRequest::new(2, 2).unwrap(),
            ..Default::default()
        };
        let page = channels.edm_campaigns(&query);

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].id, 3);
        assert_eq!(
            page.pagination,
            ChannelPagination {
                page: 2,
                limit: 2,
                total: 5,
                total_pages: 3
            }
        );

        let past_end = ChannelQuery {
            page: PageRequest::new(9, 10).unwrap(),
            ..Default::default()
        };
        assert!(channels.shopify_days(&past_end).data.is_empty());
    }

    #[test]
    fn test_default_limit_and_json_shape() {
        let channels = PrivateChannelService::new();
        let page = channels.whatsapp_campaigns(&ChannelQuery::default());
        assert_eq!(page.pagination.limit, DEFAULT_LIMIT);
        assert_eq!(page.data[0].delivery_rate, 97.0);

        let json = serde_json::to_value(channels.lifecycle(&ChannelQuery::default())).unwrap();
        assert_eq!(json["pagination"]["totalPages"], 1);
        assert_eq!(json["data"][1]["customer_segment"], "Active Customers");
    }

    #[test]
    fn test_channel_stats_and_funnel() {
        let channels = PrivateChannelService::new();
        let stats = channels.channel_stats();
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].total_revenue, 217_300.0);

        let funnel = channels.conversion_funnel();
        assert_eq!(funnel.first().unwrap().percentage, 100.0);
        assert_eq!(funnel.last().unwrap().value, 360);
    }
}
