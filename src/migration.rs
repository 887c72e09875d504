//! Fallback schema
//!
//! DDL and sample rows loaded into the in-memory database when no real
//! database is reachable, so every route keeps answering with demo data.

use store_object::db_utils::table_exists;
use store_object::{QueryExecutor, StoreError};

/// Tables every entity service reads from
pub const FALLBACK_TABLES: &[&str] = &[
    "kol_tribit_total",
    "kol_ytb_video",
    "kol_tribit_2024",
    "kol_tribit_india",
    "insight_search",
    "insight_video_tk_creator",
    "insight_video_tk_product",
    "selfkoc_ins",
    "selfkoc_ytb",
    "selkoc_tk",
    "selkoc_account",
];

pub const FALLBACK_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kol_tribit_total (
    "No." INTEGER PRIMARY KEY,
    Region TEXT,
    Platform TEXT,
    kol_account TEXT,
    kol_url TEXT
);

CREATE TABLE IF NOT EXISTS kol_ytb_video (
    rank INTEGER,
    Youtuber TEXT,
    subscribers INTEGER,
    "video views" INTEGER,
    category TEXT,
    Title TEXT,
    uploads INTEGER,
    Country TEXT,
    channel_type TEXT,
    created_year INTEGER
);

CREATE TABLE IF NOT EXISTS kol_tribit_2024 (
    "No." INTEGER PRIMARY KEY,
    platform TEXT,
    kol_account TEXT,
    kol_post_url TEXT
);

CREATE TABLE IF NOT EXISTS kol_tribit_india (
    "No." INTEGER PRIMARY KEY,
    Region TEXT,
    Platform TEXT,
    kol_account TEXT,
    kol_url TEXT
);

CREATE TABLE IF NOT EXISTS insight_search (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT,
    region TEXT,
    language TEXT,
    modifier_type TEXT,
    modifier TEXT,
    suggestion TEXT,
    search_volume INTEGER,
    competition TEXT,
    competition_index INTEGER,
    cost_per_click REAL,
    bid_low REAL,
    bid_high REAL
);

CREATE TABLE IF NOT EXISTS insight_video_tk_creator (
    "达人名称" TEXT,
    "达人账号" TEXT,
    "达人类型" TEXT,
    "达人粉丝数" INTEGER,
    "粉丝增长数" INTEGER,
    "均播量" INTEGER,
    "达人带货数" INTEGER,
    "近30日销售额" REAL,
    "视频GPM" REAL,
    "直播GPM" REAL,
    MCN INTEGER
);

CREATE TABLE IF NOT EXISTS insight_video_tk_product (
    "商品名称" TEXT,
    "商品类目-zh" TEXT,
    "商品类目-en" TEXT,
    "国家、地区" TEXT,
    "商品价格最小值" REAL,
    "商品价格最大值" REAL,
    "商品星级" REAL,
    "销量" INTEGER,
    "销售额" REAL,
    "销量环比" REAL,
    "带货达人数" INTEGER,
    "商品评论数" INTEGER,
    "店铺名称" TEXT,
    "运营模式" TEXT
);

CREATE TABLE IF NOT EXISTS selfkoc_ins (
    selfkoc_post_url TEXT,
    Likes INTEGER,
    Comments INTEGER,
    Views TEXT,
    selfkoc_post_date TEXT,
    selfkoc_account TEXT,
    selfkoc_video_id TEXT
);

CREATE TABLE IF NOT EXISTS selfkoc_ytb (
    video_id TEXT,
    video_title TEXT,
    video_url TEXT,
    channel_name TEXT,
    views INTEGER,
    likes INTEGER,
    comments INTEGER,
    published_date TEXT
);

CREATE TABLE IF NOT EXISTS selkoc_tk (
    video_id TEXT,
    video_url TEXT,
    account_name TEXT,
    views INTEGER,
    likes INTEGER,
    comments INTEGER,
    shares INTEGER,
    posted_date TEXT
);

CREATE TABLE IF NOT EXISTS selkoc_account (
    account_id TEXT,
    account_name TEXT,
    platform TEXT,
    followers INTEGER,
    following INTEGER,
    posts_count INTEGER,
    engagement_rate REAL,
    created_date TEXT
);

INSERT INTO kol_tribit_total ("No.", Region, Platform, kol_account, kol_url) VALUES
    (1, 'North America', 'YouTube', 'MrBeast', 'https://www.youtube.com/@MrBeast'),
    (2, 'Europe', 'YouTube', 'PewDiePie', 'https://www.youtube.com/@PewDiePie'),
    (3, 'Asia', 'YouTube', 'T-Series', 'https://www.youtube.com/@tseries'),
    (4, 'North America', 'YouTube', 'Dude Perfect', 'https://www.youtube.com/@DudePerfect'),
    (5, 'Europe', 'TikTok', 'techreviewer_uk', 'https://www.tiktok.com/@techreviewer_uk'),
    (6, 'Asia', 'TikTok', 'gadget_tokyo', 'https://www.tiktok.com/@gadget_tokyo'),
    (7, 'North America', 'Instagram', 'audio.daily', 'https://www.instagram.com/audio.daily'),
    (8, 'Europe', 'Instagram', 'soundcheck_de', 'https://www.instagram.com/soundcheck_de'),
    (9, 'Asia', 'YouTube', 'CarryMinati', 'https://www.youtube.com/@CarryMinati'),
    (10, 'North America', 'Twitter', 'speakerlab', 'https://x.com/speakerlab'),
    (11, 'Oceania', 'YouTube', 'HowToBasic', 'https://www.youtube.com/@HowToBasic'),
    (12, 'South America', 'TikTok', 'musica_br', 'https://www.tiktok.com/@musica_br');

INSERT INTO kol_ytb_video (rank, Youtuber, subscribers, "video views", category, Title, uploads, Country, channel_type, created_year) VALUES
    (1, 'T-Series', 245000000, 228000000000, 'Music', 'T-Series', 20082, 'India', 'Music', 2006),
    (2, 'MrBeast', 166000000, 28368841870, 'Entertainment', 'MrBeast', 741, 'United States', 'Entertainment', 2012),
    (3, 'PewDiePie', 111000000, 28852082906, 'Gaming', 'PewDiePie', 4716, 'Japan', 'Entertainment', 2010),
    (4, 'Dude Perfect', 59700000, 16306050138, 'Sports', 'Dude Perfect', 337, 'United States', 'Sports', 2009),
    (5, 'CarryMinati', 40000000, 3597000000, 'Comedy', 'CarryMinati', 197, 'India', 'Comedy', 2014),
    (6, 'HowToBasic', 17400000, 3944000000, 'Howto & Style', 'HowToBasic', 419, 'Australia', 'Howto', 2011);

INSERT INTO kol_tribit_2024 ("No.", platform, kol_account, kol_post_url) VALUES
    (1, 'YouTube', 'techchap', 'https://www.youtube.com/watch?v=tribit01'),
    (2, 'YouTube', 'sound_guy', 'https://www.youtube.com/watch?v=tribit02'),
    (3, 'TikTok', 'tiktok_audio', 'https://www.tiktok.com/@tiktok_audio/video/1'),
    (4, 'TikTok', 'techreviewer_uk', 'https://www.tiktok.com/@techreviewer_uk/video/2'),
    (5, 'Instagram', 'audio.daily', 'https://www.instagram.com/p/tribit05'),
    (6, 'YouTube', 'techlinked', 'https://www.youtube.com/watch?v=tribit06'),
    (7, 'Instagram', 'outdoor_beats', 'https://www.instagram.com/p/tribit07'),
    (8, 'YouTube', 'budget_audio', 'https://www.youtube.com/watch?v=tribit08');

INSERT INTO kol_tribit_india ("No.", Region, Platform, kol_account, kol_url) VALUES
    (1, 'India', 'YouTube', 'T-Series', 'https://www.youtube.com/@tseries'),
    (2, 'India', 'YouTube', 'CarryMinati', 'https://www.youtube.com/@CarryMinati'),
    (3, 'India', 'Instagram', 'bhuvan.bam22', 'https://www.instagram.com/bhuvan.bam22'),
    (4, 'India', 'YouTube', 'Technical Guruji', 'https://www.youtube.com/@TechnicalGuruji'),
    (5, 'India', 'Instagram', 'komalpandeyofficial', 'https://www.instagram.com/komalpandeyofficial');

INSERT INTO insight_search (keyword, region, language, modifier_type, modifier, suggestion, search_volume, competition, competition_index, cost_per_click, bid_low, bid_high) VALUES
    ('bluetooth speaker', 'US', 'en', 'question', 'how', 'how to pair bluetooth speaker', 74000, 'HIGH', 82, 1.20, 0.80, 1.80),
    ('bluetooth speaker', 'UK', 'en', 'comparison', 'vs', 'bluetooth speaker vs soundbar', 22000, 'HIGH', 75, 0.95, 0.60, 1.40),
    ('waterproof speaker', 'US', 'en', 'preposition', 'for', 'waterproof speaker for shower', 18000, 'MEDIUM', 58, 0.85, 0.50, 1.20),
    ('tribit speaker', 'US', 'en', 'question', 'which', 'which tribit speaker is best', 9900, 'MEDIUM', 50, 0.50, 0.30, 0.80),
    ('tribit stormbox', 'DE', 'de', 'comparison', 'vs', 'tribit stormbox vs jbl', 4400, 'LOW', 30, 0.42, 0.25, 0.70),
    ('lautsprecher bluetooth', 'DE', 'de', 'preposition', 'mit', 'lautsprecher bluetooth mit radio', 27000, 'HIGH', 77, 0.70, 0.45, 1.10),
    ('enceinte bluetooth', 'FR', 'fr', 'question', 'quelle', 'quelle enceinte bluetooth choisir', 33000, 'HIGH', 80, 0.65, 0.40, 1.05),
    ('portable speaker', 'CA', 'en', 'preposition', 'with', 'portable speaker with lights', 12000, 'MEDIUM', 61, 0.90, 0.55, 1.30);

INSERT INTO insight_video_tk_creator ("达人名称", "达人账号", "达人类型", "达人粉丝数", "粉丝增长数", "均播量", "达人带货数", "近30日销售额", "视频GPM", "直播GPM", MCN) VALUES
    ('Audio Andy', 'audio_andy', '个人运营', 1250000, 18000, 96000, 42, 865.40, 12.30, 8.10, 1),
    ('Gadget Gina', 'gadget_gina', '个人运营', 820000, 9500, 54000, 31, 512.75, 9.80, NULL, 0),
    ('Tribit Store', 'tribit_official', '店铺运营', 640000, 4200, 31000, 58, 398.20, 6.40, 11.50, 0),
    ('Beat Box Ben', 'beatbox_ben', '个人运营', 410000, 12500, 47000, 12, 96.30, 4.10, NULL, 1),
    ('Sound Deals', 'sound_deals_us', '店铺运营', 275000, 1100, 12000, 77, 75.11, 3.20, 5.60, 0),
    ('Camp Tunes', 'camp_tunes', '个人运营', 221066, 0, 8800, 6, 0, 0.55, NULL, 0);

INSERT INTO insight_video_tk_product ("商品名称", "商品类目-zh", "商品类目-en", "国家、地区", "商品价格最小值", "商品价格最大值", "商品星级", "销量", "销售额", "销量环比", "带货达人数", "商品评论数", "店铺名称", "运营模式") VALUES
    ('Tribit StormBox Micro 2', '手机与数码', 'Mobile & Digital', '美国', 39.99, 49.99, 4.6, 5200, 207948.00, 35.2, 48, 12450, 'Tribit Official', '自营'),
    ('Tribit XSound Plus 2', '手机与数码', 'Mobile & Digital', '美国', 59.99, 69.99, 4.5, 1400, 83986.00, 12.5, 22, 5630, 'Tribit Official', '自营'),
    ('Shower Speaker Mini', '手机与数码', 'Mobile & Digital', '美国', 8.99, 12.99, 3.9, 2100, 18879.00, -4.0, 9, 1820, 'Gadget Hub', '跨境'),
    ('LED Garden Light', '家装建材', 'Home Improvement', '美国', 19.99, 24.99, 4.1, 430, 8595.70, 8.0, 5, 340, 'Bright Home', '跨境'),
    ('Mini Air Fryer', '家电', 'Home Appliances', '美国', 129.00, 159.00, 4.3, 45, 5805.00, 2.0, 3, 210, 'Kitchen Pro', '自营'),
    ('Folding Camp Stool', '运动与户外', 'Sports & Outdoors', '美国', 540.00, 599.00, 3.7, 3, 1620.00, 0, 1, 12, 'Trail Gear', '跨境');

INSERT INTO selfkoc_ins (selfkoc_post_url, Likes, Comments, Views, selfkoc_post_date, selfkoc_account, selfkoc_video_id) VALUES
    ('https://www.instagram.com/p/self01', 1520, 88, '12000', '2024-03-02', 'tribit_official', 'ig01'),
    ('https://www.instagram.com/p/self02', 3400, 210, '41000', '2024-04-18', 'tribit_official', 'ig02'),
    ('https://www.instagram.com/p/self03', 640, 35, '5100', '2024-05-09', 'tribit.europe', 'ig03'),
    ('https://www.instagram.com/p/self04', 980, 52, '8800', '2024-06-21', 'tribit.europe', 'ig04'),
    ('https://www.instagram.com/p/self05', NULL, 4, NULL, '2024-07-01', 'tribit_outdoor', 'ig05');

INSERT INTO selfkoc_ytb (video_id, video_title, video_url, channel_name, views, likes, comments, published_date) VALUES
    ('yt01', 'StormBox Micro 2 unboxing', 'https://www.youtube.com/watch?v=self01', 'Tribit Official', 152000, 4100, 320, '2024-02-11'),
    ('yt02', 'XSound Plus 2 vs JBL Flip 6', 'https://www.youtube.com/watch?v=self02', 'Tribit Official', 98000, 2600, 410, '2024-04-03'),
    ('yt03', 'Camping with StormBox Flow', 'https://www.youtube.com/watch?v=self03', 'Tribit Outdoor', 23000, 700, 45, '2024-06-15');

INSERT INTO selkoc_tk (video_id, video_url, account_name, views, likes, comments, shares, posted_date) VALUES
    ('tk01', 'https://www.tiktok.com/@tribit_official/video/1', 'tribit_official', 510000, 38000, 910, 2200, '2024-03-20'),
    ('tk02', 'https://www.tiktok.com/@tribit_official/video/2', 'tribit_official', 87000, 5400, 130, 300, '2024-05-05'),
    ('tk03', 'https://www.tiktok.com/@tribit_outdoor/video/3', 'tribit_outdoor', 143000, 9100, 260, 640, '2024-06-30'),
    ('tk04', 'https://www.tiktok.com/@tribit_outdoor/video/4', 'tribit_outdoor', 12000, 800, 20, 15, '2024-07-12');

INSERT INTO selkoc_account (account_id, account_name, platform, followers, following, posts_count, engagement_rate, created_date) VALUES
    ('acc01', 'tribit_official', 'TikTok', 182000, 120, 340, 4.8, '2021-05-01'),
    ('acc02', 'tribit_official', 'Instagram', 56000, 310, 820, 2.1, '2020-09-14'),
    ('acc03', 'Tribit Official', 'YouTube', 94000, 12, 210, 3.3, '2019-11-02'),
    ('acc04', 'tribit.europe', 'Instagram', 8400, 95, 150, 1.7, '2022-02-20'),
    ('acc05', 'tribit_outdoor', 'TikTok', 23000, 40, 90, 5.2, '2023-04-08');
"#;

/// Fallback tables absent from the connected database
pub async fn missing_tables(executor: &dyn QueryExecutor) -> Result<Vec<&'static str>, StoreError> {
    let mut missing = Vec::new();
    for table in FALLBACK_TABLES {
        if !table_exists(executor, table).await? {
            missing.push(*table);
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_object::connection::SqliteExecutor;

    #[tokio::test]
    async fn test_fallback_schema_creates_every_table() {
        let executor = SqliteExecutor::open_memory().await.unwrap();
        assert_eq!(missing_tables(&executor).await.unwrap().len(), FALLBACK_TABLES.len());

        executor.run_script(FALLBACK_SCHEMA).await.unwrap();
        assert!(missing_tables(&executor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_rows_are_loaded() {
        let executor = SqliteExecutor::open_memory().await.unwrap();
        executor.run_script(FALLBACK_SCHEMA).await.unwrap();

        let rows = executor
            .query("SELECT COUNT(*) AS count FROM kol_tribit_total", &[])
            .await
            .unwrap();
        assert_eq!(rows[0]["count"], 12);

        let rows = executor
            .query("SELECT SUM(\"商品评论数\") AS reviews FROM insight_video_tk_product", &[])
            .await
            .unwrap();
        assert_eq!(rows[0]["reviews"], 20462);

        let rows = executor
            .query("SELECT COUNT(*) AS count FROM selkoc_account", &[])
            .await
            .unwrap();
        assert_eq!(rows[0]["count"], 5);
    }
}
