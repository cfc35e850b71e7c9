//! Normalized listing rows written to `apartment_listings`.

use anyhow::Result;
use land_client::Article;
use serde::Serialize;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};

use crate::common::utils::{normalize_price, split_floor_info};
use crate::common::CaptureStamp;

/// Trade types kept by the collector: outright sale and deposit lease.
pub const ALLOWED_TRADE_TYPES: [&str; 2] = ["매매", "전세"];

/// Postgres caps bind parameters at 65535 per statement (15 per row here).
const MAX_ROWS_PER_INSERT: usize = 1000;

pub fn is_allowed_trade_type(trade_type: Option<&str>) -> bool {
    trade_type.is_some_and(|t| ALLOWED_TRADE_TYPES.contains(&t))
}

/// One listing as stored, stamped with the run's capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedListing {
    pub complex_no: String,
    pub article_name: Option<String>,
    pub real_estate_type_name: Option<String>,
    pub trade_type_name: String,
    pub floor_info: Option<String>,
    pub floor: Option<String>,
    pub max_floor: Option<String>,
    /// Price in 만원 as decimal text (see `normalize_price`).
    pub price: String,
    pub area_name: Option<String>,
    pub area1: Option<String>,
    pub area2: Option<String>,
    pub direction: Option<String>,
    pub building_name: Option<String>,
    pub collected_date: String,
    pub collected_time: String,
}

impl NormalizedListing {
    /// Normalize a raw article, or `None` when its trade type is not kept.
    pub fn from_article(complex_no: &str, article: Article, stamp: &CaptureStamp) -> Option<Self> {
        if !is_allowed_trade_type(article.trade_type_name.as_deref()) {
            return None;
        }

        let (floor, max_floor) = split_floor_info(article.floor_info.as_deref());
        let price = normalize_price(article.deal_or_warrant_prc.as_deref().unwrap_or_default());

        Some(Self {
            complex_no: complex_no.to_string(),
            article_name: article.article_name,
            real_estate_type_name: article.real_estate_type_name,
            trade_type_name: article.trade_type_name.unwrap_or_default(),
            floor_info: article.floor_info,
            floor,
            max_floor,
            price,
            area_name: article.area_name,
            area1: article.area1,
            area2: article.area2,
            direction: article.direction,
            building_name: article.building_name,
            collected_date: stamp.date.clone(),
            collected_time: stamp.time.clone(),
        })
    }

    /// Normalize a page of articles, dropping trade types that are not kept.
    pub fn from_articles(
        complex_no: &str,
        articles: Vec<Article>,
        stamp: &CaptureStamp,
    ) -> Vec<Self> {
        articles
            .into_iter()
            .filter_map(|article| Self::from_article(complex_no, article, stamp))
            .collect()
    }

    /// Append listings with multi-row INSERTs in one transaction.
    ///
    /// The batch is stored entirely or not at all. Returns the number of rows
    /// written.
    pub async fn insert_batch(listings: &[Self], conn: &mut PgConnection) -> Result<u64> {
        let mut tx = conn.begin().await?;
        let mut inserted = 0;

        for chunk in listings.chunks(MAX_ROWS_PER_INSERT) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                r#"
                INSERT INTO apartment_listings
                (complex_no, article_name, real_estate_type_name, trade_type_name,
                 floor_info, floor, max_floor, deal_or_warrant_prc, area_name,
                 area1, area2, direction, building_name, collected_date, collected_time)
                "#,
            );

            builder.push_values(chunk, |mut row, listing| {
                row.push_bind(listing.complex_no.clone())
                    .push_bind(listing.article_name.clone())
                    .push_bind(listing.real_estate_type_name.clone())
                    .push_bind(listing.trade_type_name.clone())
                    .push_bind(listing.floor_info.clone())
                    .push_bind(listing.floor.clone())
                    .push_bind(listing.max_floor.clone())
                    .push_bind(listing.price.clone())
                    .push_bind(listing.area_name.clone())
                    .push_bind(listing.area1.clone())
                    .push_bind(listing.area2.clone())
                    .push_bind(listing.direction.clone())
                    .push_bind(listing.building_name.clone())
                    .push_bind(listing.collected_date.clone())
                    .push_bind(listing.collected_time.clone());
            });

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
