use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;

/// Header row written above the summary data (column names as the sheet's
/// readers expect them).
pub const SUMMARY_SHEET_HEADER: [&str; 6] = ["단지번호", "거래유형", "최고가", "최저가", "면적", "날짜"];

/// One row of the `sum_today` view: today's listings of a complex grouped by
/// area and trade type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SummaryRow {
    pub collected_date: String,
    pub complex_no: String,
    pub area_name: Option<String>,
    pub trade_type_name: String,
    pub article_count: i64,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

impl SummaryRow {
    /// Read today's aggregate from the `sum_today` view.
    pub async fn find_today(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT collected_date, complex_no, area_name, trade_type_name,
                   article_count, min_price, max_price
            FROM sum_today
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Cells in `SUMMARY_SHEET_HEADER` order.
    pub fn to_sheet_row(&self) -> Vec<Value> {
        vec![
            json!(self.complex_no),
            json!(self.trade_type_name),
            json!(self.max_price),
            json!(self.min_price),
            json!(self.area_name),
            json!(self.collected_date),
        ]
    }
}

/// Header plus one row per summary entry.
pub fn summary_sheet_values(rows: &[SummaryRow]) -> Vec<Vec<Value>> {
    let header = SUMMARY_SHEET_HEADER.iter().map(|h| json!(h)).collect();
    std::iter::once(header)
        .chain(rows.iter().map(SummaryRow::to_sheet_row))
        .collect()
}
