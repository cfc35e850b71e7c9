//! Fixtures shared by the integration tests.

use server_core::common::CaptureStamp;
use server_core::domains::collection::SummaryRow;

/// Capture stamp used by tests that do not care about the wall clock.
pub fn fixed_stamp() -> CaptureStamp {
    CaptureStamp {
        date: "2025-06-01".to_string(),
        time: "10:00:00".to_string(),
    }
}

pub fn summary_row(complex_no: &str, trade_type: &str, min: i64, max: i64) -> SummaryRow {
    SummaryRow {
        collected_date: "2025-06-01".to_string(),
        complex_no: complex_no.to_string(),
        area_name: Some("84A".to_string()),
        trade_type_name: trade_type.to_string(),
        article_count: 2,
        min_price: Some(min),
        max_price: Some(max),
    }
}
