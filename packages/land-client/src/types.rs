use serde::Deserialize;

/// Authentication material for one API session.
///
/// Both values are copied from a logged-in browser session and sent verbatim
/// as the `authorization` and `cookie` headers.
#[derive(Debug, Clone)]
pub struct LandAuth {
    pub authorization: String,
    pub cookie: String,
}

/// One listing ("article") as returned by the complex-articles endpoint.
///
/// Only the fields the collector stores are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub article_name: Option<String>,
    #[serde(default)]
    pub real_estate_type_name: Option<String>,
    #[serde(default)]
    pub trade_type_name: Option<String>,
    /// Combined "floor/max floor" text, e.g. `5/15` or `고/25`.
    #[serde(default)]
    pub floor_info: Option<String>,
    /// Sale price or deposit, e.g. `1억 5,000` or `9,500`.
    #[serde(default, rename = "dealOrWarrantPrc")]
    pub deal_or_warrant_prc: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub area1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub area2: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub building_name: Option<String>,
}

/// One page of the complex-articles listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    #[serde(default)]
    pub article_list: Vec<Article>,
    #[serde(default)]
    pub is_more_data: bool,
}

/// Areas come back as numbers for some property types and strings for others.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
