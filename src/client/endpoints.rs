//! Platform endpoint paths, relative to the configured host.

/// First CSV row lists every theme name
pub const THEMES: &str = "/svir/list_themes";

/// First CSV row lists the subthemes of `?theme=`
pub const SUBTHEMES_BY_THEME: &str = "/svir/list_subthemes_by_theme";

/// Commented CSV with one row per indicator
pub const INDICATORS_INFO: &str = "/svir/export_variables_info";

/// Bulk CSV export of indicator values per zone
pub const EXPORT_BY_IDS: &str = "/svir/export_variables_data_by_ids";
