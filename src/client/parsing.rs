//! CSV body parsing for the metadata endpoints.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::IndicatorInfo;

/// Number of columns every indicator row must carry
const INDICATOR_FIELDS: usize = 9;

fn reader(body: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body)
}

/// Values of the first CSV row; an empty body yields an empty list
pub(crate) fn parse_first_row(body: &[u8]) -> Result<Vec<String>> {
    let mut records = reader(body).into_records();
    match records.next() {
        Some(record) => {
            let record = record.map_err(|e| Error::Parse(e.to_string()))?;
            Ok(record.iter().map(str::to_string).collect())
        }
        None => Ok(Vec::new()),
    }
}

/// Indicator metadata keyed by code
///
/// Rows whose first field starts with `#` are comments. The first remaining
/// row is the header and is skipped.
pub(crate) fn parse_indicators(body: &[u8]) -> Result<BTreeMap<String, IndicatorInfo>> {
    let mut indicators = BTreeMap::new();
    let mut header_seen = false;

    for record in reader(body).into_records() {
        let record = record.map_err(|e| Error::Parse(e.to_string()))?;
        let Some(first) = record.get(0) else {
            continue;
        };
        if first.starts_with('#') {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }
        if record.len() < INDICATOR_FIELDS {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(Error::Parse(format!(
                "indicator row at line {} has {} fields, expected {}",
                line,
                record.len(),
                INDICATOR_FIELDS
            )));
        }

        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let info = IndicatorInfo {
            code: field(0),
            name: field(1),
            theme: field(2),
            subtheme: field(3),
            description: field(4),
            measurement_type: field(5),
            source: field(6),
            aggregation_method: field(7),
            keywords: field(8),
        };
        indicators.insert(info.code.clone(), info);
    }

    Ok(indicators)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const INDICATORS_CSV: &str = "\
# Generated by the platform
# Filters: theme=Economy
code,name,theme,subtheme,description,measurement_type,source,aggregation_method,keywords
GDP,Gross domestic product,Economy,Output,\"GDP, current US$\",Currency,World Bank,sum,\"gdp,economy\"
LIT,Literacy rate,Education,Literacy,Adult literacy,Percentage,UNESCO,average,literacy
";

    #[test]
    fn first_row_is_returned_verbatim() {
        let themes = parse_first_row(b"Economy,Education,\"Health, care\"\nignored,row\n").unwrap();
        assert_eq!(themes, ["Economy", "Education", "Health, care"]);
    }

    #[test]
    fn first_row_of_empty_body_is_empty() {
        assert!(parse_first_row(b"").unwrap().is_empty());
    }

    #[test]
    fn indicators_skip_comments_and_header() {
        let indicators = parse_indicators(INDICATORS_CSV.as_bytes()).unwrap();

        assert_eq!(indicators.len(), 2);
        assert!(!indicators.contains_key("code"));

        let gdp = &indicators["GDP"];
        assert_eq!(gdp.name, "Gross domestic product");
        assert_eq!(gdp.theme, "Economy");
        assert_eq!(gdp.subtheme, "Output");
        assert_eq!(gdp.description, "GDP, current US$");
        assert_eq!(gdp.measurement_type, "Currency");
        assert_eq!(gdp.source, "World Bank");
        assert_eq!(gdp.aggregation_method, "sum");
        assert_eq!(gdp.keywords, "gdp,economy");

        assert_eq!(indicators["LIT"].aggregation_method, "average");
    }

    #[test]
    fn indicators_decode_utf8_text() {
        let body = "code,name,theme,subtheme,description,measurement_type,source,aggregation_method,keywords\n\
                    EDU,Éducation primaire,Société,École,Taux net,Pourcentage,INSEE,moyenne,école\n";
        let indicators = parse_indicators(body.as_bytes()).unwrap();
        assert_eq!(indicators["EDU"].name, "Éducation primaire");
        assert_eq!(indicators["EDU"].keywords, "école");
    }

    #[test]
    fn short_indicator_row_is_a_parse_error() {
        let body = "code,name\nGDP,Gross domestic product,Economy\n";
        let err = parse_indicators(body.as_bytes()).unwrap_err();
        assert_eq!(err.code(), "parse_error");
        assert!(err.to_string().contains("3 fields"), "{err}");
    }

    #[test]
    fn header_only_body_yields_no_indicators() {
        let body = "# comment\ncode,name,theme\n";
        assert!(parse_indicators(body.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn duplicate_codes_keep_the_last_row() {
        let body = "h\n\
                    GDP,old,a,b,c,d,e,f,g\n\
                    GDP,new,a,b,c,d,e,f,g\n";
        let indicators = parse_indicators(body.as_bytes()).unwrap();
        assert_eq!(indicators.len(), 1);
        assert_eq!(indicators["GDP"].name, "new");
    }
}
