//! Platform responses used by the integration tests

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Login endpoint of the default configuration
pub const LOGIN_PATH: &str = "/account/ajax_login";

/// Export endpoint
pub const EXPORT_PATH: &str = "/svir/export_variables_data_by_ids";

/// Indicator listing with a comment preamble
pub const INDICATORS_CSV: &str = "\
# Social vulnerability indicators
# Exported for testing
code,name,theme,subtheme,description,measurement_type,source,aggregation_method,keywords
GDP,Gross domestic product,Economy,Output,Total output,Currency,World Bank,sum,\"gdp,economy\"
LIT,Literacy rate,Education,Literacy,Adult literacy,Percentage,UNESCO,average,literacy
";

/// Export body of `len` bytes: a small CSV padded with a trailing comment line
pub fn export_payload(len: usize) -> Vec<u8> {
    let mut body = b"code,name,GDP,LIT,geometry\nITA,Italy,1.0,0.99,\"POINT (12 42)\"\n".to_vec();
    assert!(body.len() < len, "payload too short for the CSV header");
    body.push(b'#');
    body.resize(len - 1, b'-');
    body.push(b'\n');
    body
}

/// Accept any login
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "sessionid=test; Path=/"))
        .mount(server)
        .await;
}

/// Serve `body` for an export of `ids`
pub async fn mount_export(server: &MockServer, ids: &str, geometry: bool, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .and(query_param("sv_variables_ids", ids))
        .and(query_param(
            "export_geometries",
            if geometry { "True" } else { "False" },
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(server)
        .await;
}
