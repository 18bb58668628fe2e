//! Nutrient prediction client
//!
//! Two chained requests per product:
//! 1. product metadata → id of the nutrition image
//! 2. nutrient prediction for that image's OCR document
//!
//! Uses ureq (sync HTTP), one agent per client.

use super::{numeric, PredictionSource, SourceError, SourceResult};
use crate::config::{NutrientTable, ServiceConfig};
use crate::models::{present, NutrientValues};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Error code returned by the prediction service when the OCR document
/// could not be downloaded
const DOWNLOAD_ERROR: &str = "download_error";

/// Split a barcode into the image folder layout: `3228857000852` →
/// `322/885/700/0852`. Codes shorter than 9 characters are not split.
pub fn split_barcode(code: &str) -> String {
    if code.len() < 9 || !code.is_ascii() {
        return code.to_string();
    }
    [&code[0..3], &code[3..6], &code[6..9], &code[9..]]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Prediction source backed by the public HTTP services
pub struct HttpPredictionClient {
    service: ServiceConfig,
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are mapped to SourceError below
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl HttpPredictionClient {
    pub fn new(service: ServiceConfig) -> Self {
        let agent = make_agent(Duration::from_secs(service.timeout_secs.max(1)));
        Self { service, agent }
    }

    /// URL of the OCR document of a product image
    pub fn ocr_url(&self, code: &str, image_id: &str) -> String {
        format!(
            "{}/{}/{}.json",
            self.service.ocr_base_url.trim_end_matches('/'),
            split_barcode(code),
            image_id
        )
    }

    /// Look up the nutrition image id of a product
    pub fn image_id(&self, code: &str) -> SourceResult<String> {
        let url = format!(
            "{}/{}.json",
            self.service.product_url.trim_end_matches('/'),
            code
        );
        let (status, body) = self.get(&url, None)?;
        if status >= 400 {
            return Err(SourceError::Http {
                url,
                message: format!("status {}", status),
            });
        }
        parse_image_id(code, &body, &self.service.image_key)
    }

    fn get(&self, url: &str, ocr_url: Option<&str>) -> SourceResult<(u16, String)> {
        debug!("GET {}", url);
        let mut request = self.agent.get(url);
        if let Some(ocr_url) = ocr_url {
            request = request.query("ocr_url", ocr_url);
        }

        let response = request.call().map_err(|e| SourceError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| SourceError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok((status, body))
    }
}

impl PredictionSource for HttpPredictionClient {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, code: &str, table: &NutrientTable) -> SourceResult<NutrientValues> {
        let image_id = self.image_id(code)?;
        let ocr_url = self.ocr_url(code, &image_id);
        let (status, body) = self.get(&self.service.predict_url, Some(&ocr_url))?;
        prediction_response(code, status, &body, table, &self.service.predict_url)
    }
}

/// Read the nutrition image id (`product.images.<image_key>.imgid`) from a
/// product metadata document. The id may be a number or a string.
pub fn parse_image_id(code: &str, body: &str, image_key: &str) -> SourceResult<String> {
    let document: Value = serde_json::from_str(body).map_err(|e| SourceError::MalformedResponse {
        code: code.to_string(),
        reason: e.to_string(),
    })?;

    document
        .get("product")
        .and_then(|p| p.get("images"))
        .and_then(|i| i.get(image_key))
        .and_then(|i| i.get("imgid"))
        .and_then(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| SourceError::MissingField {
            code: code.to_string(),
            field: format!("product.images.{}.imgid", image_key),
        })
}

/// Map a prediction response to values. A `download_error` body wins over
/// the status code; any other 4xx/5xx response is an HTTP error.
fn prediction_response(
    code: &str,
    status: u16,
    body: &str,
    table: &NutrientTable,
    url: &str,
) -> SourceResult<NutrientValues> {
    match parse_prediction(code, body, table) {
        Err(e @ SourceError::ServiceUnavailable { .. }) => Err(e),
        _ if status >= 400 => Err(SourceError::Http {
            url: url.to_string(),
            message: format!("status {}", status),
        }),
        result => result,
    }
}

/// Extract predicted values from a prediction document.
///
/// ```json
/// {"nutrients": {"protein": [{"value": "8.2", "unit": "g"}], ...}}
/// ```
///
/// The first candidate of each nutrient is used. Nutrients the service did
/// not recognize are absent values.
pub fn parse_prediction(
    code: &str,
    body: &str,
    table: &NutrientTable,
) -> SourceResult<NutrientValues> {
    let document: Value = serde_json::from_str(body).map_err(|e| SourceError::MalformedResponse {
        code: code.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(error) = document.get("error") {
        if error.as_str() == Some(DOWNLOAD_ERROR) {
            return Err(SourceError::ServiceUnavailable {
                code: code.to_string(),
            });
        }
        return Err(SourceError::MalformedResponse {
            code: code.to_string(),
            reason: format!("service error: {}", error),
        });
    }

    let nutrients = document
        .get("nutrients")
        .and_then(Value::as_object)
        .ok_or_else(|| SourceError::MissingField {
            code: code.to_string(),
            field: "nutrients".to_string(),
        })?;

    let values = table
        .iter()
        .map(|spec| {
            let candidate = nutrients
                .get(&spec.prediction_key)
                .and_then(Value::as_array)
                .and_then(|candidates| candidates.first());
            let value = candidate.and_then(|c| {
                let unit = c.get("unit").and_then(Value::as_str);
                present(c.get("value").and_then(numeric)).map(|v| spec.unit.normalize(v, unit))
            });
            (spec.nutrient, value)
        })
        .collect();

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrient;

    #[test]
    fn test_split_barcode() {
        assert_eq!(split_barcode("3228857000852"), "322/885/700/0852");
        assert_eq!(split_barcode("123456789"), "123/456/789");
        assert_eq!(split_barcode("12345678"), "12345678");
    }

    #[test]
    fn test_ocr_url() {
        let client = HttpPredictionClient::new(ServiceConfig::default());
        assert_eq!(
            client.ocr_url("3228857000852", "4"),
            "https://static.openfoodfacts.org/images/products/322/885/700/0852/4.json"
        );
    }

    #[test]
    fn test_parse_prediction_values_and_units() {
        let body = r#"{
            "nutrients": {
                "energy": [{"value": "1100", "unit": "kJ"}, {"value": "263", "unit": "kcal"}],
                "protein": [{"value": "8.2", "unit": "g"}],
                "salt": [{"value": 400, "unit": "mg"}],
                "fat": []
            }
        }"#;
        let values = parse_prediction("1", body, &NutrientTable::default()).unwrap();
        assert_eq!(values[&Nutrient::Energy], Some(262.0));
        assert_eq!(values[&Nutrient::Protein], Some(8.2));
        assert_eq!(values[&Nutrient::Salt], Some(0.4));
        assert_eq!(values[&Nutrient::Fat], None);
        assert_eq!(values[&Nutrient::Fiber], None);
    }

    #[test]
    fn test_parse_prediction_download_error() {
        let body = r#"{"error": "download_error", "error_description": "an error occurred during OCR JSON download"}"#;
        let err = parse_prediction("1", body, &NutrientTable::default()).unwrap_err();
        assert!(matches!(err, SourceError::ServiceUnavailable { .. }));
    }

    #[test]
    fn test_parse_prediction_other_error() {
        let body = r#"{"error": "invalid_ocr"}"#;
        let err = parse_prediction("1", body, &NutrientTable::default()).unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_prediction_invalid_json() {
        let err = parse_prediction("1", "<html>", &NutrientTable::default()).unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_image_id_number_and_string() {
        let body = r#"{"product": {"images": {"nutrition_fr": {"imgid": 4}}}}"#;
        assert_eq!(parse_image_id("1", body, "nutrition_fr").unwrap(), "4");

        let body = r#"{"product": {"images": {"nutrition_fr": {"imgid": "12"}}}}"#;
        assert_eq!(parse_image_id("1", body, "nutrition_fr").unwrap(), "12");
    }

    #[test]
    fn test_parse_image_id_missing_key() {
        let body = r#"{"product": {"images": {"front_fr": {"imgid": 1}}}}"#;
        match parse_image_id("1", body, "nutrition_fr").unwrap_err() {
            SourceError::MissingField { field, .. } => {
                assert_eq!(field, "product.images.nutrition_fr.imgid")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let body = r#"{"product": {"images": {"nutrition_fr": {"imgid": ""}}}}"#;
        assert!(matches!(
            parse_image_id("1", body, "nutrition_fr").unwrap_err(),
            SourceError::MissingField { .. }
        ));
    }

    #[test]
    fn test_parse_image_id_invalid_json() {
        let err = parse_image_id("1", "not json", "nutrition_fr").unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_prediction_response_status_precedence() {
        let table = NutrientTable::default();
        let download_error = r#"{"error": "download_error"}"#;
        let ok_body = r#"{"nutrients": {"fat": [{"value": 3, "unit": "g"}]}}"#;

        // download_error body wins over the status
        let err = prediction_response("1", 500, download_error, &table, "u").unwrap_err();
        assert!(matches!(err, SourceError::ServiceUnavailable { .. }));

        // an error status wins over a parsable body
        let err = prediction_response("1", 503, ok_body, &table, "u").unwrap_err();
        assert!(matches!(err, SourceError::Http { ref message, .. } if message.as_str() == "status 503"));

        let err = prediction_response("1", 404, "<html>", &table, "u").unwrap_err();
        assert!(matches!(err, SourceError::Http { .. }));

        let values = prediction_response("1", 200, ok_body, &table, "u").unwrap();
        assert_eq!(values[&Nutrient::Fat], Some(3.0));
    }

    #[test]
    fn test_parse_prediction_missing_nutrients() {
        let err = parse_prediction("1", "{}", &NutrientTable::default()).unwrap_err();
        assert!(matches!(err, SourceError::MissingField { .. }));
    }
}
