//! Sentiment prediction handler
//!
//! Stateless: transform the text with the pre-loaded vectorizer, send the
//! single-row delimited record to the hosted endpoint, map the returned
//! binary label to a sentiment. Any failure along the way collapses into
//! one "prediction failed" error at the boundary; the process never
//! crashes on a bad request or a broken endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::platform::PlatformError;
use crate::state::AppState;
use crate::vectorizer;
use crate::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: &'static str,
    pub input: String,
    pub prediction: &'static str,
}

/// Shape of the hosted endpoint's JSON response body.
#[derive(Debug, Deserialize)]
struct EndpointResponse {
    predictions: Vec<EndpointPrediction>,
}

#[derive(Debug, Deserialize)]
struct EndpointPrediction {
    predicted_label: f64,
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let sentiment = run_prediction(&state, &request.text)
        .await
        .map_err(|e| AppError::Prediction(e.to_string()))?;

    Ok(Json(PredictResponse {
        status: "success",
        input: request.text,
        prediction: sentiment,
    }))
}

async fn run_prediction(state: &AppState, text: &str) -> Result<&'static str, PlatformError> {
    // Empty/whitespace text transforms to the zero vector; that is
    // accepted input, the endpoint still returns a label for it.
    let features = state.vectorizer.transform(text);
    let record = vectorizer::csv_row(&features);

    let body = state
        .invoker
        .invoke(&state.endpoint_name, "text/csv", record.into_bytes())
        .await?;

    let response: EndpointResponse = serde_json::from_slice(&body)
        .map_err(|e| PlatformError::MalformedResponse(e.to_string()))?;

    let label = response
        .predictions
        .first()
        .map(|p| p.predicted_label as i64)
        .ok_or_else(|| {
            PlatformError::MalformedResponse("response carries no predictions".to_string())
        })?;

    // Label 1 is the positive class under the alphabetical label encoding
    // of {negative, positive}; this mapping is tied to that ordering.
    Ok(if label == 1 { "Positive" } else { "Negative" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::EndpointInvoker;
    use crate::vectorizer::TfidfVectorizer;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct MockInvoker {
        response: Result<&'static str, &'static str>,
        seen: Mutex<Vec<(String, String, Vec<u8>)>>,
    }

    impl MockInvoker {
        fn replying(body: &'static str) -> Self {
            Self {
                response: Ok(body),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(cause: &'static str) -> Self {
            Self {
                response: Err(cause),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EndpointInvoker for MockInvoker {
        async fn invoke(
            &self,
            endpoint_name: &str,
            content_type: &str,
            body: Vec<u8>,
        ) -> Result<Vec<u8>, PlatformError> {
            self.seen.lock().unwrap().push((
                endpoint_name.to_string(),
                content_type.to_string(),
                body,
            ));
            match self.response {
                Ok(body) => Ok(body.as_bytes().to_vec()),
                Err(cause) => Err(PlatformError::Platform(cause.to_string())),
            }
        }
    }

    fn app(invoker: Arc<MockInvoker>) -> Router {
        let docs = vec![
            "produk sangat bagus".to_string(),
            "produk jelek kecewa".to_string(),
        ];
        let state = AppState {
            vectorizer: Arc::new(TfidfVectorizer::fit(&docs, 100)),
            invoker,
            endpoint_name: "linear-learner-sentiment-model-endpoint".to_string(),
        };
        Router::new()
            .route("/v1/predict", post(predict))
            .with_state(state)
    }

    async fn post_text(router: Router, text: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "text": text }).to_string(),
            ))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn positive_label_maps_to_positive_sentiment() {
        let invoker = Arc::new(MockInvoker::replying(
            r#"{"predictions":[{"score":0.93,"predicted_label":1}]}"#,
        ));
        let (status, body) = post_text(app(invoker.clone()), "Produk ini sangat bagus").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "status": "success",
                "input": "Produk ini sangat bagus",
                "prediction": "Positive"
            })
        );

        // The record sent to the endpoint is a single header-less
        // delimited row with the platform's delimited-text content type.
        let seen = invoker.seen.lock().unwrap();
        let (endpoint, content_type, record) = &seen[0];
        assert_eq!(endpoint, "linear-learner-sentiment-model-endpoint");
        assert_eq!(content_type, "text/csv");
        let record = String::from_utf8(record.clone()).unwrap();
        assert!(!record.contains('\n'));
        assert!(record.split(',').all(|f| f.parse::<f64>().is_ok()));
    }

    #[tokio::test]
    async fn zero_label_maps_to_negative_sentiment() {
        let invoker = Arc::new(MockInvoker::replying(
            r#"{"predictions":[{"score":0.12,"predicted_label":0}]}"#,
        ));
        let (status, body) = post_text(app(invoker), "pengiriman lama, kecewa").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], "Negative");
    }

    #[tokio::test]
    async fn empty_text_is_accepted_and_still_yields_a_label() {
        let invoker = Arc::new(MockInvoker::replying(
            r#"{"predictions":[{"score":0.5,"predicted_label":0}]}"#,
        ));
        let (status, body) = post_text(app(invoker), "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], "Negative");
        assert_eq!(body["input"], "");
    }

    #[tokio::test]
    async fn invocation_failure_becomes_a_well_formed_500() {
        let invoker = Arc::new(MockInvoker::failing("connection reset by peer"));
        let (status, body) = post_text(app(invoker), "apa ini").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Prediction failed:"));
        assert!(detail.contains("connection reset by peer"));
    }

    #[tokio::test]
    async fn malformed_endpoint_body_becomes_a_well_formed_500() {
        let invoker = Arc::new(MockInvoker::replying("not json at all"));
        let (status, body) = post_text(app(invoker), "bagus").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Prediction failed:"));
    }

    #[tokio::test]
    async fn missing_predictions_field_becomes_a_well_formed_500() {
        let invoker = Arc::new(MockInvoker::replying(r#"{"predictions":[]}"#));
        let (status, body) = post_text(app(invoker), "bagus").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("no predictions"));
    }
}
