//! Client for a MAX image-segmenter service.
//!
//! The service accepts `POST <endpoint>` with a multipart `image` field and
//! answers `{"status": "ok", "image_size": [w, h], "seg_map": [[class, ...]]}`
//! where `seg_map` holds one row per image row.
use super::{Prediction, Segmenter};
use crate::config::ModelConfig;
use crate::diagnostics::elapsed_ms;
use crate::error::{Error, Result};
use crate::image::io::encode_png;
use crate::labels::LabelSet;
use crate::segmentation::ClassMap;
use image::RgbaImage;
use log::debug;
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/model/predict";

#[derive(Debug, Deserialize)]
struct PredictResponse {
    status: String,
    #[serde(default)]
    image_size: Option<[u32; 2]>,
    #[serde(default)]
    seg_map: Vec<Vec<u32>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug)]
pub struct MaxSegmenter {
    client: Client,
    endpoint: String,
    labels: LabelSet,
}

impl MaxSegmenter {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(Error::inference)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            labels: LabelSet::pascal_voc(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse_response(&self, response: PredictResponse) -> Result<Prediction> {
        if response.status != "ok" {
            let detail = response.message.unwrap_or(response.status);
            return Err(Error::inference(format!("service replied: {detail}")));
        }
        let class_map = ClassMap::from_rows(&response.seg_map, &self.labels)?;
        if let Some([w, h]) = response.image_size {
            if (w, h) != (class_map.width(), class_map.height()) {
                debug!(
                    "image_size {w}x{h} differs from seg_map {}x{}, using seg_map",
                    class_map.width(),
                    class_map.height()
                );
            }
        }
        Ok(Prediction::from_class_map(class_map, &self.labels))
    }
}

impl Segmenter for MaxSegmenter {
    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn predict(&self, image: &RgbaImage) -> Result<Prediction> {
        let t0 = Instant::now();
        let png = encode_png(image)?;
        let part = multipart::Part::bytes(png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(Error::inference)?;
        let form = multipart::Form::new().part("image", part);
        let response: PredictResponse = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(Error::inference)?;
        debug!(
            "MaxSegmenter::predict {}x{} in {:.1} ms",
            image.width(),
            image.height(),
            elapsed_ms(t0)
        );
        self.parse_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> MaxSegmenter {
        MaxSegmenter::new(&ModelConfig::default()).unwrap()
    }

    #[test]
    fn parses_ok_response() {
        let json = r#"{"status": "ok", "image_size": [2, 2], "seg_map": [[0, 0], [15, 15]]}"#;
        let response: PredictResponse = serde_json::from_str(json).unwrap();
        let prediction = segmenter().parse_response(response).unwrap();
        assert_eq!(prediction.class_map.data(), &[0, 0, 15, 15]);
        assert_eq!(prediction.objects_detected, ["background", "person"]);
    }

    #[test]
    fn error_status_becomes_inference_failure() {
        let json = r#"{"status": "error", "message": "bad image"}"#;
        let response: PredictResponse = serde_json::from_str(json).unwrap();
        let err = segmenter().parse_response(response).unwrap_err();
        assert!(matches!(err, Error::ModelInferenceFailure(ref m) if m.contains("bad image")));
    }

    #[test]
    fn out_of_range_class_is_rejected() {
        let json = r#"{"status": "ok", "seg_map": [[0, 99]]}"#;
        let response: PredictResponse = serde_json::from_str(json).unwrap();
        let err = segmenter().parse_response(response).unwrap_err();
        assert!(matches!(err, Error::UnknownClass { index: 99, .. }));
    }
}
