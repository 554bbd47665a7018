//! The edit processor: request validation, stage orchestration, and
//! stage-tagged failure reporting
//!
//! One edit is one task over its own inputs; the processor holds no
//! per-request state and is shared by reference across concurrent
//! edits. Only storage access and the model call await; the raster
//! stages run to completion without yielding.

use crate::backends::PatchModel;
use crate::config::{EditConfig, MAX_FEATHER, MAX_PADDING};
use crate::error::{at, EditError, Stage, StageError};
use crate::pipeline::{color, composite, mask, patch, region};
use crate::services::{data_url, ImageStore, SavedFile, StoreDir};
use crate::types::{EditAlpha, EditOutcome, MaskSpace};
use crate::utils::raster;
use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A mask-guided edit request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    /// Name of the stored base image
    pub filename: String,
    /// User-drawn mask as a data URL
    pub mask_data_url: String,
    /// Natural-language edit instruction, non-empty
    pub prompt: String,
    /// Feather radius in pixels, 0-32; configured default when omitted
    #[serde(default)]
    pub feather: Option<u32>,
    /// BBox padding in pixels, 0-128; configured default when omitted
    #[serde(default)]
    pub padding: Option<u32>,
    /// Persist the composited result to the edits directory
    #[serde(default)]
    pub save: bool,
}

/// A successful edit response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResponse {
    /// The composited canvas as base64 PNG
    pub image_base64: String,
    /// Always `image/png`
    pub mime: String,
    /// Persisted-file record, present iff the request asked to save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<SavedFile>,
}

/// Orchestrates one edit across the pipeline stages and collaborators
pub struct ImageEditProcessor {
    config: EditConfig,
    model: Arc<dyn PatchModel>,
    store: ImageStore,
}

impl ImageEditProcessor {
    /// Create a processor from a validated configuration and its
    /// collaborators
    ///
    /// # Errors
    /// - `EditError::InvalidConfig` when the configuration is out of range
    pub fn new(
        config: EditConfig,
        model: Arc<dyn PatchModel>,
        store: ImageStore,
    ) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model,
            store,
        })
    }

    /// The configuration this processor runs with
    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    /// Run a full edit: read the base, decode the mask, extract and
    /// align the region, call the model, color-match, composite, and
    /// optionally persist.
    ///
    /// # Errors
    /// Every failure carries the stage that raised it; see
    /// [`Stage`](crate::error::Stage) for the taxonomy.
    pub async fn edit(&self, request: EditRequest) -> std::result::Result<EditResponse, StageError> {
        let (outcome, saved) = self.run(&request).await?;

        Ok(EditResponse {
            image_base64: general_purpose::STANDARD.encode(&outcome.png),
            mime: "image/png".to_string(),
            file: saved,
        })
    }

    /// Like [`edit`](Self::edit), returning the raw outcome instead of
    /// the wire response
    pub async fn edit_outcome(
        &self,
        request: EditRequest,
    ) -> std::result::Result<EditOutcome, StageError> {
        let (outcome, _) = self.run(&request).await?;
        Ok(outcome)
    }

    async fn run(
        &self,
        request: &EditRequest,
    ) -> std::result::Result<(EditOutcome, Option<SavedFile>), StageError> {
        // parse
        let (feather, padding) = self.validate_request(request).map_err(at(Stage::Parse))?;

        // read_base
        let base = self.read_base(&request.filename).await?;
        let (img_w, img_h) = (base.width(), base.height());

        // parse_mask
        let mask_alpha = self
            .decode_mask_alpha(&request.mask_data_url)
            .map_err(at(Stage::ParseMask))?;

        // mask_to_bbox
        let mask_bbox = region::tight_bbox(&mask_alpha)
            .map(|tight| tight.pad(padding, mask_alpha.width(), mask_alpha.height()))
            .map_err(at(Stage::MaskToBbox))?;

        // align_mask_to_image
        let (alpha, bbox) = region::align_to_image(mask_alpha, mask_bbox, img_w, img_h)
            .map_err(at(Stage::AlignMaskToImage))?;

        // make_patch
        let patch_png = patch::prepare_patch(&base, bbox, self.config.max_patch_edge)
            .map_err(at(Stage::MakePatch))?;

        // openrouter
        let edited_bytes = tokio::time::timeout(
            self.config.model_timeout,
            self.model.generate_from_patch(&request.prompt, &patch_png),
        )
        .await
        .map_err(|_| EditError::ModelTimeout(self.config.model_timeout))
        .map_err(at(Stage::Model))?
        .map_err(at(Stage::Model))?;

        // composite_precheck
        let mut edited = image::load_from_memory(&edited_bytes)
            .map_err(|_| EditError::NoImageInResponse)
            .map_err(at(Stage::CompositePrecheck))?
            .to_rgb8();
        composite::precheck_alpha(&alpha, img_w, img_h).map_err(at(Stage::CompositePrecheck))?;

        // composite
        let base_rgb = base.to_rgb8();
        let gains = match color::ring_mean(&base_rgb, bbox, self.config.color_match_ring) {
            Some(tgt) => {
                let gains = color::channel_gains(
                    color::mean_rgb(&edited),
                    tgt,
                    self.config.color_gain_min,
                    self.config.color_gain_max,
                );
                color::apply_gains(&mut edited, gains);
                gains
            }
            None => {
                debug!("bbox covers the image, no surrounding ring to color-match against");
                [1.0; 3]
            }
        };
        let canvas = composite::composite_patch(&base, &alpha, bbox, &edited, feather)
            .map_err(at(Stage::Composite))?;
        let png = raster::encode_png(&canvas).map_err(at(Stage::Composite))?;

        // save_or_return
        let saved = if request.save {
            let file = self
                .store
                .save_to(StoreDir::Edits, &png, "png")
                .await
                .map_err(at(Stage::SaveOrReturn))?;
            Some(file)
        } else {
            None
        };

        info!(
            "edited {} at {}x{}+{}+{} (feather {}, padding {})",
            request.filename, bbox.width, bbox.height, bbox.left, bbox.top, feather, padding
        );
        Ok((EditOutcome { png, bbox, gains }, saved))
    }

    fn validate_request(&self, request: &EditRequest) -> crate::Result<(u32, u32)> {
        if request.prompt.trim().is_empty() {
            return Err(EditError::PromptRequired);
        }

        let feather = request.feather.unwrap_or(self.config.default_feather);
        if feather > MAX_FEATHER {
            return Err(EditError::invalid_payload(format!(
                "feather {} outside 0-{}",
                feather, MAX_FEATHER
            )));
        }

        let padding = request.padding.unwrap_or(self.config.default_padding);
        if padding > MAX_PADDING {
            return Err(EditError::invalid_payload(format!(
                "padding {} outside 0-{}",
                padding, MAX_PADDING
            )));
        }

        Ok((feather, padding))
    }

    async fn read_base(&self, filename: &str) -> std::result::Result<DynamicImage, StageError> {
        let (bytes, _mime, origin) = self
            .store
            .read_by_name(filename)
            .await
            .map_err(at(Stage::ReadBase))?;

        if bytes.len() as u64 > self.config.max_input_bytes {
            return Err(StageError::new(
                Stage::ReadBase,
                EditError::PayloadTooLarge {
                    actual: bytes.len() as u64,
                    limit: self.config.max_input_bytes,
                },
            ));
        }

        let base = image::load_from_memory(&bytes)
            .map_err(|e| EditError::image_meta(e.to_string()))
            .map_err(at(Stage::ReadBase))?;
        if base.width() == 0 || base.height() == 0 {
            return Err(StageError::new(
                Stage::ReadBase,
                EditError::image_meta("base image has zero dimensions"),
            ));
        }

        debug!(
            "base {} is {}x{} from {}",
            filename,
            base.width(),
            base.height(),
            origin.as_str()
        );
        Ok(base)
    }

    fn decode_mask_alpha(&self, mask_data_url: &str) -> crate::Result<EditAlpha<MaskSpace>> {
        let mask_bytes = data_url::decode_image_data_url(mask_data_url)?;
        let mask_img = mask::decode_mask(&mask_bytes)?;
        let alpha = mask::edit_alpha_from_mask(&mask_img)?;
        if self.config.soft_dilate_mask {
            return mask::soft_dilate(alpha);
        }
        Ok(alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockPatchModel;
    use tempfile::tempdir;

    fn processor_with(store: ImageStore) -> ImageEditProcessor {
        ImageEditProcessor::new(
            EditConfig::default(),
            Arc::new(MockPatchModel::new()),
            store,
        )
        .unwrap()
    }

    fn request(filename: &str, mask: &str, prompt: &str) -> EditRequest {
        EditRequest {
            filename: filename.to_string(),
            mask_data_url: mask.to_string(),
            prompt: prompt.to_string(),
            feather: None,
            padding: None,
            save: false,
        }
    }

    #[tokio::test]
    async fn test_empty_prompt_fails_at_parse() {
        let tmp = tempdir().unwrap();
        let processor = processor_with(ImageStore::new(tmp.path()));

        let err = processor
            .edit(request("aa.png", "ignored", "   "))
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Parse);
        assert_eq!(err.source.tag(), "prompt_required");
    }

    #[tokio::test]
    async fn test_out_of_range_feather_fails_at_parse() {
        let tmp = tempdir().unwrap();
        let processor = processor_with(ImageStore::new(tmp.path()));

        let mut req = request("aa.png", "ignored", "edit");
        req.feather = Some(33);
        let err = processor.edit(req).await.unwrap_err();
        assert_eq!(err.stage, Stage::Parse);
        assert_eq!(err.source.tag(), "invalid_payload");
    }

    #[tokio::test]
    async fn test_missing_base_fails_at_read_base() {
        let tmp = tempdir().unwrap();
        let processor = processor_with(ImageStore::new(tmp.path()));

        let err = processor
            .edit(request("0123abc.png", "ignored", "edit"))
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::ReadBase);
        assert_eq!(err.source.tag(), "file_not_found");
    }

    #[tokio::test]
    async fn test_request_serde_defaults() {
        let req: EditRequest = serde_json::from_str(
            r#"{"filename":"a.png","mask_data_url":"data:,","prompt":"x"}"#,
        )
        .unwrap();
        assert_eq!(req.feather, None);
        assert_eq!(req.padding, None);
        assert!(!req.save);
    }

    #[test]
    fn test_response_omits_file_when_not_saved() {
        let response = EditResponse {
            image_base64: "AA==".to_string(),
            mime: "image/png".to_string(),
            file: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"file\""));
    }
}
