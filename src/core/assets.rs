//! Image → asset conversion.
//!
//! Planning picks a conflict-free asset name for every stored image. Rewriting
//! replaces `{#image ...}` directives in template content with `{#asset ...}`.

use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use crate::core::store::types::ImageRecord;

const CONFLICT_PREFIX: &str = "image_";

static IMAGE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{#image ([^{}]{0,150})\}").expect("image directive pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAsset {
    pub name: String,
    pub content: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPlan {
    pub assets: Vec<PlannedAsset>,
    /// Original image name → new asset name.
    pub image_to_asset: BTreeMap<String, String>,
}

impl AssetPlan {
    pub fn asset_for(&self, image_name: &str) -> Option<&str> {
        self.image_to_asset.get(image_name).map(String::as_str)
    }
}

fn candidate_name(image: &ImageRecord) -> String {
    match image.content_type.split_once('/') {
        Some((_, subtype)) => format!("{}.{}", image.name, subtype),
        None => image.name.clone(),
    }
}

/// Plans one asset per image.
///
/// `asset_exists` answers whether an asset with the given name is already stored.
/// A colliding candidate is retried as `image_<candidate>` until it is free. Names
/// planned earlier in the same run count as taken, so the result is injective.
pub fn plan<F>(images: &[ImageRecord], asset_exists: F) -> AssetPlan
where
    F: Fn(&str) -> bool,
{
    let mut plan = AssetPlan::default();
    let mut taken: HashSet<String> = HashSet::new();
    let mut pending: Vec<(&ImageRecord, String)> =
        images.iter().map(|img| (img, candidate_name(img))).collect();

    while !pending.is_empty() {
        let mut conflicts = Vec::new();

        for (image, candidate) in pending {
            if taken.contains(&candidate) || asset_exists(&candidate) {
                conflicts.push((image, format!("{}{}", CONFLICT_PREFIX, candidate)));
                continue;
            }
            taken.insert(candidate.clone());
            plan.image_to_asset
                .insert(image.name.clone(), candidate.clone());
            plan.assets.push(PlannedAsset {
                name: candidate,
                content: image.content.clone(),
            });
        }

        pending = conflicts;
    }

    plan
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Base64,
    DataUri,
}

impl ImageEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageEncoding::Base64 => "base64",
            ImageEncoding::DataUri => "dataURI",
        }
    }
}

/// Splits a directive body into the referenced image name and its encoding.
/// `None` encoding means a malformed parameter clause.
fn parse_directive(body: &str) -> (&str, Option<ImageEncoding>) {
    let Some(idx) = body.find(" @") else {
        return (body, Some(ImageEncoding::DataUri));
    };

    let name = &body[..idx];
    let params: Vec<&str> = body[idx + 2..].split('=').collect();
    let encoding = match params.as_slice() {
        ["encoding", "base64"] => Some(ImageEncoding::Base64),
        ["encoding", "dataURI"] => Some(ImageEncoding::DataUri),
        _ => None,
    };
    (name, encoding)
}

/// Rewrites image directives whose image exists and was planned as an asset.
///
/// Returns `None` when nothing was replaced.
pub fn rewrite_directives(
    content: &str,
    live_images: &HashSet<String>,
    plan: &AssetPlan,
) -> Option<String> {
    let mut replaced = 0usize;

    let rewritten = IMAGE_DIRECTIVE.replace_all(content, |caps: &Captures| {
        let original = caps[0].to_string();
        let (image_name, encoding) = parse_directive(&caps[1]);

        if !live_images.contains(image_name) {
            return original;
        }
        let Some(encoding) = encoding else {
            return original;
        };
        let Some(asset) = plan.asset_for(image_name) else {
            return original;
        };

        replaced += 1;
        format!("{{#asset {} @encoding={}}}", asset, encoding.as_str())
    });

    (replaced > 0).then(|| rewritten.into_owned())
}
