//! Caption overlay payloads attached to posts.
//!
//! Overlays are opaque JSON to the backend; the shapes here mirror the
//! client app's caption renderer. Every variant serializes with
//! `overlay_type: "caption"` and a variant-specific `overlay_id`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DEFAULT_TEXT_COLOR: &str = "#FFFFFFE6";

/// Icon shown inside a static-content caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayIcon {
    Emoji { data: String },
    Image { url: String },
}

impl OverlayIcon {
    fn to_value(&self) -> Value {
        match self {
            OverlayIcon::Emoji { data } => json!({
                "type": "emoji",
                "data": data,
            }),
            OverlayIcon::Image { url } => json!({
                "type": "image",
                "data": url,
                "source": "url",
            }),
        }
    }
}

/// One caption overlay preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum CaptionOverlay {
    /// Plain caption text. A blank caption produces no overlay.
    Standard { text: String },
    /// Caption rendered with the clock icon.
    Time { text: String },
    /// Star rating with a quoted comment.
    Review { rating: String, comment: String },
    /// Current conditions caption, e.g. "72° Sunny".
    Weather {
        text: String,
        /// SF Symbol name for the conditions icon.
        icon: String,
    },
    /// Music caption with a tappable payload.
    Music {
        text: String,
        preview_url: String,
        external_url: String,
        isrc: String,
        song_title: String,
        artist: String,
        icon_url: String,
    },
    /// Decorated caption with custom colors and an optional icon.
    StaticContent {
        text: String,
        #[serde(default)]
        text_color: Option<String>,
        #[serde(default)]
        color_top: Option<String>,
        #[serde(default)]
        color_bottom: Option<String>,
        #[serde(default)]
        icon: Option<OverlayIcon>,
        #[serde(default)]
        overlay_id: Option<String>,
    },
}

fn gradient(color_top: &Option<String>, color_bottom: &Option<String>) -> Value {
    let colors = match (color_top, color_bottom) {
        (Some(top), Some(bottom)) => json!([top, bottom]),
        _ => json!([]),
    };
    json!({ "material_blur": "ultra_thin", "colors": colors })
}

fn overlay(data: Value, alt_text: &str, overlay_id: &str) -> Value {
    json!({
        "data": data,
        "alt_text": alt_text,
        "overlay_id": overlay_id,
        "overlay_type": "caption",
    })
}

impl CaptionOverlay {
    /// Builds the wire payload, or `None` when the preset renders
    /// nothing (blank standard caption).
    pub fn to_payload(&self) -> Option<Value> {
        match self {
            CaptionOverlay::Standard { text } => {
                if text.trim().is_empty() {
                    return None;
                }
                Some(overlay(
                    json!({
                        "text": text,
                        "text_color": DEFAULT_TEXT_COLOR,
                        "type": "standard",
                        "max_lines": 4,
                        "background": { "colors": [], "material_blur": "ultra_thin" },
                    }),
                    text,
                    "caption:standard",
                ))
            }
            CaptionOverlay::Time { text } => Some(overlay(
                json!({
                    "text": text,
                    "text_color": DEFAULT_TEXT_COLOR,
                    "type": "time",
                    "max_lines": 4,
                    "icon": {
                        "color": "#FFFFFFCC",
                        "data": "clock.fill",
                        "type": "sf_symbol",
                    },
                    "background": { "material_blur": "regular", "colors": [] },
                }),
                text,
                "caption:time",
            )),
            CaptionOverlay::Review { rating, comment } => {
                let text = format!("\u{2605}{} - \"{}\"", rating, comment);
                Some(overlay(
                    json!({
                        "text": text,
                        "text_color": DEFAULT_TEXT_COLOR,
                        "type": "review",
                        "max_lines": 1,
                        "payload": { "comment": comment, "rating": rating },
                        "background": { "material_blur": "regular", "colors": [] },
                    }),
                    &text,
                    "caption:review",
                ))
            }
            CaptionOverlay::Weather { text, icon } => Some(overlay(
                json!({
                    "text": text,
                    "text_color": DEFAULT_TEXT_COLOR,
                    "type": "weather",
                    "max_lines": 1,
                    "icon": {
                        "color": "#FFFFFFCC",
                        "data": icon,
                        "type": "sf_symbol",
                    },
                    "background": { "material_blur": "regular", "colors": [] },
                }),
                text,
                "caption:weather",
            )),
            CaptionOverlay::Music {
                text,
                preview_url,
                external_url,
                isrc,
                song_title,
                artist,
                icon_url,
            } => Some(overlay(
                json!({
                    "text": text,
                    "text_color": DEFAULT_TEXT_COLOR,
                    "type": "music",
                    "icon": { "type": "image", "data": icon_url, "source": "url" },
                    "max_lines": 1,
                    "payload": {
                        "preview_url": preview_url,
                        "spotify_url": external_url,
                        "isrc": isrc,
                        "song_title": song_title,
                        "artist": artist,
                    },
                    "background": { "material_blur": "ultra_thin", "colors": [] },
                }),
                text,
                "caption:music",
            )),
            CaptionOverlay::StaticContent {
                text,
                text_color,
                color_top,
                color_bottom,
                icon,
                overlay_id,
            } => {
                let mut data = json!({
                    "text": text,
                    "text_color": text_color.as_deref().unwrap_or(DEFAULT_TEXT_COLOR),
                    "type": "static_content",
                    "max_lines": 4,
                    "background": gradient(color_top, color_bottom),
                });
                if let Some(icon) = icon {
                    data["icon"] = icon.to_value();
                }
                Some(overlay(
                    data,
                    text,
                    overlay_id.as_deref().unwrap_or("caption:static"),
                ))
            }
        }
    }
}

/// Builds the overlays array for a post, skipping empty presets.
pub fn build_overlays(presets: &[CaptionOverlay]) -> Vec<Value> {
    presets.iter().filter_map(|p| p.to_payload()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_standard_caption_renders_nothing() {
        let preset = CaptionOverlay::Standard {
            text: "   ".to_string(),
        };
        assert!(preset.to_payload().is_none());
    }

    #[test]
    fn test_standard_caption_shape() {
        let payload = CaptionOverlay::Standard {
            text: "hello".to_string(),
        }
        .to_payload()
        .unwrap();
        assert_eq!(payload["overlay_id"], "caption:standard");
        assert_eq!(payload["overlay_type"], "caption");
        assert_eq!(payload["alt_text"], "hello");
        assert_eq!(payload["data"]["type"], "standard");
        assert_eq!(payload["data"]["max_lines"], 4);
    }

    #[test]
    fn test_time_caption_carries_clock_icon() {
        let payload = CaptionOverlay::Time {
            text: "late night".to_string(),
        }
        .to_payload()
        .unwrap();
        assert_eq!(payload["overlay_id"], "caption:time");
        assert_eq!(payload["data"]["icon"]["data"], "clock.fill");
        assert_eq!(payload["data"]["icon"]["type"], "sf_symbol");
    }

    #[test]
    fn test_review_caption_formats_text() {
        let payload = CaptionOverlay::Review {
            rating: "4".to_string(),
            comment: "solid".to_string(),
        }
        .to_payload()
        .unwrap();
        assert_eq!(payload["data"]["text"], "\u{2605}4 - \"solid\"");
        assert_eq!(payload["data"]["payload"]["rating"], "4");
        assert_eq!(payload["overlay_id"], "caption:review");
    }

    #[test]
    fn test_static_content_gradient_requires_both_colors() {
        let payload = CaptionOverlay::StaticContent {
            text: "ootd".to_string(),
            text_color: None,
            color_top: Some("#112233".to_string()),
            color_bottom: None,
            icon: None,
            overlay_id: None,
        }
        .to_payload()
        .unwrap();
        assert_eq!(payload["data"]["background"]["colors"], json!([]));

        let payload = CaptionOverlay::StaticContent {
            text: "ootd".to_string(),
            text_color: None,
            color_top: Some("#112233".to_string()),
            color_bottom: Some("#445566".to_string()),
            icon: Some(OverlayIcon::Emoji {
                data: "🔥".to_string(),
            }),
            overlay_id: Some("caption:party".to_string()),
        }
        .to_payload()
        .unwrap();
        assert_eq!(
            payload["data"]["background"]["colors"],
            json!(["#112233", "#445566"])
        );
        assert_eq!(payload["data"]["icon"]["type"], "emoji");
        assert_eq!(payload["overlay_id"], "caption:party");
    }

    #[test]
    fn test_build_overlays_skips_empty() {
        let overlays = build_overlays(&[
            CaptionOverlay::Standard {
                text: String::new(),
            },
            CaptionOverlay::Time {
                text: "now".to_string(),
            },
        ]);
        assert_eq!(overlays.len(), 1);
    }

    #[test]
    fn test_preset_round_trips_through_serde() {
        let preset = CaptionOverlay::Music {
            text: "song".to_string(),
            preview_url: "https://p.example/x.mp3".to_string(),
            external_url: "https://open.example/track".to_string(),
            isrc: "ABC123".to_string(),
            song_title: "Song".to_string(),
            artist: "Artist".to_string(),
            icon_url: "https://i.example/icon.png".to_string(),
        };
        let encoded = serde_json::to_string(&preset).unwrap();
        assert!(encoded.contains("\"style\":\"music\""));
        let decoded: CaptionOverlay = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, preset);
    }
}
