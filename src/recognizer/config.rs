use crate::error::RecognizerError;
use serde::{Deserialize, Serialize};

/// Audio encodings the recognizer accepts when decoding is explicit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    Linear16,
    Flac,
    Mulaw,
    OggOpus,
    WebmOpus,
}

/// How the recognizer should interpret the audio payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Decoding {
    /// Let the recognizer sniff the container format
    Auto,

    /// Raw or container audio with a known layout
    Explicit {
        encoding: AudioEncoding,
        #[serde(rename = "sampleRateHertz")]
        sample_rate_hertz: u32,
        channels: u16,
    },
}

/// Optional recognizer behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionFeatures {
    /// Insert punctuation into transcripts
    pub punctuation: bool,

    /// Report per-word time offsets
    pub word_timing: bool,
}

impl Default for RecognitionFeatures {
    fn default() -> Self {
        Self {
            punctuation: true,
            word_timing: true,
        }
    }
}

/// The configuration handshake sent as the first message of every
/// recognition call
///
/// Resolved once before any session starts; sessions never try alternative
/// configurations at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerConfig {
    /// BCP-47 language codes the recognizer may detect
    pub languages: Vec<String>,

    pub decoding: Decoding,

    /// Recognition model name
    pub model: String,

    pub features: RecognitionFeatures,

    /// Emit provisional results before a phrase is finalized
    pub interim_results: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en-US".to_string(), "sw-KE".to_string()], // English + Swahili (Kenya)
            decoding: Decoding::Auto,
            model: "chirp_3".to_string(),
            features: RecognitionFeatures::default(),
            interim_results: true,
        }
    }
}

impl RecognizerConfig {
    /// Reject configurations the recognizer would refuse at handshake time
    pub fn validate(&self) -> Result<(), RecognizerError> {
        if self.languages.is_empty() {
            return Err(RecognizerError::InvalidConfig(
                "at least one language is required".to_string(),
            ));
        }

        if let Some(blank) = self.languages.iter().find(|l| l.trim().is_empty()) {
            return Err(RecognizerError::InvalidConfig(format!(
                "blank language code {:?}",
                blank
            )));
        }

        if self.model.trim().is_empty() {
            return Err(RecognizerError::InvalidConfig(
                "model name is required".to_string(),
            ));
        }

        if let Decoding::Explicit {
            sample_rate_hertz,
            channels,
            ..
        } = &self.decoding
        {
            if *sample_rate_hertz == 0 {
                return Err(RecognizerError::InvalidConfig(
                    "explicit decoding needs a sample rate".to_string(),
                ));
            }
            if *channels == 0 {
                return Err(RecognizerError::InvalidConfig(
                    "explicit decoding needs a channel count".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RecognizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "chirp_3");
        assert!(config.features.punctuation);
        assert!(config.features.word_timing);
        assert!(config.interim_results);
    }

    #[test]
    fn empty_language_list_is_rejected() {
        let config = RecognizerConfig {
            languages: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RecognizerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn explicit_decoding_requires_sample_rate() {
        let config = RecognizerConfig {
            decoding: Decoding::Explicit {
                encoding: AudioEncoding::Linear16,
                sample_rate_hertz: 0,
                channels: 1,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn decoding_serializes_with_mode_tag() {
        let json = serde_json::to_value(Decoding::Explicit {
            encoding: AudioEncoding::WebmOpus,
            sample_rate_hertz: 48000,
            channels: 1,
        })
        .unwrap();

        assert_eq!(json["mode"], "explicit");
        assert_eq!(json["encoding"], "WEBM_OPUS");
        assert_eq!(json["sampleRateHertz"], 48000);

        let auto = serde_json::to_value(Decoding::Auto).unwrap();
        assert_eq!(auto["mode"], "auto");
    }
}
