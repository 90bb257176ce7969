//! Content - 변환 입력 (텍스트, URL, 미디어) 및 컨텍스트

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::Fingerprint;
use crate::media::{Media, QueueableMedia};
use crate::Result;

/// 실행 경로와 무관하게 핸들러에 그대로 전달되는 컨텍스트
pub type Context = Map<String, Value>;

/// 변환 입력
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// 원문 텍스트
    Text(String),
    /// 아직 가져오지 않은 원격 URL
    Url(String),
    /// 이미지 / 문서
    Media(Media),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Content::Url(url.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_media(&self) -> Option<&Media> {
        match self {
            Content::Media(media) => Some(media),
            _ => None,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, Content::Media(_))
    }

    /// 캐시 키용 다이제스트 (64 hex)
    pub fn digest(&self) -> String {
        let mut fp = Fingerprint::new("content");
        match self {
            Content::Text(text) => {
                fp.push_str("text", text);
            }
            Content::Url(url) => {
                fp.push_str("url", url);
            }
            Content::Media(media) => {
                fp.push_str("kind", media.kind().as_str())
                    .push_opt_str("mime_type", media.mime_type())
                    .push_opt_str("title", media.title())
                    .push_bytes("bytes", media.bytes());
            }
        }
        fp.finalize()
    }

    /// 큐 전송용 표현
    pub fn to_queueable(&self) -> QueueableContent {
        match self {
            Content::Text(text) => QueueableContent::Text { text: text.clone() },
            Content::Url(url) => QueueableContent::Url { url: url.clone() },
            Content::Media(media) => QueueableContent::Media {
                media: QueueableMedia::from_media(media),
            },
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Media> for Content {
    fn from(media: Media) -> Self {
        Content::Media(media)
    }
}

/// 직렬화 가능한 Content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueableContent {
    Text { text: String },
    Url { url: String },
    Media { media: QueueableMedia },
}

impl QueueableContent {
    /// 원래 Content 복원 (미디어 디코드 실패는 에러)
    pub fn into_content(self) -> Result<Content> {
        Ok(match self {
            QueueableContent::Text { text } => Content::Text(text),
            QueueableContent::Url { url } => Content::Url(url),
            QueueableContent::Media { media } => Content::Media(media.to_media()?),
        })
    }
}
