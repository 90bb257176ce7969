//! Transformer trait
//!
//! 변환기는 이름, 프롬프트, 옵션과 선택적인 before/after 훅으로 정의됩니다.
//! 이름은 캐시 식별자의 판별자이자 큐에서 핸들러를 찾는 키입니다.

use async_trait::async_trait;
use prism_foundation::{Content, Context, Result};
use std::sync::Arc;

use crate::options::TransformerOptions;
use crate::result::TransformerResult;

// ============================================================================
// Transformer Trait
// ============================================================================

/// Prompt-driven transformation definition
///
/// 모든 훅에는 기본 구현이 있어 필요한 것만 오버라이드하면 됩니다.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// 판별자 (캐시 식별자, 핸들러 등록 이름)
    fn name(&self) -> &str;

    /// 실행할 프롬프트
    fn prompt(&self) -> String;

    fn options(&self) -> TransformerOptions {
        TransformerOptions::default()
    }

    /// 캐시 미스 후, 프로바이더 호출 전
    ///
    /// `Err` 는 실패한 결과로 기록됩니다.
    async fn before_transform(&self, _content: &Content, _context: &Context) -> Result<()> {
        Ok(())
    }

    /// 성공한 결과가 캐시에 기록된 후
    async fn after_transform(&self, _result: &TransformerResult) {}
}

// ============================================================================
// InlineTransformer
// ============================================================================

type BeforeFn = Arc<dyn Fn(&Content, &Context) -> Result<()> + Send + Sync>;
type AfterFn = Arc<dyn Fn(&TransformerResult) + Send + Sync>;

/// Transformer assembled from values and closures
///
/// ```ignore
/// let t = InlineTransformer::new("summarize", "Summarize in one line")
///     .with_options(TransformerOptions::new().with_temperature(0.2));
/// ```
#[derive(Clone)]
pub struct InlineTransformer {
    name: String,
    prompt: String,
    options: TransformerOptions,
    before: Option<BeforeFn>,
    after: Option<AfterFn>,
}

impl InlineTransformer {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            options: TransformerOptions::default(),
            before: None,
            after: None,
        }
    }

    pub fn with_options(mut self, options: TransformerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Content, &Context) -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(f));
        self
    }

    pub fn with_after<F>(mut self, f: F) -> Self
    where
        F: Fn(&TransformerResult) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for InlineTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineTransformer")
            .field("name", &self.name)
            .field("prompt", &self.prompt)
            .field("options", &self.options)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[async_trait]
impl Transformer for InlineTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn prompt(&self) -> String {
        self.prompt.clone()
    }

    fn options(&self) -> TransformerOptions {
        self.options.clone()
    }

    async fn before_transform(&self, content: &Content, context: &Context) -> Result<()> {
        match &self.before {
            Some(before) => before(content, context),
            None => Ok(()),
        }
    }

    async fn after_transform(&self, result: &TransformerResult) {
        if let Some(after) = &self.after {
            after(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_foundation::Error;

    #[tokio::test]
    async fn test_inline_hooks() {
        let transformer = InlineTransformer::new("guarded", "Do it")
            .with_before(|content, _| match content {
                Content::Url(_) => Err(Error::InvalidInput("urls not accepted".into())),
                _ => Ok(()),
            });

        let context = Context::new();
        assert!(transformer
            .before_transform(&Content::text("ok"), &context)
            .await
            .is_ok());
        assert!(transformer
            .before_transform(&Content::url("https://x"), &context)
            .await
            .is_err());
    }

    #[test]
    fn test_defaults() {
        let transformer = InlineTransformer::new("plain", "Echo");
        assert_eq!(transformer.name(), "plain");
        assert_eq!(transformer.prompt(), "Echo");
        assert_eq!(transformer.options(), TransformerOptions::default());
    }
}
