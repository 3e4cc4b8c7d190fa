use crate::config::LlmSpec;
use crate::llm;
use crate::{Error, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::debug;

/// Chat completions client. Gemini is reached through its OpenAI-compatible
/// endpoint, so one client type covers both providers.
pub struct OpenAI {
    model: String,
    client: Client<OpenAIConfig>,
}

impl OpenAI {
    pub fn new(spec: &LlmSpec, api_key: &str) -> std::sync::Arc<Self> {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = spec.provider.api_base() {
            config = config.with_api_base(base);
        }

        std::sync::Arc::new(Self {
            model: spec.model.clone(),
            client: Client::with_config(config),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TryFrom<&llm::Message> for ChatCompletionRequestMessage {
    type Error = Error;

    fn try_from(msg: &llm::Message) -> Result<Self> {
        match msg {
            llm::Message::User(msg) => Ok(ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(msg.clone()),
                    name: None,
                },
            )),
            llm::Message::System(msg) => Ok(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.clone()),
                    name: None,
                },
            )),
        }
    }
}

#[async_trait]
impl llm::LLM for OpenAI {
    async fn completion<'a>(
        &self,
        request: llm::CompletionRequest<'a>,
    ) -> Result<llm::CompletionResponse> {
        let mut completion = CreateChatCompletionRequestArgs::default();
        completion.model(&self.model).messages(
            request
                .messages
                .iter()
                .map(ChatCompletionRequestMessage::try_from)
                .collect::<Result<Vec<_>>>()?,
        );

        if let Some(temperature) = request.temperature {
            completion.temperature(temperature);
        }

        let completion = completion.build()?;

        debug!(model = %self.model, messages = request.messages.len(), "chat completion");
        let res = self.client.chat().create(completion).await?;

        let choice = res
            .choices
            .into_iter()
            .next()
            .ok_or(Error::LLMResponseError("choices is empty".to_string()))?;

        let content = choice
            .message
            .content
            .ok_or(Error::LLMResponseError("content is empty".to_string()))?;

        Ok(llm::CompletionResponse { content })
    }
}
