use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::{Flow, FlowError, not_blank, run_flow};
use crate::llm::GenerativeModel;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssistantQuery {
    #[validate(custom(function = "not_blank"))]
    pub user_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssistantAnswer {
    #[validate(custom(function = "not_blank"))]
    #[schemars(
        description = "A helpful response, recommendation, or information based on the user's query."
    )]
    pub recommendation: String,
    #[validate(custom(function = "not_blank"))]
    #[schemars(
        description = "The reasoning or additional context for the response/recommendation."
    )]
    pub reason: String,
}

pub struct LocalAssistantFlow;

const LOCAL_ASSISTANT_PROMPT: &str = r#"You are a helpful and knowledgeable local assistant for the city.
A user will ask you a question, state a mood, or mention a craving. Provide a relevant recommendation, information, or answer.
If they mention a mood or craving, suggest a specific spot or activity. Explain your reasoning or provide context.
"#;

impl Flow for LocalAssistantFlow {
    const NAME: &'static str = "localAssistantFlow";
    type Input = AssistantQuery;
    type Output = AssistantAnswer;

    fn render_prompt(input: &AssistantQuery) -> String {
        format!("{}\nUser Query: {}\n", LOCAL_ASSISTANT_PROMPT, input.user_query)
    }

    fn output_schema() -> Value {
        schema_for!(AssistantAnswer).to_value()
    }
}

/// Answer a free-text question, mood or craving about the city.
pub async fn get_local_assistant_response(
    model: &dyn GenerativeModel,
    input: &AssistantQuery,
) -> Result<AssistantAnswer, FlowError> {
    run_flow::<LocalAssistantFlow>(model, input).await
}
