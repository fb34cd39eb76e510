use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::{Flow, FlowError, not_blank, run_flow};
use crate::llm::GenerativeModel;

const NO_PREFERENCE: &str = "No specific preference";

/// Empty `facilities` or `roommatePreference` means no preference, but both
/// keys have to be present.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomSearchCriteria {
    #[validate(range(exclusive_min = 0.0))]
    pub budget: f64,
    #[validate(custom(function = "not_blank"))]
    pub location: String,
    pub facilities: String,
    pub roommate_preference: String,
}

impl RoomSearchCriteria {
    /// Comma-separated facilities as a trimmed list; empty means no preference.
    pub fn requested_facilities(&self) -> Vec<String> {
        self.facilities
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomMatch {
    #[schemars(description = "The name of the PG/room.")]
    pub pg_name: String,
    #[schemars(description = "The address of the PG/room.")]
    pub address: String,
    #[validate(range(min = 0.0))]
    #[schemars(description = "The monthly price of the PG/room.")]
    pub price: f64,
    #[schemars(description = "A comma-separated list of available facilities.")]
    pub facilities: String,
    #[schemars(description = "Contact information for the PG/room.")]
    pub contact: String,
    #[validate(range(min = 0.0, max = 1.0))]
    #[schemars(
        description = "A score (0-1) indicating how well this PG/room matches the user preferences. Higher is better."
    )]
    pub match_score: f64,
}

/// Matches in the order the model ranked them. Neither order nor score is
/// deterministic across calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
pub struct RoomMatchList {
    #[validate(nested)]
    #[schemars(description = "A list of PG/room matches based on the user specified criteria.")]
    pub matches: Vec<RoomMatch>,
}

fn or_no_preference(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { NO_PREFERENCE } else { trimmed }
}

pub struct RoomMatcherFlow;

impl Flow for RoomMatcherFlow {
    const NAME: &'static str = "pgRoomMatcherFlow";
    type Input = RoomSearchCriteria;
    type Output = RoomMatchList;

    fn render_prompt(input: &RoomSearchCriteria) -> String {
        let facilities = input.requested_facilities();
        let facilities = if facilities.is_empty() {
            NO_PREFERENCE.to_string()
        } else {
            facilities.join(", ")
        };

        format!(
            r#"You are an AI assistant helping users find suitable PG/room options based on their preferences.
Given the following user criteria, find the best PG/room matches:

Budget: {}
Location: {}
Facilities: {}
Roommate Preference: {}

Return a list of PG/room matches, including the name, address, price, facilities, contact information,
and a match score (0-1) indicating how well each option fits the user's needs.
The facilities string should only include the facilities that are actually present in the PG/room.
"#,
            input.budget,
            input.location.trim(),
            facilities,
            or_no_preference(&input.roommate_preference),
        )
    }

    fn output_schema() -> Value {
        schema_for!(RoomMatchList).to_value()
    }
}

/// Find PG/room listings for the given criteria.
pub async fn find_pg_room_matches(
    model: &dyn GenerativeModel,
    input: &RoomSearchCriteria,
) -> Result<RoomMatchList, FlowError> {
    run_flow::<RoomMatcherFlow>(model, input).await
}
