use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::{Flow, FlowError, not_blank, run_flow};
use crate::llm::GenerativeModel;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VibeQuery {
    #[validate(custom(function = "not_blank"))]
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
}

impl VibeQuery {
    /// The city, if one was given; blank counts as absent.
    pub fn city(&self) -> Option<&str> {
        self.city_name
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendingPlace {
    #[schemars(description = "Name of the trending place.")]
    pub name: String,
    #[serde(rename = "type")]
    #[schemars(description = "Type of place (e.g., cafe, bar, food truck, restaurant).")]
    pub kind: String,
}

/// Only the four canonical phrases are accepted, spelled exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrowdLevel {
    NotBusy,
    ModeratelyBusy,
    VeryBusy,
    NotApplicable,
}

impl CrowdLevel {
    pub const ALL: [CrowdLevel; 4] = [
        CrowdLevel::NotBusy,
        CrowdLevel::ModeratelyBusy,
        CrowdLevel::VeryBusy,
        CrowdLevel::NotApplicable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrowdLevel::NotBusy => "Not busy",
            CrowdLevel::ModeratelyBusy => "Moderately busy",
            CrowdLevel::VeryBusy => "Very busy",
            CrowdLevel::NotApplicable => "Not applicable",
        }
    }

    /// Rough occupancy gauge shown next to the crowd level.
    pub fn occupancy_percent(&self) -> u8 {
        match self {
            CrowdLevel::NotBusy => 25,
            CrowdLevel::ModeratelyBusy => 55,
            CrowdLevel::VeryBusy => 85,
            CrowdLevel::NotApplicable => 0,
        }
    }
}

impl fmt::Display for CrowdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrowdLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrowdLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "crowdLevel must be one of \"Not busy\", \"Moderately busy\", \"Very busy\", \"Not applicable\", got \"{}\"",
                    s
                )
            })
    }
}

impl TryFrom<String> for CrowdLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrowdLevel> for String {
    fn from(level: CrowdLevel) -> Self {
        level.as_str().to_string()
    }
}

impl JsonSchema for CrowdLevel {
    fn schema_name() -> Cow<'static, str> {
        "CrowdLevel".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        let phrases = CrowdLevel::ALL.map(|level| level.as_str());
        json_schema!({
            "type": "string",
            "enum": phrases,
            "description": "Current crowd level at the place."
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VibeReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 4))]
    #[schemars(description = "List of 3-4 trending nearby or related places.")]
    pub trending_places: Option<Vec<TrendingPlace>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crowd_level: Option<CrowdLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Estimated wait time, e.g. \"No wait\" or \"5-10 minutes\".")]
    pub estimated_wait_time: Option<String>,
    #[validate(length(max = 5))]
    #[schemars(description = "Live comments reflecting the current vibe of the place.")]
    pub comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 5.0))]
    #[schemars(description = "Simulated average mood/atmosphere rating (0-5 stars).")]
    pub simulated_mood_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 5.0))]
    #[schemars(description = "Simulated average music rating (0-5 stars), if applicable.")]
    pub simulated_music_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 5.0))]
    #[schemars(description = "Simulated average crowd rating (0-5 stars).")]
    pub simulated_crowd_rating: Option<f64>,
}

pub struct VibeCheckerFlow;

const VIBE_INSTRUCTIONS: &str = r#"Given the name of the place or area, you will respond with:
1. Trending nearby or related places: List 3-4 diverse and popular/accessible bars, restaurants, cafes, and food trucks. If none, provide an empty array.
2. Crowd level: Assess the current crowd level as one of "Not busy", "Moderately busy", "Very busy". If not applicable, state "Not applicable".
3. Estimated wait time: Provide an estimated wait time if applicable (e.g., "No wait", "5-10 minutes"). If not applicable, state "Not applicable".
4. Simulated average ratings (0-5 stars):
   - Mood: General mood/atmosphere.
   - Music: If applicable, what's the music like.
   - Crowd: How people generally feel about the crowd (e.g., lively, too packed).
   Provide these as numerical scores. If a rating is not applicable (e.g. music for a park), omit it.
5. Live comments: An array of 3-5 live comments reflecting the current vibe of the main queried place, in English.
   They should sound like they come from different individuals sharing their feelings about the atmosphere, music and crowd
   (e.g., "Music is too loud!", "Love the chill mood here."). If no relevant comments can be generated, provide an empty array.
"#;

impl Flow for VibeCheckerFlow {
    const NAME: &'static str = "liveVibeFlow";
    type Input = VibeQuery;
    type Output = VibeReport;

    fn render_prompt(input: &VibeQuery) -> String {
        let place = input.place_name.trim();
        let mut prompt = String::from(
            "You are a helpful assistant that provides live insights about a place or area.\n",
        );
        if let Some(city) = input.city() {
            prompt.push_str(&format!(
                "The place, \"{}\", is located in or near the city of {}. Use this city context if relevant for determining local trends or typical vibes.\n",
                place, city
            ));
        }
        prompt.push('\n');
        prompt.push_str(VIBE_INSTRUCTIONS);
        prompt.push_str(&format!("\nPlace/Area Name: {}\n", place));
        prompt
    }

    fn output_schema() -> Value {
        schema_for!(VibeReport).to_value()
    }
}

/// Snapshot of the current vibe at a place.
pub async fn get_live_vibe(
    model: &dyn GenerativeModel,
    input: &VibeQuery,
) -> Result<VibeReport, FlowError> {
    run_flow::<VibeCheckerFlow>(model, input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelError;
    use crate::llm::stub::StubModel;

    fn marina_beach(city: Option<&str>) -> VibeQuery {
        VibeQuery {
            place_name: "Marina Beach".to_string(),
            city_name: city.map(str::to_string),
        }
    }

    #[test]
    fn test_prompt_without_city_never_mentions_one() {
        let prompt = VibeCheckerFlow::render_prompt(&marina_beach(None));
        assert!(!prompt.to_lowercase().contains("city"));
        assert!(prompt.contains("Place/Area Name: Marina Beach"));
    }

    #[test]
    fn test_prompt_with_city_includes_it_verbatim() {
        let prompt = VibeCheckerFlow::render_prompt(&marina_beach(Some("Chennai")));
        assert!(prompt.contains("near the city of Chennai."));
        assert!(prompt.contains("\"Marina Beach\""));
    }

    #[test]
    fn test_blank_city_counts_as_absent() {
        let prompt = VibeCheckerFlow::render_prompt(&marina_beach(Some("   ")));
        assert!(!prompt.to_lowercase().contains("city"));
    }

    #[test]
    fn test_crowd_level_parsing() {
        assert_eq!("Very busy".parse::<CrowdLevel>(), Ok(CrowdLevel::VeryBusy));
        assert!("Packed".parse::<CrowdLevel>().is_err());
        assert!("moderately busy".parse::<CrowdLevel>().is_err());
        assert!(" Very busy ".parse::<CrowdLevel>().is_err());
        for level in CrowdLevel::ALL {
            assert_eq!(level.as_str().parse::<CrowdLevel>(), Ok(level));
        }
    }

    #[test]
    fn test_crowd_level_wire_format() {
        let level: CrowdLevel = serde_json::from_str(r#""Not busy""#).unwrap();
        assert_eq!(serde_json::to_string(&level).unwrap(), r#""Not busy""#);
        assert!(serde_json::from_str::<CrowdLevel>(r#""NOT BUSY""#).is_err());
    }

    #[test]
    fn test_output_schema_lists_crowd_levels_and_ratings() {
        let schema = VibeCheckerFlow::output_schema();
        assert_eq!(schema["type"], "object");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required, &vec![Value::from("comments")]);
        let text = schema.to_string();
        for level in CrowdLevel::ALL {
            assert!(text.contains(level.as_str()));
        }
        for field in ["trendingPlaces", "estimatedWaitTime", "simulatedMusicRating"] {
            assert!(text.contains(field), "schema is missing {field}");
        }
    }

    #[test]
    fn test_occupancy_percent() {
        assert_eq!(CrowdLevel::NotBusy.occupancy_percent(), 25);
        assert_eq!(CrowdLevel::ModeratelyBusy.occupancy_percent(), 55);
        assert_eq!(CrowdLevel::VeryBusy.occupancy_percent(), 85);
        assert_eq!(CrowdLevel::NotApplicable.occupancy_percent(), 0);
    }

    #[tokio::test]
    async fn test_full_report() {
        let model = StubModel::answering(
            r#"{
                "trendingPlaces": [
                    {"name": "Sundari Akka Kadai", "type": "food stall"},
                    {"name": "Amethyst", "type": "cafe"}
                ],
                "crowdLevel": "Very busy",
                "estimatedWaitTime": "No wait",
                "comments": ["Sea breeze is perfect tonight", "So many people!", "Loving the sundal"],
                "simulatedMoodRating": 4.5,
                "simulatedCrowdRating": 3
            }"#,
        );
        let report = get_live_vibe(&model, &marina_beach(Some("Chennai")))
            .await
            .unwrap();
        assert_eq!(report.crowd_level, Some(CrowdLevel::VeryBusy));
        assert_eq!(report.comments.len(), 3);
        assert_eq!(report.trending_places.as_ref().map(Vec::len), Some(2));
        assert!(report.simulated_music_rating.is_none());
        assert!(model.last_prompt().contains("Chennai"));
    }

    #[tokio::test]
    async fn test_omitted_optional_fields_are_not_a_failure() {
        let model = StubModel::answering(r#"{"comments": []}"#);
        let report = get_live_vibe(&model, &marina_beach(None)).await.unwrap();
        assert!(report.trending_places.is_none());
        assert!(report.crowd_level.is_none());
        assert!(report.estimated_wait_time.is_none());
        assert!(report.comments.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_crowd_level_is_rejected() {
        let model = StubModel::answering(r#"{"crowdLevel": "Packed", "comments": []}"#);
        let err = get_live_vibe(&model, &marina_beach(None)).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::ModelInvocation(ModelError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_rating_above_five_is_rejected() {
        let model =
            StubModel::answering(r#"{"comments": ["nice"], "simulatedMusicRating": 7}"#);
        let err = get_live_vibe(&model, &marina_beach(None)).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::ModelInvocation(ModelError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_lowercase_crowd_level_is_rejected() {
        let model = StubModel::answering(r#"{"crowdLevel": "very busy", "comments": []}"#);
        let err = get_live_vibe(&model, &marina_beach(None)).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::ModelInvocation(ModelError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_too_many_trending_places_is_rejected() {
        let model = StubModel::answering(
            r#"{"trendingPlaces": [
                {"name": "A", "type": "cafe"}, {"name": "B", "type": "bar"},
                {"name": "C", "type": "cafe"}, {"name": "D", "type": "bar"},
                {"name": "E", "type": "food truck"}
            ], "comments": []}"#,
        );
        let err = get_live_vibe(&model, &marina_beach(None)).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::ModelInvocation(ModelError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_too_many_comments_is_rejected() {
        let model = StubModel::answering(r#"{"comments": ["a", "b", "c", "d", "e", "f"]}"#);
        let err = get_live_vibe(&model, &marina_beach(None)).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::ModelInvocation(ModelError::SchemaViolation(_))
        ));
    }
}
