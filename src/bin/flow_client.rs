use anyhow::Result;
use city_companion::flows::{CrowdLevel, VibeReport};
use serde_json::{Value, json};

const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";

async fn call_flow(
    client: &reqwest::Client,
    base_url: &str,
    path: &str,
    body: Value,
) -> Result<Value> {
    let url = format!("{}{}", base_url, path);
    println!("🔍 POST {}", url);
    println!("Request: {}", body);

    let response = client.post(&url).json(&body).send().await?;
    let status = response.status();
    let body: Value = response.json().await?;

    if !status.is_success() {
        return Err(anyhow::anyhow!("{} failed with {}: {}", path, status, body));
    }
    Ok(body)
}

fn print_vibe(report: &Value) {
    match serde_json::from_value::<VibeReport>(report.clone()) {
        Ok(report) => {
            let level = report.crowd_level.unwrap_or(CrowdLevel::NotApplicable);
            println!("👥 Crowd: {} ({}% occupancy)", level, level.occupancy_percent());
            for comment in &report.comments {
                println!("   💬 {}", comment);
            }
        }
        Err(e) => println!("⚠️  Vibe report did not parse: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("🚀 City Companion flow smoke test");
    println!("{}", "=".repeat(50));

    let base_url =
        std::env::var("FLOW_SERVICE_URL").unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
    let client = reqwest::Client::new();

    let calls = vec![
        (
            "/api/local-assistant",
            json!({ "userQuery": "feeling adventurous, what should I do this evening?" }),
        ),
        (
            "/api/pg-matcher",
            json!({ "budget": 10000, "location": "Koramangala", "facilities": "wifi,AC", "roommatePreference": "" }),
        ),
        ("/api/vibe-check", json!({ "placeName": "Marina Beach" })),
        (
            "/api/vibe-check",
            json!({ "placeName": "Church Street", "cityName": "Bangalore" }),
        ),
        (
            "/api/fare-estimate",
            json!({ "transportType": "auto-rickshaw", "startLocation": "Bus Stand", "endLocation": "Market" }),
        ),
    ];

    // Fire everything at once; calls are independent of each other.
    let futures = calls
        .iter()
        .map(|(path, body)| call_flow(&client, &base_url, path, body.clone()));
    let results = futures::future::join_all(futures).await;

    let mut failures = 0;
    for ((path, _), result) in calls.iter().zip(results) {
        println!("\n{}", "─".repeat(40));
        match result {
            Ok(body) => {
                println!("✅ {}", path);
                if *path == "/api/vibe-check" {
                    print_vibe(&body);
                }
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            Err(e) => {
                failures += 1;
                println!("❌ {}", e);
            }
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("🏁 {} calls, {} failed", calls.len(), failures);

    Ok(())
}
