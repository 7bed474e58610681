//! Arbitrage API models.
//!
//! Wire types for the HTTP surface: the response envelope, the arbitrage
//! record as clients see it, and the create/update payloads.

use serde::{Deserialize, Serialize};

/// Stake details for one side of an arbitrage (amount, bookmaker, ...).
///
/// Kept as an opaque JSON object; the API does not validate its shape.
pub type Stake = serde_json::Map<String, serde_json::Value>;

/// Fields a client posted beyond the known ones. Stored and returned as-is.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

/// Response envelope shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Human-readable outcome.
    pub message: String,

    /// Payload; `null` on failure or empty results.
    pub data: Option<T>,

    /// Short error label, present only on failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// Successful outcome without a payload (delete, empty filter result).
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Return on investment, stored either as a number or as a display string.
///
/// Integers stay integers so a posted `2` is not returned as `2.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Roi {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Roi {
    /// Empty strings carry no value; numbers (including zero) always do.
    pub fn is_empty(&self) -> bool {
        matches!(self, Roi::Text(text) if text.trim().is_empty())
    }
}

/// Arbitrage record as returned to clients.
///
/// The identifier is the hex form of the document store id and keeps the
/// store's `_id` key on the wire. `time` is whatever JSON value the record
/// was created with (ISO string, epoch seconds, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub home_stake: Stake,
    pub away_stake: Stake,
    pub time: serde_json::Value,
    pub roi: Option<Roi>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Request body for `POST /api/arbitrages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArbitrage {
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_stake: Stake,
    #[serde(default)]
    pub away_stake: Stake,
    pub time: serde_json::Value,
    pub roi: Roi,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Request body for `PUT /api/arbitrages/{id}`.
///
/// Every field is optional; only non-empty values are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_stake: Option<Stake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_stake: Option<Stake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<Roi>,
}

impl ArbitrageUpdate {
    /// True when no field was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.away_team.is_none()
            && self.away_stake.is_none()
            && self.home_team.is_none()
            && self.home_stake.is_none()
            && self.roi.is_none()
    }

    /// Drop supplied-but-empty values so they never overwrite stored data.
    pub fn retain_non_empty(self) -> Self {
        Self {
            away_team: self.away_team.filter(|team| !team.trim().is_empty()),
            away_stake: self.away_stake.filter(|stake| !stake.is_empty()),
            home_team: self.home_team.filter(|team| !team.trim().is_empty()),
            home_stake: self.home_stake.filter(|stake| !stake.is_empty()),
            roi: self.roi.filter(|roi| !roi.is_empty()),
        }
    }
}

/// Readiness probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: String,

    /// Document store connectivity ("healthy" or "unhealthy").
    pub database: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_omits_error() {
        let body = serde_json::to_value(ApiResponse::success("ok", vec![1, 2])).unwrap();
        assert_eq!(body, json!({"message": "ok", "data": [1, 2]}));
    }

    #[test]
    fn test_empty_envelope_has_null_data() {
        let body = serde_json::to_value(ApiResponse::<()>::empty("no arbitrages found")).unwrap();
        assert_eq!(body, json!({"message": "no arbitrages found", "data": null}));
    }

    #[test]
    fn test_failure_envelope_carries_error() {
        let body =
            serde_json::to_value(ApiResponse::<()>::failure("Arbitrage already exists", "Conflict"))
                .unwrap();
        assert_eq!(
            body,
            json!({"message": "Arbitrage already exists", "data": null, "error": "Conflict"})
        );
    }

    #[test]
    fn test_roi_accepts_number_and_string() {
        let number: Roi = serde_json::from_value(json!(2.35)).unwrap();
        let text: Roi = serde_json::from_value(json!("2.35%")).unwrap();

        let integer: Roi = serde_json::from_value(json!(2)).unwrap();

        assert_eq!(number, Roi::Number(2.35));
        assert_eq!(text, Roi::Text("2.35%".to_string()));
        assert_eq!(integer, Roi::Integer(2));
        assert_eq!(serde_json::to_value(&integer).unwrap(), json!(2));
        assert!(!Roi::Integer(0).is_empty());
        assert!(!Roi::Number(0.0).is_empty());
        assert!(Roi::Text(" ".to_string()).is_empty());
    }

    #[test]
    fn test_record_serializes_id_as_underscore_id() {
        let record = ArbitrageRecord {
            id: "65f1c2a9e4b0a1b2c3d4e5f6".to_string(),
            sport: "soccer_epl".to_string(),
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea".to_string(),
            home_stake: Stake::new(),
            away_stake: Stake::new(),
            time: json!("2024-03-16T15:00:00Z"),
            roi: Some(Roi::Number(1.8)),
            extra: ExtraFields::new(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], "65f1c2a9e4b0a1b2c3d4e5f6");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_new_arbitrage_defaults_stakes_and_requires_keys() {
        let parsed: NewArbitrage = serde_json::from_value(json!({
            "sport": "basketball_nba",
            "home_team": "Lakers",
            "away_team": "Celtics",
            "time": "2024-03-16T01:30:00Z",
            "roi": "1.2"
        }))
        .unwrap();
        assert!(parsed.home_stake.is_empty());
        assert!(parsed.away_stake.is_empty());

        let missing_time = serde_json::from_value::<NewArbitrage>(json!({
            "sport": "basketball_nba",
            "home_team": "Lakers",
            "away_team": "Celtics",
            "roi": 1.2
        }));
        assert!(missing_time.is_err());
    }

    #[test]
    fn test_new_arbitrage_keeps_extra_fields_and_opaque_time() {
        let parsed: NewArbitrage = serde_json::from_value(json!({
            "sport": "soccer_epl",
            "home_team": "Arsenal",
            "away_team": "Chelsea",
            "time": 1710601200,
            "roi": 2,
            "league": "EPL"
        }))
        .unwrap();

        assert_eq!(parsed.time, json!(1710601200));
        assert_eq!(parsed.roi, Roi::Integer(2));
        assert_eq!(parsed.extra.get("league"), Some(&json!("EPL")));
        assert_eq!(parsed.extra.len(), 1);
    }

    #[test]
    fn test_update_retain_non_empty_drops_blank_values() {
        let update = ArbitrageUpdate {
            away_team: Some(String::new()),
            away_stake: Some(Stake::new()),
            home_team: Some("Arsenal".to_string()),
            home_stake: None,
            roi: Some(Roi::Text(String::new())),
        }
        .retain_non_empty();

        assert_eq!(update.home_team.as_deref(), Some("Arsenal"));
        assert!(update.away_team.is_none());
        assert!(update.away_stake.is_none());
        assert!(update.roi.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_is_empty_when_nothing_supplied() {
        let update: ArbitrageUpdate = serde_json::from_value(json!({})).unwrap();
        assert!(update.is_empty());

        let unknown_only: ArbitrageUpdate =
            serde_json::from_value(json!({"sport": "tennis"})).unwrap();
        assert!(unknown_only.is_empty());
    }
}
