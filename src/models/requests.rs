use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{IncidentType, MatchStatus, Sex};

/// Request to register a new animal
///
/// The owner is never taken from the body; it is stamped from the caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAnimal {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Breed is required"))]
    pub breed: String,
    #[validate(range(min = 0.0, message = "Age must not be negative"))]
    pub age: f64,
    #[serde(rename = "gender")]
    pub sex: Sex,
    #[validate(length(min = 1, message = "Health status is required"))]
    pub health_status: String,
    #[serde(rename = "milk_production", default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Milk production must not be negative"))]
    pub milk_yield: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genetic_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub location_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub location_lng: Option<f64>,
}

/// Partial update of an animal; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AnimalUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Breed must not be empty"))]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Age must not be negative"))]
    pub age: Option<f64>,
    #[serde(rename = "gender", default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Health status must not be empty"))]
    pub health_status: Option<String>,
    #[serde(rename = "milk_production", default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Milk production must not be negative"))]
    pub milk_yield: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genetic_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub location_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub location_lng: Option<f64>,
}

impl AnimalUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.breed.is_none()
            && self.age.is_none()
            && self.sex.is_none()
            && self.health_status.is_none()
            && self.milk_yield.is_none()
            && self.genetic_history.is_none()
            && self.location_lat.is_none()
            && self.location_lng.is_none()
    }
}

/// Request to move a match to a new status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMatchStatusRequest {
    pub status: MatchStatus,
}

/// Request to file a welfare incident report
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewWelfareReport {
    pub incident_type: IncidentType,
    #[validate(length(min = 20, message = "Description must be at least 20 characters"))]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    #[serde(default)]
    #[validate(required(message = "Location is required to submit a report"), range(min = -90.0, max = 90.0))]
    pub location_lat: Option<f64>,
    #[serde(default)]
    #[validate(required(message = "Location is required to submit a report"), range(min = -180.0, max = 180.0))]
    pub location_lng: Option<f64>,
}
