// src/models/absence.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "absence_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AbsenceType {
    #[default]
    Personal,
    Vacation,
    Sick,
    Other,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    pub id: Uuid,
    pub company_id: Uuid,
    pub technician_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub absence_type: AbsenceType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAbsencePayload {
    pub technician_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub absence_type: AbsenceType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAbsencePayload {
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub absence_type: Option<AbsenceType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAbsencesQuery {
    pub technician_id: Option<Uuid>,
}
