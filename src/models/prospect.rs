// src/models/prospect.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "processing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Created,
    Confirmed,
    NewPlan,
    Completed,
    Cancelled,
}

// "regie" = comentário da administração; "call_center" = do operador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "comment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommentType {
    Regie,
    CallCenter,
}

// --- ENTIDADES ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: Uuid,
    pub company_id: Uuid,
    pub call_center_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_home: Option<String>,
    pub phone_mobile: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub housing_type: Option<String>,
    pub annual_income: Option<String>,
    pub age: Option<i32>,
    pub comments: Option<String>,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prospect {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProspectComment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub prospect_id: Uuid,
    pub comment: String,
    pub comment_type: CommentType,
    pub user_id: Uuid,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProspectPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone_home: Option<String>,
    #[validate(length(min = 6, message = "O celular é obrigatório."))]
    pub phone_mobile: String,
    #[validate(length(min = 1, message = "O endereço é obrigatório."))]
    pub address: String,
    #[validate(length(min = 1, message = "A cidade é obrigatória."))]
    pub city: String,
    #[validate(length(min = 1, message = "O código postal é obrigatório."))]
    pub postal_code: String,
    pub housing_type: Option<String>,
    pub annual_income: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    pub comments: Option<String>,
    pub processing_status: Option<ProcessingStatus>,
    /// Ignorado quando quem cria é um call center (usa o próprio id).
    pub call_center_id: Option<Uuid>,
}

// `call_center_id` e `created_at` não são atualizáveis.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProspectPayload {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone_home: Option<String>,
    #[validate(length(min = 6))]
    pub phone_mobile: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub housing_type: Option<String>,
    pub annual_income: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    pub comments: Option<String>,
    pub processing_status: Option<ProcessingStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentPayload {
    #[validate(length(min = 1, max = 5000, message = "O comentário não pode ser vazio."))]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListProspectsQuery {
    pub processing_status: Option<ProcessingStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProspectStats {
    pub total: i64,
    pub created: i64,
    pub confirmed: i64,
    pub new_plan: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl ProspectStats {
    pub fn from_counts(counts: impl IntoIterator<Item = (ProcessingStatus, i64)>) -> Self {
        let mut stats = ProspectStats::default();
        for (status, count) in counts {
            match status {
                ProcessingStatus::Created => stats.created += count,
                ProcessingStatus::Confirmed => stats.confirmed += count,
                ProcessingStatus::NewPlan => stats.new_plan += count,
                ProcessingStatus::Completed => stats.completed += count,
                ProcessingStatus::Cancelled => stats.cancelled += count,
            }
            stats.total += count;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_sum_into_total() {
        let stats = ProspectStats::from_counts([
            (ProcessingStatus::Created, 3),
            (ProcessingStatus::NewPlan, 2),
            (ProcessingStatus::Cancelled, 1),
        ]);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.new_plan, 2);
        assert_eq!(stats.confirmed, 0);
    }

    #[test]
    fn new_plan_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ProcessingStatus::NewPlan).unwrap();
        assert_eq!(json, "\"new_plan\"");
    }
}
