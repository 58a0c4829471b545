// src/models/simulator.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Sub-opções escolhidas para cada tipo de obra.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatorSubOptions {
    pub combles_type: Vec<String>,
    pub planchers_type: Vec<String>,
    pub murs_type: Vec<String>,
    pub chauffage_type: Vec<String>,
    pub chauffe_eau_type: Vec<String>,
    pub fenetres_type: Vec<String>,
    pub vmc_type: Vec<String>,
    pub solaire_type: Vec<String>,
}

// Formulário público do simulador de obras
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorSubmission {
    pub id: Uuid,
    pub profile: String,
    pub housing: String,
    pub age: String,
    pub heating: Vec<String>,
    pub radiator: Vec<String>,
    pub energy: String,
    pub surface: String,
    pub works: Vec<String>,
    #[schema(value_type = SimulatorSubOptions)]
    pub sub_options: Json<SimulatorSubOptions>,
    pub status: String,
    pub address: String,
    pub city: String,
    pub department: String,
    pub last_name: String,
    pub first_name: String,
    pub phone: String,
    pub email: String,
    pub consent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorSubmissionPayload {
    #[validate(length(min = 1, message = "O perfil é obrigatório."))]
    pub profile: String,
    #[validate(length(min = 1, message = "O tipo de moradia é obrigatório."))]
    pub housing: String,
    #[validate(length(min = 1, message = "A idade do imóvel é obrigatória."))]
    pub age: String,
    #[serde(default)]
    pub heating: Vec<String>,
    #[serde(default)]
    pub radiator: Vec<String>,
    pub energy: String,
    pub surface: String,
    #[serde(default)]
    pub works: Vec<String>,
    #[serde(default)]
    pub sub_options: SimulatorSubOptions,
    pub status: String,
    #[validate(length(min = 1, message = "O endereço é obrigatório."))]
    pub address: String,
    #[validate(length(min = 1, message = "A cidade é obrigatória."))]
    pub city: String,
    #[validate(length(min = 1, message = "O departamento é obrigatório."))]
    pub department: String,
    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub first_name: String,
    #[validate(length(min = 6, message = "O telefone é obrigatório."))]
    pub phone: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub consent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorReceipt {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_and_sub_options_default_to_empty() {
        let payload: SimulatorSubmissionPayload = serde_json::from_value(serde_json::json!({
            "profile": "proprietaire",
            "housing": "maison",
            "age": "plus_15_ans",
            "energy": "gaz",
            "surface": "100",
            "status": "modeste",
            "address": "3 rue des Lilas",
            "city": "Lyon",
            "department": "69",
            "lastName": "Durand",
            "firstName": "Marie",
            "phone": "0612345678",
            "email": "marie@exemple.fr",
            "consent": true,
            "subOptions": { "comblesType": ["perdus"] }
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        assert!(payload.works.is_empty());
        assert_eq!(payload.sub_options.combles_type, vec!["perdus"]);
        assert!(payload.sub_options.vmc_type.is_empty());
    }

    #[test]
    fn bad_email_is_rejected() {
        let payload: SimulatorSubmissionPayload = serde_json::from_value(serde_json::json!({
            "profile": "p", "housing": "h", "age": "a", "energy": "e", "surface": "s",
            "status": "s", "address": "a", "city": "c", "department": "d",
            "lastName": "l", "firstName": "f", "phone": "0612345678",
            "email": "nope", "consent": false
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
