// src/common/i18n.rs

// Catálogo de mensagens de erro exibidas ao cliente.
// Idiomas suportados: "pt" e "en" (fallback).

pub const DEFAULT_LANG: &str = "en";

pub fn message(key: &str, lang: &str) -> &'static str {
    match lang {
        "pt" => pt(key),
        _ => en(key),
    }
}

fn pt(key: &str) -> &'static str {
    match key {
        "validation" => "Os dados enviados são inválidos.",
        "invalid_input" => "Dados inválidos.",
        "invalid_status_transition" => "Transição de status não permitida.",
        "email_exists" => "Este e-mail já está em uso.",
        "unique_violation" => "Já existe um registro com este valor.",
        "scheduling_conflict" => "O técnico já possui um compromisso ou ausência neste horário.",
        "invalid_credentials" => "E-mail ou senha inválidos.",
        "invalid_token" => "Token de autenticação inválido ou ausente.",
        "forbidden" => "Você não tem permissão para realizar esta ação.",
        "ip_not_allowed" => "Seu endereço IP não tem acesso a este link.",
        "not_found" => "Recurso não encontrado.",
        "share_link_invalid" => "Link de compartilhamento inválido ou expirado.",
        "tenant_context_required" => "O cabeçalho X-Tenant-ID é obrigatório para esta operação.",
        _ => "Ocorreu um erro inesperado.",
    }
}

fn en(key: &str) -> &'static str {
    match key {
        "validation" => "The submitted data is invalid.",
        "invalid_input" => "Invalid input.",
        "invalid_status_transition" => "Status transition not allowed.",
        "email_exists" => "This e-mail is already in use.",
        "unique_violation" => "A record with this value already exists.",
        "scheduling_conflict" => "The technician already has an appointment or absence at this time.",
        "invalid_credentials" => "Invalid e-mail or password.",
        "invalid_token" => "Invalid or missing authentication token.",
        "forbidden" => "You are not allowed to perform this action.",
        "ip_not_allowed" => "Your IP address has no access to this link.",
        "not_found" => "Resource not found.",
        "share_link_invalid" => "Invalid or expired share link.",
        "tenant_context_required" => "The X-Tenant-ID header is required for this operation.",
        _ => "An unexpected error occurred.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_english() {
        assert_eq!(message("forbidden", "de"), message("forbidden", DEFAULT_LANG));
    }

    #[test]
    fn unknown_key_is_generic() {
        assert_eq!(message("nope", "pt"), "Ocorreu um erro inesperado.");
    }
}
