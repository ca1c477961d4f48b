use thiserror::Error;

/// Erros da camada de negócio. Os comandos do desktop convertem para `String`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro no banco de dados: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Erro de arquivo: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Regra de negócio violada (ex.: instalação de orçamento não aprovado)
    #[error("{0}")]
    Domain(String),

    #[error("Erro gerando PDF: {0}")]
    Pdf(String),

    #[error("Erro gerando gráfico: {0}")]
    Chart(String),

    #[error("Google Drive: {0}")]
    Drive(String),

    #[error("Erro de conexão: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Banco de dados bloqueado")]
    Lock,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}

impl<T> From<std::sync::PoisonError<T>> for AppError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        AppError::Lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mensagem_sem_prefixo_para_erros_de_usuario() {
        let err = AppError::not_found("Produto não encontrado");
        assert_eq!(String::from(err), "Produto não encontrado");

        let err = AppError::Domain("Orçamento precisa estar aprovado".into());
        assert_eq!(err.to_string(), "Orçamento precisa estar aprovado");
    }

    #[test]
    fn test_conversao_de_rusqlite() {
        let err: AppError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.to_string().starts_with("Erro no banco de dados"));
    }
}
