use thiserror::Error;

/// Taxonomia de erros da aplicação
///
/// Componentes abaixo do orquestrador nunca propagam erro além do seu
/// contrato: falha vira dado (`None`, `false`, `error_message`). Este tipo
/// existe para os pontos onde um erro tipado importa (timeouts de espera,
/// extração, histórico).
#[derive(Debug, Error)]
pub enum AppError {
    /// Erro de comunicação com o navegador
    #[error("erro de navegador: {0}")]
    Browser(String),

    /// Timeout aguardando a UI responder
    #[error("timeout após {seconds}s aguardando {what}")]
    Timeout { what: String, seconds: u64 },

    /// Estrutura do DOM fora do esperado
    #[error("erro de extração: {0}")]
    Extraction(String),

    /// Falha de escrita no histórico
    #[error("erro de histórico: {0}")]
    History(#[from] std::io::Error),
}

impl AppError {
    pub fn timeout(what: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            seconds,
        }
    }
}
