//! Relator de progresso - camada de capacidades
//!
//! Fire-and-forget: a ausência de um relator não muda o comportamento da
//! automação.

use tracing::info;

/// Recebe mensagens de progresso legíveis durante a execução
pub trait ProgressReporter: Send + Sync {
    fn notify(&self, message: &str);
}

/// Relator padrão: encaminha tudo para o log
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn notify(&self, message: &str) {
        info!("{}", message);
    }
}

/// Relator nulo, para quando ninguém está assistindo
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn notify(&self, _message: &str) {}
}
