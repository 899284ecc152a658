//! Contexto de uma tarefa
//!
//! Encapsula "estou processando qual cota de qual grupo" para o fluxo e
//! para os logs.

use std::fmt::Display;

/// Contexto de processamento de uma tarefa do board
#[derive(Debug, Clone)]
pub struct TaskCtx {
    /// Número do grupo (coluna do board)
    pub grupo: String,

    /// Número da cota (valor de exibição)
    pub cota: String,

    /// Nome do cliente
    pub nome: String,

    /// Índice da tarefa dentro da seção (a partir de 1, só para logs)
    pub task_index: usize,

    /// Total de tarefas na seção (só para logs)
    pub section_total: usize,
}

impl TaskCtx {
    pub fn new(
        grupo: impl Into<String>,
        cota: impl Into<String>,
        nome: impl Into<String>,
        task_index: usize,
        section_total: usize,
    ) -> Self {
        Self {
            grupo: grupo.into(),
            cota: cota.into(),
            nome: nome.into(),
            task_index,
            section_total,
        }
    }
}

impl Display for TaskCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Grupo {} Cota {} - {}]",
            self.grupo, self.cota, self.nome
        )
    }
}
