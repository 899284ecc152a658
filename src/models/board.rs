//! Modelo do board extraído do Todoist
//!
//! O `Board` é produzido fresco a cada extração e nunca persistido. A ordem
//! das seções e das tarefas é a ordem do documento e codifica prioridade.

use std::fmt;

use chromiumoxide::Element;

/// Board completo: colunas (seções) na ordem do documento
#[derive(Debug, Default)]
pub struct Board {
    pub sections: Vec<Section>,
}

impl Board {
    /// Total de tarefas em todas as seções
    pub fn total_tasks(&self) -> usize {
        self.sections.iter().map(|s| s.tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Uma coluna do board: grupo de trabalho com suas tarefas
///
/// Invariante: toda seção presente num `Board` tem ao menos uma tarefa;
/// seções sem número de grupo no título nem entram.
#[derive(Debug)]
pub struct Section {
    /// Número do grupo (dígitos iniciais do título)
    pub grupo: String,
    /// Título completo da coluna
    pub title: String,
    pub tasks: Vec<Task>,
}

/// Uma tarefa (cota) dentro de uma seção
#[derive(Debug)]
pub struct Task {
    /// Número da cota (valor de exibição, não normalizado)
    pub cota: String,
    /// Nome do cliente
    pub nome: String,
    /// Identificador estável da tarefa na UI de origem
    pub task_id: String,
    /// Estado do checkbox no momento da extração
    pub is_completed: bool,
    /// Referência viva ao checkbox, válida só nesta sessão/passada
    pub handle: TaskHandle,
}

/// Capacidade de marcar a tarefa como concluída
///
/// Embrulha uma referência viva a elemento do DOM: válida apenas na mesma
/// sessão do navegador e invalidada quando a página navega. Não é um
/// identificador serializável; para reuso entre passadas, re-extraia o
/// board pelo `task_id`.
pub struct TaskHandle {
    element: Element,
}

impl TaskHandle {
    pub(crate) fn new(element: Element) -> Self {
        Self { element }
    }

    pub(crate) fn element(&self) -> &Element {
        &self.element
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskHandle(<elemento vivo>)")
    }
}
