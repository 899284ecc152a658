//! # Lance Cycle
//!
//! Automação do ciclo completo de lances: board do Todoist → lances no
//! Servopa → checkbox no Todoist → histórico, repetido coluna por coluna.
//!
//! ## Arquitetura
//!
//! O sistema segue uma arquitetura em quatro camadas:
//!
//! ### ① Infraestrutura (`infrastructure/`)
//! - `Session` - dona do Browser e da aba ativa; única autorizada a trocar
//!   de aba (`switch_to`)
//! - `waits` - esperas com timeout limitado (elemento, URL, tabela)
//!
//! ### ② Capacidades de negócio (`services/`)
//! - `board_extractor` - extrai o board completo (colunas → tarefas)
//! - `lance_executor` - passos do lance (buscar grupo, selecionar cota,
//!   simular, registrar)
//! - `protocol_extractor` - recupera o número de protocolo do documento
//!   gerado pelo registro
//! - `history` / `progress` - sumidouro de histórico e relator de progresso
//!
//! ### ③ Fluxo (`workflow/`)
//! - `TaskCtx` - contexto de uma tarefa (grupo + cota + nome)
//! - `LanceFlow` - sequência completa de um lance → `LanceOutcome`
//!
//! ### ④ Orquestração (`orchestrator/`)
//! - `CycleOrchestrator` - percorre colunas e tarefas, alterna entre as
//!   duas abas, marca checkboxes, varre a coluna ao final e acumula
//!   estatísticas; cancelamento cooperativo em cada transição

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// Re-exporta os tipos mais usados
pub use app::App;
pub use browser::connect_to_browser;
pub use config::Config;
pub use error::AppError;
pub use infrastructure::Session;
pub use models::{
    Board, CycleStats, HistoryEntry, HistoryStatus, LanceOutcome, ProtocolRecord, ProtocolSource,
    Section, Task, TaskHandle,
};
pub use orchestrator::{CancelFlag, CycleOrchestrator};
pub use workflow::{LanceFlow, TaskCtx};
