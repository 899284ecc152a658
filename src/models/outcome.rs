//! Resultado de um lance e registro de protocolo

use std::collections::BTreeMap;

use serde::Serialize;

/// Resultado de uma execução do lance
///
/// Criado uma vez por tentativa de tarefa e dobrado num `HistoryEntry`;
/// não é retido além disso. `already_exists=true` é o caminho idempotente:
/// o próprio portal recusou a re-submissão porque já havia registro, e
/// isso conta como sucesso.
#[derive(Debug, Default, Serialize)]
pub struct LanceOutcome {
    pub success: bool,
    pub already_exists: bool,
    /// Percentual copiado do lance fixo durante a execução
    pub valor_lance: String,
    pub message: String,
    pub protocol: Option<ProtocolRecord>,
    pub error_message: Option<String>,
}

impl LanceOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            message: format!("Erro: {}", error),
            error_message: Some(error),
            valor_lance: "N/A".to_string(),
            ..Default::default()
        }
    }
}

/// Origem do número de protocolo recuperado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolSource {
    /// Decodificado do payload embutido na URL do documento
    DecodedPayload,
    /// Minerado do texto do documento renderizado
    MinedText,
    /// Nenhum protocolo recuperado (resultado válido, não é erro)
    None,
}

/// Metadados de confirmação decodificados do documento de protocolo
#[derive(Debug, Serialize)]
pub struct ProtocolRecord {
    /// Ausência é válida e representável; nunca um erro
    pub protocol_number: Option<String>,
    pub source: ProtocolSource,
    pub docparser_url: Option<String>,
    pub pdf_url: Option<String>,
    /// Campos auxiliares do payload (cliente, grupo, assembleia...),
    /// repassados oportunisticamente, sem esquema fixo
    pub metadata: BTreeMap<String, String>,
}

impl ProtocolRecord {
    pub fn none() -> Self {
        Self {
            protocol_number: None,
            source: ProtocolSource::None,
            docparser_url: None,
            pdf_url: None,
            metadata: BTreeMap::new(),
        }
    }
}

impl Default for ProtocolRecord {
    fn default() -> Self {
        Self::none()
    }
}

/// Dados da cota capturados da tabela de resultados do portal
#[derive(Debug, Clone, Serialize)]
pub struct CotaData {
    pub cota: String,
    pub nome: String,
    pub valor: String,
    pub grupo: String,
    pub digito: String,
    pub contrato: String,
}
