//! Extrator de protocolo - camada de capacidades
//!
//! Recupera o número de protocolo do documento gerado pelo registro do
//! lance. Primeiro tenta decodificar o payload embutido na URL do
//! docparser; se não der, baixa o documento renderizado e minera o texto.
//! Todo caminho de falha degrada para um registro sem protocolo: ausência
//! de protocolo nunca é erro do lance.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chromiumoxide::Page;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::config::Config;
use crate::models::{ProtocolRecord, ProtocolSource};
use crate::services::progress::ProgressReporter;
use crate::utils::logging::truncate_text;

/// Variantes conhecidas do campo de protocolo, em ordem de prioridade
const PROTOCOL_FIELD_CANDIDATES: [&str; 3] =
    ["num_protocolo_ant", "num_protocolo", "numero_protocolo"];

/// Extrai o protocolo a partir da referência do documento
///
/// `reference` pode ser a URL do visualizador, a URL do gerador com o
/// payload em query, ou o próprio blob codificado.
pub async fn extract_protocol(
    page: &Page,
    reference: &str,
    config: &Config,
    progress: &dyn ProgressReporter,
) -> ProtocolRecord {
    progress.notify(&format!(
        "🔍 Extraindo protocolo de: {}...",
        truncate_text(reference, 100)
    ));

    let mut record = decode_reference(reference);

    // Fallback: baixa o documento renderizado e minera o texto
    if record.protocol_number.is_none() {
        let mut candidates: Vec<String> = Vec::new();
        if reference.starts_with("http") {
            candidates.push(reference.to_string());
        }
        if let Some(url) = record.pdf_url.clone() {
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }

        for url in candidates {
            progress.notify(&format!("🔗 Baixando documento em {}...", truncate_text(&url, 80)));

            let bytes = match download_document(page, &url, config).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    progress.notify(&format!("⚠️ Falha ao baixar documento: {}", e));
                    continue;
                }
            };

            let text = match extract_document_text(bytes).await {
                Ok(text) => text,
                Err(e) => {
                    progress.notify(&format!("⚠️ Falha ao ler documento: {}", e));
                    continue;
                }
            };

            if let Some(protocol) = mine_protocol_from_text(&text) {
                record.protocol_number = Some(protocol);
                record.source = ProtocolSource::MinedText;
                record.pdf_url = Some(url);
                break;
            }
        }
    }

    match &record.protocol_number {
        Some(protocol) => progress.notify(&format!("📑 Protocolo capturado: {}", protocol)),
        None => progress.notify("⚠️ Protocolo não encontrado no documento"),
    }

    record
}

/// Parte pura da extração: formato da referência + payload decodificado
pub(crate) fn decode_reference(reference: &str) -> ProtocolRecord {
    let mut record = ProtocolRecord::none();
    if reference.starts_with("http") {
        record.docparser_url = Some(reference.to_string());
    }

    let Some(blob) = extract_blob(reference) else {
        return record;
    };

    let payload = match decode_payload(&blob) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Não foi possível decodificar o payload do documento: {}", e);
            return record;
        }
    };

    let data = payload.get("data").cloned().unwrap_or(JsonValue::Null);
    record.metadata = scalar_metadata(&data);

    if let Some((value, _key)) = protocol_from_data(&data) {
        record.protocol_number = Some(value);
        record.source = ProtocolSource::DecodedPayload;
    } else if let Some(texto) = data.get("texto").and_then(|v| v.as_str()) {
        // Payload sem campo de protocolo mas com texto corrido
        if let Some(mined) = mine_protocol_from_text(texto) {
            record.protocol_number = Some(mined);
            record.source = ProtocolSource::MinedText;
        }
    }

    record.pdf_url = payload
        .get("url")
        .or_else(|| payload.get("pdf_url"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    record
}

/// Reconhece o formato da referência e isola o blob codificado
pub(crate) fn extract_blob(reference: &str) -> Option<String> {
    let trimmed = reference.trim_end_matches('/');

    // Visualizador: https://.../docparser/view/BLOB
    if trimmed.contains("/view/") {
        return trimmed.split("/view/").last().map(str::to_string);
    }

    // Gerador: https://.../docgen/lance?data=BLOB
    if trimmed.contains("docgen") {
        let query = trimmed.split_once('?').map(|(_, q)| q)?;
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("data=") {
                return Some(value.to_string());
            }
        }
        return None;
    }

    // Blob direto, reconhecível pelo prefixo do JSON codificado
    if trimmed.starts_with("eyJ") {
        return Some(trimmed.to_string());
    }

    None
}

/// Decodifica o blob base64 (alfabeto URL-safe) em JSON
pub(crate) fn decode_payload(blob: &str) -> Result<JsonValue> {
    let unescaped = blob.replace("%3D", "=").replace("%3d", "=");
    let stripped = unescaped.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(stripped)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(serde_json::from_str(&text)?)
}

/// Procura o protocolo nos campos conhecidos, em ordem de prioridade
pub(crate) fn protocol_from_data(data: &JsonValue) -> Option<(String, String)> {
    for key in PROTOCOL_FIELD_CANDIDATES {
        let value = match data.get(key) {
            Some(JsonValue::String(s)) => s.trim().to_string(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => continue,
        };
        if !value.is_empty() {
            return Some((value, key.to_string()));
        }
    }
    None
}

/// Repassa os demais campos escalares de `data` como metadados
pub(crate) fn scalar_metadata(data: &JsonValue) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    let Some(object) = data.as_object() else {
        return metadata;
    };

    for (key, value) in object {
        if PROTOCOL_FIELD_CANDIDATES.contains(&key.as_str()) {
            continue;
        }
        let scalar = match value {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            _ => continue,
        };
        metadata.insert(key.clone(), scalar);
    }

    metadata
}

/// Minera o número de protocolo de texto corrido
///
/// Primeiro um número após a palavra "protocolo"; senão a maior sequência
/// de 6+ dígitos, desempate pela primeira ocorrência. Heurística de
/// melhor esforço: o documento renderizado não tem estrutura estável.
pub(crate) fn mine_protocol_from_text(text: &str) -> Option<String> {
    let labeled = Regex::new(r"(?i)protocolo[^\d]*(\d{4,})").expect("regex válida");
    if let Some(cap) = labeled.captures(text) {
        return Some(cap[1].to_string());
    }

    let runs = Regex::new(r"\b\d{6,}\b").expect("regex válida");
    let mut best: Option<&str> = None;
    for m in runs.find_iter(text) {
        let run = m.as_str();
        if best.map_or(true, |b| run.len() > b.len()) {
            best = Some(run);
        }
    }
    best.map(str::to_string)
}

/// Baixa o documento autenticado com os cookies da sessão atual
async fn download_document(page: &Page, url: &str, config: &Config) -> Result<Vec<u8>> {
    let cookies = page.get_cookies().await.unwrap_or_default();
    let cookie_header = cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()?;

    let mut request = client
        .get(url)
        .header(reqwest::header::USER_AGENT, "Mozilla/5.0")
        .header(
            reqwest::header::ACCEPT,
            "application/pdf,application/octet-stream,*/*;q=0.8",
        )
        .header(reqwest::header::REFERER, config.portal_origin());

    if !cookie_header.is_empty() {
        request = request.header(reqwest::header::COOKIE, cookie_header);
    }

    let response = request.send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Extrai o texto do PDF baixado
async fn extract_document_text(bytes: Vec<u8>) -> Result<String> {
    if !bytes.starts_with(b"%PDF") {
        warn!("Conteúdo baixado não parece ser um PDF (assinatura ausente)");
    }

    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| anyhow!("falha ao ler PDF: {}", e))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn blob_from_viewer_url() {
        let blob = extract_blob("https://exemplo.com/docparser/view/eyJabc123/");
        assert_eq!(blob.as_deref(), Some("eyJabc123"));
    }

    #[test]
    fn blob_from_generator_query() {
        let blob = extract_blob("https://exemplo.com/docgen/lance?tipo=1&data=eyJxyz");
        assert_eq!(blob.as_deref(), Some("eyJxyz"));
    }

    #[test]
    fn bare_blob_recognized_by_prefix() {
        assert_eq!(extract_blob("eyJkYXRhIjp7fX0").as_deref(), Some("eyJkYXRhIjp7fX0"));
    }

    #[test]
    fn unknown_shape_yields_none() {
        assert!(extract_blob("https://exemplo.com/outra/coisa").is_none());
        assert!(extract_blob("lixo qualquer").is_none());
    }

    #[test]
    fn decoded_payload_round_trip() {
        let blob = encode(r#"{"data":{"num_protocolo_ant":"174245","nome_cliente":"Gil Zanobia"}}"#);
        let record = decode_reference(&blob);

        assert_eq!(record.protocol_number.as_deref(), Some("174245"));
        assert_eq!(record.source, ProtocolSource::DecodedPayload);
        assert_eq!(
            record.metadata.get("nome_cliente").map(String::as_str),
            Some("Gil Zanobia")
        );
    }

    #[test]
    fn decoded_payload_from_viewer_url() {
        let blob = encode(r#"{"data":{"num_protocolo":"555777"}}"#);
        let url = format!("https://exemplo.com/docparser/view/{}", blob);
        let record = decode_reference(&url);

        assert_eq!(record.protocol_number.as_deref(), Some("555777"));
        assert_eq!(record.docparser_url.as_deref(), Some(url.as_str()));
    }

    #[test]
    fn field_priority_prefers_previous_protocol() {
        let blob = encode(r#"{"data":{"num_protocolo":"2","num_protocolo_ant":"1"}}"#);
        let record = decode_reference(&blob);
        assert_eq!(record.protocol_number.as_deref(), Some("1"));
    }

    #[test]
    fn texto_field_is_mined_when_no_protocol_field() {
        let blob = encode(r#"{"data":{"texto":"Seu Protocolo: 984321 foi gerado"},"url":"https://x/doc.pdf"}"#);
        let record = decode_reference(&blob);

        assert_eq!(record.protocol_number.as_deref(), Some("984321"));
        assert_eq!(record.source, ProtocolSource::MinedText);
        assert_eq!(record.pdf_url.as_deref(), Some("https://x/doc.pdf"));
    }

    #[test]
    fn undecodable_blob_degrades_to_none() {
        let record = decode_reference("https://exemplo.com/docparser/view/nao-e-base64!!");
        assert_eq!(record.source, ProtocolSource::None);
        assert!(record.protocol_number.is_none());
    }

    #[test]
    fn mining_prefers_labeled_number() {
        assert_eq!(
            mine_protocol_from_text("Protocolo: 984321").as_deref(),
            Some("984321")
        );
        // Rótulo vence mesmo com sequência maior no resto do texto
        assert_eq!(
            mine_protocol_from_text("contrato 99887766554433 protocolo 1234").as_deref(),
            Some("1234")
        );
    }

    #[test]
    fn mining_falls_back_to_longest_run() {
        assert_eq!(
            mine_protocol_from_text("valores 55 203945 8812").as_deref(),
            Some("203945")
        );
    }

    #[test]
    fn mining_tie_breaks_by_first_occurrence() {
        assert_eq!(
            mine_protocol_from_text("111111 depois 222222").as_deref(),
            Some("111111")
        );
    }

    #[test]
    fn mining_ignores_short_runs() {
        assert!(mine_protocol_from_text("12345 e 999").is_none());
    }

    #[test]
    fn metadata_skips_protocol_fields_and_non_scalars() {
        let data: JsonValue = serde_json::from_str(
            r#"{"num_protocolo":"1","grupo":"1550","assembleia":42,"ativo":true,"extra":{"x":1}}"#,
        )
        .unwrap();
        let metadata = scalar_metadata(&data);

        assert_eq!(metadata.get("grupo").map(String::as_str), Some("1550"));
        assert_eq!(metadata.get("assembleia").map(String::as_str), Some("42"));
        assert_eq!(metadata.get("ativo").map(String::as_str), Some("true"));
        assert!(!metadata.contains_key("num_protocolo"));
        assert!(!metadata.contains_key("extra"));
    }
}
