/// Configuração do programa
#[derive(Clone, Debug)]
pub struct Config {
    /// Porta de depuração do navegador
    pub browser_debug_port: u16,
    /// Fragmento de URL que identifica a aba do Servopa
    pub servopa_url_part: String,
    /// Fragmento de URL que identifica a aba do Todoist
    pub todoist_url_part: String,
    /// URL do painel de seleção de consórcio
    pub servopa_painel_url: String,
    /// URL da página de lances
    pub servopa_lances_url: String,
    /// Nome do projeto do board no Todoist
    pub board_project_name: String,
    /// Timeout padrão de espera por elementos (segundos)
    pub timeout_secs: u64,
    /// Delay entre teclas na digitação simulada (ms)
    pub typing_delay_ms: u64,
    /// Timeout de detecção de nova aba após o registro (segundos)
    pub window_poll_timeout_secs: u64,
    /// Timeout de download do documento de protocolo (segundos)
    pub download_timeout_secs: u64,
    /// Arquivo de histórico (append-only)
    pub history_file: String,
    /// Arquivo de log da execução
    pub output_log_file: String,
    /// Exibe logs detalhados
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            servopa_url_part: "servopa".to_string(),
            todoist_url_part: "todoist".to_string(),
            servopa_painel_url: "https://www.consorcioservopa.com.br/vendas/painel".to_string(),
            servopa_lances_url: "https://www.consorcioservopa.com.br/vendas/lances".to_string(),
            board_project_name: "Lances Servopa".to_string(),
            timeout_secs: 20,
            typing_delay_ms: 100,
            window_poll_timeout_secs: 10,
            download_timeout_secs: 15,
            history_file: "historico.txt".to_string(),
            output_log_file: "lances_log.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            servopa_url_part: std::env::var("SERVOPA_URL_PART").unwrap_or(default.servopa_url_part),
            todoist_url_part: std::env::var("TODOIST_URL_PART").unwrap_or(default.todoist_url_part),
            servopa_painel_url: std::env::var("SERVOPA_PAINEL_URL").unwrap_or(default.servopa_painel_url),
            servopa_lances_url: std::env::var("SERVOPA_LANCES_URL").unwrap_or(default.servopa_lances_url),
            board_project_name: std::env::var("BOARD_PROJECT_NAME").unwrap_or(default.board_project_name),
            timeout_secs: std::env::var("TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.timeout_secs),
            typing_delay_ms: std::env::var("TYPING_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.typing_delay_ms),
            window_poll_timeout_secs: std::env::var("WINDOW_POLL_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.window_poll_timeout_secs),
            download_timeout_secs: std::env::var("DOWNLOAD_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.download_timeout_secs),
            history_file: std::env::var("HISTORY_FILE").unwrap_or(default.history_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// Caminho da URL de lances, para comparação de URL por substring
    pub fn lances_path(&self) -> &str {
        path_of(&self.servopa_lances_url)
    }

    /// Origem do portal (esquema + host), usada como Referer nos downloads
    pub fn portal_origin(&self) -> String {
        origin_of(&self.servopa_painel_url)
            .unwrap_or_else(|| self.servopa_painel_url.clone())
    }
}

/// Parte do caminho de uma URL absoluta ("/vendas/lances")
fn path_of(url: &str) -> &str {
    match url.find("://") {
        Some(i) => match url[i + 3..].find('/') {
            Some(j) => &url[i + 3 + j..],
            None => "/",
        },
        None => url,
    }
}

/// Esquema + host de uma URL absoluta, com barra final
fn origin_of(url: &str) -> Option<String> {
    let scheme_end = url.find("://")? + 3;
    let host_end = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i)
        .unwrap_or(url.len());
    Some(format!("{}/", &url[..host_end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lances_path_strips_scheme_and_host() {
        let config = Config::default();
        assert_eq!(config.lances_path(), "/vendas/lances");
    }

    #[test]
    fn portal_origin_keeps_scheme_and_host() {
        let config = Config::default();
        assert_eq!(
            config.portal_origin(),
            "https://www.consorcioservopa.com.br/"
        );
    }

    #[test]
    fn path_of_relative_value_passes_through() {
        assert_eq!(path_of("/vendas/lances"), "/vendas/lances");
        assert_eq!(path_of("https://host.com"), "/");
    }
}
