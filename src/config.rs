//! Carga y gestión de configuración de la aplicación (backend externo + servidor local).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use url::Url;

use crate::i18n::Language;

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// URL base del backend externo (el prefijo `/api` se añade por petición).
    pub backend_url: Url,
    pub server_addr: String,
    /// Directorio donde se persiste el estado local (favoritos, sesión, idioma).
    pub data_dir: PathBuf,
    pub default_language: Language,
    /// Tiempo máximo de espera para cada petición de chat al backend.
    pub chat_timeout: Duration,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let backend_url_raw =
            env::var("BACKEND_URL").map_err(|_| anyhow!("Falta BACKEND_URL en el entorno"))?;
        let backend_url = Url::parse(&backend_url_raw)
            .map_err(|e| anyhow!("BACKEND_URL no es una URL válida: {e}"))?;

        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3345".to_string());

        let data_dir = match env::var("DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_local_dir()
                .ok_or_else(|| anyhow!("No se pudo determinar el directorio de datos local"))?
                .join("reentry-connect"),
        };

        let default_language = env::var("DEFAULT_LANGUAGE")
            .ok()
            .map(|s| Language::from_str(&s))
            .transpose()?
            .unwrap_or(Language::En);

        let chat_timeout_secs = match env::var("CHAT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| anyhow!("CHAT_TIMEOUT_SECS debe ser un número de segundos"))?,
            Err(_) => 30,
        };

        Ok(Self {
            backend_url,
            server_addr,
            data_dir,
            default_language,
            chat_timeout: Duration::from_secs(chat_timeout_secs),
        })
    }
}
