//! Almacenamiento local duradero: un fichero JSON por clave, con envoltura
//! versionada. Equivale al `localStorage` del navegador para una aplicación
//! de un solo usuario: los datos ausentes o corruptos se tratan como
//! inexistentes, nunca como un error fatal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

/// Versión del esquema de persistencia. Un fichero con otra versión se
/// descarta y la clave vuelve a su valor por defecto.
const STORE_VERSION: u32 = 1;

pub const KEY_CHAT_SESSION: &str = "chat-session";
pub const KEY_FAVORITES: &str = "favorites";
pub const KEY_LANGUAGE: &str = "language";

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    value: T,
}

/// Almacén clave-valor sobre el sistema de ficheros.
///
/// Hay un único hilo de control escritor por clave (cada propietario guarda
/// el almacén tras su propio mutex), así que cada mutación escribe el valor
/// completo de forma síncrona.
pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    /// Abre (creando si hace falta) el directorio base del almacén.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("No se pudo crear el directorio de datos {base_dir:?}"))?;
        Ok(Self { base_dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    /// Lee una clave. Fichero ausente, ilegible, corrupto o de otra versión
    /// devuelven `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.key_path(key);
        let raw = fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) if envelope.version == STORE_VERSION => Some(envelope.value),
            Ok(envelope) => {
                warn!(
                    "Clave local '{}' con versión {} (esperada {}); se descarta",
                    key, envelope.version, STORE_VERSION
                );
                None
            }
            Err(e) => {
                warn!("Clave local '{}' corrupta ({}); se descarta", key, e);
                None
            }
        }
    }

    /// Escribe una clave de forma síncrona, sustituyendo el valor anterior.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let envelope = Envelope { version: STORE_VERSION, value };
        let json = serde_json::to_string_pretty(&envelope)
            .with_context(|| format!("No se pudo serializar la clave local '{key}'"))?;
        let path = self.key_path(key);
        fs::write(&path, json)
            .with_context(|| format!("No se pudo escribir el fichero {path:?}"))?;
        Ok(())
    }
}
