//! Idiomas soportados y textos localizados del asistente de chat.
//!
//! Solo viven aquí las cadenas que el gestor de sesión inserta por sí mismo
//! (saludo inicial y disculpa fija ante fallos); el resto de la traducción
//! de la interfaz pertenece al frontend.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
}

impl Language {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            other => Err(anyhow!("Idioma no soportado: {other}")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Saludo con el que arranca toda conversación, incluso antes de abrir el widget.
    pub fn chat_greeting(&self) -> &'static str {
        match self {
            Self::En => {
                "Hello! I'm here to help you find resources for your reentry journey in Minnesota. \
                 What kind of assistance are you looking for today? You can ask about housing, \
                 employment, legal aid, healthcare, education, food assistance, or transportation."
            }
            Self::Es => {
                "¡Hola! Estoy aquí para ayudarte a encontrar recursos para tu proceso de reingreso \
                 en Minnesota. ¿Qué tipo de asistencia estás buscando hoy?"
            }
        }
    }

    /// Disculpa fija que sustituye a la respuesta cuando la petición al backend falla.
    pub fn chat_error(&self) -> &'static str {
        match self {
            Self::En => {
                "I apologize, but I'm having trouble connecting right now. Please try again in a \
                 moment, or browse our resource directory directly for assistance."
            }
            Self::Es => {
                "Lo siento, pero tengo problemas para conectarme en este momento. Por favor, \
                 intenta de nuevo en un momento, o explora nuestro directorio de recursos \
                 directamente para obtener asistencia."
            }
        }
    }
}
