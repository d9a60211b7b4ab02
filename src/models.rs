//! Modelos de dominio (recursos del directorio, categorías y mensajes de chat).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categoría fija de clasificación de un recurso.
///
/// Las categorías desconocidas del backend se decodifican como `Other` y
/// reciben el icono/estilo por defecto, nunca un error de deserialización.
/// `Transportation` existe en los datos pero se suprime del directorio visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Housing,
    Legal,
    Employment,
    Healthcare,
    Education,
    Food,
    Transportation,
    #[serde(other)]
    Other,
}

impl Category {
    /// Nombre del icono que usa el frontend para esta categoría.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Housing => "Home",
            Category::Legal => "Scale",
            Category::Employment => "Briefcase",
            Category::Healthcare => "Heart",
            Category::Education => "GraduationCap",
            Category::Food => "Utensils",
            _ => "Home",
        }
    }

    /// Token de color para las insignias de categoría.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Housing => "blue",
            Category::Legal => "amber",
            Category::Employment => "emerald",
            Category::Healthcare => "pink",
            Category::Education => "indigo",
            Category::Food => "orange",
            _ => "blue",
        }
    }

    /// `true` para las categorías que no se muestran en el directorio.
    pub fn suppressed(&self) -> bool {
        matches!(self, Category::Transportation)
    }
}

/// Entrada de la lista de categorías que devuelve el backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub name: String,
    pub icon: String,
}

/// Un recurso del directorio. Creado y poseído por el backend; el cliente
/// nunca lo muta, solo copia instantáneas al conjunto de favoritos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub address: String,
    pub city: String,
    #[serde(default = "default_state")]
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub eligibility: Option<String>,
    #[serde(default)]
    pub serving_area: Option<String>,
    #[serde(default)]
    pub access_method: Option<String>,
    #[serde(default)]
    pub good_fit_if: Option<String>,
    #[serde(default)]
    pub what_to_expect: Option<String>,
    #[serde(default = "default_true")]
    pub reentry_focused: bool,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Un recurso solo puede situarse en el mapa con coordenadas finitas y en rango.
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

fn default_state() -> String {
    "MN".to_string()
}

fn default_true() -> bool {
    true
}

/// Rol de un mensaje dentro de la conversación del asistente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Un mensaje de la conversación. La secuencia es solo-añadir: ningún
/// mensaje se edita ni se borra individualmente.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Sugerencia de recurso enviada por la comunidad. Se reenvía al backend
/// tal cual; es el backend quien la sella y la almacena para revisión.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub address: Option<String>,
    pub city: String,
    pub county: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub services: Option<String>,
    #[serde(default, rename = "submitterEmail")]
    pub submitter_email: Option<String>,
}
