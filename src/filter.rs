//! Motor de búsqueda y filtrado del directorio de recursos.
//!
//! Funciones puras sobre la lista en memoria: el resultado es siempre una
//! subsecuencia estable de la entrada (se conserva el orden original) y la
//! lista fuente nunca se muta. Una lista filtrada vacía es un estado válido
//! que el frontend muestra como "sin resultados", no un error.

use crate::models::{Category, CategoryInfo, Resource};

/// Entradas independientes del filtrado. `None` en categoría o condado
/// significa "todos"; la consulta vacía no filtra.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub query: String,
    pub category: Option<Category>,
    pub county: Option<String>,
}

impl ResourceFilter {
    /// Un recurso pasa el filtro solo si cumple las TRES condiciones a la vez.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.matches_category(resource)
            && self.matches_county(resource)
            && self.matches_text(resource)
    }

    fn matches_category(&self, resource: &Resource) -> bool {
        match self.category {
            None => true,
            Some(selected) => resource.category == selected,
        }
    }

    /// El condado se deriva de la ciudad vía la tabla fija. Una ciudad sin
    /// entrada no pertenece a ningún condado concreto: queda excluida en
    /// cuanto se selecciona uno, e incluida solo bajo "todos".
    fn matches_county(&self, resource: &Resource) -> bool {
        match &self.county {
            None => true,
            Some(selected) => county_for_city(&resource.city)
                .is_some_and(|county| county.eq_ignore_ascii_case(selected)),
        }
    }

    /// Subcadena sin distinción de mayúsculas sobre nombre, descripción o
    /// cualquier etiqueta de servicios. El condado no se busca como texto.
    fn matches_text(&self, resource: &Resource) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        resource.name.to_lowercase().contains(&query)
            || resource.description.to_lowercase().contains(&query)
            || resource
                .services
                .iter()
                .any(|s| s.to_lowercase().contains(&query))
    }
}

/// Aplica el filtro devolviendo la sublista ordenada (orden original intacto).
pub fn filter_resources(resources: &[Resource], filter: &ResourceFilter) -> Vec<Resource> {
    resources
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// La selección de categoría actúa como un interruptor: volver a pulsar la
/// categoría activa la deselecciona (una sola categoría activa a la vez).
pub fn toggle_category(current: Option<Category>, clicked: Category) -> Option<Category> {
    if current == Some(clicked) {
        None
    } else {
        Some(clicked)
    }
}

/// Elimina de la vista los recursos de categorías suprimidas (transporte).
pub fn visible_resources(resources: Vec<Resource>) -> Vec<Resource> {
    resources
        .into_iter()
        .filter(|r| !r.category.suppressed())
        .collect()
}

/// Ídem para la lista de categorías del backend.
pub fn visible_categories(categories: Vec<CategoryInfo>) -> Vec<CategoryInfo> {
    categories
        .into_iter()
        .filter(|c| !c.id.suppressed())
        .collect()
}

/// Tabla fija ciudad → condado de Minnesota. Tolera mayúsculas y la grafía
/// `Saint`/`St.`; las ciudades fuera de la tabla devuelven `None`.
pub fn county_for_city(city: &str) -> Option<&'static str> {
    let key = city.trim().to_lowercase().replace("saint ", "st. ");
    match key.as_str() {
        "minneapolis" | "golden valley" | "brooklyn park" | "edina" | "bloomington"
        | "richfield" | "plymouth" | "hopkins" => Some("Hennepin"),
        "st. paul" | "roseville" | "maplewood" | "shoreview" | "white bear lake" => Some("Ramsey"),
        "burnsville" | "eagan" | "apple valley" | "hastings" => Some("Dakota"),
        "anoka" | "blaine" | "coon rapids" | "fridley" => Some("Anoka"),
        "stillwater" | "woodbury" | "oakdale" => Some("Washington"),
        "shakopee" | "savage" => Some("Scott"),
        "chaska" | "chanhassen" => Some("Carver"),
        "rochester" => Some("Olmsted"),
        "st. cloud" => Some("Stearns"),
        "duluth" => Some("St. Louis"),
        "center city" => Some("Chisago"),
        "monticello" | "buffalo" => Some("Wright"),
        "elk river" => Some("Sherburne"),
        "mankato" => Some("Blue Earth"),
        "faribault" | "northfield" => Some("Rice"),
        "winona" => Some("Winona"),
        "brainerd" => Some("Crow Wing"),
        "fergus falls" => Some("Otter Tail"),
        "moorhead" => Some("Clay"),
        "bemidji" => Some("Beltrami"),
        _ => None,
    }
}
