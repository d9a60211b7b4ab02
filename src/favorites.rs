//! Conjunto de recursos guardados por el usuario.
//!
//! Cada entrada es una instantánea del recurso en el momento de guardarlo,
//! con unicidad por id. Toda mutación persiste el conjunto completo de forma
//! síncrona y notifica a los suscriptores el nuevo tamaño.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::error;

use crate::models::Resource;
use crate::storage::{LocalStore, KEY_FAVORITES};

pub struct FavoritesStore {
    store: Arc<LocalStore>,
    inner: Mutex<Vec<Resource>>,
    count_tx: watch::Sender<usize>,
}

impl FavoritesStore {
    /// Rehidrata el conjunto desde el almacén local; datos ausentes o
    /// corruptos equivalen a un conjunto vacío.
    pub fn new(store: Arc<LocalStore>) -> Self {
        let initial: Vec<Resource> = store.get(KEY_FAVORITES).unwrap_or_default();
        let (count_tx, _) = watch::channel(initial.len());
        Self {
            store,
            inner: Mutex::new(initial),
            count_tx,
        }
    }

    /// Inserta el recurso si su id no está ya guardado. Idempotente:
    /// devuelve `false` (sin efecto) para un duplicado.
    pub fn add(&self, resource: Resource) -> bool {
        let mut items = self.inner.lock().unwrap();
        if items.iter().any(|f| f.id == resource.id) {
            return false;
        }
        items.push(resource);
        self.persist(&items);
        true
    }

    /// Elimina la entrada con ese id si existe; si no, no hace nada.
    pub fn remove(&self, id: &str) -> bool {
        let mut items = self.inner.lock().unwrap();
        let before = items.len();
        items.retain(|f| f.id != id);
        if items.len() == before {
            return false;
        }
        self.persist(&items);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().unwrap().iter().any(|f| f.id == id)
    }

    pub fn clear(&self) {
        let mut items = self.inner.lock().unwrap();
        items.clear();
        self.persist(&items);
    }

    /// Tamaño actual del conjunto.
    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Instantánea del conjunto en su orden de inserción.
    pub fn all(&self) -> Vec<Resource> {
        self.inner.lock().unwrap().clone()
    }

    /// Canal de notificación de cambios: publica el tamaño tras cada mutación.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }

    fn persist(&self, items: &Vec<Resource>) {
        if let Err(e) = self.store.set(KEY_FAVORITES, items) {
            error!("No se pudieron persistir los favoritos: {e}");
        }
        // send_replace publica aunque todavía no haya suscriptores.
        self.count_tx.send_replace(items.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn resource(id: &str) -> Resource {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Recurso {id}"),
            "category": "housing",
            "description": "d",
            "address": "a",
            "city": "Minneapolis",
            "zip_code": "55403",
            "latitude": 44.97,
            "longitude": -93.26
        }))
        .unwrap()
    }

    fn fresh_store(dir: &std::path::Path) -> FavoritesStore {
        FavoritesStore::new(Arc::new(LocalStore::open(dir).unwrap()))
    }

    #[test]
    fn add_y_contains() {
        let dir = tempdir().unwrap();
        let favs = fresh_store(dir.path());

        assert!(favs.add(resource("r1")));
        assert!(favs.contains("r1"));
        assert!(!favs.contains("r2"));
    }

    #[test]
    fn add_duplicado_no_incrementa() {
        let dir = tempdir().unwrap();
        let favs = fresh_store(dir.path());

        assert!(favs.add(resource("r1")));
        assert!(!favs.add(resource("r1")));
        assert_eq!(favs.count(), 1);
    }

    #[test]
    fn remove_de_id_ausente_no_hace_nada() {
        let dir = tempdir().unwrap();
        let favs = fresh_store(dir.path());

        favs.add(resource("r1"));
        assert!(!favs.remove("no-existe"));
        assert_eq!(favs.count(), 1);
        assert!(favs.remove("r1"));
        assert_eq!(favs.count(), 0);
    }

    #[test]
    fn clear_vacia_el_conjunto() {
        let dir = tempdir().unwrap();
        let favs = fresh_store(dir.path());

        favs.add(resource("r1"));
        favs.add(resource("r2"));
        favs.clear();
        assert_eq!(favs.count(), 0);
        assert!(favs.all().is_empty());
    }

    #[test]
    fn cada_mutacion_persiste_y_se_rehidrata() {
        let dir = tempdir().unwrap();
        {
            let favs = fresh_store(dir.path());
            favs.add(resource("r1"));
            favs.add(resource("r2"));
            favs.remove("r1");
        }
        // Proceso nuevo sobre el mismo directorio.
        let favs = fresh_store(dir.path());
        assert_eq!(favs.count(), 1);
        assert!(favs.contains("r2"));
    }

    #[test]
    fn datos_corruptos_rehidratan_como_vacio() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("favorites.json"), "][").unwrap();

        let favs = fresh_store(dir.path());
        assert_eq!(favs.count(), 0);
    }

    #[test]
    fn los_suscriptores_ven_el_nuevo_tamano() {
        let dir = tempdir().unwrap();
        let favs = fresh_store(dir.path());
        let rx = favs.subscribe();

        favs.add(resource("r1"));
        favs.add(resource("r2"));
        assert_eq!(*rx.borrow(), 2);

        favs.clear();
        assert_eq!(*rx.borrow(), 0);
    }
}
