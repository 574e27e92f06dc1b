use super::model::Dinosaur;
use async_trait::async_trait;
use talon::prelude::*;
use tokio::sync::RwLock;

#[async_trait]
pub trait DinosaurRepository: Send + Sync {
    async fn find_all(&self) -> Vec<Dinosaur>;
    async fn find_by_id(&self, id: &str) -> Option<Dinosaur>;
    async fn save(&self, dinosaur: Dinosaur);
}

/// Process-local store, seeded with three records.
pub struct InMemoryDinosaurRepository {
    records: RwLock<Vec<Dinosaur>>,
}

#[async_trait]
impl Injectable for InMemoryDinosaurRepository {
    async fn inject(_resolver: &mut Resolver) -> talon::Result<Self> {
        let seed = [
            ("1", "Tyrannosaurus", "Cretaceous", true),
            ("2", "Stegosaurus", "Jurassic", false),
            ("3", "Velociraptor", "Cretaceous", true),
        ];
        let records = seed
            .into_iter()
            .map(|(id, name, era, carnivore)| Dinosaur {
                id: id.to_string(),
                name: name.to_string(),
                era: era.to_string(),
                carnivore,
            })
            .collect();

        Ok(Self {
            records: RwLock::new(records),
        })
    }
}

#[async_trait]
impl DinosaurRepository for InMemoryDinosaurRepository {
    async fn find_all(&self) -> Vec<Dinosaur> {
        self.records.read().await.clone()
    }

    async fn find_by_id(&self, id: &str) -> Option<Dinosaur> {
        self.records
            .read()
            .await
            .iter()
            .find(|dinosaur| dinosaur.id == id)
            .cloned()
    }

    async fn save(&self, dinosaur: Dinosaur) {
        self.records.write().await.push(dinosaur);
    }
}
