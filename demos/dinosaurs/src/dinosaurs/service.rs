use super::model::{CreateDinosaurRequest, Dinosaur};
use super::repository::DinosaurRepository;
use talon::prelude::*;
use uuid::Uuid;

pub struct DinosaurService {
    repository: Arc<dyn DinosaurRepository>,
}

#[async_trait]
impl Injectable for DinosaurService {
    async fn inject(resolver: &mut Resolver) -> talon::Result<Self> {
        Ok(Self {
            repository: resolver.resolve_trait::<dyn DinosaurRepository>().await?,
        })
    }
}

impl DinosaurService {
    pub async fn list(&self, era: Option<&str>) -> Vec<Dinosaur> {
        let all = self.repository.find_all().await;
        match era {
            Some(era) => all
                .into_iter()
                .filter(|dinosaur| dinosaur.era.eq_ignore_ascii_case(era))
                .collect(),
            None => all,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Dinosaur, HttpException> {
        self.repository
            .find_by_id(id)
            .await
            .ok_or_else(|| HttpException::not_found(format!("Dinosaur {} not found", id)))
    }

    pub async fn create(&self, request: CreateDinosaurRequest) -> Result<Dinosaur, HttpException> {
        if request.name.trim().is_empty() {
            return Err(HttpException::bad_request("Bad Request"));
        }
        let dinosaur = Dinosaur {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            era: request.era,
            carnivore: request.carnivore,
        };
        self.repository.save(dinosaur.clone()).await;
        tracing::info!("Created dinosaur {}", dinosaur.id);
        Ok(dinosaur)
    }
}
