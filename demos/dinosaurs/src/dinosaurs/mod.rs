use talon::prelude::*;

pub mod controller;
pub mod guard;
pub mod model;
pub mod repository;
pub mod service;

pub use controller::DinosaurController;
pub use repository::{DinosaurRepository, InMemoryDinosaurRepository};
pub use service::DinosaurService;

pub struct DinosaurModule;

impl Module for DinosaurModule {
    fn configure(config: ApplicationConfig) -> ApplicationConfig {
        let api_key = std::env::var("API_KEY").unwrap_or_else(|_| "dino-secret".to_string());
        config
            .provider::<InMemoryDinosaurRepository>(Scope::Singleton)
            .bind::<dyn DinosaurRepository, InMemoryDinosaurRepository, _>(|repository| {
                repository as Arc<dyn DinosaurRepository>
            })
            .provider::<DinosaurService>(Scope::Singleton)
            .controller(DinosaurController::describe(&api_key))
    }
}
