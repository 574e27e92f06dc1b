use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dinosaur {
    pub id: String,
    pub name: String,
    pub era: String,
    pub carnivore: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateDinosaurRequest {
    pub name: String,
    pub era: String,
    #[serde(default)]
    pub carnivore: bool,
}
