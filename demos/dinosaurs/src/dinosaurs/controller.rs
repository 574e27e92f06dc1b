use super::guard::ApiKeyGuard;
use super::model::{CreateDinosaurRequest, Dinosaur};
use super::service::DinosaurService;
use talon::prelude::*;

pub struct DinosaurController {
    service: Arc<DinosaurService>,
}

#[async_trait]
impl Injectable for DinosaurController {
    async fn inject(resolver: &mut Resolver) -> talon::Result<Self> {
        Ok(Self {
            service: resolver.resolve::<DinosaurService>().await?,
        })
    }
}

impl DinosaurController {
    pub fn describe(api_key: &str) -> ControllerDescriptor {
        ControllerDescriptor::builder::<DinosaurController>("/dinosaurs")
            .get("/", |route| {
                route.query("era").action("list", |controller, args| async move {
                    controller.list(args.string(0)?).await
                })
            })
            .get("/{id}", |route| {
                route.path_param("id").action("get", |controller, args| async move {
                    controller.get(args.string(0)?).await
                })
            })
            .post("/", |route| {
                route
                    .body()
                    .raw_response()
                    .before(GuardHook::new(ApiKeyGuard::new(api_key)))
                    .action("create", |controller, args| async move {
                        controller.create(args.body(0)?, args.response(1)?).await
                    })
            })
            .build()
    }

    async fn list(&self, era: Option<String>) -> Result<Vec<Dinosaur>, ActionError> {
        Ok(self.service.list(era.as_deref()).await)
    }

    async fn get(&self, id: Option<String>) -> Result<Dinosaur, ActionError> {
        let id = id.ok_or_else(|| HttpException::bad_request("Bad Request"))?;
        Ok(self.service.get(&id).await?)
    }

    async fn create(
        &self,
        request: CreateDinosaurRequest,
        response: &ResponseHandle,
    ) -> Result<Dinosaur, ActionError> {
        let dinosaur = self.service.create(request).await?;
        response.set_status(StatusCode::CREATED);
        Ok(dinosaur)
    }
}
