use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use std::process::ExitCode;
use utoipa::OpenApi;
use vigil_common::{config, db::Database};
use vigil_module_feed::endpoints;
use vigil_module_feed::nvd::NvdClient;
use vigil_module_feed::service::FeedService;

/// Run the API server
#[derive(clap::Args, Debug, Clone)]
pub struct Run {
    #[command(flatten)]
    pub database: config::Database,

    /// Re-create the database before connecting (first run)
    #[arg(long, env = "DB_BOOTSTRAP", default_value_t = false)]
    pub bootstrap: bool,

    #[arg(
        id = "http-bind-addr",
        long,
        env = "HTTP_BIND_ADDR",
        default_value = "localhost"
    )]
    pub bind_addr: String,

    #[arg(
        id = "http-bind-port",
        long,
        env = "HTTP_BIND_PORT",
        default_value_t = 8080
    )]
    pub bind_port: u16,
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let db = if self.bootstrap {
            Database::bootstrap(&self.database).await?
        } else {
            Database::new(&self.database).await?
        };

        let client = NvdClient::new()?;

        // best effort: if the NVD is unavailable the dashboard still starts
        // with an empty feed
        FeedService::new(db.clone(), client.clone())
            .seed_if_empty()
            .await;

        log::info!("listening on {}:{}", self.bind_addr, self.bind_port);

        HttpServer::new(move || {
            let db = db.clone();
            let client = client.clone();

            App::new()
                .wrap(Logger::default())
                .app_data(web::Data::new(db.clone()))
                .service(
                    web::scope("/api")
                        .configure(move |config| endpoints::configure(config, db, client)),
                )
                .route("/health", web::get().to(health))
                .route("/openapi.json", web::get().to(openapi))
        })
        .bind((self.bind_addr, self.bind_port))?
        .run()
        .await?;

        Ok(ExitCode::SUCCESS)
    }
}

async fn health(db: web::Data<Database>) -> impl Responder {
    match db.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"status": "up"})),
        Err(err) => {
            log::warn!("health check failed: {err}");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({"status": "down"}))
        }
    }
}

async fn openapi() -> impl Responder {
    HttpResponse::Ok().json(endpoints::ApiDoc::openapi())
}
