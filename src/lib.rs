pub mod domain;
pub mod dto;
pub mod forms;
pub mod models;
pub mod render;
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
pub mod services;

#[cfg(feature = "server")]
pub use server::run;

#[cfg(feature = "server")]
mod server {
    use std::fs;
    use std::sync::Arc;

    use actix_cors::Cors;
    use actix_files::Files;
    use actix_multipart::form::tempfile::TempFileConfig;
    use actix_web::{App, HttpServer, middleware, web};

    use crate::models::config::ServerConfig;
    use crate::repository::JsonRepository;
    use crate::routes::{configure_api, multipart_config};
    use crate::services::notifier::{ReceiptNotifier, SmtpNotifier};
    use crate::services::receipt::ReceiptPipeline;

    /// Builds and runs the Actix-Web HTTP server using the provided configuration.
    pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
        let storage = &server_config.storage;
        for dir in [
            &storage.upload_dir,
            &storage.optimized_dir,
            &storage.output_dir,
        ] {
            fs::create_dir_all(dir)?;
        }

        let repo = JsonRepository::from_config(storage);
        let pipeline = web::Data::new(ReceiptPipeline::from_config(&server_config));

        let notifier = SmtpNotifier::new(&server_config.smtp)
            .map_err(|e| std::io::Error::other(format!("Failed to configure SMTP: {e}")))?;
        let notifier: Arc<dyn ReceiptNotifier> = Arc::new(notifier);
        let notifier = web::Data::from(notifier);

        let upload_dir = storage.upload_dir.clone();
        let upload_limit_mb = server_config.upload_limit_mb;
        let static_dir = server_config.static_dir.clone();
        let bind_address = (server_config.address.clone(), server_config.port);

        log::info!(
            "Serving {} on {}:{}",
            static_dir,
            bind_address.0,
            bind_address.1
        );

        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(middleware::Logger::default())
                .app_data(multipart_config(upload_limit_mb))
                .app_data(TempFileConfig::default().directory(&upload_dir))
                .app_data(web::Data::new(repo.clone()))
                .app_data(pipeline.clone())
                .app_data(notifier.clone())
                .configure(configure_api)
                .service(Files::new("/", &static_dir).index_file("index.html"))
        })
        .bind(bind_address)?
        .run()
        .await
    }
}
