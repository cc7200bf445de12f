use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use cytoserve::config::Settings;
use cytoserve::model::ClassifierModel;
use cytoserve::pipeline::Pipeline;
use cytoserve::server::routes;
use cytoserve::store::ResultStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load().context("could not load configuration")?;

    // A service without a usable model must not come up at all
    let model = Arc::new(
        ClassifierModel::load(&settings.model.path)
            .with_context(|| format!("startup aborted: {}", settings.model.path.display()))?,
    );
    let store = Arc::new(ResultStore::new());
    let pipeline = web::Data::new(Pipeline::new(&settings, model, store));

    let bind = (settings.server.host.clone(), settings.server.port);
    info!("listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        // Permissive CORS for the browser frontend
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .app_data(pipeline.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .service(routes::predict)
            .service(routes::get_result)
            .service(routes::health)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
