mod models;
mod routes;
mod db;
mod config;
mod services;
mod utils;
mod middleware;
use actix_web::{App, HttpServer, web};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let config = config::Config::from_env()
        .expect("Invalid configuration");

    println!("🔌 Connecting to database...");
    let db = db::establish_connection()
        .await
        .expect("Failed to connect to database");
    println!("✅ Database connected!");

    println!("🚀 AuthStarter API running on http://0.0.0.0:8000");

    let db_data = web::Data::new(db);

    HttpServer::new(move || {
        App::new()
            .app_data(db_data.clone())
            .app_data(web::Data::new(config.clone()))
            .configure(routes::configure_routes)
    })
        .bind(("0.0.0.0", 8000))?
        .run()
        .await
}
