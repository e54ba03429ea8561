use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::upload::{CloudinaryHost, ImageHost};

pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub image_host: Arc<dyn ImageHost>,
}

impl AppState {
    /// 本番用：画像は Cloudinary に送る
    pub fn new(db: DatabaseConnection, config: Config) -> Arc<Self> {
        let image_host = Arc::new(CloudinaryHost::new(config.cloudinary.clone()));
        Self::with_image_host(db, config, image_host)
    }

    pub fn with_image_host(
        db: DatabaseConnection,
        config: Config,
        image_host: Arc<dyn ImageHost>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            config,
            image_host,
        })
    }
}
